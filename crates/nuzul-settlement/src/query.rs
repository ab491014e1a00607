//! Payout listing over the four canonical views

use nuzul_types::{PayoutFilter, PayoutPage, Result, MAX_PAGE_SIZE};

use crate::SettlementEngine;

impl SettlementEngine {
    /// List reservations matching a payout filter, paged.
    ///
    /// Results sort by check-in date ascending, tie-broken by reservation id,
    /// so the same filter always pages deterministically. `page` is 1-based;
    /// a page past the end is empty, not an error. `page_size` is clamped to
    /// `[1, MAX_PAGE_SIZE]`.
    pub async fn list_payouts(&self, filter: &PayoutFilter) -> Result<PayoutPage> {
        let view = filter.view()?;
        let page = filter.page.max(1);
        let page_size = filter.page_size.clamp(1, MAX_PAGE_SIZE);

        let mut matching: Vec<_> = self
            .ledger
            .snapshot(filter.hotel_id.as_ref())
            .await
            .into_iter()
            .filter(|r| view.matches(r))
            .collect();
        matching.sort_by(|a, b| {
            a.checkin_date
                .cmp(&b.checkin_date)
                .then_with(|| a.id.cmp(&b.id))
        });

        let total = matching.len() as u64;
        let reservations = matching
            .into_iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .collect();

        Ok(PayoutPage {
            reservations,
            total,
            page,
            page_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::{engine, seed};
    use nuzul_types::{
        HotelId, PayoutFilter, PaymentChannel, SettlementStatus, TransferStatus, MAX_PAGE_SIZE,
    };
    use rust_decimal_macros::dec;

    fn commission_due(hotel: &HotelId) -> PayoutFilter {
        PayoutFilter::new(
            Some(hotel.clone()),
            PaymentChannel::Offline,
            SettlementStatus::CommissionPaid(false),
        )
    }

    #[tokio::test]
    async fn test_list_filters_by_view_and_hotel() {
        let eng = engine();
        let hotel = HotelId::new();
        let other = HotelId::new();
        seed(&eng, &hotel, PaymentChannel::Offline, dec!(500), dec!(60), 1).await;
        seed(&eng, &hotel, PaymentChannel::Online, dec!(700), dec!(70), 2).await;
        seed(&eng, &other, PaymentChannel::Offline, dec!(300), dec!(30), 3).await;

        let page = eng.list_payouts(&commission_due(&hotel)).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.reservations[0].hotel_id, hotel);
        assert_eq!(
            page.reservations[0].payment_channel,
            PaymentChannel::Offline
        );

        let transfers = eng
            .list_payouts(&PayoutFilter::new(
                Some(hotel.clone()),
                PaymentChannel::Online,
                SettlementStatus::Transfer(TransferStatus::NotTransferred),
            ))
            .await
            .unwrap();
        assert_eq!(transfers.total, 1);
        assert_eq!(
            transfers.reservations[0].online_payout_sar(),
            Some(dec!(630.00))
        );
    }

    #[tokio::test]
    async fn test_list_sorts_by_checkin_then_id() {
        let eng = engine();
        let hotel = HotelId::new();
        seed(&eng, &hotel, PaymentChannel::Offline, dec!(100), dec!(10), 9).await;
        seed(&eng, &hotel, PaymentChannel::Offline, dec!(100), dec!(10), 3).await;
        let c = seed(&eng, &hotel, PaymentChannel::Offline, dec!(100), dec!(10), 3).await;
        let d = seed(&eng, &hotel, PaymentChannel::Offline, dec!(100), dec!(10), 3).await;

        let page = eng.list_payouts(&commission_due(&hotel)).await.unwrap();
        let dates: Vec<_> = page.reservations.iter().map(|r| r.checkin_date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);

        // Same-date reservations order by id
        let same_day: Vec<_> = page
            .reservations
            .iter()
            .filter(|r| r.checkin_date == c.checkin_date)
            .map(|r| r.id.clone())
            .collect();
        let mut by_id = same_day.clone();
        by_id.sort();
        assert_eq!(same_day, by_id);
        assert!(same_day.contains(&c.id) && same_day.contains(&d.id));
    }

    #[tokio::test]
    async fn test_pagination_is_deterministic_and_complete() {
        let eng = engine();
        let hotel = HotelId::new();
        for day in 1..=5 {
            seed(&eng, &hotel, PaymentChannel::Offline, dec!(100), dec!(10), day).await;
        }

        let filter = commission_due(&hotel).with_page(1, 2);
        let first = eng.list_payouts(&filter).await.unwrap();
        assert_eq!(first.total, 5);
        assert_eq!(first.reservations.len(), 2);

        let second = eng
            .list_payouts(&commission_due(&hotel).with_page(2, 2))
            .await
            .unwrap();
        let third = eng
            .list_payouts(&commission_due(&hotel).with_page(3, 2))
            .await
            .unwrap();
        assert_eq!(second.reservations.len(), 2);
        assert_eq!(third.reservations.len(), 1);

        // No overlap across pages
        let mut all_ids: Vec<_> = first
            .reservations
            .iter()
            .chain(&second.reservations)
            .chain(&third.reservations)
            .map(|r| r.id.clone())
            .collect();
        all_ids.sort();
        all_ids.dedup();
        assert_eq!(all_ids.len(), 5);

        // Past the end: empty page, not an error
        let past = eng
            .list_payouts(&commission_due(&hotel).with_page(9, 2))
            .await
            .unwrap();
        assert!(past.reservations.is_empty());
        assert_eq!(past.total, 5);
    }

    #[tokio::test]
    async fn test_page_size_clamped() {
        let eng = engine();
        let hotel = HotelId::new();
        seed(&eng, &hotel, PaymentChannel::Offline, dec!(100), dec!(10), 1).await;

        let page = eng
            .list_payouts(&commission_due(&hotel).with_page(0, 5000))
            .await
            .unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, MAX_PAGE_SIZE);

        let page = eng
            .list_payouts(&commission_due(&hotel).with_page(1, 0))
            .await
            .unwrap();
        assert_eq!(page.page_size, 1);
    }

    #[tokio::test]
    async fn test_mismatched_filter_rejected() {
        let eng = engine();
        let result = eng
            .list_payouts(&PayoutFilter::new(
                None,
                PaymentChannel::Offline,
                SettlementStatus::Transfer(TransferStatus::Transferred),
            ))
            .await;
        assert!(result.is_err());
    }
}
