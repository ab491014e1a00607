//! Payout filters and the four canonical settlement views
//!
//! `PayoutView` is the single predicate shared by the query engine and the
//! overview aggregator so that list counts and summary totals always
//! reconcile for the same filter.

use crate::{HotelId, PaymentChannel, Reservation, Result, SettlementError};
use serde::{Deserialize, Serialize};

/// Default page size for payout listings
pub const DEFAULT_PAGE_SIZE: usize = 20;
/// Upper bound on page size
pub const MAX_PAGE_SIZE: usize = 200;

/// Transfer-side status selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Transferred,
    NotTransferred,
}

/// Status half of a payout filter: exactly one of the commission flag or the
/// transfer status, matching the channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    CommissionPaid(bool),
    Transfer(TransferStatus),
}

/// Filter for `list_payouts`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutFilter {
    pub hotel_id: Option<HotelId>,
    pub payment_channel: PaymentChannel,
    pub status: SettlementStatus,
    /// 1-based page number
    pub page: usize,
    pub page_size: usize,
}

impl PayoutFilter {
    pub fn new(
        hotel_id: Option<HotelId>,
        payment_channel: PaymentChannel,
        status: SettlementStatus,
    ) -> Self {
        Self {
            hotel_id,
            payment_channel,
            status,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page(mut self, page: usize, page_size: usize) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    /// Resolve to one of the four canonical views
    pub fn view(&self) -> Result<PayoutView> {
        PayoutView::from_parts(self.payment_channel, self.status)
    }
}

/// The four canonical operational views over the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutView {
    /// Offline, commission unpaid: commission due from the hotel
    CommissionDue,
    /// Offline, commission paid
    CommissionPaid,
    /// Online, payout not yet transferred: transfer due to the hotel
    TransferDue,
    /// Online, payout transferred
    TransferCompleted,
}

impl PayoutView {
    /// Map a channel/status pair to its view; mismatched pairs (e.g. a
    /// transfer status against the offline channel) are validation errors.
    pub fn from_parts(channel: PaymentChannel, status: SettlementStatus) -> Result<Self> {
        match (channel, status) {
            (PaymentChannel::Offline, SettlementStatus::CommissionPaid(false)) => {
                Ok(Self::CommissionDue)
            }
            (PaymentChannel::Offline, SettlementStatus::CommissionPaid(true)) => {
                Ok(Self::CommissionPaid)
            }
            (PaymentChannel::Online, SettlementStatus::Transfer(TransferStatus::NotTransferred)) => {
                Ok(Self::TransferDue)
            }
            (PaymentChannel::Online, SettlementStatus::Transfer(TransferStatus::Transferred)) => {
                Ok(Self::TransferCompleted)
            }
            (PaymentChannel::Offline, SettlementStatus::Transfer(_)) => {
                Err(SettlementError::validation(
                    "status",
                    "transfer status applies to the online channel only",
                ))
            }
            (PaymentChannel::Online, SettlementStatus::CommissionPaid(_)) => {
                Err(SettlementError::validation(
                    "status",
                    "commission status applies to the offline channel only",
                ))
            }
        }
    }

    /// The channel this view covers
    pub fn channel(&self) -> PaymentChannel {
        match self {
            Self::CommissionDue | Self::CommissionPaid => PaymentChannel::Offline,
            Self::TransferDue | Self::TransferCompleted => PaymentChannel::Online,
        }
    }

    /// The shared predicate: whether a reservation belongs to this view
    pub fn matches(&self, reservation: &Reservation) -> bool {
        match self {
            Self::CommissionDue => {
                reservation.payment_channel == PaymentChannel::Offline
                    && !reservation.commission_paid
            }
            Self::CommissionPaid => {
                reservation.payment_channel == PaymentChannel::Offline
                    && reservation.commission_paid
            }
            Self::TransferDue => {
                reservation.payment_channel == PaymentChannel::Online
                    && !reservation.money_transferred_to_hotel
            }
            Self::TransferCompleted => {
                reservation.payment_channel == PaymentChannel::Online
                    && reservation.money_transferred_to_hotel
            }
        }
    }

    /// All four views, in presentation order
    pub fn all() -> [Self; 4] {
        [
            Self::CommissionDue,
            Self::CommissionPaid,
            Self::TransferDue,
            Self::TransferCompleted,
        ]
    }
}

/// One page of a payout listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutPage {
    pub reservations: Vec<Reservation>,
    /// Total matching reservations across all pages
    pub total: u64,
    pub page: usize,
    pub page_size: usize,
}
