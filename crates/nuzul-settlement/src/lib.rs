//! Nuzul Settlement - the operations layer over the reservation ledger
//!
//! Four operations, one engine:
//! - `list_payouts`: paged listing over the four canonical views
//! - `compute_overview`: aggregate totals per view, consistent with the list
//! - `charge_owner_commissions`: collect offline commission via the payment
//!   processor, idempotent by batch key
//! - `auto_reconcile_hotel`: net commission owed against payout owed without
//!   moving money
//!
//! External money movement (processor captures, currency conversion) sits
//! behind traits in [`external`]; the engine never performs network I/O while
//! holding a ledger lock, except reconciliation which moves no money at all.

pub mod charge;
pub mod external;
pub mod overview;
pub mod query;
pub mod reconcile;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use nuzul_ledger::ReservationLedger;
use nuzul_types::{BatchKey, HotelId, PaymentMethodOnFile, SettlementBatch};

pub use external::{CurrencyConverter, FixedRateConverter, MockPaymentProcessor, PaymentProcessor};

/// The settlement engine
///
/// Cheap to clone via inner `Arc`s; one instance is shared across API
/// handlers.
#[derive(Clone)]
pub struct SettlementEngine {
    ledger: Arc<ReservationLedger>,
    processor: Arc<dyn PaymentProcessor>,
    converter: Arc<dyn CurrencyConverter>,
    /// Every settlement batch ever attempted, keyed for idempotent replay
    batches: Arc<RwLock<HashMap<BatchKey, SettlementBatch>>>,
    payment_methods: Arc<RwLock<HashMap<HotelId, PaymentMethodOnFile>>>,
}

impl SettlementEngine {
    pub fn new(
        ledger: Arc<ReservationLedger>,
        processor: Arc<dyn PaymentProcessor>,
        converter: Arc<dyn CurrencyConverter>,
    ) -> Self {
        Self {
            ledger,
            processor,
            converter,
            batches: Arc::new(RwLock::new(HashMap::new())),
            payment_methods: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The underlying reservation ledger
    pub fn ledger(&self) -> &Arc<ReservationLedger> {
        &self.ledger
    }

    /// Store or replace a hotel's on-file payment method
    pub async fn register_payment_method(&self, hotel_id: HotelId, method: PaymentMethodOnFile) {
        self.payment_methods.write().await.insert(hotel_id, method);
    }

    /// The hotel's on-file payment method, if any
    pub async fn payment_method(&self, hotel_id: &HotelId) -> Option<PaymentMethodOnFile> {
        self.payment_methods.read().await.get(hotel_id).cloned()
    }

    /// Look up a settlement batch by key
    pub async fn batch(&self, key: &BatchKey) -> Option<SettlementBatch> {
        self.batches.read().await.get(key).cloned()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use chrono::NaiveDate;
    use nuzul_types::{
        Actor, AdminId, AdminRole, CommissionInput, NewReservation, PaymentChannel, Reservation,
    };
    use rust_decimal::Decimal;

    pub fn engine() -> SettlementEngine {
        engine_with_processor(Arc::new(MockPaymentProcessor::new()))
    }

    pub fn engine_with_processor(processor: Arc<MockPaymentProcessor>) -> SettlementEngine {
        SettlementEngine::new(
            Arc::new(ReservationLedger::new()),
            processor,
            // 3.75 SAR per USD
            Arc::new(FixedRateConverter::new(
                Decimal::new(2667, 4), // 0.2667 USD per SAR
            )),
        )
    }

    pub fn finance_actor() -> Actor {
        Actor::new(AdminId::new(), "amal", AdminRole::Finance)
    }

    /// Admit a reservation with a fixed commission; checkin dates are spread
    /// by `day` so sort order is controllable from tests.
    pub async fn seed(
        engine: &SettlementEngine,
        hotel_id: &HotelId,
        channel: PaymentChannel,
        total: Decimal,
        commission: Decimal,
        day: u32,
    ) -> Reservation {
        engine
            .ledger()
            .admit(NewReservation {
                id: None,
                hotel_id: hotel_id.clone(),
                confirmation_number: format!("CN-{day:04}"),
                customer_name: "guest".to_string(),
                checkin_date: NaiveDate::from_ymd_opt(2025, 6, day).unwrap(),
                checkout_date: NaiveDate::from_ymd_opt(2025, 6, day + 1).unwrap(),
                total_amount_sar: total,
                payment_channel: channel,
                commission: CommissionInput::Precomputed(commission),
            })
            .await
            .unwrap()
    }
}
