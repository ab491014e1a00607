//! External money-movement channels
//!
//! The engine talks to the payment processor and the currency-conversion
//! service through these traits. Real integrations live in the server binary;
//! the in-memory implementations here back tests and development mode.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use nuzul_types::{money::sar_to_usd, Capture, CaptureStatus, Result, SettlementError};

/// Captures funds from a hotel's on-file payment method.
///
/// A capture either completes or it does not; the engine never retries a
/// capture implicitly.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Capture `amount_usd` against the given processor token
    async fn capture(&self, amount_usd: Decimal, payment_method_token: &str) -> Result<Capture>;
}

/// Converts SAR amounts to USD for the payment processor
#[async_trait]
pub trait CurrencyConverter: Send + Sync {
    /// Convert each SAR amount to USD, preserving order
    async fn convert(&self, amounts_sar: &[Decimal]) -> Result<Vec<Decimal>>;
}

/// Converter applying a fixed USD-per-SAR rate
pub struct FixedRateConverter {
    rate: Decimal,
}

impl FixedRateConverter {
    /// `rate` is USD per 1 SAR
    pub fn new(rate: Decimal) -> Self {
        Self { rate }
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }
}

#[async_trait]
impl CurrencyConverter for FixedRateConverter {
    async fn convert(&self, amounts_sar: &[Decimal]) -> Result<Vec<Decimal>> {
        Ok(amounts_sar
            .iter()
            .map(|amount| sar_to_usd(*amount, self.rate))
            .collect())
    }
}

/// Scriptable in-memory payment processor.
///
/// Returns the configured status for every capture and counts calls, so tests
/// can assert that idempotent replays never hit the processor twice.
pub struct MockPaymentProcessor {
    next_status: RwLock<CaptureStatus>,
    calls: AtomicUsize,
}

impl MockPaymentProcessor {
    pub fn new() -> Self {
        Self::with_status(CaptureStatus::Completed)
    }

    pub fn with_status(status: CaptureStatus) -> Self {
        Self {
            next_status: RwLock::new(status),
            calls: AtomicUsize::new(0),
        }
    }

    /// Change the status returned by subsequent captures
    pub async fn set_status(&self, status: CaptureStatus) {
        *self.next_status.write().await = status;
    }

    /// Number of capture calls made so far
    pub fn capture_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockPaymentProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentProcessor for MockPaymentProcessor {
    async fn capture(&self, amount_usd: Decimal, _payment_method_token: &str) -> Result<Capture> {
        if amount_usd <= Decimal::ZERO {
            return Err(SettlementError::external(
                "payment-processor",
                "capture amount must be positive",
            ));
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Capture {
            id: format!("cap_{}", Uuid::new_v4()),
            status: *self.next_status.read().await,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_fixed_rate_converter_rounds_to_cents() {
        let converter = FixedRateConverter::new(dec!(0.2667));
        let usd = converter
            .convert(&[dec!(375.00), dec!(100.00)])
            .await
            .unwrap();
        assert_eq!(usd, vec![dec!(100.01), dec!(26.67)]);
    }

    #[tokio::test]
    async fn test_mock_processor_counts_calls() {
        let processor = MockPaymentProcessor::new();
        processor.capture(dec!(10), "tok_a").await.unwrap();
        processor.capture(dec!(10), "tok_a").await.unwrap();
        assert_eq!(processor.capture_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_processor_scripted_decline() {
        let processor = MockPaymentProcessor::new();
        processor.set_status(CaptureStatus::Declined).await;
        let capture = processor.capture(dec!(10), "tok_a").await.unwrap();
        assert_eq!(capture.status, CaptureStatus::Declined);
    }
}
