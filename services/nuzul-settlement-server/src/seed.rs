//! Demo data seeding for development mode
//!
//! Admits a handful of reservations for one hotel on both channels, registers
//! admins for each role, and puts a payment method on file, then logs every
//! id so the API can be exercised immediately.

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use nuzul_api::AppState;
use nuzul_types::{
    Actor, AdminId, AdminRole, CommissionInput, HotelId, NewReservation, PaymentChannel,
    PaymentMethodOnFile,
};

pub async fn seed_demo_data(state: &AppState) -> anyhow::Result<()> {
    let hotel = HotelId::new();
    state
        .engine
        .register_payment_method(
            hotel.clone(),
            PaymentMethodOnFile {
                token: "tok_demo_visa".to_string(),
                label: "visa •• 4242".to_string(),
            },
        )
        .await;

    for (role, name) in [
        (AdminRole::SuperAdmin, "root"),
        (AdminRole::Finance, "amal"),
        (AdminRole::Support, "sara"),
        (AdminRole::ReadOnly, "noor"),
    ] {
        let actor = Actor::new(AdminId::new(), name, role);
        tracing::info!(admin = %actor.id, name = name, role = %role, "Seeded admin");
        state.register_admin(actor).await;
    }

    let bookings = [
        (PaymentChannel::Offline, dec!(900), dec!(120), 1),
        (PaymentChannel::Offline, dec!(600), dec!(80), 3),
        (PaymentChannel::Online, dec!(650), dec!(500), 5),
        (PaymentChannel::Online, dec!(100), dec!(40), 7),
    ];
    for (channel, total, commission, day) in bookings {
        let reservation = state
            .engine
            .ledger()
            .admit(NewReservation {
                id: None,
                hotel_id: hotel.clone(),
                confirmation_number: format!("DEMO-{day:04}"),
                customer_name: "demo guest".to_string(),
                checkin_date: NaiveDate::from_ymd_opt(2026, 9, day).unwrap(),
                checkout_date: NaiveDate::from_ymd_opt(2026, 9, day + 2).unwrap(),
                total_amount_sar: total,
                payment_channel: channel,
                commission: CommissionInput::Precomputed(commission),
            })
            .await?;
        tracing::info!(
            reservation = %reservation.id,
            channel = %channel,
            total_sar = %total,
            "Seeded reservation"
        );
    }

    tracing::info!(hotel = %hotel, "Demo data seeded");
    Ok(())
}
