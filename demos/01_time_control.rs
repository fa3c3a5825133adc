/// time control - pin the clock, let a payment fall due and mark it paid
use card_billing_rs::chrono::{Duration, NaiveDate, TimeZone, Utc};
use card_billing_rs::render::{render_card_summary, render_day_detail};
use card_billing_rs::{
    CardDraft, InMemoryStore, Money, PaidKey, PurchaseDraft, PurchaseTracker, SafeTimeProvider,
    TimeSource, TrackerConfig,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()));
    let control = time.test_control().unwrap();

    let mut tracker = PurchaseTracker::new(InMemoryStore::new(), TrackerConfig::default());
    tracker.load(&time).await?;
    let visa = tracker
        .add_card(CardDraft::new("Visa").billing(15, 10).credit_limit(Money::from_major(30_000)), &time)
        .await?;
    let bought = NaiveDate::from_ymd_opt(2024, 3, 2).ok_or("bad date")?;
    tracker
        .add_purchase(PurchaseDraft::new(visa, "Papel", bought, Money::from_major(450)), &time)
        .await?;

    let due = NaiveDate::from_ymd_opt(2024, 3, 25).ok_or("bad date")?;
    let key = PaidKey::Regular { card_id: visa, due_date: due };

    // too early: the payment is not due yet
    if let Err(e) = tracker.mark_paid(key, &time).await {
        println!("refused: {}", e);
    }

    control.advance(Duration::days(24));
    if let Some(detail) = tracker.mark_paid(key, &time).await? {
        println!("{}", render_day_detail(&detail, tracker.config()));
    }

    for summary in tracker.card_summaries(&time) {
        println!("{}", render_card_summary(&summary, tracker.config()));
    }
    for notice in tracker.take_notices() {
        println!("{:?}: {}", notice.level, notice.message);
    }

    Ok(())
}
