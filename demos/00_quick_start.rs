/// quick start - add a card and a purchase, then print the month
use card_billing_rs::render::render_month;
use card_billing_rs::{
    CardDraft, InMemoryStore, Money, PurchaseDraft, PurchaseTracker, SafeTimeProvider, TimeSource,
    TrackerConfig,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::System);
    let mut tracker = PurchaseTracker::new(InMemoryStore::new(), TrackerConfig::default());
    tracker.load(&time).await?;

    // statement closes on the 15th, payment due 10 days later
    let visa = tracker
        .add_card(CardDraft::new("Visa").last_four("4242").billing(15, 10), &time)
        .await?;

    let today = time.now().date_naive();
    let laptop = PurchaseDraft::new(visa, "Laptop", today, Money::from_major(12_000)).installments(6);
    tracker.add_purchase(laptop, &time).await?;

    // the first installment lands this month or the next, depending on the cut-off
    let cursor = tracker.current_month(&time);
    for month in [cursor, cursor.next()] {
        println!("{}", render_month(&tracker.calendar(month, &time), tracker.config()));
    }

    Ok(())
}
