use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use tracing::{debug, error, info, warn};

use crate::billing::{events_for_date, installment_schedule};
use crate::calendar::{CalendarMonth, DayDetail, MonthCursor};
use crate::card::CardDraft;
use crate::config::TrackerConfig;
use crate::errors::{Result, TrackerError};
use crate::events::{Notice, Notifications};
use crate::ledger::{MarkPaidOutcome, PaidKey, PaymentLedger};
use crate::purchase::{ProductPrefill, Purchase, PurchaseDraft, PurchaseFilter};
use crate::state::Snapshot;
use crate::store::Store;
use crate::summary::CardSummary;
use crate::types::{CardId, PurchaseId};

/// owns the loaded cards, purchases and paid ledger; every write goes to the
/// store first and is followed by a full reload
pub struct PurchaseTracker<S: Store> {
    store: S,
    config: TrackerConfig,
    snapshot: Snapshot,
    ledger: PaymentLedger,
    notices: Notifications,
}

impl<S: Store> PurchaseTracker<S> {
    pub fn new(store: S, config: TrackerConfig) -> Self {
        Self {
            store,
            config,
            snapshot: Snapshot::default(),
            ledger: PaymentLedger::new(),
            notices: Notifications::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn ledger(&self) -> &PaymentLedger {
        &self.ledger
    }

    pub fn notices(&self) -> &[Notice] {
        self.notices.notices()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.take()
    }

    async fn fetch(&self) -> Result<(Snapshot, PaymentLedger)> {
        let cards = self.store.list_cards().await?;
        let purchases = self.store.list_purchases().await?;
        let mut ledger = PaymentLedger::new();
        ledger.reload(&self.store).await?;
        Ok((Snapshot::new(cards, purchases), ledger))
    }

    /// cards, purchases, then the paid ledger; the previous state is kept
    /// when any of them fails
    pub async fn load(&mut self, time: &SafeTimeProvider) -> Result<()> {
        match self.fetch().await {
            Ok((snapshot, ledger)) => {
                debug!(
                    cards = snapshot.cards.len(),
                    purchases = snapshot.purchases.len(),
                    paid = ledger.entries().len(),
                    "tracker loaded"
                );
                self.snapshot = snapshot;
                self.ledger = ledger;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "could not load tracker data");
                self.notices.error(format!("Error al cargar los datos: {}", e), time.now());
                Err(e)
            }
        }
    }

    /// queue the outcome of a write as a notice
    fn settle<T>(&mut self, result: Result<T>, success: &str, failure: &str, time: &SafeTimeProvider) -> Result<T> {
        match result {
            Ok(value) => {
                self.notices.success(success, time.now());
                Ok(value)
            }
            Err(e) => {
                warn!(error = %e, "{}", failure);
                self.notices.error(format!("{}: {}", failure, e), time.now());
                Err(e)
            }
        }
    }

    fn require_card(&self, id: CardId) -> Result<()> {
        match self.snapshot.card(id) {
            Some(_) => Ok(()),
            None => Err(TrackerError::CardNotFound { id }),
        }
    }

    fn require_purchase(&self, id: PurchaseId) -> Result<()> {
        match self.snapshot.purchase(id) {
            Some(_) => Ok(()),
            None => Err(TrackerError::PurchaseNotFound { id }),
        }
    }

    pub async fn add_card(&mut self, draft: CardDraft, time: &SafeTimeProvider) -> Result<CardId> {
        let result = match draft.validate(self.config.default_card_color) {
            Ok(new) => self.store.add_card(new).await,
            Err(e) => Err(e),
        };
        let id = self.settle(result, "Tarjeta agregada", "Error al guardar la tarjeta", time)?;
        info!(card_id = %id, "card added");
        self.load(time).await?;
        Ok(id)
    }

    pub async fn update_card(&mut self, id: CardId, draft: CardDraft, time: &SafeTimeProvider) -> Result<()> {
        let result = match self
            .require_card(id)
            .and_then(|_| draft.validate(self.config.default_card_color))
        {
            Ok(new) => self.store.update_card(id, new).await,
            Err(e) => Err(e),
        };
        self.settle(result, "Tarjeta actualizada", "Error al actualizar la tarjeta", time)?;
        info!(card_id = %id, "card updated");
        self.load(time).await
    }

    /// removes the card's purchases first, then the card; returns how many
    /// purchases went with it
    pub async fn delete_card(&mut self, id: CardId, time: &SafeTimeProvider) -> Result<usize> {
        let result = match self.require_card(id) {
            Ok(()) => match self.store.delete_purchases_for_card(id).await {
                Ok(removed) => self.store.delete_card(id).await.map(|_| removed),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };
        let outcome = self.settle(result, "Tarjeta eliminada", "Error al eliminar la tarjeta", time);
        // a partial cascade still changed the store
        self.load(time).await?;
        let removed = outcome?;
        info!(card_id = %id, purchases = removed, "card deleted");
        Ok(removed)
    }

    pub async fn add_purchase(&mut self, draft: PurchaseDraft, time: &SafeTimeProvider) -> Result<PurchaseId> {
        let result = match draft
            .validate()
            .and_then(|new| self.require_card(new.card_id).map(|_| new))
        {
            Ok(new) => self.store.add_purchase(new).await,
            Err(e) => Err(e),
        };
        let id = self.settle(result, "Compra registrada", "Error al guardar la compra", time)?;
        info!(purchase_id = %id, "purchase added");
        self.load(time).await?;
        Ok(id)
    }

    pub async fn update_purchase(
        &mut self,
        id: PurchaseId,
        draft: PurchaseDraft,
        time: &SafeTimeProvider,
    ) -> Result<()> {
        let result = match self.require_purchase(id).and_then(|_| {
            draft
                .validate()
                .and_then(|new| self.require_card(new.card_id).map(|_| new))
        }) {
            Ok(new) => self.store.update_purchase(id, new).await,
            Err(e) => Err(e),
        };
        self.settle(result, "Compra actualizada", "Error al actualizar la compra", time)?;
        info!(purchase_id = %id, "purchase updated");
        self.load(time).await
    }

    pub async fn delete_purchase(&mut self, id: PurchaseId, time: &SafeTimeProvider) -> Result<()> {
        let result = match self.require_purchase(id) {
            Ok(()) => self.store.delete_purchase(id).await,
            Err(e) => Err(e),
        };
        self.settle(result, "Compra eliminada", "Error al eliminar la compra", time)?;
        info!(purchase_id = %id, "purchase deleted");
        self.load(time).await
    }

    /// purchase form prefilled from an inventory item, dated today
    pub fn prefill_purchase(&self, product: ProductPrefill, time: &SafeTimeProvider) -> PurchaseDraft {
        PurchaseDraft::from_product(product, time.now().date_naive())
    }

    /// due date a paid key refers to, from the current snapshot
    fn due_date_of(&self, key: &PaidKey) -> Option<NaiveDate> {
        match key {
            PaidKey::Regular { due_date, .. } => Some(*due_date),
            PaidKey::Msi { purchase_id, installment } => {
                let purchase = self.snapshot.purchase(*purchase_id)?;
                let card = self.snapshot.card(purchase.card_id)?;
                installment_schedule(purchase, card)
                    .into_iter()
                    .find(|due| due.index == *installment)
                    .map(|due| due.due_date)
            }
        }
    }

    /// record a scheduled payment as paid and return the refreshed detail of
    /// its due date; marking an already paid payment changes nothing
    pub async fn mark_paid(&mut self, key: PaidKey, time: &SafeTimeProvider) -> Result<Option<DayDetail>> {
        let today = time.now().date_naive();

        let event = self.due_date_of(&key).and_then(|due| {
            events_for_date(&self.snapshot, self.ledger.paid(), due, today)
                .into_iter()
                .find(|e| e.key == key)
        });
        let result = match event {
            None => Err(TrackerError::PaymentNotFound { key }),
            Some(event) if !event.paid && !event.payable => Err(TrackerError::PaymentNotDue {
                due_date: event.due_date,
                today,
            }),
            Some(event) => {
                let written = self.ledger.mark_paid(&self.store, &event).await;
                if written.is_err() {
                    // the write may have landed before the failure
                    if let Err(e) = self.ledger.reload(&self.store).await {
                        warn!(error = %e, "paid ledger left stale");
                    }
                }
                written.map(|outcome| (outcome, event.due_date))
            }
        };

        let (outcome, due_date) = match result {
            Ok((MarkPaidOutcome::AlreadyPaid, due_date)) => (MarkPaidOutcome::AlreadyPaid, due_date),
            other => self.settle(other, "Pago registrado", "Error al registrar el pago", time)?,
        };
        debug!(key = %key, outcome = ?outcome, "mark paid settled");

        Ok(DayDetail::build(&self.snapshot, self.ledger.paid(), due_date, today))
    }

    pub fn current_month(&self, time: &SafeTimeProvider) -> MonthCursor {
        MonthCursor::containing(time.now().date_naive())
    }

    pub fn calendar(&self, cursor: MonthCursor, time: &SafeTimeProvider) -> CalendarMonth {
        CalendarMonth::build(
            &self.snapshot,
            self.ledger.paid(),
            cursor,
            time.now().date_naive(),
            self.config.calendar.week_start,
        )
    }

    pub fn day_detail(&self, date: NaiveDate, time: &SafeTimeProvider) -> Option<DayDetail> {
        DayDetail::build(&self.snapshot, self.ledger.paid(), date, time.now().date_naive())
    }

    pub fn card_summaries(&self, time: &SafeTimeProvider) -> Vec<CardSummary> {
        CardSummary::build_all(&self.snapshot, self.ledger.paid(), time.now().date_naive())
    }

    pub fn card_summary(&self, id: CardId, time: &SafeTimeProvider) -> Result<CardSummary> {
        let card = self
            .snapshot
            .card(id)
            .ok_or(TrackerError::CardNotFound { id })?;
        Ok(CardSummary::build(card, &self.snapshot, self.ledger.paid(), time.now().date_naive()))
    }

    pub fn filter_purchases(&self, filter: &PurchaseFilter) -> Vec<&Purchase> {
        filter.apply(&self.snapshot.purchases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use uuid::Uuid;

    use crate::decimal::Money;
    use crate::events::NoticeLevel;
    use crate::store::{InMemoryStore, PurchaseStore, StoreOp};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn clock(y: i32, m: u32, d: u32) -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()))
    }

    async fn tracker_with_visa(time: &SafeTimeProvider) -> (PurchaseTracker<InMemoryStore>, CardId) {
        let mut tracker = PurchaseTracker::new(InMemoryStore::new(), TrackerConfig::default());
        tracker.load(time).await.unwrap();
        let visa = tracker
            .add_card(CardDraft::new("Visa").billing(15, 10), time)
            .await
            .unwrap();
        tracker.take_notices();
        (tracker, visa)
    }

    #[tokio::test]
    async fn test_add_card_reloads_and_notifies() {
        let time = clock(2024, 3, 1);
        let mut tracker = PurchaseTracker::new(InMemoryStore::new(), TrackerConfig::default());
        let id = tracker.add_card(CardDraft::new("  Amex "), &time).await.unwrap();

        assert_eq!(tracker.snapshot().cards.len(), 1);
        assert_eq!(tracker.snapshot().cards[0].id, id);
        assert_eq!(tracker.snapshot().cards[0].name, "Amex");
        let notices = tracker.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Success);
        assert_eq!(notices[0].timestamp, Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_invalid_card_is_reported() {
        let time = clock(2024, 3, 1);
        let mut tracker = PurchaseTracker::new(InMemoryStore::new(), TrackerConfig::default());
        let err = tracker.add_card(CardDraft::new(""), &time).await.unwrap_err();

        assert!(matches!(err, TrackerError::InvalidCard { .. }));
        assert!(tracker.snapshot().cards.is_empty());
        assert!(tracker.notices()[0].is_error());
    }

    #[tokio::test]
    async fn test_purchase_for_unknown_card_rejected() {
        let time = clock(2024, 3, 1);
        let (mut tracker, _) = tracker_with_visa(&time).await;
        let ghost = Uuid::new_v4();
        let draft = PurchaseDraft::new(ghost, "Silla", date(2024, 3, 1), Money::from_major(800));

        let err = tracker.add_purchase(draft, &time).await.unwrap_err();
        assert_eq!(err, TrackerError::CardNotFound { id: ghost });
        assert!(tracker.store().list_purchases().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete_purchase() {
        let time = clock(2024, 3, 1);
        let (mut tracker, visa) = tracker_with_visa(&time).await;
        let id = tracker
            .add_purchase(PurchaseDraft::new(visa, "Silla", date(2024, 3, 1), Money::from_major(800)), &time)
            .await
            .unwrap();

        tracker
            .update_purchase(
                id,
                PurchaseDraft::new(visa, "Silla", date(2024, 3, 1), Money::from_major(900)).quantity(3),
                &time,
            )
            .await
            .unwrap();
        let stored = tracker.snapshot().purchase(id).unwrap();
        assert_eq!(stored.total_cost, Money::from_major(900));
        assert_eq!(stored.unit_cost, Money::from_major(300));

        tracker.delete_purchase(id, &time).await.unwrap();
        assert!(tracker.snapshot().purchases.is_empty());
        assert_eq!(
            tracker.delete_purchase(id, &time).await.unwrap_err(),
            TrackerError::PurchaseNotFound { id }
        );
    }

    #[tokio::test]
    async fn test_mark_paid_before_due_is_refused() {
        let time = clock(2024, 3, 20);
        let (mut tracker, visa) = tracker_with_visa(&time).await;
        tracker
            .add_purchase(PurchaseDraft::new(visa, "Papel", date(2024, 3, 2), Money::from_major(300)), &time)
            .await
            .unwrap();
        let key = PaidKey::Regular { card_id: visa, due_date: date(2024, 3, 25) };

        let err = tracker.mark_paid(key, &time).await.unwrap_err();
        assert_eq!(
            err,
            TrackerError::PaymentNotDue { due_date: date(2024, 3, 25), today: date(2024, 3, 20) }
        );
        assert!(!tracker.ledger().is_paid(&key));

        time.test_control().unwrap().advance(Duration::days(5));
        let detail = tracker.mark_paid(key, &time).await.unwrap().unwrap();
        assert!(tracker.ledger().is_paid(&key));
        assert!(detail.items[0].event.paid);
    }

    #[tokio::test]
    async fn test_mark_paid_unknown_payment() {
        let time = clock(2024, 3, 30);
        let (mut tracker, visa) = tracker_with_visa(&time).await;
        // no purchase is due on the 24th
        let key = PaidKey::Regular { card_id: visa, due_date: date(2024, 3, 24) };
        assert_eq!(
            tracker.mark_paid(key, &time).await.unwrap_err(),
            TrackerError::PaymentNotFound { key }
        );

        let key = PaidKey::Msi { purchase_id: Uuid::new_v4(), installment: 1 };
        assert!(matches!(
            tracker.mark_paid(key, &time).await,
            Err(TrackerError::PaymentNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_load_keeps_snapshot() {
        let time = clock(2024, 3, 1);
        let (mut tracker, _) = tracker_with_visa(&time).await;
        tracker.store().fail_on(StoreOp::ListEntries);

        assert!(tracker.load(&time).await.is_err());
        assert_eq!(tracker.snapshot().cards.len(), 1);
        let notices = tracker.take_notices();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].is_error());
    }

    #[tokio::test]
    async fn test_views_use_provider_date() {
        let time = clock(2024, 3, 25);
        let (mut tracker, visa) = tracker_with_visa(&time).await;
        tracker
            .add_purchase(PurchaseDraft::new(visa, "Papel", date(2024, 3, 2), Money::from_major(300)), &time)
            .await
            .unwrap();

        let cursor = tracker.current_month(&time);
        let month = tracker.calendar(cursor, &time);
        assert!(month.day(25).unwrap().is_today);
        assert!(month.day(25).unwrap().has_payments());

        let summary = tracker.card_summary(visa, &time).unwrap();
        assert_eq!(summary.next_payment_date, Some(date(2024, 3, 25)));
        assert_eq!(tracker.card_summaries(&time).len(), 1);
        assert!(tracker.card_summary(Uuid::new_v4(), &time).is_err());

        let draft = tracker.prefill_purchase(
            ProductPrefill {
                product_name: "Toner".to_string(),
                total_cost: Money::from_major(1_100),
                quantity: 2,
                category: Some("Oficina".to_string()),
            },
            &time,
        );
        assert_eq!(draft.purchase_date, date(2024, 3, 25));
        assert_eq!(draft.card_id, None);
    }
}
