use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use uuid::Uuid;

use crate::card::{Card, NewCard};
use crate::errors::{Result, TrackerError};
use crate::ledger::{NewLedgerEntry, PaidLedgerEntry};
use crate::purchase::{NewPurchase, Purchase};
use crate::store::{CardStore, LedgerStore, PurchaseStore};
use crate::types::{CardId, EntryId, PurchaseId};

/// store operations, used to inject failures in tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    ListCards,
    AddCard,
    UpdateCard,
    DeleteCard,
    ListPurchases,
    AddPurchase,
    UpdatePurchase,
    DeletePurchase,
    DeletePurchasesForCard,
    ListEntries,
    AddEntry,
}

impl StoreOp {
    pub fn name(&self) -> &'static str {
        match self {
            StoreOp::ListCards => "list cards",
            StoreOp::AddCard => "add card",
            StoreOp::UpdateCard => "update card",
            StoreOp::DeleteCard => "delete card",
            StoreOp::ListPurchases => "list purchases",
            StoreOp::AddPurchase => "add purchase",
            StoreOp::UpdatePurchase => "update purchase",
            StoreOp::DeletePurchase => "delete purchase",
            StoreOp::DeletePurchasesForCard => "delete card purchases",
            StoreOp::ListEntries => "list paid entries",
            StoreOp::AddEntry => "add paid entry",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreData {
    cards: Vec<Card>,
    purchases: Vec<Purchase>,
    entries: Vec<PaidLedgerEntry>,
}

/// process-local store with the same contract as the hosted one
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: Mutex<StoreData>,
    failures: Mutex<HashSet<StoreOp>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// restore from a json dump produced by `to_json`
    pub fn from_json(json: &str) -> Result<Self> {
        let data: StoreData = serde_json::from_str(json)
            .map_err(|e| TrackerError::persistence("restore", e.to_string()))?;
        Ok(Self {
            data: Mutex::new(data),
            failures: Mutex::new(HashSet::new()),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        let data = self
            .data
            .lock()
            .map_err(|_| TrackerError::persistence("dump", "store lock poisoned"))?;
        serde_json::to_string_pretty(&*data)
            .map_err(|e| TrackerError::persistence("dump", e.to_string()))
    }

    /// make every call of `op` fail until cleared
    pub fn fail_on(&self, op: StoreOp) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert(op);
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.clear();
        }
    }

    fn with_data<T>(&self, op: StoreOp, f: impl FnOnce(&mut StoreData) -> Result<T>) -> Result<T> {
        let injected = self
            .failures
            .lock()
            .map(|failures| failures.contains(&op))
            .unwrap_or(false);
        if injected {
            error!(operation = op.name(), "store unavailable");
            return Err(TrackerError::persistence(op.name(), "store unavailable"));
        }

        let mut data = self
            .data
            .lock()
            .map_err(|_| TrackerError::persistence(op.name(), "store lock poisoned"))?;
        let result = f(&mut data);
        debug!(operation = op.name(), ok = result.is_ok(), "store call");
        result
    }
}

fn missing(op: StoreOp, what: &str, id: Uuid) -> TrackerError {
    TrackerError::persistence(op.name(), format!("{} {} does not exist", what, id))
}

#[async_trait]
impl CardStore for InMemoryStore {
    async fn list_cards(&self) -> Result<Vec<Card>> {
        self.with_data(StoreOp::ListCards, |data| {
            let mut cards = data.cards.clone();
            cards.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(cards)
        })
    }

    async fn add_card(&self, card: NewCard) -> Result<CardId> {
        self.with_data(StoreOp::AddCard, |data| {
            let id = Uuid::new_v4();
            data.cards.push(Card::from_new(id, card, Utc::now()));
            Ok(id)
        })
    }

    async fn update_card(&self, id: CardId, card: NewCard) -> Result<()> {
        self.with_data(StoreOp::UpdateCard, |data| {
            let existing = data
                .cards
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or_else(|| missing(StoreOp::UpdateCard, "card", id))?;
            existing.apply(card, Utc::now());
            Ok(())
        })
    }

    async fn delete_card(&self, id: CardId) -> Result<()> {
        self.with_data(StoreOp::DeleteCard, |data| {
            let before = data.cards.len();
            data.cards.retain(|c| c.id != id);
            if data.cards.len() == before {
                return Err(missing(StoreOp::DeleteCard, "card", id));
            }
            Ok(())
        })
    }
}

#[async_trait]
impl PurchaseStore for InMemoryStore {
    async fn list_purchases(&self) -> Result<Vec<Purchase>> {
        self.with_data(StoreOp::ListPurchases, |data| {
            let mut purchases = data.purchases.clone();
            purchases.sort_by(|a, b| b.purchase_date.cmp(&a.purchase_date));
            Ok(purchases)
        })
    }

    async fn add_purchase(&self, purchase: NewPurchase) -> Result<PurchaseId> {
        self.with_data(StoreOp::AddPurchase, |data| {
            let id = Uuid::new_v4();
            data.purchases.push(Purchase::from_new(id, purchase, Utc::now()));
            Ok(id)
        })
    }

    async fn update_purchase(&self, id: PurchaseId, purchase: NewPurchase) -> Result<()> {
        self.with_data(StoreOp::UpdatePurchase, |data| {
            let existing = data
                .purchases
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| missing(StoreOp::UpdatePurchase, "purchase", id))?;
            existing.apply(purchase, Utc::now());
            Ok(())
        })
    }

    async fn delete_purchase(&self, id: PurchaseId) -> Result<()> {
        self.with_data(StoreOp::DeletePurchase, |data| {
            let before = data.purchases.len();
            data.purchases.retain(|p| p.id != id);
            if data.purchases.len() == before {
                return Err(missing(StoreOp::DeletePurchase, "purchase", id));
            }
            Ok(())
        })
    }

    async fn delete_purchases_for_card(&self, card_id: CardId) -> Result<usize> {
        self.with_data(StoreOp::DeletePurchasesForCard, |data| {
            let before = data.purchases.len();
            data.purchases.retain(|p| p.card_id != card_id);
            Ok(before - data.purchases.len())
        })
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn list_entries(&self) -> Result<Vec<PaidLedgerEntry>> {
        self.with_data(StoreOp::ListEntries, |data| Ok(data.entries.clone()))
    }

    async fn add_entry(&self, entry: NewLedgerEntry) -> Result<EntryId> {
        self.with_data(StoreOp::AddEntry, |data| {
            if data.entries.iter().any(|e| e.key == entry.key) {
                return Err(TrackerError::AlreadyRecorded { key: entry.key });
            }
            let id = Uuid::new_v4();
            data.entries.push(PaidLedgerEntry::from_new(id, entry, Utc::now()));
            Ok(id)
        })
    }
}
