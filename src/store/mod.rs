pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;

use crate::card::{Card, NewCard};
use crate::errors::Result;
use crate::ledger::{NewLedgerEntry, PaidLedgerEntry};
use crate::purchase::{NewPurchase, Purchase};
use crate::types::{CardId, EntryId, PurchaseId};

pub use memory::{InMemoryStore, StoreOp};

/// card collection
#[async_trait]
pub trait CardStore: Send + Sync {
    /// all cards ordered by name
    async fn list_cards(&self) -> Result<Vec<Card>>;

    async fn add_card(&self, card: NewCard) -> Result<CardId>;

    async fn update_card(&self, id: CardId, card: NewCard) -> Result<()>;

    async fn delete_card(&self, id: CardId) -> Result<()>;
}

/// purchase collection
#[async_trait]
pub trait PurchaseStore: Send + Sync {
    /// all purchases, newest purchase date first
    async fn list_purchases(&self) -> Result<Vec<Purchase>>;

    async fn add_purchase(&self, purchase: NewPurchase) -> Result<PurchaseId>;

    async fn update_purchase(&self, id: PurchaseId, purchase: NewPurchase) -> Result<()>;

    async fn delete_purchase(&self, id: PurchaseId) -> Result<()>;

    /// remove every purchase of a card, returning how many went
    async fn delete_purchases_for_card(&self, card_id: CardId) -> Result<usize>;
}

/// paid-ledger collection; append only
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn list_entries(&self) -> Result<Vec<PaidLedgerEntry>>;

    /// fails with `AlreadyRecorded` when an entry with the same key exists
    async fn add_entry(&self, entry: NewLedgerEntry) -> Result<EntryId>;
}

/// everything the tracker needs from persistence
pub trait Store: CardStore + PurchaseStore + LedgerStore {}

impl<T> Store for T where T: CardStore + PurchaseStore + LedgerStore {}

/// several trackers can share one store
#[async_trait]
impl<T: CardStore + ?Sized> CardStore for Arc<T> {
    async fn list_cards(&self) -> Result<Vec<Card>> {
        (**self).list_cards().await
    }

    async fn add_card(&self, card: NewCard) -> Result<CardId> {
        (**self).add_card(card).await
    }

    async fn update_card(&self, id: CardId, card: NewCard) -> Result<()> {
        (**self).update_card(id, card).await
    }

    async fn delete_card(&self, id: CardId) -> Result<()> {
        (**self).delete_card(id).await
    }
}

#[async_trait]
impl<T: PurchaseStore + ?Sized> PurchaseStore for Arc<T> {
    async fn list_purchases(&self) -> Result<Vec<Purchase>> {
        (**self).list_purchases().await
    }

    async fn add_purchase(&self, purchase: NewPurchase) -> Result<PurchaseId> {
        (**self).add_purchase(purchase).await
    }

    async fn update_purchase(&self, id: PurchaseId, purchase: NewPurchase) -> Result<()> {
        (**self).update_purchase(id, purchase).await
    }

    async fn delete_purchase(&self, id: PurchaseId) -> Result<()> {
        (**self).delete_purchase(id).await
    }

    async fn delete_purchases_for_card(&self, card_id: CardId) -> Result<usize> {
        (**self).delete_purchases_for_card(card_id).await
    }
}

#[async_trait]
impl<T: LedgerStore + ?Sized> LedgerStore for Arc<T> {
    async fn list_entries(&self) -> Result<Vec<PaidLedgerEntry>> {
        (**self).list_entries().await
    }

    async fn add_entry(&self, entry: NewLedgerEntry) -> Result<EntryId> {
        (**self).add_entry(entry).await
    }
}
