use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::billing::PaymentEvent;
use crate::decimal::Money;
use crate::errors::{Result, TrackerError};
use crate::store::LedgerStore;
use crate::types::{CardId, EntryId, PaymentKind, PurchaseId};

/// identity of a scheduled payment in the paid ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PaidKey {
    /// the statement total of all regular purchases of a card due that day
    Regular { card_id: CardId, due_date: NaiveDate },
    /// one installment, 1-based
    Msi { purchase_id: PurchaseId, installment: u32 },
}

impl PaidKey {
    pub fn kind(&self) -> PaymentKind {
        match self {
            PaidKey::Regular { .. } => PaymentKind::Regular,
            PaidKey::Msi { .. } => PaymentKind::Msi,
        }
    }
}

impl fmt::Display for PaidKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaidKey::Regular { card_id, due_date } => {
                write!(f, "regular|{}|{}", card_id, due_date.format("%Y-%m-%d"))
            }
            PaidKey::Msi { purchase_id, installment } => {
                write!(f, "msi|{}|{}", purchase_id, installment)
            }
        }
    }
}

/// fields of a ledger entry before the store assigns its id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLedgerEntry {
    pub key: PaidKey,
    pub card_id: Option<CardId>,
    pub due_date: NaiveDate,
    pub amount: Option<Money>,
}

/// record that a scheduled payment was settled; never edited or removed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaidLedgerEntry {
    pub id: EntryId,
    pub key: PaidKey,
    pub card_id: Option<CardId>,
    pub due_date: NaiveDate,
    pub amount: Option<Money>,
    pub created_at: DateTime<Utc>,
}

impl PaidLedgerEntry {
    pub fn new(
        key: PaidKey,
        card_id: Option<CardId>,
        due_date: NaiveDate,
        amount: Option<Money>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            key,
            card_id,
            due_date,
            amount,
            created_at,
        }
    }

    pub fn from_new(id: EntryId, new: NewLedgerEntry, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            key: new.key,
            card_id: new.card_id,
            due_date: new.due_date,
            amount: new.amount,
            created_at,
        }
    }
}

/// lookup of paid keys, split by kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaidSet {
    regular: HashSet<(CardId, NaiveDate)>,
    msi: HashSet<(PurchaseId, u32)>,
}

impl PaidSet {
    /// build from a full list of entries
    pub fn from_entries(entries: &[PaidLedgerEntry]) -> Self {
        let mut set = PaidSet::default();
        for entry in entries {
            set.insert(entry.key);
        }
        set
    }

    fn insert(&mut self, key: PaidKey) {
        match key {
            PaidKey::Regular { card_id, due_date } => {
                self.regular.insert((card_id, due_date));
            }
            PaidKey::Msi { purchase_id, installment } => {
                self.msi.insert((purchase_id, installment));
            }
        }
    }

    pub fn is_paid(&self, key: &PaidKey) -> bool {
        match key {
            PaidKey::Regular { card_id, due_date } => self.is_regular_paid(*card_id, *due_date),
            PaidKey::Msi { purchase_id, installment } => {
                self.is_installment_paid(*purchase_id, *installment)
            }
        }
    }

    pub fn is_regular_paid(&self, card_id: CardId, due_date: NaiveDate) -> bool {
        self.regular.contains(&(card_id, due_date))
    }

    pub fn is_installment_paid(&self, purchase_id: PurchaseId, installment: u32) -> bool {
        self.msi.contains(&(purchase_id, installment))
    }

    pub fn len(&self) -> usize {
        self.regular.len() + self.msi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// what a mark-paid call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkPaidOutcome {
    Recorded(EntryId),
    AlreadyPaid,
}

/// in-memory mirror of the stored paid ledger
#[derive(Debug, Clone, Default)]
pub struct PaymentLedger {
    entries: Vec<PaidLedgerEntry>,
    paid: PaidSet,
}

impl PaymentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paid(&self) -> &PaidSet {
        &self.paid
    }

    pub fn entries(&self) -> &[PaidLedgerEntry] {
        &self.entries
    }

    pub fn is_paid(&self, key: &PaidKey) -> bool {
        self.paid.is_paid(key)
    }

    /// re-fetch every entry and replace both lookup sets; on failure the
    /// current state is kept
    pub async fn reload<S>(&mut self, store: &S) -> Result<()>
    where
        S: LedgerStore + ?Sized,
    {
        let entries = store.list_entries().await?;
        let paid = PaidSet::from_entries(&entries);
        debug!(entries = entries.len(), "paid ledger reloaded");
        self.entries = entries;
        self.paid = paid;
        Ok(())
    }

    /// record a payment as paid; a no-op when it already is, including when
    /// another session recorded it since the last reload
    pub async fn mark_paid<S>(&mut self, store: &S, event: &PaymentEvent) -> Result<MarkPaidOutcome>
    where
        S: LedgerStore + ?Sized,
    {
        if self.is_paid(&event.key) {
            debug!(key = %event.key, "payment already marked paid");
            return Ok(MarkPaidOutcome::AlreadyPaid);
        }

        let entry = NewLedgerEntry {
            key: event.key,
            card_id: Some(event.card_id),
            due_date: event.due_date,
            amount: Some(event.amount),
        };
        let id = match store.add_entry(entry).await {
            Ok(id) => id,
            Err(TrackerError::AlreadyRecorded { .. }) => {
                debug!(key = %event.key, "payment recorded elsewhere, reloading");
                self.reload(store).await?;
                return Ok(MarkPaidOutcome::AlreadyPaid);
            }
            Err(e) => {
                warn!(key = %event.key, error = %e, "could not record payment");
                return Err(e);
            }
        };
        info!(key = %event.key, amount = %event.amount, "payment marked paid");

        self.reload(store).await?;
        Ok(MarkPaidOutcome::Recorded(id))
    }
}
