use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// unique identifier for a card, assigned by the store
pub type CardId = Uuid;

/// unique identifier for a purchase, assigned by the store
pub type PurchaseId = Uuid;

/// unique identifier for a paid-ledger entry
pub type EntryId = Uuid;

/// card kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    #[default]
    Credit,
    Debit,
}

impl CardKind {
    pub fn label(&self) -> &'static str {
        match self {
            CardKind::Credit => "CRÉDITO",
            CardKind::Debit => "DÉBITO",
        }
    }
}

/// colour tag used by the card grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CardColor {
    #[default]
    Blue,
    Green,
    Purple,
    Red,
    Orange,
    Black,
}

/// kind of a scheduled payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    /// statement total of a card's non-installment purchases
    Regular,
    /// one monthly share of an interest-free installment purchase
    Msi,
}

impl fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentKind::Regular => write!(f, "regular"),
            PaymentKind::Msi => write!(f, "msi"),
        }
    }
}
