use serde::{Deserialize, Serialize};

use crate::card::Card;
use crate::purchase::Purchase;
use crate::types::{CardId, PurchaseId};

/// latest loaded copy of the store; every view is computed from this
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// ordered by name
    pub cards: Vec<Card>,
    /// ordered by purchase date, newest first
    pub purchases: Vec<Purchase>,
}

impl Snapshot {
    pub fn new(cards: Vec<Card>, purchases: Vec<Purchase>) -> Self {
        Self { cards, purchases }
    }

    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn purchase(&self, id: PurchaseId) -> Option<&Purchase> {
        self.purchases.iter().find(|p| p.id == id)
    }

    pub fn purchases_for_card(&self, card_id: CardId) -> impl Iterator<Item = &Purchase> {
        self.purchases.iter().filter(move |p| p.card_id == card_id)
    }

    /// purchases whose card no longer exists
    pub fn orphaned_purchases(&self) -> impl Iterator<Item = &Purchase> {
        self.purchases
            .iter()
            .filter(move |p| self.card(p.card_id).is_none())
    }
}
