use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::billing::{installment_schedule, next_scheduled_due, projected_payment_date};
use crate::card::Card;
use crate::decimal::Money;
use crate::ledger::{PaidKey, PaidSet};
use crate::state::Snapshot;
use crate::types::CardId;

/// per-card aggregates shown on the card list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardSummary {
    pub card_id: CardId,
    pub card_name: String,
    pub total_spent: Money,
    pub purchase_count: usize,
    /// limit minus spent; only for cards with a limit
    pub available_credit: Option<Money>,
    /// number of installment purchases on the card
    pub active_installments: usize,
    /// unpaid installments due today or later
    pub pending_installment_total: Money,
    /// projection from the billing cycle alone
    pub next_payment_date: Option<NaiveDate>,
    /// earliest unpaid due date from the actual schedule
    pub next_scheduled_due: Option<NaiveDate>,
}

impl CardSummary {
    pub fn build(card: &Card, snapshot: &Snapshot, paid: &PaidSet, today: NaiveDate) -> Self {
        let mut total_spent = Money::ZERO;
        let mut purchase_count = 0;
        let mut active_installments = 0;
        let mut pending_installment_total = Money::ZERO;

        for purchase in snapshot.purchases_for_card(card.id) {
            total_spent += purchase.total_cost;
            purchase_count += 1;
            if !purchase.is_installment() {
                continue;
            }
            active_installments += 1;
            pending_installment_total += installment_schedule(purchase, card)
                .into_iter()
                .filter(|due| {
                    due.due_date >= today
                        && !paid.is_paid(&PaidKey::Msi {
                            purchase_id: purchase.id,
                            installment: due.index,
                        })
                })
                .map(|due| due.amount)
                .sum();
        }

        let next_payment_date = match card.billing {
            Some(cycle) if purchase_count > 0 => projected_payment_date(&cycle, today),
            _ => None,
        };

        Self {
            card_id: card.id,
            card_name: card.name.clone(),
            total_spent,
            purchase_count,
            available_credit: card.credit_limit.map(|limit| limit - total_spent),
            active_installments,
            pending_installment_total,
            next_payment_date,
            next_scheduled_due: next_scheduled_due(snapshot, paid, card, today),
        }
    }

    /// one summary per card in snapshot order
    pub fn build_all(snapshot: &Snapshot, paid: &PaidSet, today: NaiveDate) -> Vec<Self> {
        snapshot
            .cards
            .iter()
            .map(|card| Self::build(card, snapshot, paid, today))
            .collect()
    }

    pub fn is_over_limit(&self) -> bool {
        self.available_credit
            .map(|available| available.is_negative())
            .unwrap_or(false)
    }
}
