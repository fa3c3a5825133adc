use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::billing::cutoff::{add_months_clamped, card_due_date};
use crate::card::Card;
use crate::decimal::Money;
use crate::ledger::{PaidKey, PaidSet};
use crate::purchase::Purchase;
use crate::state::Snapshot;
use crate::types::{CardId, PaymentKind};

/// one monthly share of an installment purchase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentDue {
    /// 1-based
    pub index: u32,
    pub of: u32,
    pub due_date: NaiveDate,
    pub amount: Money,
}

/// a payment that falls due on a specific date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub key: PaidKey,
    pub card_id: CardId,
    pub card_name: String,
    pub description: String,
    pub amount: Money,
    pub due_date: NaiveDate,
    /// purchases billed together in a regular statement payment
    pub purchases: Vec<Purchase>,
    pub installment: Option<InstallmentDue>,
    pub paid: bool,
    /// due today or earlier and not paid yet
    pub payable: bool,
}

impl PaymentEvent {
    pub fn kind(&self) -> PaymentKind {
        self.key.kind()
    }
}

/// regular purchases of a card grouped by their due date
pub fn regular_due_groups<'a, I>(card: &Card, purchases: I) -> BTreeMap<NaiveDate, Vec<&'a Purchase>>
where
    I: IntoIterator<Item = &'a Purchase>,
{
    let mut groups: BTreeMap<NaiveDate, Vec<&'a Purchase>> = BTreeMap::new();
    for purchase in purchases {
        if purchase.card_id != card.id || purchase.is_installment() {
            continue;
        }
        if let Some(due) = card_due_date(purchase.purchase_date, card) {
            groups.entry(due).or_default().push(purchase);
        }
    }
    groups
}

/// every installment of an installment purchase; the first falls on the due date
/// of the purchase itself and each next one a calendar month later. a plan with
/// no monthly amount has nothing to pay
pub fn installment_schedule(purchase: &Purchase, card: &Card) -> Vec<InstallmentDue> {
    let plan = match purchase.installments {
        Some(plan) if purchase.card_id == card.id && !plan.monthly_payment.is_zero() => plan,
        _ => return Vec::new(),
    };
    let first_due = match card_due_date(purchase.purchase_date, card) {
        Some(due) => due,
        None => return Vec::new(),
    };

    (0..plan.months)
        .filter_map(|i| {
            add_months_clamped(first_due, i).map(|due_date| InstallmentDue {
                index: i + 1,
                of: plan.months,
                due_date,
                amount: plan.monthly_payment,
            })
        })
        .collect()
}

/// every payment event due on `date`
pub fn events_for_date(
    snapshot: &Snapshot,
    paid: &PaidSet,
    date: NaiveDate,
    today: NaiveDate,
) -> Vec<PaymentEvent> {
    events_in_range(snapshot, paid, date, date, today)
}

/// every payment event due between `from` and `to`, both inclusive, ordered by
/// due date; on one date regular payments come first in card order, then
/// installments in purchase order
pub fn events_in_range(
    snapshot: &Snapshot,
    paid: &PaidSet,
    from: NaiveDate,
    to: NaiveDate,
    today: NaiveDate,
) -> Vec<PaymentEvent> {
    let mut events = Vec::new();

    for card in &snapshot.cards {
        for (due_date, group) in regular_due_groups(card, snapshot.purchases_for_card(card.id)) {
            if due_date < from || due_date > to {
                continue;
            }
            let key = PaidKey::Regular {
                card_id: card.id,
                due_date,
            };
            let is_paid = paid.is_paid(&key);
            events.push(PaymentEvent {
                key,
                card_id: card.id,
                card_name: card.name.clone(),
                description: format!("Pago {}", card.name),
                amount: group.iter().map(|p| p.total_cost).sum(),
                due_date,
                purchases: group.into_iter().cloned().collect(),
                installment: None,
                paid: is_paid,
                payable: due_date <= today && !is_paid,
            });
        }
    }

    for purchase in snapshot.purchases.iter().filter(|p| p.is_installment()) {
        // purchases pointing at a deleted card simply have no schedule
        let card = match snapshot.card(purchase.card_id) {
            Some(card) => card,
            None => continue,
        };
        for due in installment_schedule(purchase, card) {
            if due.due_date < from || due.due_date > to {
                continue;
            }
            let key = PaidKey::Msi {
                purchase_id: purchase.id,
                installment: due.index,
            };
            let is_paid = paid.is_paid(&key);
            events.push(PaymentEvent {
                key,
                card_id: card.id,
                card_name: card.name.clone(),
                description: format!("MSI {} ({}/{})", purchase.product_name, due.index, due.of),
                amount: due.amount,
                due_date: due.due_date,
                purchases: Vec::new(),
                installment: Some(due),
                paid: is_paid,
                payable: due.due_date <= today && !is_paid,
            });
        }
    }

    events.sort_by_key(|e| e.due_date);
    events
}

/// earliest unpaid due date on or after `today` among a card's events
pub fn next_scheduled_due(
    snapshot: &Snapshot,
    paid: &PaidSet,
    card: &Card,
    today: NaiveDate,
) -> Option<NaiveDate> {
    let regular = regular_due_groups(card, snapshot.purchases_for_card(card.id))
        .into_keys()
        .find(|due| {
            *due >= today
                && !paid.is_paid(&PaidKey::Regular {
                    card_id: card.id,
                    due_date: *due,
                })
        });

    let installment = snapshot
        .purchases_for_card(card.id)
        .flat_map(|p| {
            installment_schedule(p, card)
                .into_iter()
                .filter(|due| {
                    due.due_date >= today
                        && !paid.is_paid(&PaidKey::Msi {
                            purchase_id: p.id,
                            installment: due.index,
                        })
                })
                .map(|due| due.due_date)
        })
        .min();

    match (regular, installment) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::card::{BillingCycle, Card};
    use crate::ledger::PaidLedgerEntry;
    use crate::purchase::InstallmentPlan;
    use crate::types::{CardColor, CardKind, PurchaseId};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn card(name: &str, billing: Option<BillingCycle>) -> Card {
        Card {
            id: Uuid::new_v4(),
            name: name.to_string(),
            kind: CardKind::Credit,
            last_four: None,
            credit_limit: None,
            color: CardColor::Blue,
            billing,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn purchase(card: &Card, name: &str, on: NaiveDate, total: i64, months: Option<u32>) -> Purchase {
        let total = Money::from_major(total);
        Purchase {
            id: PurchaseId::new_v4(),
            card_id: card.id,
            product_name: name.to_string(),
            purchase_date: on,
            total_cost: total,
            quantity: 1,
            unit_cost: total,
            installments: months.map(|m| InstallmentPlan {
                months: m,
                monthly_payment: total / Decimal::from(m),
            }),
            category: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn cycle(cut_off_day: u32, payment_offset_days: u32) -> Option<BillingCycle> {
        Some(BillingCycle { cut_off_day, payment_offset_days })
    }

    #[test]
    fn test_regular_purchases_on_same_due_date_aggregate() {
        let visa = card("Visa", cycle(15, 10));
        let a = purchase(&visa, "Papel", date(2024, 3, 2), 300, None);
        let b = purchase(&visa, "Toner", date(2024, 3, 12), 700, None);
        let snapshot = Snapshot::new(vec![visa.clone()], vec![a, b]);

        let events = events_for_date(&snapshot, &PaidSet::default(), date(2024, 3, 25), date(2024, 3, 1));
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.kind(), PaymentKind::Regular);
        assert_eq!(event.amount, Money::from_major(1_000));
        assert_eq!(event.purchases.len(), 2);
        assert_eq!(event.description, "Pago Visa");
        assert_eq!(
            event.key,
            PaidKey::Regular { card_id: visa.id, due_date: date(2024, 3, 25) }
        );
    }

    #[test]
    fn test_single_purchase_shows_its_own_amount() {
        let visa = card("Visa", cycle(15, 10));
        let a = purchase(&visa, "Papel", date(2024, 3, 20), 450, None);
        let snapshot = Snapshot::new(vec![visa], vec![a]);

        // bought after the cut-off: april 15 + 10 days
        let events = events_for_date(&snapshot, &PaidSet::default(), date(2024, 4, 25), date(2024, 3, 1));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].amount, Money::from_major(450));
        assert!(events_for_date(&snapshot, &PaidSet::default(), date(2024, 3, 25), date(2024, 3, 1)).is_empty());
    }

    #[test]
    fn test_regular_charge_is_not_repeated_monthly() {
        let visa = card("Visa", cycle(15, 10));
        let a = purchase(&visa, "Papel", date(2024, 3, 2), 300, None);
        let snapshot = Snapshot::new(vec![visa], vec![a]);

        let events = events_in_range(&snapshot, &PaidSet::default(), date(2024, 1, 1), date(2024, 12, 31), date(2024, 1, 1));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_installments_spaced_by_calendar_months() {
        let amex = card("Amex", cycle(5, 20));
        let tv = purchase(&amex, "Pantalla", date(2024, 1, 3), 9_000, Some(3));
        let schedule = installment_schedule(&tv, &amex);

        assert_eq!(schedule.len(), 3);
        assert_eq!(
            schedule.iter().map(|d| d.index).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(
            schedule.iter().map(|d| d.due_date).collect::<Vec<_>>(),
            vec![date(2024, 1, 25), date(2024, 2, 25), date(2024, 3, 25)]
        );
        assert!(schedule.iter().all(|d| d.amount == Money::from_major(3_000)));
    }

    #[test]
    fn test_installment_month_end_clamps() {
        // cut-off on the 21st plus 10 days lands on jan 31
        let card = card("Oro", cycle(21, 10));
        let buy = purchase(&card, "Silla", date(2024, 1, 10), 1_200, Some(3));
        let dues: Vec<_> = installment_schedule(&buy, &card).into_iter().map(|d| d.due_date).collect();
        assert_eq!(dues, vec![date(2024, 1, 31), date(2024, 2, 29), date(2024, 3, 31)]);
    }

    #[test]
    fn test_installment_events_over_whole_schedule() {
        let amex = card("Amex", cycle(5, 20));
        let tv = purchase(&amex, "Pantalla", date(2024, 1, 3), 9_000, Some(3));
        let snapshot = Snapshot::new(vec![amex], vec![tv.clone()]);

        let events = events_in_range(&snapshot, &PaidSet::default(), date(2023, 1, 1), date(2026, 1, 1), date(2024, 1, 1));
        assert_eq!(events.len(), 3);
        assert_eq!(events[1].description, "MSI Pantalla (2/3)");
        assert_eq!(
            events[1].key,
            PaidKey::Msi { purchase_id: tv.id, installment: 2 }
        );
        assert!(events.iter().all(|e| e.kind() == PaymentKind::Msi));
    }

    #[test]
    fn test_card_without_cycle_has_no_schedule() {
        let debit = card("Debito", None);
        let a = purchase(&debit, "Pan", date(2024, 3, 2), 50, None);
        let b = purchase(&debit, "Horno", date(2024, 3, 2), 6_000, Some(6));
        let snapshot = Snapshot::new(vec![debit.clone()], vec![a, b.clone()]);

        assert!(installment_schedule(&b, &debit).is_empty());
        let events = events_in_range(&snapshot, &PaidSet::default(), date(2020, 1, 1), date(2030, 1, 1), date(2024, 1, 1));
        assert!(events.is_empty());
    }

    #[test]
    fn test_zero_cost_installments_produce_no_events() {
        let visa = card("Visa", cycle(15, 10));
        let gift = purchase(&visa, "Regalo", date(2024, 3, 2), 0, Some(3));
        let snapshot = Snapshot::new(vec![visa.clone()], vec![gift.clone()]);

        assert!(installment_schedule(&gift, &visa).is_empty());
        let events = events_in_range(&snapshot, &PaidSet::default(), date(2024, 1, 1), date(2024, 12, 31), date(2024, 3, 25));
        assert!(events.is_empty());
        assert_eq!(next_scheduled_due(&snapshot, &PaidSet::default(), &visa, date(2024, 3, 1)), None);
    }

    #[test]
    fn test_purchase_of_deleted_card_is_ignored() {
        let visa = card("Visa", cycle(15, 10));
        let gone = card("Cancelada", cycle(15, 10));
        let orphan = purchase(&gone, "Mesa", date(2024, 3, 2), 900, Some(3));
        let snapshot = Snapshot::new(vec![visa], vec![orphan]);

        let events = events_in_range(&snapshot, &PaidSet::default(), date(2020, 1, 1), date(2030, 1, 1), date(2024, 1, 1));
        assert!(events.is_empty());
        assert_eq!(snapshot.orphaned_purchases().count(), 1);
    }

    #[test]
    fn test_paid_and_payable_flags() {
        let visa = card("Visa", cycle(15, 10));
        let a = purchase(&visa, "Papel", date(2024, 3, 2), 300, None);
        let m = purchase(&visa, "Laptop", date(2024, 3, 2), 600, Some(2));
        let snapshot = Snapshot::new(vec![visa.clone()], vec![a, m.clone()]);
        let due = date(2024, 3, 25);

        // not due yet
        let events = events_for_date(&snapshot, &PaidSet::default(), due, date(2024, 3, 24));
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| !e.payable && !e.paid));

        // due today
        let events = events_for_date(&snapshot, &PaidSet::default(), due, due);
        assert!(events.iter().all(|e| e.payable));
        assert_eq!(events[0].kind(), PaymentKind::Regular);
        assert_eq!(events[1].kind(), PaymentKind::Msi);

        let paid = PaidSet::from_entries(&[PaidLedgerEntry::new(
            PaidKey::Regular { card_id: visa.id, due_date: due },
            Some(visa.id),
            due,
            None,
            Utc::now(),
        )]);
        let events = events_for_date(&snapshot, &paid, due, date(2024, 4, 1));
        assert!(events[0].paid && !events[0].payable);
        assert!(!events[1].paid && events[1].payable);
    }

    #[test]
    fn test_recomputation_is_deterministic() {
        let visa = card("Visa", cycle(15, 10));
        let a = purchase(&visa, "Papel", date(2024, 3, 2), 300, None);
        let m = purchase(&visa, "Laptop", date(2024, 3, 2), 600, Some(4));
        let snapshot = Snapshot::new(vec![visa], vec![a, m]);
        let paid = PaidSet::default();

        let first = events_in_range(&snapshot, &paid, date(2024, 1, 1), date(2024, 12, 31), date(2024, 5, 1));
        let second = events_in_range(&snapshot, &paid, date(2024, 1, 1), date(2024, 12, 31), date(2024, 5, 1));
        assert_eq!(first, second);
    }

    #[test]
    fn test_next_scheduled_due() {
        let visa = card("Visa", cycle(15, 10));
        let a = purchase(&visa, "Papel", date(2024, 3, 2), 300, None);
        let m = purchase(&visa, "Laptop", date(2024, 3, 2), 600, Some(3));
        let snapshot = Snapshot::new(vec![visa.clone()], vec![a, m.clone()]);

        assert_eq!(
            next_scheduled_due(&snapshot, &PaidSet::default(), &visa, date(2024, 3, 20)),
            Some(date(2024, 3, 25))
        );
        assert_eq!(
            next_scheduled_due(&snapshot, &PaidSet::default(), &visa, date(2024, 3, 26)),
            Some(date(2024, 4, 25))
        );

        let paid = PaidSet::from_entries(&[PaidLedgerEntry::new(
            PaidKey::Msi { purchase_id: m.id, installment: 2 },
            Some(visa.id),
            date(2024, 4, 25),
            None,
            Utc::now(),
        )]);
        assert_eq!(
            next_scheduled_due(&snapshot, &paid, &visa, date(2024, 3, 26)),
            Some(date(2024, 5, 25))
        );
        assert_eq!(
            next_scheduled_due(&snapshot, &paid, &visa, date(2024, 6, 1)),
            None
        );
    }
}
