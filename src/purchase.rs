use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{Result, TrackerError};
use crate::types::{CardId, PurchaseId};

/// interest-free installment plan (meses sin intereses)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentPlan {
    pub months: u32,
    pub monthly_payment: Money,
}

/// validated purchase fields, ready to be stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPurchase {
    pub card_id: CardId,
    pub product_name: String,
    pub purchase_date: NaiveDate,
    pub total_cost: Money,
    pub quantity: u32,
    pub unit_cost: Money,
    pub installments: Option<InstallmentPlan>,
    pub category: Option<String>,
    pub notes: Option<String>,
}

/// stored purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: PurchaseId,
    pub card_id: CardId,
    pub product_name: String,
    pub purchase_date: NaiveDate,
    pub total_cost: Money,
    pub quantity: u32,
    pub unit_cost: Money,
    /// `None` for a regular purchase billed in full
    pub installments: Option<InstallmentPlan>,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Purchase {
    pub fn from_new(id: PurchaseId, new: NewPurchase, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            card_id: new.card_id,
            product_name: new.product_name,
            purchase_date: new.purchase_date,
            total_cost: new.total_cost,
            quantity: new.quantity,
            unit_cost: new.unit_cost,
            installments: new.installments,
            category: new.category,
            notes: new.notes,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn apply(&mut self, new: NewPurchase, updated_at: DateTime<Utc>) {
        self.card_id = new.card_id;
        self.product_name = new.product_name;
        self.purchase_date = new.purchase_date;
        self.total_cost = new.total_cost;
        self.quantity = new.quantity;
        self.unit_cost = new.unit_cost;
        self.installments = new.installments;
        self.category = new.category;
        self.notes = new.notes;
        self.updated_at = updated_at;
    }

    pub fn is_installment(&self) -> bool {
        self.installments.is_some()
    }
}

/// item coming from inventory that the user wants to register as a purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPrefill {
    pub product_name: String,
    pub total_cost: Money,
    pub quantity: u32,
    pub category: Option<String>,
}

/// raw purchase form input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseDraft {
    pub card_id: Option<CardId>,
    pub product_name: String,
    pub purchase_date: NaiveDate,
    pub total_cost: Money,
    pub quantity: u32,
    /// set when the installment box is ticked
    pub installment_months: Option<u32>,
    pub category: Option<String>,
    pub notes: Option<String>,
}

impl PurchaseDraft {
    pub fn new(card_id: CardId, product_name: impl Into<String>, purchase_date: NaiveDate, total_cost: Money) -> Self {
        Self {
            card_id: Some(card_id),
            product_name: product_name.into(),
            purchase_date,
            total_cost,
            quantity: 1,
            installment_months: None,
            category: None,
            notes: None,
        }
    }

    /// draft prefilled from an inventory item; the card is picked later
    pub fn from_product(product: ProductPrefill, today: NaiveDate) -> Self {
        Self {
            card_id: None,
            product_name: product.product_name,
            purchase_date: today,
            total_cost: product.total_cost,
            quantity: product.quantity,
            installment_months: None,
            category: product.category,
            notes: None,
        }
    }

    pub fn card(mut self, card_id: CardId) -> Self {
        self.card_id = Some(card_id);
        self
    }

    pub fn quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn installments(mut self, months: u32) -> Self {
        self.installment_months = Some(months);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// check the form and derive unit cost and monthly payment
    pub fn validate(self) -> Result<NewPurchase> {
        let card_id = self.card_id.ok_or_else(|| TrackerError::InvalidPurchase {
            message: "a card must be selected".to_string(),
        })?;

        let product_name = self.product_name.trim().to_string();
        if product_name.is_empty() {
            return Err(TrackerError::InvalidPurchase {
                message: "product name is required".to_string(),
            });
        }
        if self.total_cost.is_negative() {
            return Err(TrackerError::InvalidPurchase {
                message: format!("total cost cannot be negative: {}", self.total_cost),
            });
        }
        if self.quantity == 0 {
            return Err(TrackerError::InvalidPurchase {
                message: "quantity must be at least 1".to_string(),
            });
        }

        let installments = match self.installment_months {
            Some(0) => {
                return Err(TrackerError::InvalidPurchase {
                    message: "installment purchases need at least 1 month".to_string(),
                })
            }
            Some(months) => Some(InstallmentPlan {
                months,
                monthly_payment: self.total_cost / Decimal::from(months),
            }),
            None => None,
        };

        Ok(NewPurchase {
            card_id,
            product_name,
            purchase_date: self.purchase_date,
            total_cost: self.total_cost,
            quantity: self.quantity,
            unit_cost: self.total_cost / Decimal::from(self.quantity),
            installments,
            category: non_blank(self.category),
            notes: non_blank(self.notes),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// list filter for the purchases grid
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PurchaseFilter {
    /// matched against product name and category, case-insensitive
    pub term: Option<String>,
    pub card_id: Option<CardId>,
    /// (year, month)
    pub month: Option<(i32, u32)>,
}

impl PurchaseFilter {
    /// parse a `YYYY-MM` month selector
    pub fn with_month_str(mut self, value: &str) -> Result<Self> {
        let parsed = NaiveDate::parse_from_str(&format!("{}-01", value.trim()), "%Y-%m-%d")
            .map_err(|_| TrackerError::InvalidPurchase {
                message: format!("month filter must be YYYY-MM, got '{}'", value),
            })?;
        self.month = Some((parsed.year(), parsed.month()));
        Ok(self)
    }

    pub fn matches(&self, purchase: &Purchase) -> bool {
        if let Some(term) = self.term.as_ref().map(|t| t.trim().to_lowercase()) {
            if !term.is_empty() {
                let in_name = purchase.product_name.to_lowercase().contains(&term);
                let in_category = purchase
                    .category
                    .as_ref()
                    .map(|c| c.to_lowercase().contains(&term))
                    .unwrap_or(false);
                if !in_name && !in_category {
                    return false;
                }
            }
        }
        if let Some(card_id) = self.card_id {
            if purchase.card_id != card_id {
                return false;
            }
        }
        if let Some((year, month)) = self.month {
            if purchase.purchase_date.year() != year || purchase.purchase_date.month() != month {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, purchases: &'a [Purchase]) -> Vec<&'a Purchase> {
        purchases.iter().filter(|p| self.matches(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn stored(new: NewPurchase) -> Purchase {
        Purchase::from_new(PurchaseId::new_v4(), new, Utc::now())
    }

    #[test]
    fn test_derived_costs() {
        let card = CardId::new_v4();
        let new = PurchaseDraft::new(card, "Laptop", date(2024, 3, 5), Money::from_major(12_000))
            .quantity(4)
            .installments(6)
            .validate()
            .unwrap();

        assert_eq!(new.unit_cost, Money::from_major(3_000));
        let plan = new.installments.unwrap();
        assert_eq!(plan.months, 6);
        assert_eq!(plan.monthly_payment, Money::from_major(2_000));
    }

    #[test]
    fn test_regular_purchase_has_no_plan() {
        let new = PurchaseDraft::new(CardId::new_v4(), "Tinta", date(2024, 3, 5), Money::from_decimal(dec!(99.90)))
            .validate()
            .unwrap();
        assert!(new.installments.is_none());
        assert_eq!(new.unit_cost, Money::from_decimal(dec!(99.90)));
    }

    #[test]
    fn test_rejects_bad_input() {
        let card = CardId::new_v4();
        let d = date(2024, 1, 1);
        assert!(PurchaseDraft::new(card, " ", d, Money::ONE).validate().is_err());
        assert!(PurchaseDraft::new(card, "A", d, Money::from_major(-5)).validate().is_err());
        assert!(PurchaseDraft::new(card, "A", d, Money::ONE).quantity(0).validate().is_err());
        assert!(PurchaseDraft::new(card, "A", d, Money::ONE).installments(0).validate().is_err());
    }

    #[test]
    fn test_prefill_needs_card() {
        let product = ProductPrefill {
            product_name: "Cafe 1kg".to_string(),
            total_cost: Money::from_major(450),
            quantity: 3,
            category: Some("Insumos".to_string()),
        };
        let draft = PurchaseDraft::from_product(product, date(2024, 6, 1));
        assert_eq!(draft.purchase_date, date(2024, 6, 1));
        assert!(matches!(
            draft.clone().validate(),
            Err(TrackerError::InvalidPurchase { .. })
        ));

        let new = draft.card(CardId::new_v4()).validate().unwrap();
        assert_eq!(new.unit_cost, Money::from_major(150));
        assert_eq!(new.category.as_deref(), Some("Insumos"));
    }

    #[test]
    fn test_filter() {
        let visa = CardId::new_v4();
        let amex = CardId::new_v4();
        let purchases = vec![
            stored(PurchaseDraft::new(visa, "Cafe molido", date(2024, 5, 2), Money::ONE).validate().unwrap()),
            stored(
                PurchaseDraft::new(amex, "Vasos", date(2024, 6, 9), Money::ONE)
                    .category("Cafeteria")
                    .validate()
                    .unwrap(),
            ),
            stored(PurchaseDraft::new(visa, "Servilletas", date(2024, 6, 20), Money::ONE).validate().unwrap()),
        ];

        assert_eq!(PurchaseFilter::default().apply(&purchases).len(), 3);

        let by_term = PurchaseFilter { term: Some("CAFE".to_string()), ..Default::default() };
        assert_eq!(by_term.apply(&purchases).len(), 2);

        let by_card = PurchaseFilter { card_id: Some(visa), ..Default::default() };
        assert_eq!(by_card.apply(&purchases).len(), 2);

        let june_visa = PurchaseFilter { card_id: Some(visa), ..Default::default() }
            .with_month_str("2024-06")
            .unwrap();
        let found = june_visa.apply(&purchases);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].product_name, "Servilletas");

        assert!(PurchaseFilter::default().with_month_str("junio").is_err());
    }
}
