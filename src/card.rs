use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{Result, TrackerError};
use crate::types::{CardColor, CardId, CardKind};

/// statement cycle of a credit card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BillingCycle {
    /// day of month the statement closes, 1-31
    pub cut_off_day: u32,
    /// calendar days from cut-off to payment due
    pub payment_offset_days: u32,
}

impl BillingCycle {
    pub fn new(cut_off_day: u32, payment_offset_days: u32) -> Result<Self> {
        if !(1..=31).contains(&cut_off_day) {
            return Err(TrackerError::InvalidCard {
                message: format!("cut-off day must be between 1 and 31, got {}", cut_off_day),
            });
        }
        if payment_offset_days == 0 {
            return Err(TrackerError::InvalidCard {
                message: "payment days after cut-off must be at least 1".to_string(),
            });
        }
        Ok(Self {
            cut_off_day,
            payment_offset_days,
        })
    }
}

/// validated card fields, ready to be stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCard {
    pub name: String,
    pub kind: CardKind,
    pub last_four: Option<String>,
    pub credit_limit: Option<Money>,
    pub color: CardColor,
    pub billing: Option<BillingCycle>,
}

/// stored card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub name: String,
    pub kind: CardKind,
    pub last_four: Option<String>,
    pub credit_limit: Option<Money>,
    pub color: CardColor,
    /// `None` disables every billing-cycle computation for this card
    pub billing: Option<BillingCycle>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    pub fn from_new(id: CardId, new: NewCard, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            kind: new.kind,
            last_four: new.last_four,
            credit_limit: new.credit_limit,
            color: new.color,
            billing: new.billing,
            created_at,
            updated_at: created_at,
        }
    }

    /// overwrite editable fields, keeping identity and creation time
    pub fn apply(&mut self, new: NewCard, updated_at: DateTime<Utc>) {
        self.name = new.name;
        self.kind = new.kind;
        self.last_four = new.last_four;
        self.credit_limit = new.credit_limit;
        self.color = new.color;
        self.billing = new.billing;
        self.updated_at = updated_at;
    }

    /// masked number for display
    pub fn masked_number(&self) -> Option<String> {
        self.last_four
            .as_ref()
            .map(|digits| format!("**** **** **** {}", digits))
    }
}

/// raw card form input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardDraft {
    pub name: String,
    pub kind: CardKind,
    pub last_four: Option<String>,
    pub credit_limit: Option<Money>,
    pub color: Option<CardColor>,
    pub cut_off_day: Option<u32>,
    pub payment_offset_days: Option<u32>,
}

impl CardDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn kind(mut self, kind: CardKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn last_four(mut self, digits: impl Into<String>) -> Self {
        self.last_four = Some(digits.into());
        self
    }

    pub fn credit_limit(mut self, limit: Money) -> Self {
        self.credit_limit = Some(limit);
        self
    }

    pub fn color(mut self, color: CardColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn billing(mut self, cut_off_day: u32, payment_offset_days: u32) -> Self {
        self.cut_off_day = Some(cut_off_day);
        self.payment_offset_days = Some(payment_offset_days);
        self
    }

    /// check the form and produce storable fields
    pub fn validate(self, default_color: CardColor) -> Result<NewCard> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(TrackerError::InvalidCard {
                message: "name is required".to_string(),
            });
        }

        let last_four = match self.last_four.map(|d| d.trim().to_string()) {
            Some(d) if d.is_empty() => None,
            Some(d) if d.len() == 4 && d.chars().all(|c| c.is_ascii_digit()) => Some(d),
            Some(d) => {
                return Err(TrackerError::InvalidCard {
                    message: format!("last four digits must be 4 digits, got '{}'", d),
                })
            }
            None => None,
        };

        // a zero limit means the card has no limit
        let credit_limit = match self.credit_limit {
            Some(limit) if limit.is_negative() => {
                return Err(TrackerError::InvalidCard {
                    message: format!("credit limit cannot be negative: {}", limit),
                })
            }
            Some(limit) if limit.is_zero() => None,
            other => other,
        };

        // zero reads as "not set", same as an empty form field
        let cut_off_day = self.cut_off_day.filter(|d| *d != 0);
        let payment_offset_days = self.payment_offset_days.filter(|d| *d != 0);
        let billing = match (cut_off_day, payment_offset_days) {
            (Some(day), Some(offset)) => Some(BillingCycle::new(day, offset)?),
            (None, None) => None,
            _ => {
                return Err(TrackerError::InvalidCard {
                    message: "cut-off day and payment days must be set together".to_string(),
                })
            }
        };

        Ok(NewCard {
            name,
            kind: self.kind,
            last_four,
            credit_limit,
            color: self.color.unwrap_or(default_color),
            billing,
        })
    }
}
