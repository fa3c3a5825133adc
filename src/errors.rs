use chrono::NaiveDate;
use thiserror::Error;

use crate::ledger::PaidKey;
use crate::types::{CardId, PurchaseId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackerError {
    #[error("persistence failure during {operation}: {message}")]
    Persistence {
        operation: String,
        message: String,
    },

    #[error("invalid card: {message}")]
    InvalidCard {
        message: String,
    },

    #[error("invalid purchase: {message}")]
    InvalidPurchase {
        message: String,
    },

    #[error("card not found: {id}")]
    CardNotFound {
        id: CardId,
    },

    #[error("purchase not found: {id}")]
    PurchaseNotFound {
        id: PurchaseId,
    },

    #[error("{key} is already recorded")]
    AlreadyRecorded {
        key: PaidKey,
    },

    #[error("no scheduled payment for {key}")]
    PaymentNotFound {
        key: PaidKey,
    },

    #[error("payment due {due_date} cannot be marked paid before it is due (today {today})")]
    PaymentNotDue {
        due_date: NaiveDate,
        today: NaiveDate,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },
}

impl TrackerError {
    pub fn persistence(operation: &str, message: impl Into<String>) -> Self {
        TrackerError::Persistence {
            operation: operation.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
