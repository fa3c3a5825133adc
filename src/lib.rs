pub mod billing;
pub mod calendar;
pub mod card;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod logging;
pub mod purchase;
pub mod render;
pub mod state;
pub mod store;
pub mod summary;
pub mod tracker;
pub mod types;

// re-export key types
pub use billing::{
    card_due_date, covering_cut_off, events_for_date, events_in_range, installment_schedule,
    next_scheduled_due, payment_due_date, projected_payment_date, InstallmentDue, PaymentEvent,
};
pub use calendar::{
    CalendarCell, CalendarDay, CalendarMonth, CutOffMarker, DayDetail, DayDetailItem, MonthCursor,
    PaymentAction, PaymentBadge,
};
pub use card::{BillingCycle, Card, CardDraft, NewCard};
pub use config::{CalendarConfig, CurrencyFormat, TrackerConfig, WeekStart};
pub use decimal::Money;
pub use errors::{Result, TrackerError};
pub use events::{Notice, NoticeLevel, Notifications};
pub use ledger::{MarkPaidOutcome, NewLedgerEntry, PaidKey, PaidLedgerEntry, PaidSet, PaymentLedger};
pub use logging::init_tracing;
pub use purchase::{InstallmentPlan, NewPurchase, ProductPrefill, Purchase, PurchaseDraft, PurchaseFilter};
pub use state::Snapshot;
pub use store::{CardStore, InMemoryStore, LedgerStore, PurchaseStore, Store, StoreOp};
pub use summary::CardSummary;
pub use tracker::PurchaseTracker;
pub use types::{CardColor, CardId, CardKind, EntryId, PaymentKind, PurchaseId};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
