pub mod cutoff;
pub mod schedule;

pub use cutoff::{
    add_months_clamped, card_due_date, covering_cut_off, overflowing_day, payment_due_date,
    projected_payment_date,
};
pub use schedule::{
    events_for_date, events_in_range, installment_schedule, next_scheduled_due,
    regular_due_groups, InstallmentDue, PaymentEvent,
};
