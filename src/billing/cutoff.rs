use chrono::{Datelike, Days, Months, NaiveDate};

use crate::card::{BillingCycle, Card};

/// date for `day` of a month; days past the month end roll into the next month
/// (day 31 of april is may 1st, day 31 of february 2023 is march 3rd)
pub fn overflowing_day(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_days(Days::new(u64::from(day.saturating_sub(1))))
}

/// the month after (year, month)
pub fn following_month(year: i32, month: u32) -> (i32, u32) {
    if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// the month before (year, month)
pub fn preceding_month(year: i32, month: u32) -> (i32, u32) {
    if month <= 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

/// statement cut-off covering a purchase: this month's cut-off when the purchase
/// is on or before it, otherwise next month's
pub fn covering_cut_off(purchase_date: NaiveDate, cut_off_day: u32) -> Option<NaiveDate> {
    let this_month = overflowing_day(purchase_date.year(), purchase_date.month(), cut_off_day)?;
    if purchase_date <= this_month {
        return Some(this_month);
    }
    let (year, month) = following_month(purchase_date.year(), purchase_date.month());
    overflowing_day(year, month, cut_off_day)
}

/// due date for a purchase under a billing cycle
pub fn payment_due_date(purchase_date: NaiveDate, cycle: &BillingCycle) -> Option<NaiveDate> {
    covering_cut_off(purchase_date, cycle.cut_off_day)?
        .checked_add_days(Days::new(u64::from(cycle.payment_offset_days)))
}

/// due date for a purchase on a card; `None` when the card has no billing cycle
pub fn card_due_date(purchase_date: NaiveDate, card: &Card) -> Option<NaiveDate> {
    card.billing
        .as_ref()
        .and_then(|cycle| payment_due_date(purchase_date, cycle))
}

/// shift by whole calendar months keeping the day, clamped to the month end
/// (jan 31 + 1 month is feb 28 or 29)
pub fn add_months_clamped(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

/// simple next-payment projection: this month's cut-off plus the offset, or
/// next month's when that date has already passed
pub fn projected_payment_date(cycle: &BillingCycle, today: NaiveDate) -> Option<NaiveDate> {
    let offset = Days::new(u64::from(cycle.payment_offset_days));
    let this_month = overflowing_day(today.year(), today.month(), cycle.cut_off_day)?
        .checked_add_days(offset)?;
    if this_month >= today {
        return Some(this_month);
    }
    let (year, month) = following_month(today.year(), today.month());
    overflowing_day(year, month, cycle.cut_off_day)?.checked_add_days(offset)
}
