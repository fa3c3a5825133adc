use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::billing::cutoff::{following_month, preceding_month};
use crate::billing::{events_for_date, events_in_range, PaymentEvent};
use crate::config::WeekStart;
use crate::decimal::Money;
use crate::ledger::PaidSet;
use crate::state::Snapshot;
use crate::types::CardId;

/// month shown by the calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthCursor {
    year: i32,
    month: u32,
}

impl MonthCursor {
    /// `None` for a month outside 1-12
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)?;
        Some(Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn next(&self) -> Self {
        let (year, month) = following_month(self.year, self.month);
        Self { year, month }
    }

    pub fn prev(&self) -> Self {
        let (year, month) = preceding_month(self.year, self.month);
        Self { year, month }
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        let next = self.next();
        NaiveDate::from_ymd_opt(next.year, next.month, 1)?.pred_opt()
    }

    pub fn days_in_month(&self) -> u32 {
        self.last_day().map(|d| d.day()).unwrap_or(0)
    }
}

/// summary shown inside a day cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentBadge {
    Single(Money),
    Multiple { total: Money, count: usize },
}

impl PaymentBadge {
    pub fn from_events(events: &[PaymentEvent]) -> Option<Self> {
        match events {
            [] => None,
            [only] => Some(PaymentBadge::Single(only.amount)),
            many => Some(PaymentBadge::Multiple {
                total: many.iter().map(|e| e.amount).sum(),
                count: many.len(),
            }),
        }
    }

    pub fn total(&self) -> Money {
        match self {
            PaymentBadge::Single(amount) => *amount,
            PaymentBadge::Multiple { total, .. } => *total,
        }
    }
}

/// a card whose statement closes on a given day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutOffMarker {
    pub card_id: CardId,
    pub card_name: String,
}

/// cards whose cut-off day equals the day number of `date`
pub fn cut_offs_for_date(snapshot: &Snapshot, date: NaiveDate) -> Vec<CutOffMarker> {
    snapshot
        .cards
        .iter()
        .filter(|card| {
            card.billing
                .map(|cycle| cycle.cut_off_day == date.day())
                .unwrap_or(false)
        })
        .map(|card| CutOffMarker {
            card_id: card.id,
            card_name: card.name.clone(),
        })
        .collect()
}

/// an in-month day of the grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub is_today: bool,
    pub events: Vec<PaymentEvent>,
    pub badge: Option<PaymentBadge>,
    pub cut_offs: Vec<CutOffMarker>,
}

impl CalendarDay {
    pub fn has_payments(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn has_cut_off(&self) -> bool {
        !self.cut_offs.is_empty()
    }

    /// whether clicking the day has anything to show
    pub fn has_details(&self) -> bool {
        self.has_payments() || self.has_cut_off()
    }
}

/// one grid cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CalendarCell {
    /// day of the previous or next month, not interactive
    Filler { date: NaiveDate },
    Day(CalendarDay),
}

impl CalendarCell {
    pub fn date(&self) -> NaiveDate {
        match self {
            CalendarCell::Filler { date } => *date,
            CalendarCell::Day(day) => day.date,
        }
    }
}

/// a month laid out in full weeks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarMonth {
    pub cursor: MonthCursor,
    pub week_start: WeekStart,
    pub cells: Vec<CalendarCell>,
}

impl CalendarMonth {
    pub fn build(
        snapshot: &Snapshot,
        paid: &PaidSet,
        cursor: MonthCursor,
        today: NaiveDate,
        week_start: WeekStart,
    ) -> Self {
        let (first, last) = match (cursor.first_day(), cursor.last_day()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                return Self {
                    cursor,
                    week_start,
                    cells: Vec::new(),
                }
            }
        };

        // one pass over the schedule for the whole month
        let mut events = events_in_range(snapshot, paid, first, last, today).into_iter().peekable();

        let leading = match week_start {
            WeekStart::Sunday => first.weekday().num_days_from_sunday(),
            WeekStart::Monday => first.weekday().num_days_from_monday(),
        };
        let mut cells = Vec::with_capacity(42);

        for back in (1..=leading).rev() {
            if let Some(date) = first.checked_sub_days(Days::new(u64::from(back))) {
                cells.push(CalendarCell::Filler { date });
            }
        }

        for date in first.iter_days().take_while(|d| *d <= last) {
            let mut day_events = Vec::new();
            while let Some(event) = events.next_if(|e| e.due_date == date) {
                day_events.push(event);
            }
            let badge = PaymentBadge::from_events(&day_events);
            cells.push(CalendarCell::Day(CalendarDay {
                date,
                is_today: date == today,
                events: day_events,
                badge,
                cut_offs: cut_offs_for_date(snapshot, date),
            }));
        }

        let mut trailing = last;
        while cells.len() % 7 != 0 {
            match trailing.succ_opt() {
                Some(date) => {
                    cells.push(CalendarCell::Filler { date });
                    trailing = date;
                }
                None => break,
            }
        }

        Self {
            cursor,
            week_start,
            cells,
        }
    }

    pub fn weeks(&self) -> impl Iterator<Item = &[CalendarCell]> {
        self.cells.chunks(7)
    }

    pub fn days(&self) -> impl Iterator<Item = &CalendarDay> {
        self.cells.iter().filter_map(|cell| match cell {
            CalendarCell::Day(day) => Some(day),
            CalendarCell::Filler { .. } => None,
        })
    }

    /// in-month day by number
    pub fn day(&self, day: u32) -> Option<&CalendarDay> {
        self.days().find(|d| d.date.day() == day)
    }

    /// sum of everything due in the month
    pub fn month_total(&self) -> Money {
        self.days()
            .filter_map(|d| d.badge.map(|b| b.total()))
            .sum()
    }
}

/// what the detail view offers for one payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentAction {
    Paid,
    MarkPaid,
    NotYetDue,
}

impl PaymentAction {
    pub fn for_event(event: &PaymentEvent) -> Self {
        if event.paid {
            PaymentAction::Paid
        } else if event.payable {
            PaymentAction::MarkPaid
        } else {
            PaymentAction::NotYetDue
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayDetailItem {
    pub event: PaymentEvent,
    pub action: PaymentAction,
}

/// everything that happens on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayDetail {
    pub date: NaiveDate,
    pub items: Vec<DayDetailItem>,
    pub cut_offs: Vec<CutOffMarker>,
}

impl DayDetail {
    /// `None` when the day has no payments and no cut-offs
    pub fn build(snapshot: &Snapshot, paid: &PaidSet, date: NaiveDate, today: NaiveDate) -> Option<Self> {
        let items: Vec<DayDetailItem> = events_for_date(snapshot, paid, date, today)
            .into_iter()
            .map(|event| DayDetailItem {
                action: PaymentAction::for_event(&event),
                event,
            })
            .collect();
        let cut_offs = cut_offs_for_date(snapshot, date);

        if items.is_empty() && cut_offs.is_empty() {
            return None;
        }
        Some(Self {
            date,
            items,
            cut_offs,
        })
    }

    pub fn total(&self) -> Money {
        self.items.iter().map(|i| i.event.amount).sum()
    }
}
