use chrono::Datelike;

use crate::calendar::{CalendarCell, CalendarMonth, DayDetail, PaymentAction, PaymentBadge};
use crate::config::TrackerConfig;
use crate::decimal::Money;
use crate::summary::CardSummary;

const CELL_WIDTH: usize = 5;

/// label shown next to a payment in the day detail
pub fn action_label(action: PaymentAction) -> &'static str {
    match action {
        PaymentAction::Paid => "Pagado",
        PaymentAction::MarkPaid => "Marcar pagado",
        PaymentAction::NotYetDue => "Aún no vence",
    }
}

fn cell_text(cell: &CalendarCell) -> String {
    match cell {
        CalendarCell::Filler { .. } => format!("{:^width$}", ".", width = CELL_WIDTH),
        CalendarCell::Day(day) => format!(
            "{}{:>2}{}{}",
            if day.is_today { '>' } else { ' ' },
            day.date.day(),
            if day.has_payments() { '$' } else { ' ' },
            if day.has_cut_off() { '*' } else { ' ' },
        ),
    }
}

/// month grid followed by one line per day with payments
pub fn render_month(month: &CalendarMonth, config: &TrackerConfig) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} {}\n",
        config.calendar.month_name(month.cursor.month()),
        month.cursor.year()
    ));

    let header: Vec<String> = config
        .calendar
        .header()
        .iter()
        .map(|name| format!("{:^width$}", name, width = CELL_WIDTH))
        .collect();
    out.push_str(header.join("").trim_end());
    out.push('\n');

    for week in month.weeks() {
        let line: String = week.iter().map(cell_text).collect();
        out.push_str(line.trim_end());
        out.push('\n');
    }

    for day in month.days() {
        match day.badge {
            Some(PaymentBadge::Single(amount)) => {
                out.push_str(&format!(
                    "{:>2}  {}\n",
                    day.date.day(),
                    amount.format(&config.currency)
                ));
            }
            Some(PaymentBadge::Multiple { total, count }) => {
                out.push_str(&format!(
                    "{:>2}  {} ({} pagos)\n",
                    day.date.day(),
                    total.format(&config.currency),
                    count
                ));
            }
            None => {}
        }
    }
    out
}

/// payments of a day with their purchases, then the cut-offs
pub fn render_day_detail(detail: &DayDetail, config: &TrackerConfig) -> String {
    let mut out = format!(
        "{} {} {}\n",
        detail.date.day(),
        config.calendar.month_name(detail.date.month()),
        detail.date.year()
    );

    for item in &detail.items {
        out.push_str(&format!(
            "  [{}] {}  {}\n",
            action_label(item.action),
            item.event.description,
            item.event.amount.format(&config.currency)
        ));
        for purchase in &item.event.purchases {
            out.push_str(&format!(
                "      {}  {}\n",
                purchase.product_name,
                purchase.total_cost.format(&config.currency)
            ));
        }
    }
    for marker in &detail.cut_offs {
        out.push_str(&format!("  Corte: {}\n", marker.card_name));
    }
    if !detail.items.is_empty() {
        out.push_str(&format!("Total: {}\n", detail.total().format(&config.currency)));
    }
    out
}

pub fn render_card_summary(summary: &CardSummary, config: &TrackerConfig) -> String {
    let money = |m: Money| m.format(&config.currency);
    let mut out = format!("{}\n", summary.card_name);
    out.push_str(&format!("  Gastado: {} ({} compras)\n", money(summary.total_spent), summary.purchase_count));
    if let Some(available) = summary.available_credit {
        out.push_str(&format!("  Disponible: {}\n", money(available)));
    }
    if summary.active_installments > 0 {
        out.push_str(&format!(
            "  MSI activos: {}, pendiente {}\n",
            summary.active_installments,
            money(summary.pending_installment_total)
        ));
    }
    if let Some(next) = summary.next_payment_date {
        out.push_str(&format!("  Próximo pago: {}\n", next.format("%d/%m/%Y")));
    }
    out
}
