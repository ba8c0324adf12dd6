//! HTML rendering of a cycle report for the dashboard page.
//!
//! Price rises are shown red and falls green, the convention of the
//! marketplaces being watched.

use std::fmt::Write;

use crate::types::{CycleReport, Direction, ItemCategory, MarketplaceTable, PriceSummary, ReportRow};

/// Escape text for inclusion in HTML element content and attributes.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn price_cell(row: &ReportRow) -> String {
    let text = escape(&row.display_price);
    match row.trend {
        Some(Direction::Up) => format!("<span style=\"color:red\">{text}</span>"),
        Some(Direction::Down) => format!("<span style=\"color:green\">{text}</span>"),
        _ => text,
    }
}

fn status_cell(row: &ReportRow) -> String {
    let text = escape(&row.status);
    match (row.flagged, row.category) {
        (true, ItemCategory::Output) => format!("<b style=\"color:red\">{text}</b>"),
        (true, ItemCategory::Material) => format!("<b style=\"color:blue\">{text}</b>"),
        _ => text,
    }
}

/// One marketplace's statistics: items across, max/min/mean/median down,
/// with the min row highlighted. Absent items show "-".
fn marketplace_table(body: &mut String, table: &MarketplaceTable) {
    let _ = write!(
        body,
        "<h3>{} ({} of {} observed)</h3><table border=\"1\" cellpadding=\"4\"><tr><th></th>",
        table.marketplace,
        table.observed(),
        table.quotes.len(),
    );
    for quote in &table.quotes {
        let _ = write!(body, "<th>{}</th>", escape(&quote.item_name));
    }
    body.push_str("</tr>");

    let stats: [(&str, fn(&PriceSummary) -> rust_decimal::Decimal); 4] = [
        ("Max", |s| s.max),
        ("Min", |s| s.min),
        ("Mean", |s| s.mean),
        ("Median", |s| s.median),
    ];
    for (label, stat) in stats {
        let style = if label == "Min" {
            " style=\"background:#FFFF00;font-weight:bold\""
        } else {
            ""
        };
        let _ = write!(body, "<tr{style}><td>{label}</td>");
        for quote in &table.quotes {
            match &quote.summary {
                Some(summary) => {
                    let _ = write!(body, "<td>{}</td>", stat(summary).normalize());
                }
                None => body.push_str("<td>-</td>"),
            }
        }
        body.push_str("</tr>");
    }
    body.push_str("</table>");
}

/// Full page for the latest report, or a placeholder before the first cycle.
pub fn render_page(title: &str, report: Option<&CycleReport>) -> String {
    let title = escape(title);
    let mut body = String::new();

    match report {
        None => body.push_str("<p>No cycle has completed yet.</p>"),
        Some(r) => {
            let _ = write!(
                body,
                "<p>Cycle #{} &middot; {} items &middot; {} priced &middot; {} unresolved &middot; {} collection failures &middot; cheapest material {}</p>",
                r.cycle_number,
                r.items_requested,
                r.items_priced,
                r.resolution_failures,
                r.collection_failures,
                r.min_material_cost.normalize(),
            );
            body.push_str(
                "<table border=\"1\" cellpadding=\"4\">\
                 <tr><th>Category</th><th>Item</th><th>Price</th><th>Status</th></tr>",
            );
            for row in &r.rows {
                let _ = write!(
                    body,
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                    escape(&row.category.to_string()),
                    escape(&row.item_name),
                    price_cell(row),
                    status_cell(row),
                );
            }
            body.push_str("</table>");
            for table in &r.marketplaces {
                marketplace_table(&mut body, table);
            }
            let _ = write!(
                body,
                "<p style=\"font-size:12px;color:gray\">Updated {}</p>",
                r.finished_at.format("%Y-%m-%d %H:%M:%S UTC"),
            );
        }
    }

    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{title}</title></head>\
         <body><h2>{title}</h2>{body}</body></html>"
    )
}
