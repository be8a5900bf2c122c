//! Report writer: flat CSV, one row per correlated keyword.
//!
//! The competitor columns are a variable-length tail of alternating
//! price/url pairs; consumers must read row length rather than assume a
//! fixed schema.
use crate::model::ReportRow;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

const HEADER: &str = "ID,Product Name,Current Price,Competitor Prices,URLs";

pub fn write_report(path: &Path, rows: &[ReportRow]) -> Result<()> {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');
    for row in rows {
        out.push_str(&render_row(row));
        out.push('\n');
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create report directory for {}", path.display()))?;
        }
    }
    fs::write(path, out)
        .with_context(|| format!("failed to write report file: {}", path.display()))?;
    info!(rows = rows.len(), path = %path.display(), "report written");
    Ok(())
}

fn render_row(row: &ReportRow) -> String {
    let mut fields = vec![
        escape(&row.product_id),
        escape(&row.product_name),
        format_price(row.reference_price),
    ];
    for offer in &row.offers {
        fields.push(format_price(offer.price));
        fields.push(escape(&offer.url));
    }
    fields.join(",")
}

/// Render prices without a forced decimal tail: `19.99` stays `19.99`,
/// `-1` stays `-1`.
fn format_price(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{}", price as i64)
    } else {
        format!("{price}")
    }
}

fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
