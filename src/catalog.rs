//! Catalog reader boundary: turns a CSV export of the product catalog into
//! `ProductRecord`s. Rows with a missing or non-numeric barcode are
//! discarded here, mirroring the upstream spreadsheet cleanup; the count of
//! discarded rows is reported for observability, not treated as failure.
use crate::model::ProductRecord;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

const COL_ID: &str = "ID";
const COL_TITLE: &str = "Title";
const COL_PRICE: &str = "Variant Price";
const COL_BARCODE: &str = "Variant Barcode";

#[derive(Debug, Clone)]
pub struct CatalogScan {
    pub records: Vec<ProductRecord>,
    /// Rows dropped for a missing/non-numeric barcode or unparsable price.
    pub skipped: usize,
}

/// Reads the catalog CSV. The header row must carry the `ID`, `Title`,
/// `Variant Price` and `Variant Barcode` columns, in any order.
pub fn read_catalog(path: &Path) -> Result<CatalogScan> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file: {}", path.display()))?;
    let mut lines = content.lines();

    let header = match lines.next() {
        Some(line) => split_row(line),
        None => bail!("catalog file is empty: {}", path.display()),
    };
    let col = |name: &str| -> Result<usize> {
        header
            .iter()
            .position(|h| h.trim() == name)
            .with_context(|| format!("catalog is missing the '{name}' column"))
    };
    let id_col = col(COL_ID)?;
    let title_col = col(COL_TITLE)?;
    let price_col = col(COL_PRICE)?;
    let barcode_col = col(COL_BARCODE)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for (line_no, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_row(line);
        let field = |i: usize| fields.get(i).map(String::as_str).unwrap_or("").trim();

        let barcode = match normalize_barcode(field(barcode_col)) {
            Some(barcode) => barcode,
            None => {
                debug!(row = line_no + 2, "dropping catalog row without numeric barcode");
                skipped += 1;
                continue;
            }
        };
        let reference_price: f64 = match field(price_col).parse() {
            Ok(price) => price,
            Err(_) => {
                debug!(row = line_no + 2, "dropping catalog row with unparsable price");
                skipped += 1;
                continue;
            }
        };

        records.push(ProductRecord {
            id: field(id_col).to_string(),
            title: field(title_col).to_string(),
            reference_price,
            barcode: Some(barcode),
        });
    }

    info!(
        records = records.len(),
        skipped,
        path = %path.display(),
        "catalog loaded"
    );
    Ok(CatalogScan { records, skipped })
}

/// Barcodes arrive as integers, floats (`6291041500213.0`) or junk. Accept
/// anything numeric with an integral value and render it as a plain integer
/// string; everything else is rejected.
pub fn normalize_barcode(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let value: f64 = raw.parse().ok()?;
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
        return None;
    }
    Some(format!("{}", value as u64))
}

/// Splits one CSV row, honoring double-quoted fields with `""` escapes.
fn split_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }
    fields.push(current);
    fields
}
