//! Batch CSV parsing.
//!
//! This is a deliberately restricted format, not RFC 4180:
//!
//! - one product per line, `\r\n` or `\n` line endings
//! - the first line is a header and is discarded
//! - blank lines are skipped
//! - fields are split on every comma; there is no quoting or escaping
//! - fixed column order `name,price,specifications,brand,imageUrl[,description]`
//!
//! Rows with any other column count, or with an empty name or price, are
//! rejected with the offending line number (the header is line 1).

use serde::Serialize;

use crate::error::{AdForgeError, Result};
use crate::model::ProductContent;

pub const CSV_HEADER: &str = "name,price,specifications,brand,imageUrl,description";

const MIN_COLUMNS: usize = 5;
const MAX_COLUMNS: usize = 6;

/// One validated CSV row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProduct {
    pub name: String,
    pub price: String,
    pub specifications: String,
    pub brand: String,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

impl BatchProduct {
    /// Content for this row, without its image (fetched separately).
    pub fn to_content(&self) -> ProductContent {
        ProductContent {
            name: self.name.clone(),
            brand: self.brand.clone(),
            price: self.price.clone(),
            specifications: self.specifications.clone(),
            image: None,
            description: self.description.clone(),
            features: Vec::new(),
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() { None } else { Some(s.to_string()) }
}

/// Parse batch CSV text into rows.
///
/// A header-only (or empty) input yields an empty list.
pub fn parse_batch_csv(text: &str) -> Result<Vec<BatchProduct>> {
    let mut rows = Vec::new();

    for (idx, raw) in text.split('\n').enumerate().skip(1) {
        let line_no = idx + 1;
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let cells: Vec<&str> = line.split(',').map(str::trim).collect();
        if !(MIN_COLUMNS..=MAX_COLUMNS).contains(&cells.len()) {
            return Err(AdForgeError::Csv {
                line: line_no,
                message: format!(
                    "expected {} or {} columns, found {}",
                    MIN_COLUMNS,
                    MAX_COLUMNS,
                    cells.len()
                ),
            });
        }

        let name = cells[0];
        let price = cells[1];
        if name.is_empty() {
            return Err(AdForgeError::Csv {
                line: line_no,
                message: "name is required".to_string(),
            });
        }
        if price.is_empty() {
            return Err(AdForgeError::Csv {
                line: line_no,
                message: "price is required".to_string(),
            });
        }

        rows.push(BatchProduct {
            name: name.to_string(),
            price: price.to_string(),
            specifications: cells[2].to_string(),
            brand: cells[3].to_string(),
            image_url: non_empty(cells[4]),
            description: cells.get(5).and_then(|d| non_empty(d)),
        });
    }

    Ok(rows)
}

/// Header plus one example row, offered as a download.
pub fn csv_template() -> String {
    format!(
        "{}\n{}\n",
        CSV_HEADER,
        "iPhone 15 Pro,$999,6.1\" Super Retina XDR|128GB|A17 Pro chip,Apple,https://picsum.photos/seed/iphone15/800/800,Refurbished with 90-day warranty"
    )
}
