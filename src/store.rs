use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    brand::brand_for,
    error::Result,
    extract::{int_or_zero, Column, Extract},
    ledger::OrderRecord,
    period::YearMonth,
    tax::tax_inclusive,
    yen::Yen,
};

/// Employee name the store system records against online orders that were
/// misfiled into the store export.
pub const WEB_EMPLOYEE_MARKER: &str = "ｗｅｂ";

/// Columns a store export must have.
pub const STORE_COLUMNS: [Column; 6] = [
    Column {
        name: "商品CD",
        alias: "Product Code",
    },
    Column {
        name: "商品名",
        alias: "Product Name",
    },
    Column {
        name: "カラー",
        alias: "Color",
    },
    Column {
        name: "サイズ",
        alias: "Size",
    },
    Column {
        name: "プロパー金額",
        alias: "List Price",
    },
    Column {
        name: "売上数",
        alias: "Units Sold",
    },
];

/// Defines the store export format.
#[derive(Debug, Deserialize)]
struct StoreRow {
    #[serde(rename = "商品CD", alias = "Product Code")]
    product_code: Option<String>,
    #[serde(rename = "商品名", alias = "Product Name")]
    product_name: Option<String>,
    #[serde(rename = "カラー", alias = "Color")]
    color: Option<String>,
    #[serde(rename = "サイズ", alias = "Size")]
    size: Option<String>,
    #[serde(rename = "プロパー金額", alias = "List Price")]
    list_price: Option<String>,
    #[serde(rename = "売上数", alias = "Units Sold")]
    units_sold: Option<String>,
    #[serde(rename = "社員名", alias = "Employee Name")]
    employee_name: Option<String>,
}

/// Normalizes a store export for `period` into ledger records.
///
/// Store exports are already deduplicated by the store system, so the result
/// is appended to the ledger as it is.
///
/// # Errors
///
/// Returns [`crate::Error::MissingColumns`] if any of [`STORE_COLUMNS`] is
/// absent, or any error from reading a row.
pub fn normalize(extract: &Extract, period: YearMonth) -> Result<Vec<OrderRecord>> {
    extract.require(&STORE_COLUMNS)?;
    let rows: Vec<StoreRow> = extract.deserialize()?;
    let read = rows.len();
    let records: Vec<OrderRecord> = rows
        .into_iter()
        .filter(|row| row.employee_name.as_deref() != Some(WEB_EMPLOYEE_MARKER))
        .map(|row| {
            let listed = Yen::new(int_or_zero(row.list_price.as_deref()));
            let (pre_tax, with_tax) = match tax_inclusive(listed, period) {
                Some(with_tax) => (listed, with_tax),
                None => {
                    warn!(
                        product_code = row.product_code.as_deref().unwrap_or_default(),
                        list_price = %listed,
                        "list price too large, recording zero"
                    );
                    (Yen::default(), Yen::default())
                }
            };
            let brand = brand_for(row.product_code.as_deref().unwrap_or_default()).to_string();
            OrderRecord {
                product_code: row.product_code,
                product_name: row.product_name,
                color: row.color,
                size: row.size,
                pre_tax_amount: Some(pre_tax),
                tax_inclusive_amount: Some(with_tax),
                year: period.year(),
                month: period.month(),
                quantity: int_or_zero(row.units_sold.as_deref()),
                brand,
                ..OrderRecord::default()
            }
        })
        .collect();
    debug!(
        source = extract.source(),
        read,
        kept = records.len(),
        "normalized store export"
    );
    Ok(records)
}
