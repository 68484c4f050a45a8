//! Raw order export from the WEB ledger.

use rust_xlsxwriter::Workbook;
use serde::Serialize;
use tracing::info;

use std::path::Path;

use crate::{
    error::Result,
    ledger::OrderRecord,
    summary::{CodeRange, SummaryQuery},
    yen::Yen,
};

/// One exported order line, in sheet column order.
#[derive(Debug, Default, Serialize)]
struct ExportRow {
    #[serde(rename = "Order No")]
    order_no: Option<String>,
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "Month")]
    month: u32,
    #[serde(rename = "Order Date")]
    order_date: Option<i64>,
    #[serde(rename = "Age")]
    age: Option<i64>,
    #[serde(rename = "Gender")]
    gender: Option<String>,
    #[serde(rename = "Product Code")]
    product_code: Option<String>,
    #[serde(rename = "Product Name")]
    product_name: Option<String>,
    #[serde(rename = "Color")]
    color: Option<String>,
    #[serde(rename = "Size")]
    size: Option<String>,
    #[serde(rename = "Pre-tax Amount")]
    pre_tax_amount: Option<i64>,
    #[serde(rename = "Tax-inclusive Amount")]
    tax_inclusive_amount: Option<i64>,
    #[serde(rename = "Quantity")]
    quantity: i64,
    #[serde(rename = "Gift")]
    gift: Option<u8>,
    #[serde(rename = "Payment Method")]
    payment_method: Option<String>,
    #[serde(rename = "Residence")]
    residence: Option<String>,
    #[serde(rename = "Brand")]
    brand: String,
}

impl From<&OrderRecord> for ExportRow {
    fn from(r: &OrderRecord) -> Self {
        Self {
            order_no: r.order_no.clone(),
            year: r.year,
            month: r.month,
            order_date: r.order_date,
            age: r.age,
            gender: r.gender.clone(),
            product_code: r.product_code.clone(),
            product_name: r.product_name.clone(),
            color: r.color.clone(),
            size: r.size.clone(),
            pre_tax_amount: r.pre_tax_amount.map(Yen::amount),
            tax_inclusive_amount: r.tax_inclusive_amount.map(Yen::amount),
            quantity: r.quantity,
            gift: r.gift,
            payment_method: r.payment_method.clone(),
            residence: r.residence.clone(),
            brand: r.brand.clone(),
        }
    }
}

/// Returns the orders in the query's months, restricted to whole product
/// codes within `query.codes` when a range is given.
#[must_use]
pub fn select_orders<'a>(orders: &'a [OrderRecord], query: &SummaryQuery) -> Vec<&'a OrderRecord> {
    orders
        .iter()
        .filter(|o| query.covers(o.period()))
        .filter(|o| {
            query.codes.as_ref().map_or(true, |range: &CodeRange| {
                o.product_code.as_deref().is_some_and(|code| range.contains(code))
            })
        })
        .collect()
}

/// Writes `orders` to a new workbook at `path`, one row per order line.
///
/// # Errors
///
/// Returns any errors from building or saving the workbook.
pub fn write_orders(orders: &[&OrderRecord], path: impl AsRef<Path>) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.serialize_headers(0, 0, &ExportRow::default())?;
    for order in orders {
        sheet.serialize(&ExportRow::from(*order))?;
    }
    workbook.save(path.as_ref())?;
    info!(path = %path.as_ref().display(), rows = orders.len(), "wrote order export");
    Ok(())
}
