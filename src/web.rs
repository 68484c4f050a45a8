//! Normalization of WEB-channel monthly exports.
//!
//! The WEB export has no reliable header names, so columns are taken by
//! position. Each step below runs over the whole batch in file order, because
//! the refund-date backfill and the gift flag depend on neighbouring rows.

use csv::StringRecord;
use tracing::debug;

use std::{collections::HashSet, str::FromStr};

use crate::{
    brand::brand_for,
    extract::{cell, parse_int, Extract},
    ledger::OrderRecord,
    period::YearMonth,
    yen::Yen,
};

/// Product code every shipping-fee line is filed under.
pub const SHIPPING_FEE_CODE: &str = "979900010199";

/// Gift-wrapping items; an order containing any of them is a gift order.
pub const GIFT_ITEM_CODES: [&str; 3] = ["909900220199", "909900250199", "699900030199"];

const SHIPPING_FEE_NAMES: [&str; 2] = ["shipping fee", "送料"];
const RIBBON_MARKERS: [&str; 2] = ["ribbon", "リボン"];
const CODE_WIDTH: usize = 12;

const ORDER_DATE: usize = 0;
const ORDER_NO: usize = 1;
const AGE: usize = 4;
const GENDER: usize = 5;
const PRODUCT_CODE: usize = 6;
const PRODUCT_NAME: usize = 7;
const COLOR: usize = 8;
const SIZE: usize = 9;
const PRE_TAX: usize = 10;
const TAX_INCLUSIVE: usize = 11;
const RESIDENCE: usize = 12;
const PAYMENT: usize = 13;
const GIFT_TEXT: usize = 14;

/// A WEB export line after column selection and type coercion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebRow {
    pub order_no: String,
    pub order_date: Option<i64>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub product_code: Option<String>,
    pub product_name: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub pre_tax: Option<Yen>,
    pub tax_inclusive: Option<Yen>,
    pub residence: Option<String>,
    pub payment_method: Option<String>,
    pub gift_text: Option<String>,
}

impl WebRow {
    /// Selects and coerces the fixed columns of `row`, or returns `None` if
    /// the order number or order date cell is blank. Cells past `width` are
    /// treated as absent.
    fn select(row: &StringRecord, width: usize) -> Option<Self> {
        let get = |i: usize| if i < width { cell(row, i) } else { None };
        let text = |i: usize| get(i).map(str::to_string);

        let order_no = get(ORDER_NO)?.to_string();
        let raw_date = get(ORDER_DATE)?;
        let product_code = get(PRODUCT_CODE).map(|code| format!("{code:0>width$}", width = CODE_WIDTH));
        let product_name = text(PRODUCT_NAME);
        let product_code = if product_name
            .as_deref()
            .is_some_and(|name| SHIPPING_FEE_NAMES.contains(&name))
        {
            Some(SHIPPING_FEE_CODE.to_string())
        } else {
            product_code
        };

        Some(Self {
            order_no,
            order_date: parse_int(raw_date),
            age: get(AGE).and_then(parse_int),
            gender: text(GENDER),
            product_code,
            product_name,
            color: text(COLOR),
            size: text(SIZE),
            pre_tax: get(PRE_TAX).and_then(|s| Yen::from_str(s).ok()),
            tax_inclusive: get(TAX_INCLUSIVE).and_then(|s| Yen::from_str(s).ok()),
            residence: text(RESIDENCE),
            payment_method: text(PAYMENT),
            gift_text: text(GIFT_TEXT),
        })
    }

    fn is_refund(&self) -> bool {
        self.tax_inclusive.is_some_and(Yen::is_negative)
    }
}

/// Gives refund lines the date of the sale they belong to.
///
/// Refund lines (negative tax-inclusive amount) are exported with a blank or
/// wrong date. Scanning in file order, each refund takes the order date of
/// the most recent non-negative line; a refund with no such line before it
/// keeps its own date. Lines with no amount neither donate nor receive a
/// date.
pub fn backfill_refund_dates(rows: &mut [WebRow]) {
    let mut last_sale_date = None;
    for row in rows {
        match row.tax_inclusive {
            Some(amount) if amount.is_negative() => {
                if let Some(date) = last_sale_date {
                    row.order_date = Some(date);
                }
            }
            Some(_) => last_sale_date = row.order_date,
            None => {}
        }
    }
}

/// Returns the order numbers of every order containing a gift-wrapping item.
fn gift_orders(rows: &[WebRow]) -> HashSet<&str> {
    rows.iter()
        .filter(|r| {
            r.product_code
                .as_deref()
                .is_some_and(|code| GIFT_ITEM_CODES.contains(&code))
        })
        .map(|r| r.order_no.as_str())
        .collect()
}

fn has_ribbon(gift_text: Option<&str>) -> bool {
    gift_text.is_some_and(|text| RIBBON_MARKERS.iter().any(|m| text.contains(m)))
}

/// Normalizes a WEB export for `period` into ledger records.
///
/// Rows without an order number or order date are dropped, as are rows whose
/// date could not be read or backfilled, so every returned record has both.
/// The result still has to be reconciled against the ledger.
#[must_use]
pub fn normalize(extract: &Extract, period: YearMonth) -> Vec<OrderRecord> {
    let width = extract.width();
    let mut rows: Vec<WebRow> = extract
        .rows()
        .filter_map(|row| WebRow::select(row, width))
        .collect();
    backfill_refund_dates(&mut rows);

    let gift_orders = gift_orders(&rows);
    let records: Vec<OrderRecord> = rows
        .iter()
        .filter_map(|row| {
            let order_date = row.order_date?;
            let gift = gift_orders.contains(row.order_no.as_str())
                || has_ribbon(row.gift_text.as_deref());
            Some(OrderRecord {
                order_no: Some(row.order_no.clone()),
                order_date: Some(order_date),
                age: row.age,
                gender: row.gender.clone(),
                product_code: row.product_code.clone(),
                product_name: row.product_name.clone(),
                color: row.color.clone(),
                size: row.size.clone(),
                pre_tax_amount: row.pre_tax,
                tax_inclusive_amount: row.tax_inclusive,
                residence: row.residence.clone(),
                payment_method: row.payment_method.clone(),
                year: period.year(),
                month: period.month(),
                quantity: if row.is_refund() { -1 } else { 1 },
                gift: Some(u8::from(gift)),
                brand: brand_for(row.product_code.as_deref().unwrap_or_default()).to_string(),
            })
        })
        .collect();
    debug!(
        source = extract.source(),
        read = extract.rows().count(),
        kept = records.len(),
        "normalized WEB export"
    );
    records
}
