//! Normalization of product-master extracts and price feeds.

use serde::Deserialize;
use tracing::{debug, warn};

use std::str::FromStr;

use crate::{
    brand::brand_for,
    catalog::{PriceUpdate, ProductRecord},
    error::Result,
    extract::{parse_int, prefix, Column, Extract},
    leather::leather_type,
    tax::pre_tax_at_current_rate,
    yen::Yen,
};

/// Columns a product-master extract must have.
pub const MASTER_COLUMNS: [Column; 5] = [
    Column {
        name: "商品名",
        alias: "Product Name",
    },
    Column {
        name: "品番CD",
        alias: "Product Code",
    },
    Column {
        name: "カラーNO",
        alias: "Color No",
    },
    Column {
        name: "カラー名",
        alias: "Color Name",
    },
    Column {
        name: "サイズ数計",
        alias: "Size Count",
    },
];

/// Columns a price feed must have.
pub const PRICE_COLUMNS: [Column; 2] = [
    Column {
        name: "商品コード",
        alias: "Item Code",
    },
    Column {
        name: "通常価格",
        alias: "Regular Price",
    },
];

/// Price-feed codes are matched on this many leading characters.
pub const PRICE_PREFIX_LEN: usize = 8;

/// Defines the product-master extract format.
#[derive(Debug, Deserialize)]
struct MasterRow {
    #[serde(rename = "商品名", alias = "Product Name")]
    product_name: Option<String>,
    #[serde(rename = "品番CD", alias = "Product Code")]
    product_code: Option<String>,
    #[serde(rename = "カラーNO", alias = "Color No")]
    color_no: Option<String>,
    #[serde(rename = "カラー名", alias = "Color Name")]
    color_name: Option<String>,
    #[serde(rename = "サイズ数計", alias = "Size Count")]
    size_count: Option<String>,
}

/// Defines the price feed format.
#[derive(Debug, Deserialize)]
struct PriceRow {
    #[serde(rename = "商品コード", alias = "Item Code")]
    item_code: Option<String>,
    #[serde(rename = "通常価格", alias = "Regular Price")]
    regular_price: Option<String>,
}

fn trimmed(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Normalizes a product-master extract, deriving leather type and brand.
///
/// Prices are left unset; they only ever come from the price feed.
///
/// # Errors
///
/// Returns [`crate::Error::MissingColumns`] if any of [`MASTER_COLUMNS`] is
/// absent, or any error from reading a row.
pub fn normalize_master(extract: &Extract) -> Result<Vec<ProductRecord>> {
    extract.require(&MASTER_COLUMNS)?;
    let rows: Vec<MasterRow> = extract.deserialize()?;
    let products: Vec<ProductRecord> = rows
        .into_iter()
        .map(|row| {
            let product_name = trimmed(row.product_name);
            let product_code = trimmed(row.product_code);
            ProductRecord {
                leather_type: leather_type(product_name.as_deref()).to_string(),
                brand: brand_for(product_code.as_deref().unwrap_or_default()).to_string(),
                product_name,
                product_code,
                color_no: trimmed(row.color_no),
                color_name: trimmed(row.color_name),
                size_count: row.size_count.as_deref().and_then(parse_int),
                price: None,
            }
        })
        .collect();
    debug!(source = extract.source(), rows = products.len(), "normalized product master");
    Ok(products)
}

/// Reads a price feed into pre-tax price updates keyed on 8-character code
/// prefixes.
///
/// Feed prices include tax; they are converted back at the current rate.
/// Rows with no code, or with a price that is unreadable or too large to
/// convert, are skipped.
///
/// # Errors
///
/// Returns [`crate::Error::MissingColumns`] if any of [`PRICE_COLUMNS`] is
/// absent, or any error from reading a row.
pub fn price_updates(extract: &Extract) -> Result<Vec<PriceUpdate>> {
    extract.require(&PRICE_COLUMNS)?;
    let rows: Vec<PriceRow> = extract.deserialize()?;
    let read = rows.len();
    let updates: Vec<PriceUpdate> = rows
        .into_iter()
        .filter_map(|row| {
            let code = trimmed(row.item_code)?;
            let price = row
                .regular_price
                .as_deref()
                .and_then(|s| Yen::from_str(s).ok())
                .and_then(pre_tax_at_current_rate);
            match price {
                Some(price) => Some(PriceUpdate {
                    code_prefix: prefix(&code, PRICE_PREFIX_LEN).to_string(),
                    price,
                }),
                None => {
                    warn!(item_code = %code, "skipping price feed row without a readable price");
                    None
                }
            }
        })
        .collect();
    debug!(source = extract.source(), read, kept = updates.len(), "read price feed");
    Ok(updates)
}
