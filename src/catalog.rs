//! The product-master catalog, persisted in SQLite.

use rusqlite::{params, Connection, Row};
use serde::Serialize;
use tracing::{debug, warn};

use std::path::Path;

use crate::{error::Result, yen::Yen};

/// One (product code, color number) entry of the product master.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductRecord {
    pub product_name: Option<String>,
    pub product_code: Option<String>,
    pub color_no: Option<String>,
    pub color_name: Option<String>,
    pub size_count: Option<i64>,
    pub price: Option<Yen>,
    pub leather_type: String,
    pub brand: String,
}

impl ProductRecord {
    /// Returns the key ledger codes are matched against: the product code,
    /// a literal `0`, then the color number.
    ///
    /// Ledger codes are cut to 10 characters before matching, so product
    /// `71001234` in color `5` matches ledger code `7100123405...`.
    #[must_use]
    pub fn join_key(&self) -> String {
        format!(
            "{}0{}",
            self.product_code.as_deref().unwrap_or_default(),
            self.color_no.as_deref().unwrap_or_default()
        )
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            product_name: row.get("product_name")?,
            product_code: row.get("product_code")?,
            color_no: row.get("color_no")?,
            color_name: row.get("color_name")?,
            size_count: row.get("size_count")?,
            price: row.get::<_, Option<i64>>("price")?.map(Yen::new),
            leather_type: row.get("leather_type")?,
            brand: row.get("brand")?,
        })
    }
}

/// A pre-tax price to set on every product whose code starts with
/// `code_prefix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceUpdate {
    pub code_prefix: String,
    pub price: Yen,
}

/// The product catalog backed by one SQLite database file.
pub struct Catalog {
    conn: Connection,
}

impl Catalog {
    /// Opens (creating if necessary) the catalog database at `path`.
    ///
    /// # Errors
    ///
    /// Returns any errors from opening the database or creating the table.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS products (
                product_name TEXT,
                product_code TEXT NOT NULL,
                color_no TEXT NOT NULL,
                color_name TEXT,
                size_count INTEGER,
                price INTEGER,
                leather_type TEXT NOT NULL,
                brand TEXT NOT NULL,
                PRIMARY KEY (product_code, color_no)
            )",
            [],
        )?;
        Ok(Self { conn })
    }

    /// Reads every product, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns any errors from querying the database.
    pub fn read_all(&self) -> Result<Vec<ProductRecord>> {
        let mut stmt = self.conn.prepare("SELECT * FROM products ORDER BY rowid")?;
        let products = stmt
            .query_map([], ProductRecord::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(products)
    }

    /// Inserts each product, or overwrites every field but the price of the
    /// product already stored under the same code and color number.
    ///
    /// A row that cannot be written is logged and skipped. Returns the number
    /// of rows written.
    ///
    /// # Errors
    ///
    /// Returns any errors from starting or committing the transaction.
    pub fn upsert(&mut self, products: &[ProductRecord]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut written = 0;
        for product in products {
            match upsert_product(&tx, product) {
                Ok(()) => written += 1,
                Err(e) => warn!(
                    product_code = product.product_code.as_deref().unwrap_or_default(),
                    color_no = product.color_no.as_deref().unwrap_or_default(),
                    "skipping product: {e}"
                ),
            }
        }
        tx.commit()?;
        debug!(offered = products.len(), written, "upserted products");
        Ok(written)
    }

    /// Applies `updates` in order, in a single transaction, and returns how
    /// many product rows were touched in total.
    ///
    /// # Errors
    ///
    /// Returns any errors from writing; nothing is committed in that case.
    pub fn apply_prices(&mut self, updates: &[PriceUpdate]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut touched = 0;
        for update in updates {
            touched += tx.execute(
                "UPDATE products SET price = ?1 WHERE substr(product_code, 1, 8) = ?2",
                params![update.price.amount(), update.code_prefix],
            )?;
        }
        tx.commit()?;
        debug!(updates = updates.len(), touched, "applied price feed");
        Ok(touched)
    }
}

fn upsert_product(conn: &Connection, p: &ProductRecord) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO products (
            product_name, product_code, color_no, color_name, size_count,
            leather_type, brand
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT (product_code, color_no) DO UPDATE SET
            product_name = excluded.product_name,
            color_name = excluded.color_name,
            size_count = excluded.size_count,
            leather_type = excluded.leather_type,
            brand = excluded.brand",
        params![
            p.product_name,
            p.product_code,
            p.color_no,
            p.color_name,
            p.size_count,
            p.leather_type,
            p.brand,
        ],
    )?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn product(code: &str, color_no: &str, name: &str) -> ProductRecord {
        ProductRecord {
            product_name: Some(name.to_string()),
            product_code: Some(code.to_string()),
            color_no: Some(color_no.to_string()),
            color_name: Some("BLACK".to_string()),
            size_count: Some(1),
            price: None,
            leather_type: "other".to_string(),
            brand: "BEORMA".to_string(),
        }
    }

    #[test]
    fn join_key_fn_inserts_a_literal_zero() {
        assert_eq!(product("71001234", "5", "BAG").join_key(), "7100123405");
    }

    #[test]
    fn upsert_fn_overwrites_everything_but_price() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = Catalog::open(dir.path().join("products.db")).unwrap();
        catalog.upsert(&[product("71001234", "1", "BAG")]).unwrap();
        catalog
            .apply_prices(&[PriceUpdate {
                code_prefix: "71001234".to_string(),
                price: Yen::new(10000),
            }])
            .unwrap();

        let mut renamed = product("71001234", "1", "BAG BRI");
        renamed.leather_type = "BRI".to_string();
        renamed.price = Some(Yen::new(1));
        assert_eq!(catalog.upsert(&[renamed]).unwrap(), 1);

        let stored = catalog.read_all().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].product_name.as_deref(), Some("BAG BRI"));
        assert_eq!(stored[0].leather_type, "BRI");
        assert_eq!(stored[0].price, Some(Yen::new(10000)));
    }

    #[test]
    fn upsert_fn_skips_rows_that_cannot_be_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = Catalog::open(dir.path().join("products.db")).unwrap();
        let mut nameless = product("x", "1", "BAG");
        nameless.product_code = None;
        let written = catalog
            .upsert(&[product("71001234", "1", "BAG"), nameless])
            .unwrap();
        assert_eq!(written, 1);
        assert_eq!(catalog.read_all().unwrap().len(), 1);
    }

    #[test]
    fn apply_prices_fn_updates_every_color_sharing_the_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = Catalog::open(dir.path().join("products.db")).unwrap();
        catalog
            .upsert(&[
                product("71001234", "1", "BAG"),
                product("71001234", "2", "BAG"),
                product("71009999", "1", "CASE"),
            ])
            .unwrap();
        let touched = catalog
            .apply_prices(&[PriceUpdate {
                code_prefix: "71001234".to_string(),
                price: Yen::new(10000),
            }])
            .unwrap();
        assert_eq!(touched, 2);
        let prices: Vec<_> = catalog
            .read_all()
            .unwrap()
            .into_iter()
            .map(|p| p.price)
            .collect();
        assert_eq!(prices, vec![Some(Yen::new(10000)), Some(Yen::new(10000)), None]);
    }
}
