//! Per-channel order ledgers persisted in SQLite.
//!
//! Both channels share one `orders` schema. Text columns stay text and
//! numeric columns stay integers across reads and writes, so the
//! deduplication key renders the same way whether a record came from an
//! export or from the database.

use rusqlite::{params, Connection, Row};
use serde::Serialize;
use tracing::debug;

use std::{collections::HashSet, path::Path};

use crate::{error::Result, period::YearMonth, yen::Yen};

/// One sales-order line in a channel ledger.
///
/// Store-channel records carry no order number, order date, customer
/// details or gift flag; those fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderRecord {
    pub order_no: Option<String>,
    pub order_date: Option<i64>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub product_code: Option<String>,
    pub product_name: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub pre_tax_amount: Option<Yen>,
    pub tax_inclusive_amount: Option<Yen>,
    pub residence: Option<String>,
    pub payment_method: Option<String>,
    pub year: i32,
    pub month: u32,
    pub quantity: i64,
    pub gift: Option<u8>,
    pub brand: String,
}

/// The natural key used to recognise an already-ingested order line:
/// order number, product code and tax-inclusive amount, all as text.
pub type DedupKey = (String, String, String);

impl OrderRecord {
    #[must_use]
    pub fn period(&self) -> YearMonth {
        YearMonth::new(self.year, self.month)
    }

    #[must_use]
    pub fn dedup_key(&self) -> DedupKey {
        (
            self.order_no.clone().unwrap_or_default(),
            self.product_code.clone().unwrap_or_default(),
            self.tax_inclusive_amount
                .map(|amount| amount.to_string())
                .unwrap_or_default(),
        )
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            order_no: row.get("order_no")?,
            order_date: row.get("order_date")?,
            age: row.get("age")?,
            gender: row.get("gender")?,
            product_code: row.get("product_code")?,
            product_name: row.get("product_name")?,
            color: row.get("color")?,
            size: row.get("size")?,
            pre_tax_amount: row.get::<_, Option<i64>>("pre_tax_amount")?.map(Yen::new),
            tax_inclusive_amount: row
                .get::<_, Option<i64>>("tax_inclusive_amount")?
                .map(Yen::new),
            residence: row.get("residence")?,
            payment_method: row.get("payment_method")?,
            year: row.get("year")?,
            month: row.get("month")?,
            quantity: row.get("quantity")?,
            gift: row.get("gift")?,
            brand: row.get("brand")?,
        })
    }
}

/// Returns the candidates whose [`DedupKey`] is neither in `existing` nor
/// earlier in `candidates`, keeping their original order.
#[must_use]
pub fn unseen(candidates: Vec<OrderRecord>, existing: &[OrderRecord]) -> Vec<OrderRecord> {
    let mut seen: HashSet<DedupKey> = existing.iter().map(OrderRecord::dedup_key).collect();
    candidates
        .into_iter()
        .filter(|r| seen.insert(r.dedup_key()))
        .collect()
}

/// A channel ledger backed by one SQLite database file.
///
/// Opening creates the `orders` table if it is absent. The connection is
/// closed when the ledger is dropped.
pub struct Ledger {
    conn: Connection,
}

impl Ledger {
    /// Opens (creating if necessary) the ledger database at `path`.
    ///
    /// # Errors
    ///
    /// Returns any errors from opening the database or creating the table.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        create_table(&conn)?;
        Ok(Self { conn })
    }

    /// Reads every record, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns any errors from querying the database.
    pub fn read_all(&self) -> Result<Vec<OrderRecord>> {
        Ok(read_orders(&self.conn)?)
    }

    /// Appends `records` unconditionally in a single transaction.
    ///
    /// # Errors
    ///
    /// Returns any errors from writing; nothing is committed in that case.
    pub fn append(&mut self, records: &[OrderRecord]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        for record in records {
            insert_order(&tx, record)?;
        }
        tx.commit()?;
        debug!(rows = records.len(), "appended to ledger");
        Ok(records.len())
    }

    /// Appends the candidates not already in the ledger, and returns them.
    ///
    /// The comparison uses [`OrderRecord::dedup_key`]. Reading the existing
    /// keys and appending happen in one transaction, so either the whole
    /// unseen subset is committed or none of it is.
    ///
    /// # Errors
    ///
    /// Returns any errors from reading or writing the database.
    pub fn reconcile(&mut self, candidates: Vec<OrderRecord>) -> Result<Vec<OrderRecord>> {
        let tx = self.conn.transaction()?;
        let existing = read_orders(&tx)?;
        let offered = candidates.len();
        let fresh = unseen(candidates, &existing);
        for record in &fresh {
            insert_order(&tx, record)?;
        }
        tx.commit()?;
        debug!(offered, appended = fresh.len(), "reconciled batch against ledger");
        Ok(fresh)
    }
}

fn create_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS orders (
            order_no TEXT,
            order_date INTEGER,
            age INTEGER,
            gender TEXT,
            product_code TEXT,
            product_name TEXT,
            color TEXT,
            size TEXT,
            pre_tax_amount INTEGER,
            tax_inclusive_amount INTEGER,
            residence TEXT,
            payment_method TEXT,
            year INTEGER NOT NULL,
            month INTEGER NOT NULL,
            quantity INTEGER NOT NULL,
            gift INTEGER,
            brand TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

fn read_orders(conn: &Connection) -> rusqlite::Result<Vec<OrderRecord>> {
    let mut stmt = conn.prepare("SELECT * FROM orders ORDER BY rowid")?;
    let orders = stmt
        .query_map([], OrderRecord::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(orders)
}

fn insert_order(conn: &Connection, r: &OrderRecord) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO orders (
            order_no, order_date, age, gender, product_code, product_name,
            color, size, pre_tax_amount, tax_inclusive_amount, residence,
            payment_method, year, month, quantity, gift, brand
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            r.order_no,
            r.order_date,
            r.age,
            r.gender,
            r.product_code,
            r.product_name,
            r.color,
            r.size,
            r.pre_tax_amount.map(Yen::amount),
            r.tax_inclusive_amount.map(Yen::amount),
            r.residence,
            r.payment_method,
            r.year,
            r.month,
            r.quantity,
            r.gift,
            r.brand,
        ],
    )?;
    Ok(())
}
