//! The operations a user can invoke.
//!
//! Each action opens the databases it needs, does its work and closes them
//! again before returning. Input-shape problems (a file name without a
//! month, missing columns) are detected before any database is opened.

use tracing::info;

use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use crate::{
    catalog::{Catalog, ProductRecord},
    config::Config,
    error::Result,
    export::{select_orders, write_orders},
    extract::Extract,
    ledger::{Ledger, OrderRecord},
    master::{normalize_master, price_updates},
    notify::{Notice, Notifier},
    period::{store_period, web_period},
    report::write_summary,
    snapshot, store,
    summary::{summarize, Channel, SalesSummary, SummaryQuery},
    web,
};

/// What an action changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Order lines added to a ledger.
    Appended(usize),
    /// Product rows inserted or updated.
    Upserted(usize),
    /// Product rows given a new price.
    PricesUpdated(usize),
    /// A report was written to this path.
    Exported(PathBuf),
    /// Nothing matched; no data was written.
    NoChange,
}

impl Outcome {
    #[must_use]
    pub fn notice(&self) -> Notice {
        match self {
            Self::NoChange => Notice::Info,
            _ => Notice::Success,
        }
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Appended(n) => write!(f, "added {n} order lines"),
            Self::Upserted(n) => write!(f, "imported {n} products"),
            Self::PricesUpdated(n) => write!(f, "updated {n} product prices"),
            Self::Exported(path) => write!(f, "wrote {}", path.display()),
            Self::NoChange => write!(f, "no matching data; nothing was written"),
        }
    }
}

fn count(n: usize, outcome: fn(usize) -> Outcome) -> Outcome {
    if n == 0 {
        Outcome::NoChange
    } else {
        outcome(n)
    }
}

/// Adds the WEB export at `path` to the WEB ledger, skipping order lines
/// already there.
///
/// # Errors
///
/// Returns an error if the file name has no month, the file cannot be read,
/// or the ledger cannot be updated.
pub fn ingest_web(config: &Config, path: &Path) -> Result<Outcome> {
    let period = web_period(path)?;
    let extract = Extract::from_path(path)?;
    let records = web::normalize(&extract, period);

    let mut ledger = Ledger::open(config.web_ledger())?;
    let appended = ledger.reconcile(records)?;
    snapshot::mirror(ledger.read_all(), &config.web_snapshot());
    info!(file = %path.display(), %period, appended = appended.len(), "ingested WEB export");
    Ok(count(appended.len(), Outcome::Appended))
}

/// Appends the store export at `path` to the store ledger as it is.
///
/// # Errors
///
/// Returns an error if the file name has no month, a required column is
/// missing, the file cannot be read, or the ledger cannot be updated.
pub fn ingest_store(config: &Config, path: &Path) -> Result<Outcome> {
    let period = store_period(path)?;
    let extract = Extract::from_path(path)?;
    let records = store::normalize(&extract, period)?;

    let mut ledger = Ledger::open(config.store_ledger())?;
    let appended = ledger.append(&records)?;
    snapshot::mirror(ledger.read_all(), &config.store_snapshot());
    info!(file = %path.display(), %period, appended, "ingested store export");
    Ok(count(appended, Outcome::Appended))
}

/// Imports a product-master extract into the catalog. Prices already in
/// the catalog are kept.
///
/// # Errors
///
/// Returns an error if a required column is missing, the file cannot be
/// read, or the catalog cannot be opened.
pub fn import_master(config: &Config, path: &Path) -> Result<Outcome> {
    let extract = Extract::from_path(path)?;
    let products = normalize_master(&extract)?;

    let mut catalog = Catalog::open(config.catalog())?;
    let written = catalog.upsert(&products)?;
    snapshot::mirror(catalog.read_all(), &config.catalog_snapshot());
    info!(file = %path.display(), written, "imported product master");
    Ok(count(written, Outcome::Upserted))
}

/// Applies a price feed to the catalog.
///
/// # Errors
///
/// Returns an error if a required column is missing, the file cannot be
/// read, or the catalog cannot be updated.
pub fn import_prices(config: &Config, path: &Path) -> Result<Outcome> {
    let extract = Extract::from_path(path)?;
    let updates = price_updates(&extract)?;

    let mut catalog = Catalog::open(config.catalog())?;
    let touched = catalog.apply_prices(&updates)?;
    snapshot::mirror(catalog.read_all(), &config.catalog_snapshot());
    info!(file = %path.display(), touched, "imported price feed");
    Ok(count(touched, Outcome::PricesUpdated))
}

/// Reads a ledger for a report. A ledger that was never written reads as
/// empty and is not created.
fn stored_orders(path: &Path) -> Result<Vec<OrderRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    Ledger::open(path)?.read_all()
}

fn stored_products(path: &Path) -> Result<Vec<ProductRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    Catalog::open(path)?.read_all()
}

fn load_orders(config: &Config, channel: Channel) -> Result<Vec<OrderRecord>> {
    let mut orders = Vec::new();
    if matches!(channel, Channel::Web | Channel::All) {
        orders.extend(stored_orders(&config.web_ledger())?);
    }
    if matches!(channel, Channel::Store | Channel::All) {
        orders.extend(stored_orders(&config.store_ledger())?);
    }
    Ok(orders)
}

/// Builds the sales summary for `query` from the stored ledgers and
/// catalog.
///
/// # Errors
///
/// Returns any errors from reading the databases.
pub fn sales_summary(config: &Config, query: &SummaryQuery) -> Result<SalesSummary> {
    let orders = load_orders(config, query.channel)?;
    let products = stored_products(&config.catalog())?;
    Ok(summarize(&orders, &products, query))
}

/// Builds the sales summary for `query` and writes it to the output
/// directory.
///
/// # Errors
///
/// Returns any errors from reading the databases or writing the report.
pub fn write_sales_summary(config: &Config, query: &SummaryQuery) -> Result<Outcome> {
    let summary = sales_summary(config, query)?;
    if summary.rows.is_empty() {
        return Ok(Outcome::NoChange);
    }
    let path = config.summary_path(query);
    write_summary(&summary, &path)?;
    Ok(Outcome::Exported(path))
}

/// Exports WEB ledger lines matching `query` to the output directory. The
/// query's channel is ignored.
///
/// # Errors
///
/// Returns any errors from reading the ledger or writing the export.
pub fn export_orders(config: &Config, query: &SummaryQuery) -> Result<Outcome> {
    let orders = stored_orders(&config.web_ledger())?;
    let selected = select_orders(&orders, query);
    if selected.is_empty() {
        return Ok(Outcome::NoChange);
    }
    let path = config.export_path(query.from, query.to);
    write_orders(&selected, &path)?;
    Ok(Outcome::Exported(path))
}

/// Passes the result of an action to `notifier`, and returns it.
///
/// # Errors
///
/// Returns the action's own error, after reporting it.
pub fn notify(notifier: &mut dyn Notifier, title: &str, result: Result<Outcome>) -> Result<Outcome> {
    match &result {
        Ok(outcome) => notifier.notify(outcome.notice(), title, &outcome.to_string()),
        Err(e) => notifier.notify(Notice::Error, title, &e.to_string()),
    }
    result
}

/// How a multi-file ingestion went.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Batch {
    pub processed: usize,
    pub failed: usize,
}

fn ingest_each(
    notifier: &mut dyn Notifier,
    title: &str,
    paths: &[PathBuf],
    ingest: impl Fn(&Path) -> Result<Outcome>,
) -> Batch {
    let mut batch = Batch::default();
    for path in paths {
        let file_title = format!("{title}: {}", path.display());
        match notify(notifier, &file_title, ingest(path.as_path())) {
            Ok(_) => batch.processed += 1,
            Err(_) => batch.failed += 1,
        }
    }
    notifier.notify(
        Notice::Info,
        title,
        &format!("{} of {} files processed", batch.processed, paths.len()),
    );
    batch
}

/// Ingests each WEB export in `paths` in turn. A file that fails is
/// reported and the rest still run.
pub fn ingest_web_files(config: &Config, paths: &[PathBuf], notifier: &mut dyn Notifier) -> Batch {
    ingest_each(notifier, "WEB import", paths, |path| ingest_web(config, path))
}

/// Ingests each store export in `paths` in turn. A file that fails is
/// reported and the rest still run.
pub fn ingest_store_files(config: &Config, paths: &[PathBuf], notifier: &mut dyn Notifier) -> Batch {
    ingest_each(notifier, "Store import", paths, |path| ingest_store(config, path))
}
