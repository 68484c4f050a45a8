use std::path::{Path, PathBuf};

use crate::{period::YearMonth, summary::SummaryQuery};

pub const WEB_LEDGER_DB: &str = "web_orders.db";
pub const STORE_LEDGER_DB: &str = "store_orders.db";
pub const CATALOG_DB: &str = "products.db";
pub const WEB_SNAPSHOT: &str = "web_orders.csv";
pub const STORE_SNAPSHOT: &str = "store_orders.csv";
pub const CATALOG_SNAPSHOT: &str = "products.csv";

/// Where the databases, snapshots and reports live.
///
/// Databases and their CSV snapshots sit together in `data_dir`; reports
/// are written to `output_dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    data_dir: PathBuf,
    output_dir: PathBuf,
}

impl Config {
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    #[must_use]
    pub fn web_ledger(&self) -> PathBuf {
        self.data_dir.join(WEB_LEDGER_DB)
    }

    #[must_use]
    pub fn store_ledger(&self) -> PathBuf {
        self.data_dir.join(STORE_LEDGER_DB)
    }

    #[must_use]
    pub fn catalog(&self) -> PathBuf {
        self.data_dir.join(CATALOG_DB)
    }

    #[must_use]
    pub fn web_snapshot(&self) -> PathBuf {
        self.data_dir.join(WEB_SNAPSHOT)
    }

    #[must_use]
    pub fn store_snapshot(&self) -> PathBuf {
        self.data_dir.join(STORE_SNAPSHOT)
    }

    #[must_use]
    pub fn catalog_snapshot(&self) -> PathBuf {
        self.data_dir.join(CATALOG_SNAPSHOT)
    }

    /// Returns the report path for a summary, e.g.
    /// `sales_summary_2024-01_2024-05_web.xlsx`.
    #[must_use]
    pub fn summary_path(&self, query: &SummaryQuery) -> PathBuf {
        self.output_dir.join(format!(
            "sales_summary_{}_{}_{}.xlsx",
            query.from, query.to, query.channel
        ))
    }

    /// Returns the path for an order export covering `from..=to`.
    #[must_use]
    pub fn export_path(&self, from: YearMonth, to: YearMonth) -> PathBuf {
        self.output_dir.join(format!("orders_{from}_{to}.xlsx"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(".", ".")
    }
}
