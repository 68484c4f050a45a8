//! The per-product monthly sales summary.
//!
//! Ledger quantities are pivoted into one column per month and joined onto
//! the product master, so every priced, non-sample product gets a row even
//! if it sold nothing in the period.

use tracing::{debug, warn};

use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    fmt::Display,
    str::FromStr,
};

use crate::{
    catalog::ProductRecord,
    error::{Error, Result},
    extract::prefix,
    leather::SAMPLE,
    ledger::OrderRecord,
    period::YearMonth,
    presentation::{self, Presentation},
    yen::Yen,
};

/// Ledger codes are cut to this many characters before joining.
pub const JOIN_CODE_LEN: usize = 10;

/// Product-code range bounds are compared on this many characters.
pub const RANGE_PREFIX_LEN: usize = 8;

/// Ledger codes missing from the catalog are only reported under this prefix.
pub const UNMATCHED_PREFIX: &str = "71";

/// Leather types that sort ahead of all others within a product family,
/// in this order.
pub const LEATHER_PRIORITY: [&str; 6] = ["BRI", "VIN BR", "NATUR", "VTC BADALASSI", "BADALASSI", "BR/RUS"];

/// Which channel ledgers a summary reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Channel {
    Web,
    Store,
    #[default]
    All,
}

impl Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Web => "web",
            Self::Store => "store",
            Self::All => "all",
        })
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "web" => Ok(Self::Web),
            "store" => Ok(Self::Store),
            "all" => Ok(Self::All),
            other => Err(format!("unknown channel {other:?}: expected web, store or all")),
        }
    }
}

/// An inclusive product-code range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeRange {
    start: String,
    end: String,
}

impl CodeRange {
    /// Returns a range from `start` to `end`, or `None` unless both are
    /// non-blank.
    #[must_use]
    pub fn new(start: &str, end: &str) -> Option<Self> {
        let (start, end) = (start.trim(), end.trim());
        (!start.is_empty() && !end.is_empty()).then(|| Self {
            start: start.to_string(),
            end: end.to_string(),
        })
    }

    /// Reports whether `code` lies within the range, comparing whole codes.
    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.start.as_str() <= code && code <= self.end.as_str()
    }

    /// Reports whether `code` lies within the range, comparing only the
    /// first [`RANGE_PREFIX_LEN`] characters of each.
    #[must_use]
    pub fn contains_prefix(&self, code: &str) -> bool {
        let code = prefix(code, RANGE_PREFIX_LEN);
        prefix(&self.start, RANGE_PREFIX_LEN) <= code && code <= prefix(&self.end, RANGE_PREFIX_LEN)
    }
}

/// What to summarize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryQuery {
    pub from: YearMonth,
    pub to: YearMonth,
    pub codes: Option<CodeRange>,
    pub channel: Channel,
}

impl SummaryQuery {
    /// Creates a query over `from..=to` for every product and both channels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPeriod`] if `from` is after `to`.
    pub fn new(from: YearMonth, to: YearMonth) -> Result<Self> {
        if from > to {
            return Err(Error::InvalidPeriod(format!("{from} is after {to}")));
        }
        Ok(Self {
            from,
            to,
            codes: None,
            channel: Channel::All,
        })
    }

    #[must_use]
    pub fn with_codes(mut self, codes: Option<CodeRange>) -> Self {
        self.codes = codes;
        self
    }

    #[must_use]
    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = channel;
        self
    }

    /// Reports whether `period` falls inside the query's months.
    #[must_use]
    pub fn covers(&self, period: YearMonth) -> bool {
        (self.from.key()..=self.to.key()).contains(&period.key())
    }
}

/// One product line of the summary.
///
/// After duplicate suppression `product_code`, `product_name` and `price`
/// are `None` on every row that repeats the line above it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryRow {
    pub product_code: Option<String>,
    pub product_name: Option<String>,
    pub color_no: Option<String>,
    pub color_name: Option<String>,
    pub size_count: Option<i64>,
    pub price: Option<Yen>,
    pub leather_type: String,
    /// Units sold per month, parallel to [`SalesSummary::months`].
    pub quantities: Vec<i64>,
    pub total: i64,
}

/// The finished summary, ready to render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalesSummary {
    /// Month labels (`YY/MM`), ascending.
    pub months: Vec<String>,
    pub rows: Vec<SummaryRow>,
    /// 10-character ledger codes under [`UNMATCHED_PREFIX`] with no catalog
    /// entry, sorted.
    pub unmatched: Vec<String>,
    pub presentation: Presentation,
}

impl SalesSummary {
    /// Returns the rendered column headings.
    #[must_use]
    pub fn headers(&self) -> Vec<String> {
        ["Product Code", "Product Name", "Color Name", "Price"]
            .into_iter()
            .map(str::to_string)
            .chain(self.months.iter().cloned())
            .chain(std::iter::once("Total Units".to_string()))
            .collect()
    }
}

/// Builds the sales summary for `query` from ledger `orders` and catalog
/// `products`.
///
/// `orders` is whatever the query's channel selects; the channel itself is
/// not consulted here.
#[must_use]
pub fn summarize(orders: &[OrderRecord], products: &[ProductRecord], query: &SummaryQuery) -> SalesSummary {
    let orders: Vec<&OrderRecord> = orders.iter().filter(|o| query.covers(o.period())).collect();
    let products: Vec<&ProductRecord> = products
        .iter()
        .filter(|p| {
            query.codes.as_ref().map_or(true, |range| {
                range.contains_prefix(p.product_code.as_deref().unwrap_or_default())
            })
        })
        .filter(|p| p.leather_type != SAMPLE && p.price.is_some())
        .collect();

    let periods: BTreeSet<YearMonth> = orders.iter().map(|o| o.period()).collect();
    let mut pivot: BTreeMap<String, BTreeMap<YearMonth, i64>> = BTreeMap::new();
    for order in &orders {
        let code = prefix(order.product_code.as_deref().unwrap_or_default(), JOIN_CODE_LEN);
        *pivot
            .entry(code.to_string())
            .or_default()
            .entry(order.period())
            .or_default() += order.quantity;
    }

    let join_keys: HashSet<String> = products.iter().map(|p| p.join_key()).collect();
    let unmatched: Vec<String> = pivot
        .keys()
        .filter(|code| code.starts_with(UNMATCHED_PREFIX) && !join_keys.contains(*code))
        .cloned()
        .collect();
    if !unmatched.is_empty() {
        warn!(codes = ?unmatched, "ledger codes missing from the product master");
    }

    let mut rows: Vec<SummaryRow> = products
        .iter()
        .map(|p| {
            let sold = pivot.get(&p.join_key());
            let quantities: Vec<i64> = periods
                .iter()
                .map(|period| sold.and_then(|s| s.get(period)).copied().unwrap_or(0))
                .collect();
            SummaryRow {
                product_code: p.product_code.clone(),
                product_name: p.product_name.clone(),
                color_no: p.color_no.clone(),
                color_name: p.color_name.clone(),
                size_count: p.size_count,
                price: p.price,
                leather_type: p.leather_type.clone(),
                total: quantities.iter().sum(),
                quantities,
            }
        })
        .collect();
    sort_rows(&mut rows);
    suppress_repeats(&mut rows);

    let months: Vec<String> = periods.iter().map(|p| p.label()).collect();
    let presentation = presentation::build(&rows, months.len());
    debug!(
        orders = orders.len(),
        products = products.len(),
        months = months.len(),
        "built sales summary"
    );
    SalesSummary {
        months,
        rows,
        unmatched,
        presentation,
    }
}

fn leather_priority(leather_type: &str) -> usize {
    LEATHER_PRIORITY
        .iter()
        .position(|&t| t == leather_type)
        .unwrap_or(LEATHER_PRIORITY.len())
}

/// Sorts by product family (first four code characters), then leather
/// priority, leather type and full product code. The sort is stable.
fn sort_rows(rows: &mut [SummaryRow]) {
    rows.sort_by_cached_key(|row| {
        let code = row.product_code.clone().unwrap_or_default();
        (
            prefix(&code, 4).to_string(),
            leather_priority(&row.leather_type),
            row.leather_type.clone(),
            code,
        )
    });
}

/// Blanks code, name and price on each row that repeats all three of the
/// row above it, as it was before blanking.
fn suppress_repeats(rows: &mut [SummaryRow]) {
    let mut previous: Option<(Option<String>, Option<String>, Option<Yen>)> = None;
    for row in rows {
        let current = (row.product_code.clone(), row.product_name.clone(), row.price);
        if previous.as_ref() == Some(&current) {
            row.product_code = None;
            row.product_name = None;
            row.price = None;
        }
        previous = Some(current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::product;

    fn sale(code: &str, period: YearMonth, quantity: i64) -> OrderRecord {
        OrderRecord {
            product_code: Some(code.to_string()),
            year: period.year(),
            month: period.month(),
            quantity,
            brand: "BEORMA".to_string(),
            ..OrderRecord::default()
        }
    }

    fn priced(code: &str, color_no: &str, name: &str, leather: &str) -> ProductRecord {
        ProductRecord {
            price: Some(Yen::new(10000)),
            leather_type: leather.to_string(),
            ..product(code, color_no, name)
        }
    }

    fn query(from: YearMonth, to: YearMonth) -> SummaryQuery {
        SummaryQuery::new(from, to).unwrap()
    }

    const JAN: YearMonth = YearMonth::new(2024, 1);
    const FEB: YearMonth = YearMonth::new(2024, 2);
    const MAR: YearMonth = YearMonth::new(2024, 3);

    #[test]
    fn summarize_fn_pivots_quantities_by_month() {
        let orders = vec![
            sale("123456789012", JAN, 2),
            sale("1234567890", FEB, -1),
        ];
        let products = vec![priced("12345678", "90", "BAG", "other")];
        // join key "12345678" + "0" + "90" is 11 characters and never matches
        let summary = summarize(&orders, &products, &query(JAN, FEB));
        assert_eq!(summary.months, vec!["24/01", "24/02"]);
        assert_eq!(summary.rows[0].quantities, vec![0, 0]);

        let products = vec![priced("12345678", "9", "BAG", "other")];
        let summary = summarize(&orders, &products, &query(JAN, FEB));
        assert_eq!(summary.rows[0].quantities, vec![0, 0]);

        let products = vec![priced("123456789", "", "BAG", "other")];
        let summary = summarize(&orders, &products, &query(JAN, FEB));
        assert_eq!(summary.rows[0].quantities, vec![2, -1]);
        assert_eq!(summary.rows[0].total, 1);
    }

    #[test]
    fn summarize_fn_keeps_unsold_products_with_zeros() {
        let orders = vec![sale("7100123401", JAN, 3)];
        let products = vec![
            priced("71001234", "1", "BAG", "other"),
            priced("71001234", "2", "BAG NAVY", "other"),
        ];
        let summary = summarize(&orders, &products, &query(JAN, JAN));
        assert_eq!(summary.rows.len(), 2);
        assert_eq!(summary.rows[0].total, 3);
        assert_eq!(summary.rows[1].quantities, vec![0]);
        assert_eq!(summary.rows[1].total, 0);
    }

    #[test]
    fn summarize_fn_filters_months_by_key() {
        let orders = vec![
            sale("7100123401", YearMonth::new(2023, 12), 5),
            sale("7100123401", JAN, 1),
            sale("7100123401", MAR, 7),
        ];
        let products = vec![priced("71001234", "1", "BAG", "other")];
        let summary = summarize(&orders, &products, &query(JAN, FEB));
        assert_eq!(summary.months, vec!["24/01"]);
        assert_eq!(summary.rows[0].total, 1);
    }

    #[test]
    fn summarize_fn_drops_samples_unpriced_and_out_of_range_products() {
        let mut unpriced = priced("71001111", "1", "CASE", "other");
        unpriced.price = None;
        let products = vec![
            priced("71001234", "1", "BAG", "other"),
            priced("71009999", "1", "SAMPL BAG", SAMPLE),
            unpriced,
            priced("72000000", "1", "WALLET", "other"),
        ];
        let q = query(JAN, JAN).with_codes(CodeRange::new("7100000000", "71009999"));
        let summary = summarize(&[], &products, &q);
        let codes: Vec<_> = summary
            .rows
            .iter()
            .map(|r| r.product_code.as_deref())
            .collect();
        assert_eq!(codes, vec![Some("71001234")]);
        assert!(summary.months.is_empty());
    }

    #[test]
    fn summarize_fn_reports_unmatched_71_codes() {
        let orders = vec![
            sale("7100123401", JAN, 1),
            sale("710077770199", JAN, 1),
            sale("710055550199", JAN, 1),
            sale("5200000201", JAN, 1),
        ];
        let products = vec![priced("71001234", "1", "BAG", "other")];
        let summary = summarize(&orders, &products, &query(JAN, JAN));
        assert_eq!(summary.unmatched, vec!["7100555501", "7100777701"]);
    }

    #[test]
    fn summarize_fn_sorts_by_family_then_leather_priority() {
        let products = vec![
            priced("71009999", "1", "Z", "other"),
            priced("71001234", "1", "A", "NATUR"),
            priced("71005555", "1", "B", "BRI"),
            priced("70001234", "1", "C", "DERBY"),
            priced("71002222", "1", "D", "BRI"),
            priced("71003333", "1", "E", "CORDOVAN"),
        ];
        let summary = summarize(&[], &products, &query(JAN, JAN));
        let names: Vec<_> = summary
            .rows
            .iter()
            .map(|r| r.product_name.as_deref().unwrap_or_default())
            .collect();
        assert_eq!(names, vec!["C", "D", "B", "A", "E", "Z"]);
    }

    #[test]
    fn summarize_fn_blanks_repeated_code_name_and_price() {
        let orders = vec![
            sale("7100123401", JAN, 1),
            sale("7100123402", JAN, 2),
            sale("7100123403", JAN, 3),
        ];
        let products = vec![
            priced("71001234", "1", "BAG", "other"),
            priced("71001234", "2", "BAG", "other"),
            priced("71001234", "3", "BAG", "other"),
        ];
        let summary = summarize(&orders, &products, &query(JAN, JAN));
        let first = &summary.rows[0];
        assert_eq!(first.product_code.as_deref(), Some("71001234"));
        assert_eq!(first.price, Some(Yen::new(10000)));
        for (row, qty) in summary.rows[1..].iter().zip([2, 3]) {
            assert_eq!(row.product_code, None);
            assert_eq!(row.product_name, None);
            assert_eq!(row.price, None);
            assert!(row.color_no.is_some());
            assert_eq!(row.quantities, vec![qty]);
        }
    }

    #[test]
    fn suppress_repeats_fn_only_blanks_consecutive_runs() {
        let mut rows = vec![
            SummaryRow {
                product_code: Some("A".to_string()),
                ..SummaryRow::default()
            },
            SummaryRow {
                product_code: Some("B".to_string()),
                ..SummaryRow::default()
            },
            SummaryRow {
                product_code: Some("A".to_string()),
                ..SummaryRow::default()
            },
        ];
        suppress_repeats(&mut rows);
        assert!(rows.iter().all(|r| r.product_code.is_some()));
    }

    #[test]
    fn channel_parses_case_insensitively() {
        assert_eq!("WEB".parse::<Channel>(), Ok(Channel::Web));
        assert_eq!("store".parse::<Channel>(), Ok(Channel::Store));
        assert_eq!(" all ".parse::<Channel>(), Ok(Channel::All));
        assert!("shop".parse::<Channel>().is_err());
    }

    #[test]
    fn code_range_needs_both_ends() {
        assert_eq!(CodeRange::new("71", ""), None);
        let range = CodeRange::new("710012340000", "71009999").unwrap();
        assert!(range.contains_prefix("7100123401"));
        assert!(range.contains_prefix("71009999"));
        assert!(!range.contains("710099990101"));
    }

    #[test]
    fn query_rejects_reversed_months() {
        assert!(SummaryQuery::new(FEB, JAN).is_err());
    }

    #[test]
    fn headers_fn_lists_month_labels_between_fixed_columns() {
        let summary = SalesSummary {
            months: vec!["24/01".to_string()],
            ..SalesSummary::default()
        };
        assert_eq!(
            summary.headers(),
            vec!["Product Code", "Product Name", "Color Name", "Price", "24/01", "Total Units"]
        );
    }
}
