use calamine::{open_workbook_auto, Reader};
use csv::StringRecord;
use encoding_rs::{SHIFT_JIS, UTF_8};
use encoding_rs_io::DecodeReaderBytesBuilder;
use serde::de::DeserializeOwned;

use std::{
    io::{Cursor, Read},
    path::Path,
};

use crate::error::{Error, Result};

/// File extensions read as spreadsheets; anything else is read as CSV.
pub const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// A column the source system names in its header row, together with the
/// English alias accepted in hand-prepared files.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub alias: &'static str,
}

/// An export read as raw text cells, from either a CSV file or the first
/// sheet of a workbook.
///
/// Header names are trimmed (and any byte-order mark removed) so that
/// columns can be found by name; data cells are kept as they are.
#[derive(Debug)]
pub struct Extract {
    source: String,
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl Extract {
    /// Reads the export at `path`, as a workbook if its extension is one of
    /// [`WORKBOOK_EXTENSIONS`] and as CSV otherwise.
    ///
    /// # Errors
    ///
    /// Returns any errors from opening or parsing the file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = path.display().to_string();
        let is_workbook = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                WORKBOOK_EXTENSIONS
                    .iter()
                    .any(|w| w.eq_ignore_ascii_case(ext))
            });
        if is_workbook {
            return Self::from_workbook(source, path);
        }
        let file = std::fs::File::open(path)?;
        Self::from_reader(&source, file)
    }

    /// Reads a CSV export from any reader; `source` names it in error
    /// messages.
    ///
    /// Text with a byte-order mark is decoded accordingly, valid UTF-8 is
    /// taken as it is, and anything else is decoded as Shift_JIS (the
    /// Windows code page 932 the vendor systems export in).
    ///
    /// # Errors
    ///
    /// Returns any errors from reading or parsing the data.
    pub fn from_reader(source: &str, mut rdr: impl Read) -> Result<Self> {
        let mut bytes = Vec::new();
        rdr.read_to_end(&mut bytes)?;
        let fallback = if std::str::from_utf8(&bytes).is_ok() {
            UTF_8
        } else {
            SHIFT_JIS
        };
        let decoded = DecodeReaderBytesBuilder::new()
            .encoding(Some(fallback))
            .bom_override(true)
            .build(Cursor::new(bytes));
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(decoded);
        let headers = rdr.headers().map_err(|e| Error::csv(source, e))?.clone();
        let rows = rdr
            .records()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::csv(source, e))?;
        Ok(Self::new(source.to_string(), &headers, rows))
    }

    /// Reads the first sheet of a workbook; its first row is the header.
    fn from_workbook(source: String, path: &Path) -> Result<Self> {
        let mut workbook = open_workbook_auto(path).map_err(|e| Error::workbook(&source, e))?;
        let range = match workbook.worksheet_range_at(0) {
            Some(range) => range.map_err(|e| Error::workbook(&source, e))?,
            None => return Err(Error::EmptyWorkbook(source)),
        };
        let mut rows = range
            .rows()
            .map(|row| row.iter().map(ToString::to_string).collect::<StringRecord>());
        let headers = rows.next().unwrap_or_default();
        let rows = rows.collect();
        Ok(Self::new(source, &headers, rows))
    }

    fn new(source: String, headers: &StringRecord, rows: Vec<StringRecord>) -> Self {
        let headers = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim())
            .collect();
        Self {
            source,
            headers,
            rows,
        }
    }

    /// Names the file (or reader) this extract came from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the number of columns in the header row.
    #[must_use]
    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn rows(&self) -> impl Iterator<Item = &StringRecord> {
        self.rows.iter()
    }

    /// Checks that every one of `columns` is present, by name or alias.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingColumns`] listing every absent column.
    pub fn require(&self, columns: &[Column]) -> Result<()> {
        let missing: Vec<String> = columns
            .iter()
            .filter(|c| !self.headers.iter().any(|h| h == c.name || h == c.alias))
            .map(|c| c.name.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingColumns {
                file: self.source.clone(),
                missing,
            })
        }
    }

    /// Deserializes every row into `T` using the header names.
    ///
    /// # Errors
    ///
    /// Returns any errors from deserializing a row.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.rows
            .iter()
            .map(|row| {
                row.deserialize(Some(&self.headers))
                    .map_err(|e| Error::csv(&self.source, e))
            })
            .collect()
    }
}

/// Returns the cell at `index`, or `None` if the row is short or the cell is
/// blank.
#[must_use]
pub fn cell(row: &StringRecord, index: usize) -> Option<&str> {
    row.get(index).map(str::trim).filter(|s| !s.is_empty())
}

/// Parses a numeric cell, tolerating thousands separators.
#[must_use]
pub fn parse_number(s: &str) -> Option<f64> {
    s.trim()
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// Parses a cell holding a whole number, such as `20240501` or `20240501.0`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn parse_int(s: &str) -> Option<i64> {
    parse_number(s)
        .filter(|n| n.fract() == 0.0)
        .map(|n| n as i64)
}

/// Parses a numeric cell, truncating any fraction and substituting zero for
/// anything unreadable.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn int_or_zero(s: Option<&str>) -> i64 {
    s.and_then(parse_number).map_or(0, |n| n.trunc() as i64)
}

/// Returns at most the first `n` characters of `s`.
#[must_use]
pub fn prefix(s: &str, n: usize) -> &str {
    s.char_indices().nth(n).map_or(s, |(i, _)| &s[..i])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Row {
        #[serde(rename = "商品名", alias = "Product Name")]
        name: Option<String>,
        #[serde(rename = "売上数", alias = "Units Sold")]
        qty: Option<String>,
    }

    #[test]
    fn from_path_fn_reads_headers_and_rows() {
        let extract = Extract::from_path("testdata/2024年5月_web.csv").unwrap();
        assert_eq!(extract.width(), 15);
        assert_eq!(extract.rows().count(), 8);
    }

    #[test]
    fn from_path_fn_decodes_shift_jis_exports() {
        let extract = Extract::from_path("testdata/price_feed_sjis.csv").unwrap();
        assert_eq!(extract.headers.get(0), Some("商品コード"));
        let first = extract.rows().next().unwrap();
        assert_eq!(first.get(2), Some("11,000"));
        let pending = extract.rows().nth(1).unwrap();
        assert_eq!(pending.get(2), Some("未定"));
    }

    #[test]
    fn from_reader_fn_keeps_utf8_with_or_without_a_bom() {
        for text in ["商品名\nバッグ\n", "\u{feff}商品名\nバッグ\n"] {
            let extract = Extract::from_reader("inline", text.as_bytes()).unwrap();
            assert_eq!(extract.headers.get(0), Some("商品名"));
            assert_eq!(extract.rows().next().unwrap().get(0), Some("バッグ"));
        }
    }

    #[test]
    fn from_path_fn_reads_the_first_sheet_of_a_workbook() {
        let extract = Extract::from_path("testdata/product_master.xlsx").unwrap();
        assert_eq!(extract.width(), 5);
        assert_eq!(extract.headers.get(1), Some("品番CD"));
        let rows: Vec<_> = extract.rows().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get(0), Some("LONDON WALLET"));
        assert_eq!(rows[0].get(1), Some("71001234"));
        assert_eq!(rows[1].get(2), Some("2"));
        assert_eq!(cell(rows[2], 4), None);
    }

    #[test]
    fn require_fn_lists_missing_columns() {
        let extract = Extract::from_reader("inline", "商品名,Color\nA,red\n".as_bytes()).unwrap();
        let err = extract
            .require(&[
                Column {
                    name: "商品名",
                    alias: "Product Name",
                },
                Column {
                    name: "売上数",
                    alias: "Units Sold",
                },
            ])
            .unwrap_err();
        match err {
            Error::MissingColumns { missing, .. } => assert_eq!(missing, vec!["売上数"]),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn deserialize_fn_accepts_aliases_and_blank_cells() {
        let extract =
            Extract::from_reader("inline", "\u{feff}Product Name , Units Sold\nBAG,\n".as_bytes())
                .unwrap();
        let rows: Vec<Row> = extract.deserialize().unwrap();
        assert_eq!(rows[0].name.as_deref(), Some("BAG"));
        assert_eq!(rows[0].qty, None);
    }

    #[test]
    fn cell_fn_treats_blank_and_missing_cells_alike() {
        let row = StringRecord::from(vec!["a", " ", "c"]);
        assert_eq!(cell(&row, 0), Some("a"));
        assert_eq!(cell(&row, 1), None);
        assert_eq!(cell(&row, 7), None);
    }

    #[test]
    fn numeric_coercion_fns_never_fail() {
        assert_eq!(parse_int("20240501.0"), Some(20_240_501));
        assert_eq!(parse_int("2024/05/01"), None);
        assert_eq!(parse_int("12.5"), None);
        assert_eq!(int_or_zero(Some("1,500")), 1500);
        assert_eq!(int_or_zero(Some("2.9")), 2);
        assert_eq!(int_or_zero(Some("n/a")), 0);
        assert_eq!(int_or_zero(None), 0);
    }

    #[test]
    fn prefix_fn_counts_characters() {
        assert_eq!(prefix("710012345678", 8), "71001234");
        assert_eq!(prefix("7100", 8), "7100");
        assert_eq!(prefix("品番コード", 2), "品番");
    }
}
