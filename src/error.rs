use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("file name {file:?} has no {expected} year/month token")]
    MissingPeriod { file: String, expected: &'static str },

    #[error("invalid year/month {0:?}: expected YYYY-MM")]
    InvalidPeriod(String),

    #[error("{file:?} is missing required columns: {}", .missing.join(", "))]
    MissingColumns { file: String, missing: Vec<String> },

    #[error("reading {file:?}: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },

    #[error("reading workbook {file:?}: {source}")]
    Workbook {
        file: String,
        #[source]
        source: calamine::Error,
    },

    #[error("workbook {0:?} has no sheets")]
    EmptyWorkbook(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("writing spreadsheet: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn csv(file: impl Into<String>, source: csv::Error) -> Self {
        Self::Csv {
            file: file.into(),
            source,
        }
    }

    pub(crate) fn workbook(file: impl Into<String>, source: calamine::Error) -> Self {
        Self::Workbook {
            file: file.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
