#![doc = include_str!("../README.md")]

pub mod actions;
pub mod brand;
pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod leather;
pub mod ledger;
pub mod master;
pub mod notify;
pub mod period;
pub mod presentation;
pub mod report;
pub mod rules;
pub mod snapshot;
pub mod store;
pub mod summary;
pub mod tax;
pub mod web;
pub mod yen;

pub use actions::Outcome;
pub use config::Config;
pub use error::{Error, Result};
pub use period::YearMonth;
pub use summary::{Channel, CodeRange, SalesSummary, SummaryQuery};
pub use yen::Yen;
