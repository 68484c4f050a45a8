//! Leather-material classification of product names.
//!
//! Names are classified against one ordered keyword list in two passes: an
//! exact full-name match first, then a positional pass in list order where
//! each keyword matches as a substring. `LON` is looser than the rest so that
//! names like `LONDON TAN` are caught while `LONG ...` names are not.

use std::sync::OnceLock;

use crate::rules::{Rule, Rules, UNCLASSIFIED};

/// Leather type given to sample items, which reports leave out.
pub const SAMPLE: &str = "SAMPL";

const LON: &str = "LON";

const KEYWORDS: [&str; 33] = [
    SAMPLE,
    "OXFORD",
    "LON/BRI",
    "BRITISH COUNTRY",
    "SHRUNKEN",
    "SAFARI",
    "DERBY",
    "REGENT",
    LON,
    "CORDOVAN",
    "ST.JAMES",
    "GASTON",
    "HAMPSTEAD",
    "VIN BR",
    "HORWEEN/BRI",
    "BR/RUS",
    "PLAITED",
    "VTC BADALASSI",
    "BADALASSI",
    "NATUR/BR",
    "NATUR",
    "CAN/TUS",
    "TUS",
    "RUSSET",
    "PLAI",
    "FIX LEATHER",
    "WEBBNG",
    "WEBBING",
    "PASTURE SUEDE",
    "STIRRUP",
    "LEATHER BALM",
    "BR2",
    "BRI",
];

struct LeatherRules {
    exact: Rules,
    positional: Rules,
}

fn leather_rules() -> &'static LeatherRules {
    static RULES: OnceLock<LeatherRules> = OnceLock::new();
    RULES.get_or_init(|| LeatherRules {
        exact: KEYWORDS
            .iter()
            .map(|&kw| Rule::exact(kw).expect("invalid leather rule"))
            .collect(),
        positional: KEYWORDS
            .iter()
            .flat_map(|&kw| positional_rules(kw))
            .collect(),
    })
}

fn positional_rules(keyword: &'static str) -> Vec<Rule> {
    if keyword == LON {
        vec![
            Rule::new(LON, r"(?i)^LON", Some(r"(?i)^LONG")).expect("invalid LON rule"),
            Rule::new(LON, r"(?i)\bLON", Some(r"(?i)\bLONG")).expect("invalid LON rule"),
        ]
    } else {
        vec![Rule::contains(keyword).expect("invalid leather rule")]
    }
}

/// Returns the leather type for `product_name`.
///
/// A missing name, or one that matches no keyword, is [`UNCLASSIFIED`].
///
/// # Examples
///
/// ```
/// # use sales_ledger::leather::leather_type;
/// assert_eq!(leather_type(Some("LONDON FOG")), "LON");
/// assert_eq!(leather_type(Some("LONG COAT")), "other");
/// assert_eq!(leather_type(None), "other");
/// ```
#[must_use]
pub fn leather_type(product_name: Option<&str>) -> &'static str {
    let Some(name) = product_name else {
        return UNCLASSIFIED;
    };
    let rules = leather_rules();
    rules
        .exact
        .classify(name)
        .or_else(|| rules.positional.classify(name))
        .unwrap_or(UNCLASSIFIED)
}
