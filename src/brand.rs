use std::sync::OnceLock;

use crate::rules::{Rule, Rules, UNCLASSIFIED};

/// Product-code prefixes assigned to each brand by the source systems.
const BRANDS: [(&str, &str); 14] = [
    ("72", "Owen Barry"),
    ("52", "Crockett&Jones"),
    ("69", "PYRENEX"),
    ("01", "BARBARIAN"),
    ("71", "BEORMA"),
    ("04", "SETTLER"),
    ("10", "McROSTIE"),
    ("70", "William Lockie"),
    ("53", "PASHMINA"),
    ("30", "WHITEHOUSE COX"),
    ("08", "Anderson & Co"),
    ("68", "FILSON"),
    ("59", "CANADA GOOSE"),
    ("35", "Northern Watters Knitwear"),
];

fn brand_rules() -> &'static Rules {
    static RULES: OnceLock<Rules> = OnceLock::new();
    RULES.get_or_init(|| {
        BRANDS
            .iter()
            .map(|&(prefix, brand)| Rule::prefix(prefix, brand).expect("invalid brand rule"))
            .collect()
    })
}

/// Returns the brand for `product_code`, judged by its first two characters.
///
/// Codes with an unknown prefix, and empty codes, belong to
/// [`UNCLASSIFIED`].
///
/// # Examples
///
/// ```
/// # use sales_ledger::brand::brand_for;
/// assert_eq!(brand_for("710012345678"), "BEORMA");
/// assert_eq!(brand_for("99"), "other");
/// ```
#[must_use]
pub fn brand_for(product_code: &str) -> &'static str {
    brand_rules()
        .classify(product_code)
        .unwrap_or(UNCLASSIFIED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brand_for_fn_maps_every_known_prefix() {
        for (prefix, brand) in BRANDS {
            assert_eq!(brand_for(&format!("{prefix}0000000000")), brand);
        }
    }

    #[test]
    fn brand_for_fn_falls_back_to_other() {
        assert_eq!(brand_for(""), UNCLASSIFIED);
        assert_eq!(brand_for("7"), UNCLASSIFIED);
        assert_eq!(brand_for("979900010199"), UNCLASSIFIED);
    }

    #[test]
    fn brand_for_fn_only_looks_at_the_leading_characters() {
        assert_eq!(brand_for("017200000000"), "BARBARIAN");
    }
}
