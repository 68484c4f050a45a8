use regex::Regex;

/// Label returned by the classifiers when no rule matches.
pub const UNCLASSIFIED: &str = "other";

/// One entry in an ordered classification table.
///
/// A rule matches when `include` matches the input and `exclude`, if any,
/// does not.
#[derive(Debug)]
pub struct Rule {
    label: &'static str,
    include: Regex,
    exclude: Option<Regex>,
}

impl Rule {
    /// Creates a rule from raw regular expressions.
    ///
    /// # Errors
    ///
    /// Returns any errors from compiling `include` or `exclude` with
    /// [`Regex::new`].
    pub fn new(
        label: &'static str,
        include: &str,
        exclude: Option<&str>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            label,
            include: Regex::new(include)?,
            exclude: exclude.map(Regex::new).transpose()?,
        })
    }

    /// A rule matching inputs equal to `label`.
    ///
    /// # Errors
    ///
    /// Never fails in practice: `label` is escaped before compiling.
    pub fn exact(label: &'static str) -> Result<Self, regex::Error> {
        Self::new(label, &format!("^{}$", regex::escape(label)), None)
    }

    /// A rule matching inputs containing `label` anywhere.
    ///
    /// # Errors
    ///
    /// Never fails in practice: `label` is escaped before compiling.
    pub fn contains(label: &'static str) -> Result<Self, regex::Error> {
        Self::new(label, &regex::escape(label), None)
    }

    /// A rule labelling inputs that start with `prefix` as `label`.
    ///
    /// # Errors
    ///
    /// Never fails in practice: `prefix` is escaped before compiling.
    pub fn prefix(prefix: &str, label: &'static str) -> Result<Self, regex::Error> {
        Self::new(label, &format!("^{}", regex::escape(prefix)), None)
    }

    #[must_use]
    pub fn is_match(&self, input: &str) -> bool {
        self.include.is_match(input) && !self.exclude.as_ref().is_some_and(|re| re.is_match(input))
    }
}

/// An ordered rule table evaluated first-match-wins.
#[derive(Debug, Default)]
pub struct Rules(Vec<Rule>);

impl Rules {
    #[must_use]
    pub fn new(rules: Vec<Rule>) -> Self {
        Self(rules)
    }

    /// Returns the label of the first rule matching `input`, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// # use sales_ledger::rules::{Rule, Rules};
    /// let rules = Rules::new(vec![
    ///     Rule::contains("NATUR/BR").unwrap(),
    ///     Rule::contains("NATUR").unwrap(),
    /// ]);
    /// assert_eq!(rules.classify("NATUR/BR TOTE"), Some("NATUR/BR"));
    /// assert_eq!(rules.classify("NATUR TOTE"), Some("NATUR"));
    /// assert_eq!(rules.classify("canvas tote"), None);
    /// ```
    #[must_use]
    pub fn classify(&self, input: &str) -> Option<&'static str> {
        self.0.iter().find(|r| r.is_match(input)).map(|r| r.label)
    }
}

impl FromIterator<Rule> for Rules {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_fn_returns_first_matching_label() {
        let rules = Rules::new(vec![
            Rule::contains("BR/RUS").unwrap(),
            Rule::contains("RUS").unwrap(),
        ]);
        assert_eq!(rules.classify("BR/RUS WALLET"), Some("BR/RUS"));
        assert_eq!(rules.classify("RUSSET WALLET"), Some("RUS"));
        assert_eq!(rules.classify("bogus product"), None);
    }

    #[test]
    fn exclude_pattern_vetoes_a_match() {
        let rule = Rule::new("LON", "^LON", Some("^LONG")).unwrap();
        assert!(rule.is_match("LONDON"));
        assert!(!rule.is_match("LONGWING"));
    }

    #[test]
    fn exact_rule_matches_whole_input_only() {
        let rule = Rule::exact("ST.JAMES").unwrap();
        assert!(rule.is_match("ST.JAMES"));
        assert!(!rule.is_match("ST.JAMES BAG"));
        assert!(!rule.is_match("STXJAMES"));
    }

    #[test]
    fn prefix_rule_labels_by_leading_characters() {
        let rule = Rule::prefix("72", "Owen Barry").unwrap();
        assert!(rule.is_match("720012345678"));
        assert!(!rule.is_match("172001234567"));
    }

    #[test]
    fn new_fn_returns_error_for_bad_regex() {
        assert!(Rule::new("bad", "(", None).is_err());
    }
}
