use crate::{period::YearMonth, yen::Yen};

/// A consumption-tax rate, in percent, in force from `from` until the next
/// change.
struct RateChange {
    from: YearMonth,
    percent: i64,
}

const SCHEDULE: [RateChange; 3] = [
    RateChange {
        from: YearMonth::new(0, 1),
        percent: 5,
    },
    RateChange {
        from: YearMonth::new(2014, 4),
        percent: 8,
    },
    RateChange {
        from: YearMonth::new(2019, 10),
        percent: 10,
    },
];

/// Returns the consumption-tax rate, in percent, for sales in `period`.
#[must_use]
pub fn rate_percent(period: YearMonth) -> i64 {
    SCHEDULE
        .iter()
        .rev()
        .find(|change| change.from <= period)
        .map_or(SCHEDULE[0].percent, |change| change.percent)
}

/// Returns the tax-inclusive amount for a `pre_tax` sale made in `period`,
/// rounded to the nearest yen (ties to even), or `None` if the amount is too
/// large to represent.
#[must_use]
pub fn tax_inclusive(pre_tax: Yen, period: YearMonth) -> Option<Yen> {
    let percent = rate_percent(period);
    let scaled = pre_tax.amount().checked_mul(100 + percent)?;
    Some(Yen::new(div_round_half_even(scaled, 100)))
}

/// Converts a tax-inclusive price back to its pre-tax amount at the
/// *current* rate, whatever era the price belongs to. Returns `None` if the
/// price is too large to convert.
#[must_use]
pub fn pre_tax_at_current_rate(tax_inclusive: Yen) -> Option<Yen> {
    let percent = SCHEDULE[SCHEDULE.len() - 1].percent;
    let scaled = tax_inclusive.amount().checked_mul(100)?;
    Some(Yen::new(div_round_half_even(scaled, 100 + percent)))
}

/// Divides `num` by a positive `den`, rounding to the nearest integer with
/// ties going to the even neighbour.
fn div_round_half_even(num: i64, den: i64) -> i64 {
    let quotient = num.div_euclid(den);
    let remainder = num.rem_euclid(den);
    match (remainder * 2).cmp(&den) {
        std::cmp::Ordering::Less => quotient,
        std::cmp::Ordering::Greater => quotient + 1,
        std::cmp::Ordering::Equal if quotient.rem_euclid(2) == 0 => quotient,
        std::cmp::Ordering::Equal => quotient + 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_changes_on_the_statutory_months() {
        assert_eq!(rate_percent(YearMonth::new(2010, 6)), 5);
        assert_eq!(rate_percent(YearMonth::new(2014, 3)), 5);
        assert_eq!(rate_percent(YearMonth::new(2014, 4)), 8);
        assert_eq!(rate_percent(YearMonth::new(2019, 9)), 8);
        assert_eq!(rate_percent(YearMonth::new(2019, 10)), 10);
        assert_eq!(rate_percent(YearMonth::new(2025, 1)), 10);
    }

    #[test]
    fn tax_inclusive_fn_applies_the_rate_for_the_month() {
        let pre_tax = Yen::new(1000);
        assert_eq!(tax_inclusive(pre_tax, YearMonth::new(2014, 3)), Some(Yen::new(1050)));
        assert_eq!(tax_inclusive(pre_tax, YearMonth::new(2014, 4)), Some(Yen::new(1080)));
        assert_eq!(tax_inclusive(pre_tax, YearMonth::new(2019, 10)), Some(Yen::new(1100)));
    }

    #[test]
    fn tax_inclusive_fn_rounds_ties_to_even() {
        let period = YearMonth::new(2020, 1);
        assert_eq!(tax_inclusive(Yen::new(15), period), Some(Yen::new(16)));
        assert_eq!(tax_inclusive(Yen::new(25), period), Some(Yen::new(28)));
        assert_eq!(tax_inclusive(Yen::new(-15), period), Some(Yen::new(-16)));
    }

    #[test]
    fn pre_tax_at_current_rate_fn_ignores_the_era() {
        assert_eq!(pre_tax_at_current_rate(Yen::new(11000)), Some(Yen::new(10000)));
        assert_eq!(pre_tax_at_current_rate(Yen::new(10800)), Some(Yen::new(9818)));
    }

    #[test]
    fn conversions_fail_rather_than_overflow() {
        let huge = Yen::new(100_000_000_000_000_000);
        assert_eq!(tax_inclusive(huge, YearMonth::new(2024, 4)), None);
        assert_eq!(pre_tax_at_current_rate(Yen::new(i64::MAX)), None);
        assert_eq!(
            tax_inclusive(Yen::new(i64::MAX / 110), YearMonth::new(2024, 4)),
            Some(Yen::new(i64::MAX / 110 * 110 / 100))
        );
    }

    #[test]
    fn div_round_half_even_fn_handles_negative_numerators() {
        assert_eq!(div_round_half_even(-150, 100), -2);
        assert_eq!(div_round_half_even(-250, 100), -2);
        assert_eq!(div_round_half_even(-149, 100), -1);
    }
}
