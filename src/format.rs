//! Brazilian real formatting.

use rust_decimal::{Decimal, RoundingStrategy};

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// Price-input mask. The raw value is read as integer cents and shown at
/// ten-centavo resolution, so `2999` renders as `"29,90"` and `123456` as
/// `"1.234,50"`.
pub fn format_cents(raw: i64) -> String {
    let sign = if raw < 0 { "-" } else { "" };
    let dimes = raw.unsigned_abs() / 10;
    let reais = dimes / 10;
    let tenths = dimes % 10;
    format!("{}{},{}0", sign, group_thousands(&reais.to_string()), tenths)
}

/// Full currency rendering, e.g. `R$ 1.234,56`.
pub fn format_brl(value: Decimal) -> String {
    let rounded = value
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .abs();
    let reais = rounded.trunc();
    let cents = ((rounded - reais) * Decimal::from(100)).trunc();
    let sign = if value.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!(
        "{}R$ {},{:02}",
        sign,
        group_thousands(&reais.to_string()),
        cents.mantissa()
    )
}

/// Percentage with two places and a comma, e.g. `66,67%`.
pub fn format_percent(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}%", rounded).replace('.', ",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(2999, "29,90")]
    #[case(0, "0,00")]
    #[case(7, "0,00")]
    #[case(150, "1,50")]
    #[case(123456, "1.234,50")]
    #[case(100000000, "1.000.000,00")]
    #[case(-2999, "-29,90")]
    fn cents_mask(#[case] raw: i64, #[case] expected: &str) {
        assert_eq!(format_cents(raw), expected);
    }

    #[rstest]
    #[case(dec!(1234.56), "R$ 1.234,56")]
    #[case(dec!(29.9), "R$ 29,90")]
    #[case(dec!(0.005), "R$ 0,01")]
    #[case(dec!(-15), "-R$ 15,00")]
    fn brl(#[case] value: Decimal, #[case] expected: &str) {
        assert_eq!(format_brl(value), expected);
    }

    #[test]
    fn percent_uses_comma() {
        assert_eq!(format_percent(dec!(66.666)), "66,67%");
    }
}
