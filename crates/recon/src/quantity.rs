// Quantity coercion for comparison.
//
// Quantities stay strings in canonical tables; they are only turned into
// numbers here, when two sides are compared.

use regex::Regex;

#[derive(Debug, Clone)]
pub struct QuantityParser {
    number: Regex,
}

impl QuantityParser {
    pub fn new() -> Self {
        Self {
            number: Regex::new(r"[-+]?[0-9]*\.?[0-9]+").expect("quantity pattern"),
        }
    }

    /// Lowercase, turn `,` into `.`, take the first signed decimal run.
    ///
    /// `"1250kg"` → `1250.0`; `"1.250,5"` → `"1.250.5"` → `1.25`;
    /// `"n/a"` → `None`. An absent number is not zero.
    pub fn parse(&self, raw: &str) -> Option<f64> {
        let cleaned = raw.to_lowercase().replace(',', ".");
        let m = self.number.find(&cleaned)?;
        m.as_str().parse::<f64>().ok()
    }
}

impl Default for QuantityParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a difference: integral values without decimals, others as the
/// shortest decimal after rounding away float noise. A non-zero delta never
/// renders as `0`.
pub fn format_difference(delta: f64) -> String {
    let rounded = (delta * 1e9).round() / 1e9;
    if rounded == 0.0 && delta != 0.0 {
        return format!("{delta}");
    }
    if rounded.fract() == 0.0 && rounded.abs() < 1e15 {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_integers() {
        let p = QuantityParser::new();
        assert_eq!(p.parse("10"), Some(10.0));
        assert_eq!(p.parse(" 8 "), Some(8.0));
        assert_eq!(p.parse("-3"), Some(-3.0));
    }

    #[test]
    fn units_are_ignored() {
        let p = QuantityParser::new();
        assert_eq!(p.parse("1250kg"), Some(1250.0));
        assert_eq!(p.parse("800 KG"), Some(800.0));
        assert_eq!(p.parse("aprox. 12 un"), Some(12.0));
    }

    #[test]
    fn decimal_comma() {
        let p = QuantityParser::new();
        assert_eq!(p.parse("2,5"), Some(2.5));
        assert_eq!(p.parse(",5"), Some(0.5));
    }

    #[test]
    fn thousands_separator_takes_first_run() {
        // "1.250,5" -> "1.250.5": the first run is "1.250", read as 1.25.
        let p = QuantityParser::new();
        assert_eq!(p.parse("1.250,5"), Some(1.25));
        assert_eq!(p.parse("1.250"), Some(1.25));
    }

    #[test]
    fn no_number() {
        let p = QuantityParser::new();
        assert_eq!(p.parse(""), None);
        assert_eq!(p.parse("n/a"), None);
        assert_eq!(p.parse("-"), None);
    }

    #[test]
    fn difference_rendering() {
        assert_eq!(format_difference(-2.0), "-2");
        assert_eq!(format_difference(0.0), "0");
        assert_eq!(format_difference(2.5), "2.5");
        assert_eq!(format_difference(8.0 - 10.1), "-2.1");
    }

    #[test]
    fn tiny_difference_is_not_zero() {
        let p = QuantityParser::new();
        let delta = p.parse("1.0000001").unwrap() - p.parse("1").unwrap();
        assert_ne!(format_difference(delta), "0");
        assert_eq!(format_difference(1e-7), "0.0000001");
        assert_eq!(format_difference(-0.0000025), "-0.0000025");
    }

    #[test]
    fn only_ascii_digits_count() {
        let p = QuantityParser::new();
        // Arabic-Indic and full-width digits are not quantities.
        assert_eq!(p.parse("\u{0663}"), None);
        assert_eq!(p.parse("\u{FF15}"), None);
        assert_eq!(p.parse("\u{0663} 7"), Some(7.0));
    }
}
