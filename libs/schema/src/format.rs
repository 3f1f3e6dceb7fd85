//! Format grammars for string-backed kinds and schema names
//!
//! The patterns are compiled once on first use.

use once_cell::sync::Lazy;
use regex::Regex;

/// Integer strings: optional minus sign and at most 100 digits
pub const INTEGER_FORMAT: &str = r"^-?[0-9]{1,100}$";

/// Decimal strings: at most 50 digits on either side of the point and an
/// optional exponent of at most 2 digits
pub const DECIMAL_FORMAT: &str = r"^-?[0-9]{1,50}(\.[0-9]{1,50})?([eE][-+]?[0-9]{1,2})?$";

/// Module, object type, field and enum names
pub const NAME_FORMAT: &str = r"^[a-zA-Z_][a-zA-Z0-9_]{0,63}$";

static INTEGER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(INTEGER_FORMAT).expect("integer format is a valid regex"));
static DECIMAL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(DECIMAL_FORMAT).expect("decimal format is a valid regex"));
static NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(NAME_FORMAT).expect("name format is a valid regex"));

pub fn is_integer(s: &str) -> bool {
    INTEGER_REGEX.is_match(s)
}

pub fn is_decimal(s: &str) -> bool {
    DECIMAL_REGEX.is_match(s)
}

pub fn is_valid_name(s: &str) -> bool {
    NAME_REGEX.is_match(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_format() {
        assert!(is_integer("0"));
        assert!(is_integer("-123"));
        assert!(is_integer("007"));
        assert!(is_integer(&"9".repeat(100)));

        assert!(!is_integer(&"9".repeat(101)));
        assert!(!is_integer(""));
        assert!(!is_integer("-"));
        assert!(!is_integer("+1"));
        assert!(!is_integer("1.0"));
        assert!(!is_integer(" 1"));
    }

    #[test]
    fn test_decimal_format() {
        for ok in ["0", "-1.5", "1e6", "1.25E-07", "00.10", "3e+2"] {
            assert!(is_decimal(ok), "{ok} should match");
        }
        for bad in ["", ".5", "1.", "1e", "1e123", "1.2.3", "NaN", "1,5"] {
            assert!(!is_decimal(bad), "{bad} should not match");
        }
        assert!(is_decimal(&format!("{}.{}", "1".repeat(50), "2".repeat(50))));
        assert!(!is_decimal(&"1".repeat(51)));
    }

    #[test]
    fn test_name_format() {
        assert!(is_valid_name("bank"));
        assert!(is_valid_name("_balances2"));
        assert!(is_valid_name(&"a".repeat(64)));
        assert!(!is_valid_name(&"a".repeat(65)));
        assert!(!is_valid_name("2fa"));
        assert!(!is_valid_name("with-dash"));
        assert!(!is_valid_name(""));
    }
}
