use std::str::FromStr;

use crate::types::errors::KcdParseError;

/// Parses a required numeric attribute.
pub(crate) fn parse<T: FromStr>(
    element: &'static str,
    attribute: &'static str,
    value: &str,
) -> Result<T, KcdParseError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| invalid(element, attribute, value))
}

/// Parses an optional numeric attribute; absent or blank gives `None`.
pub(crate) fn parse_opt<T: FromStr>(
    element: &'static str,
    attribute: &'static str,
    value: Option<&str>,
) -> Result<Option<T>, KcdParseError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse(element, attribute, v).map(Some),
    }
}

/// Parses a hexadecimal id, with or without the `0x` prefix.
pub(crate) fn parse_hex(
    element: &'static str,
    attribute: &'static str,
    value: &str,
) -> Result<u32, KcdParseError> {
    let trimmed: &str = value.trim();
    let digits: &str = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u32::from_str_radix(digits, 16).map_err(|_| invalid(element, attribute, value))
}

pub(crate) fn invalid(element: &'static str, attribute: &'static str, value: &str) -> KcdParseError {
    KcdParseError::InvalidAttribute {
        element,
        attribute,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("Message", "id", "0x37F").unwrap(), 0x37F);
        assert_eq!(parse_hex("Message", "id", "7e8").unwrap(), 0x7E8);
        assert_eq!(parse_hex("Message", "id", " 0X18FEF100 ").unwrap(), 0x18FEF100);
        assert!(matches!(
            parse_hex("Message", "id", "0xZZ"),
            Err(KcdParseError::InvalidAttribute { element: "Message", attribute: "id", .. })
        ));
    }

    #[test]
    fn test_parse_opt() {
        assert_eq!(parse_opt::<u16>("Signal", "length", None).unwrap(), None);
        assert_eq!(parse_opt::<u16>("Signal", "length", Some(" ")).unwrap(), None);
        assert_eq!(parse_opt::<u16>("Signal", "length", Some("12")).unwrap(), Some(12));
        assert!(parse_opt::<u16>("Signal", "length", Some("-1")).is_err());
        assert_eq!(parse::<f64>("Value", "slope", "0.25").unwrap(), 0.25);
    }
}
