// ABOUTME: Carrier detection from tracking number formats
// ABOUTME: Pure pattern rules for UPS, USPS, FedEx, and DHL numbers

use std::sync::LazyLock;

use regex::Regex;

use crate::types::Carrier;

static UPS_1Z: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^1Z[0-9A-Z]{16}$").unwrap());
static UPS_MAIL_INNOVATIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^T\d{10}$").unwrap());
static USPS_DOMESTIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^9[2-5]\d{18,20}$").unwrap());
static USPS_INTERNATIONAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2}\d{9}US$").unwrap());
static FEDEX_GROUND_96: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^96\d{20}$").unwrap());
static FEDEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{12}|\d{15}|\d{20})$").unwrap());
static DHL_EXPRESS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{10}$").unwrap());
static DHL_ECOMMERCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(JJD|JVGL)[0-9A-Z]*$").unwrap());

/// Strip whitespace and dashes and uppercase
pub fn normalize_tracking_number(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .flat_map(char::to_uppercase)
        .collect()
}

/// Infer the carrier from a tracking number. Total: anything unrecognized is
/// `Carrier::Unknown`.
pub fn detect_carrier(tracking_number: &str) -> Carrier {
    let number = normalize_tracking_number(tracking_number);

    if UPS_1Z.is_match(&number) || UPS_MAIL_INNOVATIONS.is_match(&number) {
        Carrier::Ups
    } else if USPS_DOMESTIC.is_match(&number) || USPS_INTERNATIONAL.is_match(&number) {
        Carrier::Usps
    } else if FEDEX_GROUND_96.is_match(&number) || FEDEX.is_match(&number) {
        Carrier::Fedex
    } else if DHL_EXPRESS.is_match(&number) || DHL_ECOMMERCE.is_match(&number) {
        Carrier::Dhl
    } else {
        Carrier::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ups_formats() {
        assert_eq!(detect_carrier("1Z999AA10123456784"), Carrier::Ups);
        assert_eq!(detect_carrier("1z 999 aa1 0123 456 784"), Carrier::Ups);
        assert_eq!(detect_carrier("T1234567890"), Carrier::Ups);
        assert_eq!(detect_carrier("1Z999AA1012345678"), Carrier::Unknown);
    }

    #[test]
    fn test_usps_formats() {
        assert_eq!(detect_carrier("9400111899223856927492"), Carrier::Usps);
        assert_eq!(detect_carrier("9205 5000 0000 0000 0000 00"), Carrier::Usps);
        assert_eq!(detect_carrier("93001234567890123456"), Carrier::Usps);
        assert_eq!(detect_carrier("EA123456789US"), Carrier::Usps);
    }

    #[test]
    fn test_fedex_formats() {
        assert_eq!(detect_carrier("123456789012"), Carrier::Fedex);
        assert_eq!(detect_carrier("123456789012345"), Carrier::Fedex);
        // 20 digits not starting 92-95
        assert_eq!(detect_carrier("61299995669352455464"), Carrier::Fedex);
        assert_eq!(detect_carrier("9612019059803563050071"), Carrier::Fedex);
    }

    #[test]
    fn test_dhl_formats() {
        assert_eq!(detect_carrier("1234567890"), Carrier::Dhl);
        assert_eq!(detect_carrier("JJD0099999999"), Carrier::Dhl);
        assert_eq!(detect_carrier("jvgl-0999-9999-99"), Carrier::Dhl);
    }

    #[test]
    fn test_unrecognized_is_unknown() {
        for number in ["", "   ", "ABC", "12345", "ZZ123456789CA", "1Z!"] {
            assert_eq!(detect_carrier(number), Carrier::Unknown, "{number:?}");
        }
    }

    #[test]
    fn test_detection_is_deterministic() {
        let numbers = [
            "1Z999AA10123456784",
            "9400111899223856927492",
            "123456789012",
            "JJD0099999999",
            "nonsense",
        ];
        for number in numbers {
            assert_eq!(detect_carrier(number), detect_carrier(number));
            assert_eq!(
                detect_carrier(number),
                detect_carrier(&normalize_tracking_number(number))
            );
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_tracking_number(" 1z-999 aa1 "), "1Z999AA1");
    }
}
