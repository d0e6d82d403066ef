//! Validation and normalization of model output.
//!
//! The model is asked for pure JSON but nothing enforces that at the source,
//! so this module is permissive: only an unparsable body is an error. Every
//! field is coerced on its own, and a value that cannot be coerced becomes
//! `null` (or, for tax lines, the entry is dropped) without affecting the rest
//! of the record.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::error::{ExtractError, Result};
use crate::models::{
    Address, Amounts, ExtractionResult, Issuer, Payment, PaymentMethod, ReceiptInfo, ReceiptType,
    TaxLine,
};
use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Lazily initialized regex for numeric strings with currency or percent decoration
static NUMBER_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_number_regex() -> &'static Regex {
    NUMBER_REGEX.get_or_init(|| {
        Regex::new(
            r"^(?:[A-Za-z]{3}|[€$£¥])?\s*(?P<num>[+-]?\d(?:[\d.,' \u{a0}]*\d)?)\s*(?:%|[A-Za-z]{3}|[€$£¥])?$",
        )
        .expect("Invalid regex pattern")
    })
}

/// Characters that mark a card number as masked
const CARD_MASK_CHARS: &[char] = &['*', 'x', 'X', '•', '#', '.', '…'];

/// Separators allowed between digit groups of a printed card number
const CARD_SEPARATOR_CHARS: &[char] = &[' ', '-'];

/// Digit count of a full, unmasked card number
const CARD_NUMBER_DIGITS: std::ops::RangeInclusive<usize> = 12..=19;

/// Slice `raw` from the first `{` to the last `}` inclusive.
pub fn strip_to_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Parse and normalize raw model output into an `ExtractionResult`.
pub fn validate_response(raw: &str) -> Result<ExtractionResult> {
    if raw.trim().is_empty() {
        return Err(ExtractError::MalformedResponse(
            "model returned empty output".to_string(),
        ));
    }

    let json_text = strip_to_json_object(raw).ok_or_else(|| {
        ExtractError::MalformedResponse("no JSON object found in model output".to_string())
    })?;

    if json_text.len() != raw.trim().len() {
        debug!(
            "Stripped {} bytes of non-JSON wrapping from model output",
            raw.trim().len() - json_text.len()
        );
    }

    let value: Value = serde_json::from_str(json_text)
        .map_err(|e| ExtractError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    let root = value.as_object().ok_or_else(|| {
        ExtractError::MalformedResponse("top-level JSON value is not an object".to_string())
    })?;

    Ok(normalize(root))
}

/// Normalize an already parsed JSON object. Never fails.
pub fn normalize(root: &Map<String, Value>) -> ExtractionResult {
    let empty = Map::new();
    let receipt = group(root, "receipt", &empty);
    let amounts = group(root, "amounts", &empty);
    let issuer = group(root, "issuer", &empty);
    let payment = group(root, "payment", &empty);

    let result = ExtractionResult {
        receipt: ReceiptInfo {
            date: field(receipt, "receipt.date", "date", coerce_date),
            number: field(receipt, "receipt.number", "number", coerce_text),
            kind: field(receipt, "receipt.type", "type", |v| {
                v.as_str().and_then(ReceiptType::parse)
            }),
        },
        amounts: normalize_amounts(amounts),
        taxes: normalize_taxes(root.get("taxes")),
        issuer: Issuer {
            name: field(issuer, "issuer.name", "name", coerce_text),
            address: normalize_address(issuer.get("address")),
            vat_id: field(issuer, "issuer.vat_id", "vat_id", coerce_text),
            tax_number: field(issuer, "issuer.tax_number", "tax_number", coerce_text),
        },
        payment: Payment {
            method: field(payment, "payment.method", "method", |v| {
                v.as_str().and_then(PaymentMethod::parse)
            }),
            card_last_4: field(payment, "payment.card_last_4", "card_last_4", coerce_card_last_4),
        },
        raw_text: coerce_raw_text(root.get("raw_text")),
    };

    debug!(
        "Normalized extraction: {} tax lines, {} chars of raw text",
        result.taxes.len(),
        result.raw_text.len()
    );
    result
}

fn group<'a>(
    root: &'a Map<String, Value>,
    key: &str,
    empty: &'a Map<String, Value>,
) -> &'a Map<String, Value> {
    match root.get(key) {
        Some(Value::Object(map)) => map,
        None | Some(Value::Null) => empty,
        Some(other) => {
            warn!(group = key, value = %other, "Ignoring group that is not an object");
            empty
        }
    }
}

/// Coerce one field; a present but incompatible value is logged and nulled.
fn field<T>(
    group: &Map<String, Value>,
    path: &str,
    key: &str,
    coerce: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    match group.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => {
            let coerced = coerce(value);
            if coerced.is_none() {
                warn!(field = path, value = %value, "Dropping value that does not fit the schema");
            }
            coerced
        }
    }
}

fn normalize_amounts(amounts: &Map<String, Value>) -> Amounts {
    let gross = field(amounts, "amounts.gross", "gross", coerce_amount);
    let net = field(amounts, "amounts.net", "net", coerce_amount);

    if let (Some(gross), Some(net)) = (gross, net) {
        if gross < net {
            warn!(gross, net, "Gross amount is lower than net amount");
        }
    }

    Amounts {
        gross,
        net,
        currency: field(amounts, "amounts.currency", "currency", coerce_currency),
    }
}

/// Keep entries with numeric `rate` (0-100) and `amount`; drop the rest.
fn normalize_taxes(value: Option<&Value>) -> Vec<TaxLine> {
    let entries = match value {
        Some(Value::Array(entries)) => entries,
        None | Some(Value::Null) => return Vec::new(),
        Some(other) => {
            warn!(value = %other, "Ignoring taxes that are not a list");
            return Vec::new();
        }
    };

    entries
        .iter()
        .filter_map(|entry| {
            let line = entry.as_object().and_then(|obj| {
                let rate = obj.get("rate").and_then(coerce_number)?;
                let amount = obj.get("amount").and_then(coerce_number)?;
                (0.0..=100.0).contains(&rate).then_some(TaxLine { rate, amount })
            });
            if line.is_none() {
                warn!(entry = %entry, "Dropping malformed tax line");
            }
            line
        })
        .collect()
}

fn normalize_address(value: Option<&Value>) -> Address {
    match value {
        Some(Value::Object(address)) => Address {
            street: field(address, "issuer.address.street", "street", coerce_text),
            postal_code: field(address, "issuer.address.postal_code", "postal_code", coerce_text),
            city: field(address, "issuer.address.city", "city", coerce_text),
            country: field(address, "issuer.address.country", "country", coerce_country),
        },
        // A single-line address is kept rather than lost
        Some(Value::String(line)) => Address {
            street: coerce_text(&Value::String(line.clone())),
            ..Address::default()
        },
        None | Some(Value::Null) => Address::default(),
        Some(other) => {
            warn!(field = "issuer.address", value = %other, "Dropping value that does not fit the schema");
            Address::default()
        }
    }
}

/// Numbers and numeric strings (`"19%"`, `"€ 15,97"`, `"1.234,56"`).
pub fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number_text(s),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn coerce_amount(value: &Value) -> Option<f64> {
    coerce_number(value).filter(|n| *n >= 0.0)
}

fn parse_number_text(text: &str) -> Option<f64> {
    let captures = get_number_regex().captures(text.trim())?;
    let num = &captures["num"];

    // A space only separates thousands: "1 234,50" but not "1 2"
    let spaces_group_thousands = num
        .split([' ', '\u{a0}'])
        .skip(1)
        .all(|group| group.chars().take_while(char::is_ascii_digit).count() == 3);
    if !spaces_group_thousands {
        return None;
    }

    let digits: String = num
        .chars()
        .filter(|c| !matches!(c, ' ' | '\'' | '\u{a0}'))
        .collect();

    let last_dot = digits.rfind('.');
    let last_comma = digits.rfind(',');
    let canonical = match (last_dot, last_comma) {
        // Both present: whichever comes last is the decimal separator
        (Some(dot), Some(comma)) if dot > comma => digits.replace(',', ""),
        (Some(_), Some(_)) => digits.replace('.', "").replace(',', "."),
        (None, Some(comma)) => {
            let commas = digits.matches(',').count();
            let decimals = digits.len() - comma - 1;
            if commas == 1 && decimals != 3 {
                digits.replace(',', ".")
            } else {
                digits.replace(',', "")
            }
        }
        (Some(_), None) if digits.matches('.').count() > 1 => digits.replace('.', ""),
        _ => digits,
    };

    canonical.parse::<f64>().ok()
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => match n.as_f64() {
            // 4521.0 is the number 4521, not a decimal
            Some(f) if !n.is_i64() && !n.is_u64() && f.fract() == 0.0 && f.abs() < 1e15 => {
                Some(format!("{}", f as i64))
            }
            _ => Some(n.to_string()),
        },
        _ => None,
    }
}

fn coerce_date(value: &Value) -> Option<NaiveDate> {
    let text = value.as_str()?.trim();

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Some(timestamp.date_naive());
    }
    // "2025-12-03T10:15" or "2025-12-03 10:15" without an offset
    if let Some((day, _)) = text.split_once(['T', ' ']) {
        if let Ok(date) = NaiveDate::parse_from_str(day, "%Y-%m-%d") {
            return Some(date);
        }
    }
    // Dotted dates are always day-first
    NaiveDate::parse_from_str(text, "%d.%m.%Y").ok()
}

fn coerce_currency(value: &Value) -> Option<String> {
    let text = value.as_str()?.trim();
    match text {
        "€" => Some("EUR".to_string()),
        "£" => Some("GBP".to_string()),
        code if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) => {
            Some(code.to_ascii_uppercase())
        }
        _ => None,
    }
}

fn coerce_country(value: &Value) -> Option<String> {
    let text = value.as_str()?.trim();
    (text.len() == 2 && text.chars().all(|c| c.is_ascii_alphabetic()))
        .then(|| text.to_ascii_uppercase())
}

fn coerce_card_last_4(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => n.as_u64().filter(|n| *n <= 9999).map(|n| format!("{:04}", n)),
        Value::String(s) => {
            let text = s.trim();
            if text.len() == 4 && text.chars().all(|c| c.is_ascii_digit()) {
                return Some(text.to_string());
            }
            if !text.chars().all(|c| {
                c.is_ascii_digit() || CARD_MASK_CHARS.contains(&c) || CARD_SEPARATOR_CHARS.contains(&c)
            }) {
                return None;
            }

            // Only a masked or a complete card number has trustworthy last digits
            let digit_count = text.chars().filter(char::is_ascii_digit).count();
            let masked = text.chars().any(|c| CARD_MASK_CHARS.contains(&c));
            if !masked && !CARD_NUMBER_DIGITS.contains(&digit_count) {
                return None;
            }

            let tail: Vec<char> = text.chars().rev().take(4).collect();
            if tail.len() == 4 && tail.iter().all(char::is_ascii_digit) {
                Some(tail.into_iter().rev().collect())
            } else {
                None
            }
        }
        _ => None,
    }
}

fn coerce_raw_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(lines)) => lines
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_to_json_object() {
        assert_eq!(strip_to_json_object("```json\n{\"a\": 1}\n```"), Some("{\"a\": 1}"));
        assert_eq!(strip_to_json_object("no json here"), None);
        assert_eq!(strip_to_json_object("} backwards {"), None);
    }

    #[test]
    fn test_parse_number_text() {
        assert_eq!(parse_number_text("19%"), Some(19.0));
        assert_eq!(parse_number_text("19 %"), Some(19.0));
        assert_eq!(parse_number_text("15,97"), Some(15.97));
        assert_eq!(parse_number_text("€ 100.00"), Some(100.0));
        assert_eq!(parse_number_text("100.00 EUR"), Some(100.0));
        assert_eq!(parse_number_text("1.234,56"), Some(1234.56));
        assert_eq!(parse_number_text("1,234.56"), Some(1234.56));
        assert_eq!(parse_number_text("1,234"), Some(1234.0));
        assert_eq!(parse_number_text("1 234,50 €"), Some(1234.5));
        assert_eq!(parse_number_text("-5"), Some(-5.0));
        assert_eq!(parse_number_text("nineteen"), None);
        assert_eq!(parse_number_text(""), None);
        assert_eq!(parse_number_text("19 items"), None);
        assert_eq!(parse_number_text("1 2"), None);
        assert_eq!(parse_number_text("12 345 678"), Some(12345678.0));
        assert_eq!(parse_number_text("1 23,45"), None);
    }

    #[test]
    fn test_coerce_date() {
        let expected = NaiveDate::from_ymd_opt(2025, 12, 3);
        assert_eq!(coerce_date(&json!("2025-12-03")), expected);
        assert_eq!(coerce_date(&json!("2025-12-03T14:22:00+01:00")), expected);
        assert_eq!(coerce_date(&json!("2025-12-03 14:22")), expected);
        assert_eq!(coerce_date(&json!("03.12.2025")), expected);
        assert_eq!(coerce_date(&json!("12/03/2025")), None);
        assert_eq!(coerce_date(&json!("2025-13-45")), None);
        assert_eq!(coerce_date(&json!(20251203)), None);
    }

    #[test]
    fn test_coerce_card_last_4() {
        assert_eq!(coerce_card_last_4(&json!("4829")), Some("4829".to_string()));
        assert_eq!(coerce_card_last_4(&json!("****1234")), Some("1234".to_string()));
        assert_eq!(
            coerce_card_last_4(&json!("XXXX XXXX XXXX 0042")),
            Some("0042".to_string())
        );
        assert_eq!(coerce_card_last_4(&json!(42)), Some("0042".to_string()));
        assert_eq!(coerce_card_last_4(&json!("123")), None);
        assert_eq!(coerce_card_last_4(&json!("12a4")), None);
        assert_eq!(coerce_card_last_4(&json!(123456)), None);
    }

    #[test]
    fn test_unmasked_card_digits_not_truncated() {
        assert_eq!(coerce_card_last_4(&json!("12345")), None);
        assert_eq!(coerce_card_last_4(&json!("1234 5678")), None);
        assert_eq!(
            coerce_card_last_4(&json!("4111 1111 1111 1111")),
            Some("1111".to_string())
        );
        assert_eq!(
            coerce_card_last_4(&json!("4111111111114829")),
            Some("4829".to_string())
        );
        assert_eq!(coerce_card_last_4(&json!("**** 4829")), Some("4829".to_string()));

        let result = validate_response(
            r#"{"payment": {"card_last_4": "12345"}, "amounts": {"gross": "1 2", "net": "84,03"}}"#,
        )
        .unwrap();
        assert_eq!(result.payment.card_last_4, None);
        assert_eq!(result.amounts.gross, None);
        assert_eq!(result.amounts.net, Some(84.03));
    }

    #[test]
    fn test_out_of_range_number_only_nulls_its_field() {
        let result =
            validate_response(r#"{"amounts": {"gross": 1e400, "net": 84.03, "currency": "EUR"}}"#)
                .unwrap();
        assert_eq!(result.amounts.gross, None);
        assert_eq!(result.amounts.net, Some(84.03));
        assert_eq!(result.amounts.currency.as_deref(), Some("EUR"));
    }

    #[test]
    fn test_coerce_codes() {
        assert_eq!(coerce_currency(&json!("eur")), Some("EUR".to_string()));
        assert_eq!(coerce_currency(&json!("€")), Some("EUR".to_string()));
        assert_eq!(coerce_currency(&json!("Euro")), None);
        assert_eq!(coerce_country(&json!("de")), Some("DE".to_string()));
        assert_eq!(coerce_country(&json!("DEU")), None);
    }

    #[test]
    fn test_coerce_text() {
        assert_eq!(coerce_text(&json!("  RE-1  ")), Some("RE-1".to_string()));
        assert_eq!(coerce_text(&json!(4521)), Some("4521".to_string()));
        assert_eq!(coerce_text(&json!(4521.0)), Some("4521".to_string()));
        assert_eq!(coerce_text(&json!(12.5)), Some("12.5".to_string()));
        assert_eq!(coerce_text(&json!("   ")), None);
        assert_eq!(coerce_text(&json!({"a": 1})), None);
    }

    #[test]
    fn test_negative_amount_nulled() {
        let result = validate_response(r#"{"amounts": {"gross": -12.5, "net": "10"}}"#).unwrap();
        assert_eq!(result.amounts.gross, None);
        assert_eq!(result.amounts.net, Some(10.0));
    }

    #[test]
    fn test_string_address_kept_as_street() {
        let result =
            validate_response(r#"{"issuer": {"address": "Hauptstr. 1, 10115 Berlin"}}"#).unwrap();
        assert_eq!(
            result.issuer.address.street.as_deref(),
            Some("Hauptstr. 1, 10115 Berlin")
        );
        assert_eq!(result.issuer.address.city, None);
    }

    #[test]
    fn test_raw_text_lines_joined() {
        let result = validate_response(r#"{"raw_text": ["EDEKA", "SUMME 50,00"]}"#).unwrap();
        assert_eq!(result.raw_text, "EDEKA\nSUMME 50,00");
    }

    #[test]
    fn test_wrong_group_types_default() {
        let result =
            validate_response(r#"{"receipt": "n/a", "taxes": {"rate": 19}, "payment": null}"#)
                .unwrap();
        assert_eq!(result.receipt, ReceiptInfo::default());
        assert!(result.taxes.is_empty());
        assert_eq!(result.payment, Payment::default());
    }

    #[test]
    fn test_empty_output_is_malformed() {
        assert!(matches!(
            validate_response("   \n"),
            Err(ExtractError::MalformedResponse(_))
        ));
        assert!(matches!(
            validate_response("I could not read this image."),
            Err(ExtractError::MalformedResponse(_))
        ));
        assert!(matches!(
            validate_response("{\"receipt\": {"),
            Err(ExtractError::MalformedResponse(_))
        ));
    }
}
