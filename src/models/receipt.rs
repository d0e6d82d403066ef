//! The normalized extraction record.
//!
//! Every field of the model output lands in one of these types after
//! validation. Absent values serialize as `null` so the output always carries
//! the full key set.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Structured data extracted from one receipt or invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub receipt: ReceiptInfo,
    pub amounts: Amounts,
    pub taxes: Vec<TaxLine>,
    pub issuer: Issuer,
    pub payment: Payment,
    /// Full text recognized on the document. Empty when the model gave none.
    pub raw_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceiptInfo {
    pub date: Option<NaiveDate>,
    pub number: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<ReceiptType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptType {
    Invoice,
    Receipt,
    CashRegister,
    CreditNote,
}

impl ReceiptType {
    pub const ALL: [ReceiptType; 4] = [
        ReceiptType::Invoice,
        ReceiptType::Receipt,
        ReceiptType::CashRegister,
        ReceiptType::CreditNote,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiptType::Invoice => "invoice",
            ReceiptType::Receipt => "receipt",
            ReceiptType::CashRegister => "cash_register",
            ReceiptType::CreditNote => "credit_note",
        }
    }

    /// Lenient lookup: case-insensitive, spaces and hyphens read as underscores.
    pub fn parse(value: &str) -> Option<Self> {
        let key = enum_key(value);
        Self::ALL.into_iter().find(|t| t.as_str() == key)
    }
}

/// Monetary totals. `gross` includes tax, `net` excludes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Amounts {
    pub gross: Option<f64>,
    pub net: Option<f64>,
    /// ISO 4217 code, upper-case.
    pub currency: Option<String>,
}

/// One tax rate applied on the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxLine {
    /// Percentage, e.g. `19.0` for 19 %.
    pub rate: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Issuer {
    pub name: Option<String>,
    pub address: Address,
    pub vat_id: Option<String>,
    pub tax_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    /// ISO 3166-1 alpha-2 code, upper-case.
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub method: Option<PaymentMethod>,
    pub card_last_4: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Cash,
    Transfer,
    Paypal,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Card,
        PaymentMethod::Cash,
        PaymentMethod::Transfer,
        PaymentMethod::Paypal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Paypal => "paypal",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let key = enum_key(value);
        Self::ALL.into_iter().find(|m| m.as_str() == key)
    }
}

fn enum_key(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_enum_parsing_is_lenient() {
        assert_eq!(ReceiptType::parse("Cash Register"), Some(ReceiptType::CashRegister));
        assert_eq!(ReceiptType::parse("credit-note"), Some(ReceiptType::CreditNote));
        assert_eq!(ReceiptType::parse("INVOICE"), Some(ReceiptType::Invoice));
        assert_eq!(ReceiptType::parse("bill"), None);

        assert_eq!(PaymentMethod::parse(" PayPal "), Some(PaymentMethod::Paypal));
        assert_eq!(PaymentMethod::parse("unknown"), None);
        assert_eq!(PaymentMethod::parse("bitcoin"), None);
    }

    #[test]
    fn test_default_serializes_every_key_as_null() {
        let json = serde_json::to_value(ExtractionResult::default()).unwrap();
        assert_eq!(
            json,
            json!({
                "receipt": {"date": null, "number": null, "type": null},
                "amounts": {"gross": null, "net": null, "currency": null},
                "taxes": [],
                "issuer": {
                    "name": null,
                    "address": {"street": null, "postal_code": null, "city": null, "country": null},
                    "vat_id": null,
                    "tax_number": null
                },
                "payment": {"method": null, "card_last_4": null},
                "raw_text": ""
            })
        );
    }

    #[test]
    fn test_enum_and_date_wire_format() {
        let mut result = ExtractionResult::default();
        result.receipt.kind = Some(ReceiptType::CashRegister);
        result.receipt.date = NaiveDate::from_ymd_opt(2025, 12, 3);
        result.payment.method = Some(PaymentMethod::Card);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["receipt"]["type"], "cash_register");
        assert_eq!(json["receipt"]["date"], "2025-12-03");
        assert_eq!(json["payment"]["method"], "card");
    }
}
