// Extraction prompt and response schema
// Author: kelexine (https://github.com/kelexine)

use serde_json::{json, Value};
use std::sync::OnceLock;

/// Instruction sent alongside every document.
pub const EXTRACTION_PROMPT: &str = r#"Extract all information from this receipt/invoice document.

Return ONLY a single JSON object, with no prose and no code fences, in exactly this shape:
{
  "receipt": {
    "date": "YYYY-MM-DD",
    "number": "document number",
    "type": "invoice | receipt | cash_register | credit_note"
  },
  "amounts": {
    "gross": total including tax (number),
    "net": total excluding tax (number),
    "currency": "ISO 4217 code"
  },
  "taxes": [
    { "rate": percentage (number), "amount": tax amount (number) }
  ],
  "issuer": {
    "name": "business name",
    "address": {
      "street": "street and house number",
      "postal_code": "postal code",
      "city": "city",
      "country": "ISO 3166-1 alpha-2 code"
    },
    "vat_id": "VAT identification number",
    "tax_number": "national tax number"
  },
  "payment": {
    "method": "card | cash | transfer | paypal",
    "card_last_4": "last 4 digits of the card"
  },
  "raw_text": "complete text recognized on the document"
}

Rules:
- Every key must be present. Use null for anything that is unknown or not printed; never omit a key.
- date: Convert to YYYY-MM-DD (e.g. "20/11/25" becomes 2025-11-20)
- card_last_4: Extract last 4 digits from masked card numbers like ****1234
- tax rate: Percentage as number (19 not 0.19), one entry per rate
- amounts: Plain numbers without currency symbols or thousands separators
- currency: ISO 4217 code (e.g. EUR, USD, CHF)
- country: ISO 3166-1 alpha-2 code (e.g. DE, AT, US)
- raw_text: All recognized text, line by line"#;

static RESPONSE_SCHEMA: OnceLock<Value> = OnceLock::new();

/// Gemini `responseSchema` describing the same shape as the prompt.
pub fn response_schema() -> &'static Value {
    RESPONSE_SCHEMA.get_or_init(|| {
        let nullable_string = |description: &str| {
            json!({"type": "string", "nullable": true, "description": description})
        };

        json!({
            "type": "object",
            "properties": {
                "receipt": {
                    "type": "object",
                    "properties": {
                        "date": nullable_string("Date in ISO format YYYY-MM-DD"),
                        "number": nullable_string("Receipt or invoice number"),
                        "type": {
                            "type": "string",
                            "nullable": true,
                            "enum": ["invoice", "receipt", "cash_register", "credit_note"]
                        }
                    }
                },
                "amounts": {
                    "type": "object",
                    "properties": {
                        "gross": {"type": "number", "nullable": true},
                        "net": {"type": "number", "nullable": true},
                        "currency": nullable_string("ISO 4217 code (EUR, USD, PEN, CHF)")
                    }
                },
                "taxes": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "rate": {"type": "number", "description": "Tax rate as percentage (e.g. 19 not 0.19)"},
                            "amount": {"type": "number"}
                        },
                        "required": ["rate", "amount"]
                    }
                },
                "issuer": {
                    "type": "object",
                    "properties": {
                        "name": nullable_string("Business name"),
                        "address": {
                            "type": "object",
                            "properties": {
                                "street": nullable_string("Street and house number"),
                                "postal_code": nullable_string("Postal code"),
                                "city": nullable_string("City"),
                                "country": nullable_string("ISO 3166-1 alpha-2 code (DE, AT, US, PE)")
                            }
                        },
                        "vat_id": nullable_string("VAT identification number"),
                        "tax_number": nullable_string("National tax number")
                    }
                },
                "payment": {
                    "type": "object",
                    "properties": {
                        "method": {
                            "type": "string",
                            "nullable": true,
                            "enum": ["card", "cash", "transfer", "paypal"]
                        },
                        "card_last_4": nullable_string("Last 4 digits of the card")
                    }
                },
                "raw_text": {"type": "string", "description": "Complete OCR text"}
            },
            "required": ["receipt", "amounts", "taxes", "issuer", "payment", "raw_text"]
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaymentMethod, ReceiptType};

    #[test]
    fn test_prompt_names_every_group() {
        for key in ["receipt", "amounts", "taxes", "issuer", "payment", "raw_text", "card_last_4"] {
            assert!(EXTRACTION_PROMPT.contains(key), "prompt is missing {}", key);
        }
        assert!(EXTRACTION_PROMPT.contains("null"));
    }

    #[test]
    fn test_schema_enums_match_model_types() {
        let schema = response_schema();
        let receipt_types: Vec<&str> = schema["properties"]["receipt"]["properties"]["type"]["enum"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        let expected: Vec<&str> = ReceiptType::ALL.iter().map(|t| t.as_str()).collect();
        assert_eq!(receipt_types, expected);

        let methods: Vec<&str> = schema["properties"]["payment"]["properties"]["method"]["enum"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        let expected: Vec<&str> = PaymentMethod::ALL.iter().map(|m| m.as_str()).collect();
        assert_eq!(methods, expected);
    }
}
