//! Data models for the Gemini wire format and the extraction record.
//!
//! # Submodules
//!
//! - `gemini`: Request and response types of the `generateContent` endpoint.
//! - `receipt`: The normalized `ExtractionResult` written to the caller.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod gemini;
pub mod receipt;

pub use receipt::{
    Address, Amounts, ExtractionResult, Issuer, Payment, PaymentMethod, ReceiptInfo, ReceiptType,
    TaxLine,
};
