// receipt-ocr - Extract structured data from receipts and invoices with Gemini
// Author: kelexine (https://github.com/kelexine)

pub mod cli;
pub mod config;
pub mod error;
pub mod extraction;
pub mod gemini;
pub mod models;
pub mod utils;
pub mod vision;

pub use error::{ExtractError, Result};
pub use extraction::ReceiptExtractor;
pub use models::ExtractionResult;
