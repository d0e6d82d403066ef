//! Document payload handling for the extraction request.
//!
//! This module resolves the media type of an input document, enforces the
//! inline payload limit, and encodes the bytes into Gemini's `InlineData`
//! format.
//!
//! # Submodules
//!
//! - `models`: Supported media types and size constraints.
//! - `translation`: Conversion of raw bytes into an inline request part.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod models;
pub mod translation;

pub use models::MediaType;
pub use translation::encode_inline_data;
