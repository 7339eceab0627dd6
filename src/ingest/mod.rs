//! Import of rowing machine JSON exports.

pub mod error;
pub mod export;
pub mod parser;

pub use error::ImportError;
pub use parser::{decode_submission, parse_export, ParsedWorkout};
