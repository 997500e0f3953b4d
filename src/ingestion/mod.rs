//! Data ingestion module - fetch, parse, link and write NEO close-approach data

pub mod error;
pub mod fetch;
pub mod link;
pub mod parse;
pub mod types;
pub mod utils;
pub mod write;

pub use error::{FormatError, IngestionError};
pub use link::NeoDatabase;
pub use types::*;
