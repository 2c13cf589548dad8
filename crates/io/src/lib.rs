// File ingestion: classification and parsing of uploaded files

pub mod classify;
pub mod csv;
pub mod error;
pub mod parse;
pub mod sheet;

pub use classify::{classify, file_extension, FileKind};
pub use error::ParseError;
pub use parse::parse_tabular;
