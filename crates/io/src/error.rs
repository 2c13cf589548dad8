/// Errors surfaced by the tabular parser.
///
/// Parsing is deliberately forgiving: CSV text cannot fail, and empty
/// input of any format yields an empty grid. Only an undecodable
/// spreadsheet container produces an error, and callers are expected to
/// degrade it to an empty grid rather than show it to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The spreadsheet container could not be decoded.
    Corrupt { filename: String, reason: String },
    /// The file's extension is not one the tabular parser handles.
    NotTabular { filename: String },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Corrupt { filename, reason } => {
                write!(f, "cannot decode spreadsheet '{}': {}", filename, reason)
            }
            ParseError::NotTabular { filename } => {
                write!(f, "'{}' is not a tabular file", filename)
            }
        }
    }
}

impl std::error::Error for ParseError {}
