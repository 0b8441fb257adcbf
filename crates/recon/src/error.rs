use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad threshold, empty alias, etc.).
    ConfigValidation(String),
    /// Missing required column in input data.
    MissingColumn { dataset: String, column: String },
    /// Record without a usable name or team. Fatal: the merge relies on
    /// every record carrying both keys.
    MalformedRecord { dataset: String, row: usize, field: String },
    /// Non-numeric value in a column feeding a derived field.
    FieldParse { dataset: String, row: usize, column: String, value: String },
    /// IO / reader error (CSV, JSON).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumn { dataset, column } => {
                write!(f, "dataset '{dataset}': missing column '{column}'")
            }
            Self::MalformedRecord { dataset, row, field } => {
                write!(f, "dataset '{dataset}', row {row}: missing or empty '{field}'")
            }
            Self::FieldParse { dataset, row, column, value } => {
                write!(f, "dataset '{dataset}', row {row}: cannot parse '{column}' value '{value}' as a number")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
