use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] fintec_core::ValidationError),

    #[error(transparent)]
    Money(#[from] fintec_core::MoneyError),

    #[error(transparent)]
    Conversion(#[from] fintec_core::ConversionError),

    #[error(transparent)]
    Comparison(#[from] fintec_core::ComparisonError),

    #[error(transparent)]
    Lexicon(#[from] fintec_assistant::LexiconError),

    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    History(#[from] fintec_core::HistoryError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_)
            | Self::Money(_)
            | Self::Conversion(_)
            | Self::Comparison(_)
            | Self::Lexicon(_)
            | Self::Command(_) => 2,
            Self::Serialization(_) => 4,
            Self::History(_) | Self::Io(_) => 10,
        }
    }
}
