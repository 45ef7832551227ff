use thiserror::Error;

/// Failures that reject a whole import before any reconciliation happens
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("CSV payload is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("CSV payload has no header row")]
    MissingHeader,

    #[error("malformed CSV near line {line}: {source}")]
    Csv {
        line: u64,
        #[source]
        source: csv::Error,
    },
}

impl ImportError {
    pub(crate) fn csv(source: csv::Error) -> Self {
        let line = source
            .position()
            .map(|position| position.line())
            .unwrap_or_default();
        ImportError::Csv { line, source }
    }
}
