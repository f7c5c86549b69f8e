//! Domain error types.

/// A parse error with position information for filter expressions.
#[derive(Debug, Clone, thiserror::Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    /// Format the error with a caret pointing at the error position in the input.
    pub fn display_with_context(&self, input: &str) -> String {
        let caret = " ".repeat(self.position) + "^";
        format!(
            "{input}\n{caret}\n{err}",
            input = input,
            caret = caret,
            err = self
        )
    }
}

/// Top-level error type for stockscope.
#[derive(Debug, thiserror::Error)]
pub enum StockscopeError {
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    FilterParse(#[from] ParseError),

    #[error("no data for {ticker}")]
    NoData { ticker: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl StockscopeError {
    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        StockscopeError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&StockscopeError> for std::process::ExitCode {
    fn from(err: &StockscopeError) -> Self {
        let code: u8 = match err {
            StockscopeError::Io(_) | StockscopeError::Json(_) => 1,
            StockscopeError::InvalidParameter { .. }
            | StockscopeError::ConfigParse { .. }
            | StockscopeError::ConfigMissing { .. }
            | StockscopeError::ConfigInvalid { .. } => 2,
            StockscopeError::Data { .. } => 3,
            StockscopeError::FilterParse(_) => 4,
            StockscopeError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_context_points_at_position() {
        let err = ParseError {
            message: "expected operator".into(),
            position: 4,
        };
        let rendered = err.display_with_context("roe ?? 25");
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "roe ?? 25");
        assert_eq!(lines[1], "    ^");
        assert!(lines[2].contains("position 4"));
    }

    #[test]
    fn invalid_parameter_message() {
        let err = StockscopeError::invalid_parameter("window", "must be positive");
        assert_eq!(err.to_string(), "invalid parameter window: must be positive");
    }
}
