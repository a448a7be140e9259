//! Domain error types.
//!
//! Only conditions that must stop a run are errors. Skipped trades and
//! indicators without enough history are ordinary outcomes, see
//! [`crate::domain::execution::SkipReason`].

/// Top-level error type for sigtrader.
#[derive(Debug, thiserror::Error)]
pub enum SigtraderError {
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

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

    #[error("unknown strategy type: {name}")]
    UnknownStrategy { name: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SigtraderError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        SigtraderError::InvalidInput {
            reason: reason.into(),
        }
    }
}

impl From<&SigtraderError> for std::process::ExitCode {
    fn from(err: &SigtraderError) -> Self {
        let code: u8 = match err {
            SigtraderError::Io(_) | SigtraderError::Report { .. } => 1,
            SigtraderError::ConfigParse { .. }
            | SigtraderError::ConfigMissing { .. }
            | SigtraderError::ConfigInvalid { .. } => 2,
            SigtraderError::UnknownStrategy { .. } => 4,
            SigtraderError::InvalidInput { .. } | SigtraderError::Data { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_message() {
        let err = SigtraderError::invalid_input("price series is empty");
        assert_eq!(err.to_string(), "invalid input: price series is empty");
    }

    #[test]
    fn config_invalid_message() {
        let err = SigtraderError::ConfigInvalid {
            section: "strategy".into(),
            key: "window".into(),
            reason: "window must be at least 1".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value [strategy] window: window must be at least 1"
        );
    }

    #[test]
    fn exit_codes_by_family() {
        use std::process::ExitCode;

        let cases = [
            (
                SigtraderError::ConfigMissing {
                    section: "backtest".into(),
                    key: "symbol".into(),
                },
                ExitCode::from(2),
            ),
            (
                SigtraderError::UnknownStrategy {
                    name: "turtle".into(),
                },
                ExitCode::from(4),
            ),
            (SigtraderError::invalid_input("empty"), ExitCode::from(5)),
            (
                SigtraderError::Report {
                    reason: "boom".into(),
                },
                ExitCode::from(1),
            ),
        ];

        for (err, expected) in &cases {
            assert_eq!(
                format!("{:?}", ExitCode::from(err)),
                format!("{:?}", expected),
                "exit code for {err}"
            );
        }
    }
}
