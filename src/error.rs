use std::fmt;

#[derive(Debug)]
pub enum ReportError {
    InvalidConfiguration(String),
    FontUnavailable(String),
    InvalidInput(String),
    EmptyDocument,
    Pdf(String),
    Io(std::io::Error),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::InvalidConfiguration(message) => {
                write!(f, "invalid configuration: {}", message)
            }
            ReportError::FontUnavailable(name) => {
                write!(f, "font family cannot be embedded: {}", name)
            }
            ReportError::InvalidInput(message) => write!(f, "invalid report input: {}", message),
            ReportError::EmptyDocument => write!(f, "report produced no pages"),
            ReportError::Pdf(message) => write!(f, "pdf serialization failed: {}", message),
            ReportError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ReportError {
    fn from(value: std::io::Error) -> Self {
        ReportError::Io(value)
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(value: serde_json::Error) -> Self {
        ReportError::InvalidInput(value.to_string())
    }
}

/// Failure of a single external fetch. Never escapes the fetch stage: every
/// occurrence is converted into a fallback plus a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    Timeout { what: String, millis: u64 },
    NotFound(String),
    Unavailable(String),
    Undecodable(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Timeout { what, millis } => {
                write!(f, "{} timed out after {}ms", what, millis)
            }
            FetchError::NotFound(what) => write!(f, "{} not found", what),
            FetchError::Unavailable(message) => write!(f, "source unavailable: {}", message),
            FetchError::Undecodable(message) => {
                write!(f, "payload could not be decoded: {}", message)
            }
        }
    }
}

impl std::error::Error for FetchError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_failure() {
        let err = ReportError::FontUnavailable("Garamond".to_string());
        assert!(err.to_string().contains("Garamond"));
        let err = FetchError::Timeout {
            what: "organisation logo".to_string(),
            millis: 5000,
        };
        assert_eq!(err.to_string(), "organisation logo timed out after 5000ms");
    }

    #[test]
    fn json_errors_map_to_invalid_input() {
        let err: ReportError = serde_json::from_str::<serde_json::Value>("{")
            .expect_err("truncated")
            .into();
        assert!(matches!(err, ReportError::InvalidInput(_)));
    }
}
