use serde::Serialize;

/// All errors that can occur while browsing the catalog or editing content files.
#[derive(Debug, thiserror::Error)]
pub enum GuideError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid transport encoding: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("Content host rejected the request (HTTP {status}): {message}")]
    HostRejection { status: u16, message: String },

    #[error("{path} was changed remotely since it was loaded; reload before publishing")]
    Conflict { path: String },

    #[error("{0}")]
    Validation(String),

    #[error("Not allowed right now: {0}")]
    InvalidState(String),

    #[error("No item at index {index} (file has {len} items)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("{0}")]
    Custom(String),
}

/// How a failure should be presented to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureClass {
    /// Short-lived notification; the previous view stays as it was.
    Transient,
    /// The current load is abandoned and an explicit error is shown in its place.
    Fatal,
    /// The action is refused but the open edit form is kept.
    Blocking,
}

impl GuideError {
    pub fn class(&self) -> FailureClass {
        match self {
            GuideError::Decode(_) | GuideError::Encoding(_) => FailureClass::Fatal,
            GuideError::Validation(_) => FailureClass::Blocking,
            _ => FailureClass::Transient,
        }
    }
}

// Serialized as the display string so `--json` output carries a readable message.
impl Serialize for GuideError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GuideError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_classes() {
        let decode = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
        assert_eq!(GuideError::from(decode).class(), FailureClass::Fatal);
        assert_eq!(
            GuideError::Validation("empty".into()).class(),
            FailureClass::Blocking
        );
        assert_eq!(
            GuideError::Conflict { path: "data/fish.json".into() }.class(),
            FailureClass::Transient
        );
    }

    #[test]
    fn test_serializes_as_message() {
        let err = GuideError::HostRejection {
            status: 404,
            message: "Not Found".into(),
        };
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(
            json,
            "\"Content host rejected the request (HTTP 404): Not Found\""
        );
    }
}
