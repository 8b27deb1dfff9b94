use thiserror::Error;

/// Typed failure classes for the control plane, so callers can tell a
/// retryable transport problem from permanently malformed input.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("mqtt transport error: {0}")]
    Transport(String),

    #[error("payload is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid coordinate pair `{0}`")]
    InvalidCoordinate(String),

    #[error("config file error: {0}")]
    Config(#[from] std::io::Error),
}

impl From<rumqttc::ClientError> for ProtocolError {
    fn from(e: rumqttc::ClientError) -> Self {
        ProtocolError::Transport(e.to_string())
    }
}
