//! Process-wide session and client identifiers.
//!
//! Built once at startup and passed by reference everywhere; re-deriving a
//! different ClientId mid-run is undefined for the topic registry.

use uuid::Uuid;

/// Opaque deployment identifier shared by every participant.
/// All topic names are namespaced by it so unrelated deployments can share
/// one public broker without collision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(String);

impl SessionId {
    /// 8 lowercase alphanumeric chars, enough to keep topic roots apart.
    pub fn generate() -> Self {
        let hex = Uuid::new_v4().simple().to_string();
        SessionId(hex[..8].to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        SessionId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifies one display instance. Derived from the host's network name;
/// operators run one display per host, so this is not globally unique across
/// redeployments by design.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(String);

impl ClientId {
    pub fn from_hostname() -> Self {
        let host = gethostname::gethostname().to_string_lossy().into_owned();
        Self::sanitize(&host)
    }

    /// Lowercase, keep `[a-z0-9-]`, collapse any other run to a single `-`.
    pub fn sanitize(raw: &str) -> Self {
        let mut out = String::with_capacity(raw.len());
        let mut last_dash = false;
        for c in raw.to_lowercase().chars() {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                out.push(c);
                last_dash = c == '-';
            } else if !last_dash {
                out.push('-');
                last_dash = true;
            }
        }
        let trimmed = out.trim_matches('-');
        if trimmed.is_empty() {
            ClientId("display".to_string())
        } else {
            ClientId(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Immutable identity handed to every component that needs it.
#[derive(Debug, Clone)]
pub struct RuntimeIdentity {
    pub session_id: SessionId,
    pub client_id: ClientId,
}

impl RuntimeIdentity {
    pub fn new(session_id: SessionId, client_id: ClientId) -> Self {
        Self { session_id, client_id }
    }
}
