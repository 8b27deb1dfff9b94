//! Topic naming for the shared broker.
//!
//! Every topic is rooted at `rankcast_{session}`. The five command-bearing
//! kinds exist in three forms: the suffix-less base (legacy broadcast), a
//! `/{client_id}` targeted form and an explicit `/all` broadcast form. A
//! display instance subscribes to all three forms of each; dedup makes the
//! overlap harmless.

use crate::identity::RuntimeIdentity;

pub const TARGET_ALL: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicKind {
    Commands,
    Ranking,
    Final,
    Display,
    Background,
    Status,
    Heartbeat,
}

impl TopicKind {
    pub const COMMAND_KINDS: [TopicKind; 5] = [
        TopicKind::Commands,
        TopicKind::Ranking,
        TopicKind::Final,
        TopicKind::Display,
        TopicKind::Background,
    ];

    pub fn base_name(self) -> &'static str {
        match self {
            TopicKind::Commands => "commands",
            TopicKind::Ranking => "ranking",
            TopicKind::Final => "final",
            TopicKind::Display => "display",
            TopicKind::Background => "background",
            TopicKind::Status => "status",
            TopicKind::Heartbeat => "heartbeat",
        }
    }
}

/// Fixed topic-name mapping, computed once per process from the runtime
/// identity and immutable thereafter.
#[derive(Debug, Clone)]
pub struct TopicRegistry {
    root: String,
    client_id: String,
}

impl TopicRegistry {
    pub fn new(identity: &RuntimeIdentity) -> Self {
        Self {
            root: format!("rankcast_{}", identity.session_id.as_str()),
            client_id: identity.client_id.as_str().to_string(),
        }
    }

    pub fn base(&self, kind: TopicKind) -> String {
        format!("{}/{}", self.root, kind.base_name())
    }

    pub fn targeted(&self, kind: TopicKind, client_id: &str) -> String {
        format!("{}/{}/{}", self.root, kind.base_name(), client_id)
    }

    pub fn broadcast(&self, kind: TopicKind) -> String {
        format!("{}/{}/{}", self.root, kind.base_name(), TARGET_ALL)
    }

    /// Topics a display instance subscribes to: every form of every
    /// command-bearing kind. Status and heartbeat are publish-only for it.
    pub fn display_subscriptions(&self) -> Vec<String> {
        let mut topics = Vec::with_capacity(TopicKind::COMMAND_KINDS.len() * 3);
        for kind in TopicKind::COMMAND_KINDS {
            topics.push(self.base(kind));
            topics.push(self.targeted(kind, &self.client_id));
            topics.push(self.broadcast(kind));
        }
        topics
    }

    /// Topics the operator console subscribes to.
    pub fn console_subscriptions(&self) -> Vec<String> {
        vec![self.base(TopicKind::Status), self.base(TopicKind::Heartbeat)]
    }

    /// Maps any form of a topic back to its kind. The suffix is irrelevant
    /// to classification; foreign roots return None.
    pub fn classify(&self, topic: &str) -> Option<TopicKind> {
        let rest = topic.strip_prefix(&self.root)?.strip_prefix('/')?;
        let base = rest.split('/').next()?;
        match base {
            "commands" => Some(TopicKind::Commands),
            "ranking" => Some(TopicKind::Ranking),
            "final" => Some(TopicKind::Final),
            "display" => Some(TopicKind::Display),
            "background" => Some(TopicKind::Background),
            "status" => Some(TopicKind::Status),
            "heartbeat" => Some(TopicKind::Heartbeat),
            _ => None,
        }
    }
}
