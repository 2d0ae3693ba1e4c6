use crate::counting::CrossingCounts;
use chrono::{DateTime, Utc};
use std::net::SocketAddr;
use uuid::Uuid;

/// Identity fields supplied by the client at handshake. Any of them may be
/// missing when the handshake was incomplete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionIdentity {
    pub log_id: Option<String>,
    pub box_id: Option<String>,
    pub item_type: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Session {
    // Internal id, never sent to the client or the backend
    pub id: Uuid,
    pub client_addr: Option<SocketAddr>,
    pub identity: SessionIdentity,
    pub connected_at: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub counts: CrossingCounts,
    pub messages_processed: u64,
}

impl Session {
    pub fn new(client_addr: Option<SocketAddr>) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_addr,
            identity: SessionIdentity::default(),
            connected_at: Utc::now(),
            start_time: None,
            end_time: None,
            counts: CrossingCounts::default(),
            messages_processed: 0,
        }
    }

    /// File-name-safe recording name: the `logId`, or the internal id when absent.
    pub fn recording_name(&self) -> String {
        let sanitized: Option<String> = self.identity.log_id.as_deref().map(|id| {
            id.chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                        c
                    } else {
                        '_'
                    }
                })
                .collect()
        });
        match sanitized {
            Some(name) if !name.trim_matches('.').is_empty() => name,
            _ => self.id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_name_is_sanitized() {
        let mut s = Session::new(None);
        assert_eq!(s.recording_name(), s.id.to_string());

        s.identity.log_id = Some("abc-123".to_string());
        assert_eq!(s.recording_name(), "abc-123");

        s.identity.log_id = Some("../etc/passwd".to_string());
        assert_eq!(s.recording_name(), ".._etc_passwd");

        s.identity.log_id = Some("..".to_string());
        assert_eq!(s.recording_name(), s.id.to_string());
    }
}
