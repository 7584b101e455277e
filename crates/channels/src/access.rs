//! Sender allow-list.
//!
//! Rules, in order:
//! - empty list: everyone is admitted (a warning is logged once)
//! - `"*"` in the list: everyone is admitted
//! - otherwise the sender id must be listed exactly

use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub enum AccessCheck {
    Allowed,
    Denied { sender_id: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct AllowList {
    users: Vec<String>,
}

impl AllowList {
    pub fn new(users: Vec<String>) -> Self {
        let users: Vec<String> = users
            .into_iter()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();
        if users.is_empty() {
            warn!("ALLOWED_USERS is empty, the bot answers everyone");
        }
        Self { users }
    }

    pub fn is_open(&self) -> bool {
        self.users.is_empty() || self.users.iter().any(|u| u == "*")
    }

    pub fn check(&self, sender_id: &str) -> AccessCheck {
        if self.is_open() || self.users.iter().any(|u| u == sender_id) {
            return AccessCheck::Allowed;
        }
        AccessCheck::Denied {
            sender_id: sender_id.into(),
            reason: format!(
                "Sender '{}' not in allow-list ({} users configured)",
                sender_id,
                self.users.len()
            ),
        }
    }

    pub fn is_allowed(&self, sender_id: &str) -> bool {
        self.check(sender_id) == AccessCheck::Allowed
    }
}
