use async_trait::async_trait;
use dashmap::DashMap;

use super::{Directory, UserProfile};

/// Directory backed by a fixed set of known accounts
#[derive(Default)]
pub struct InMemoryDirectory {
    users: DashMap<String, UserProfile>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, user_id: impl Into<String>, display_name: impl Into<String>) {
        let user_id = user_id.into();
        self.users.insert(
            user_id.clone(),
            UserProfile {
                user_id,
                display_name: display_name.into(),
            },
        );
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn lookup(&self, user_id: &str) -> Option<UserProfile> {
        self.users.get(user_id).map(|u| u.value().clone())
    }
}

/// Accepts every id the gateway forwards; the id doubles as display name
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughDirectory;

#[async_trait]
impl Directory for PassthroughDirectory {
    async fn lookup(&self, user_id: &str) -> Option<UserProfile> {
        Some(UserProfile {
            user_id: user_id.to_string(),
            display_name: user_id.to_string(),
        })
    }
}
