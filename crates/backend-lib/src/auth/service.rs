use async_trait::async_trait;
use campus_common::UserId;

/// Public profile of an account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: UserId,
    pub display_name: String,
}

/// Identity lookup served by the external identity collaborator
#[async_trait]
pub trait Directory: Send + Sync {
    /// `None` when no such account exists
    async fn lookup(&self, user_id: &str) -> Option<UserProfile>;
}
