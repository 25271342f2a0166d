use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Administrator,
    Editor,
    Author,
    Subscriber,
}

impl UserRole {
    /// May set breaking-news fields on any post.
    pub fn can_edit_posts(&self) -> bool {
        matches!(self, UserRole::Administrator | UserRole::Editor)
    }

    /// May change the global display settings.
    pub fn can_manage_options(&self) -> bool {
        matches!(self, UserRole::Administrator)
    }
}
