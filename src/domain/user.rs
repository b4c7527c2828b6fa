use {
    super::id::UserId,
    super::money::Balance,
    serde::{Deserialize, Serialize},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name_tag: String,
    pub balance: Balance,
    /// Purchased product ids, oldest first.
    pub history: Vec<i64>,
}

impl User {
    pub fn new(id: UserId, name_tag: impl Into<String>) -> Self {
        Self {
            id,
            name_tag: name_tag.into(),
            balance: Balance::ZERO,
            history: Vec::new(),
        }
    }

    /// Tag used when a user first shows up without a username.
    pub fn default_tag(id: UserId) -> String {
        format!("user_{id}")
    }
}
