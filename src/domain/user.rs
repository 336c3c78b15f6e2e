//! User accounts, keyed by username.

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityKind, EntityPatch, ListFilter};
use super::validation::{ValidationError, Validator};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub username: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserAccountPatch {
    pub email: Option<String>,
    pub role: Option<String>,
    pub permissions: Option<Vec<String>>,
}

impl Entity for UserAccount {
    type Patch = UserAccountPatch;

    const KIND: EntityKind = EntityKind::UserAccount;

    fn key(&self) -> &str {
        &self.username
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .require_text("username", &self.username)
            .require_text("role", &self.role)
            .check(self.email.contains('@'), "email", "must contain '@'")
            .finish()
    }

    // Users have no status of their own; the filter matches on role.
    fn matches(&self, filter: &ListFilter) -> bool {
        ListFilter::text_matches(filter.status.as_deref(), &self.role)
    }
}

impl EntityPatch<UserAccount> for UserAccountPatch {
    fn is_empty(&self) -> bool {
        self.email.is_none() && self.role.is_none() && self.permissions.is_none()
    }

    fn apply_to(self, record: &mut UserAccount) {
        if let Some(email) = self.email {
            record.email = email;
        }
        if let Some(role) = self.role {
            record.role = role;
        }
        if let Some(permissions) = self.permissions {
            record.permissions = permissions;
        }
    }
}
