//! Maintenance teams, keyed by name.

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityKind, EntityPatch};
use super::validation::{ValidationError, Validator};

/// A team member, given either by name or by numeric badge id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TeamMember {
    Name(String),
    Id(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    #[serde(default)]
    pub members: Vec<TeamMember>,
    #[serde(default)]
    pub specialites: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamPatch {
    pub members: Option<Vec<TeamMember>>,
    pub specialites: Option<Vec<String>>,
}

impl Entity for Team {
    type Patch = TeamPatch;

    const KIND: EntityKind = EntityKind::Team;

    fn key(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new().require_text("name", &self.name).finish()
    }
}

impl EntityPatch<Team> for TeamPatch {
    fn is_empty(&self) -> bool {
        self.members.is_none() && self.specialites.is_none()
    }

    fn apply_to(self, record: &mut Team) {
        if let Some(members) = self.members {
            record.members = members;
        }
        if let Some(specialites) = self.specialites {
            record.specialites = specialites;
        }
    }
}
