//! Maintenance tickets.
//!
//! A ticket is keyed by its registration identifier. Clients may supply one
//! (older clients send it as an integer); when they don't, a time-ordered
//! UUID is generated on create. Every ticket points at a team and a machine,
//! and both must exist when the ticket is created or re-pointed.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::entity::{Entity, EntityKind, EntityPatch, ListFilter, Reference};
use super::validation::{ValidationError, Validator};

/// A maintenance request against a machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceTicket {
    #[serde(default, deserialize_with = "register_id")]
    pub maintenance_register_id: String,
    pub problem_description: String,
    pub request_date: NaiveDate,
    pub priority: String,
    pub assigned_team: String,
    pub status: String,
    pub machine_id: String,
}

/// Partial update for a [`MaintenanceTicket`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MaintenanceTicketPatch {
    pub problem_description: Option<String>,
    pub request_date: Option<NaiveDate>,
    pub priority: Option<String>,
    pub assigned_team: Option<String>,
    pub status: Option<String>,
    pub machine_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRegisterId {
    Text(String),
    Number(u64),
}

/// Accepts the registration identifier either as a string or as an integer.
fn register_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawRegisterId::deserialize(deserializer)? {
        RawRegisterId::Text(text) => text,
        RawRegisterId::Number(number) => number.to_string(),
    })
}

impl Entity for MaintenanceTicket {
    type Patch = MaintenanceTicketPatch;

    const KIND: EntityKind = EntityKind::MaintenanceTicket;

    fn key(&self) -> &str {
        &self.maintenance_register_id
    }

    fn assign_key(&mut self) {
        if self.maintenance_register_id.trim().is_empty() {
            self.maintenance_register_id = Uuid::now_v7().to_string();
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .require_text("maintenance_register_id", &self.maintenance_register_id)
            .require_text("problem_description", &self.problem_description)
            .require_text("priority", &self.priority)
            .require_text("assigned_team", &self.assigned_team)
            .require_text("status", &self.status)
            .require_text("machine_id", &self.machine_id)
            .finish()
    }

    fn references(&self) -> Vec<Reference> {
        vec![
            Reference::new("assigned_team", EntityKind::Team, &self.assigned_team),
            Reference::new("machine_id", EntityKind::Machine, &self.machine_id),
        ]
    }

    fn matches(&self, filter: &ListFilter) -> bool {
        ListFilter::text_matches(filter.status.as_deref(), &self.status)
            && ListFilter::text_matches(filter.machine_id.as_deref(), &self.machine_id)
            && ListFilter::text_matches(filter.assigned_team.as_deref(), &self.assigned_team)
            && filter.date_in_range(Some(self.request_date))
    }
}

impl EntityPatch<MaintenanceTicket> for MaintenanceTicketPatch {
    fn is_empty(&self) -> bool {
        self.problem_description.is_none()
            && self.request_date.is_none()
            && self.priority.is_none()
            && self.assigned_team.is_none()
            && self.status.is_none()
            && self.machine_id.is_none()
    }

    fn apply_to(self, record: &mut MaintenanceTicket) {
        if let Some(description) = self.problem_description {
            record.problem_description = description;
        }
        if let Some(request_date) = self.request_date {
            record.request_date = request_date;
        }
        if let Some(priority) = self.priority {
            record.priority = priority;
        }
        if let Some(team) = self.assigned_team {
            record.assigned_team = team;
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(machine_id) = self.machine_id {
            record.machine_id = machine_id;
        }
    }

    fn references(&self) -> Vec<Reference> {
        let team = self
            .assigned_team
            .as_ref()
            .map(|team| Reference::new("assigned_team", EntityKind::Team, team));
        let machine = self
            .machine_id
            .as_ref()
            .map(|machine| Reference::new("machine_id", EntityKind::Machine, machine));
        team.into_iter().chain(machine).collect()
    }
}
