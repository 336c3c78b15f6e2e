//! Machine records, keyed by serial number.

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityKind, EntityPatch, ListFilter};
use super::validation::{ValidationError, Validator};

/// Operating state of a machine.
///
/// The wire names are the ones the plant floor uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MachineStatus {
    #[default]
    #[serde(rename = "Operando")]
    Operating,
    #[serde(rename = "Quebrado")]
    Broken,
    #[serde(rename = "Em manutenção")]
    UnderMaintenance,
}

impl MachineStatus {
    /// The wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Operating => "Operando",
            Self::Broken => "Quebrado",
            Self::UnderMaintenance => "Em manutenção",
        }
    }
}

impl std::fmt::Display for MachineStatus {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A machine on the plant floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    pub serial_number: String,
    pub name: String,
    #[serde(rename = "type")]
    pub machine_type: String,
    pub model: String,
    pub location: String,
    #[serde(default)]
    pub maintenance_history: Vec<String>,
    #[serde(default)]
    pub status: MachineStatus,
}

/// Partial update for a [`Machine`]. The serial number cannot be changed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MachinePatch {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub machine_type: Option<String>,
    pub model: Option<String>,
    pub location: Option<String>,
    pub maintenance_history: Option<Vec<String>>,
    pub status: Option<MachineStatus>,
}

impl Entity for Machine {
    type Patch = MachinePatch;

    const KIND: EntityKind = EntityKind::Machine;

    fn key(&self) -> &str {
        &self.serial_number
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .require_text("serial_number", &self.serial_number)
            .require_text("name", &self.name)
            .require_text("type", &self.machine_type)
            .require_text("model", &self.model)
            .require_text("location", &self.location)
            .finish()
    }

    fn matches(&self, filter: &ListFilter) -> bool {
        ListFilter::text_matches(filter.status.as_deref(), self.status.as_str())
    }
}

impl EntityPatch<Machine> for MachinePatch {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.machine_type.is_none()
            && self.model.is_none()
            && self.location.is_none()
            && self.maintenance_history.is_none()
            && self.status.is_none()
    }

    fn apply_to(self, record: &mut Machine) {
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(machine_type) = self.machine_type {
            record.machine_type = machine_type;
        }
        if let Some(model) = self.model {
            record.model = model;
        }
        if let Some(location) = self.location {
            record.location = location;
        }
        if let Some(history) = self.maintenance_history {
            record.maintenance_history = history;
        }
        if let Some(status) = self.status {
            record.status = status;
        }
    }
}
