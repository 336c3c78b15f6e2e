//! Domain module for maintenance management.
//!
//! This module contains the record kinds, their partial updates, and the
//! entity abstraction the repository is generic over.

pub mod entity;
pub mod machine;
pub mod maintenance;
pub mod part;
pub mod team;
pub mod user;
pub mod validation;

pub use entity::{Entity, EntityKind, EntityPatch, ListFilter, Reference};
pub use machine::{Machine, MachinePatch, MachineStatus};
pub use maintenance::{MaintenanceTicket, MaintenanceTicketPatch};
pub use part::{Part, PartPatch, StockError};
pub use team::{Team, TeamMember, TeamPatch};
pub use user::{UserAccount, UserAccountPatch};
pub use validation::{FieldError, ValidationError, Validator};
