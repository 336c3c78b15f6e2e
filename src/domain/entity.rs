//! Entity abstraction shared by every record kind.
//!
//! Each kind is a typed record stored under `{prefix}:{key}` with its key
//! listed in the `{collection}_list` index set. The [`Entity`] trait carries
//! everything the repository needs to treat the kinds uniformly: the key,
//! validation, cross-entity references, and list filtering.

use chrono::NaiveDate;
use serde::{Serialize, de::DeserializeOwned};

use super::validation::ValidationError;

// =============================================================================
// Entity Kind
// =============================================================================

/// The entity kinds managed by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Machine,
    MaintenanceTicket,
    Part,
    Team,
    UserAccount,
}

impl EntityKind {
    /// Key-space prefix used for record keys.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Machine => "machine",
            Self::MaintenanceTicket => "maintenance",
            Self::Part => "parts",
            Self::Team => "team",
            Self::UserAccount => "user",
        }
    }

    /// Collection name, used both as the HTTP path segment and the index name.
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Machine => "machines",
            Self::MaintenanceTicket => "maintenance",
            Self::Part => "parts",
            Self::Team => "teams",
            Self::UserAccount => "users",
        }
    }

    /// Store key of a single record: `{prefix}:{key}`.
    #[must_use]
    pub fn record_key(self, key: &str) -> String {
        format!("{}:{key}", self.prefix())
    }

    /// Store key of the membership set listing every live key of this kind.
    #[must_use]
    pub fn index_key(self) -> String {
        format!("{}_list", self.collection())
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Machine => "machine",
            Self::MaintenanceTicket => "maintenance ticket",
            Self::Part => "part",
            Self::Team => "team",
            Self::UserAccount => "user account",
        };
        formatter.write_str(name)
    }
}

// =============================================================================
// References
// =============================================================================

/// A field that points at another entity by key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Name of the referencing field.
    pub field: &'static str,
    /// Kind of the referenced entity.
    pub kind: EntityKind,
    /// Key of the referenced entity.
    pub key: String,
}

impl Reference {
    #[must_use]
    pub fn new(field: &'static str, kind: EntityKind, key: impl Into<String>) -> Self {
        Self {
            field,
            kind,
            key: key.into(),
        }
    }
}

// =============================================================================
// List Filter
// =============================================================================

/// Optional predicates for listing a collection.
///
/// Each kind decides which predicates apply to it; kinds without a matching
/// field ignore the predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Inclusive lower bound for the kind's date field.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound for the kind's date field.
    pub date_to: Option<NaiveDate>,
    /// Exact status match.
    pub status: Option<String>,
    /// Exact machine reference match.
    pub machine_id: Option<String>,
    /// Exact team reference match.
    pub assigned_team: Option<String>,
}

impl ListFilter {
    /// Returns true if no date bound is set.
    #[must_use]
    pub const fn has_date_range(&self) -> bool {
        self.date_from.is_some() || self.date_to.is_some()
    }

    /// Checks a date against the range. A missing date only matches when no
    /// bound is set.
    #[must_use]
    pub fn date_in_range(&self, date: Option<NaiveDate>) -> bool {
        if !self.has_date_range() {
            return true;
        }
        let Some(date) = date else {
            return false;
        };
        self.date_from.is_none_or(|from| date >= from) && self.date_to.is_none_or(|to| date <= to)
    }

    /// Checks an optional expected value against an actual one.
    #[must_use]
    pub fn text_matches(expected: Option<&str>, actual: &str) -> bool {
        expected.is_none_or(|expected| expected == actual)
    }
}

// =============================================================================
// Entity Traits
// =============================================================================

/// A record kind persisted by `EntityRepository`.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Partial-update payload for this kind.
    type Patch: EntityPatch<Self>;

    /// The kind this record belongs to.
    const KIND: EntityKind;

    /// Natural key identifying the record within its kind.
    fn key(&self) -> &str;

    /// Fills in a generated key when the kind supports one and none was given.
    fn assign_key(&mut self) {}

    /// Checks field-level rules.
    ///
    /// # Errors
    ///
    /// Returns every violated rule.
    fn validate(&self) -> Result<(), ValidationError>;

    /// Cross-entity references that must exist when the record is created.
    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }

    /// Whether the record passes a list filter.
    fn matches(&self, _filter: &ListFilter) -> bool {
        true
    }
}

/// A partial update: every field is optional and only supplied fields are merged.
pub trait EntityPatch<E>: DeserializeOwned + Default + Send + Sync + 'static {
    /// Returns true if no field was supplied.
    fn is_empty(&self) -> bool;

    /// Overwrites the supplied fields on `record`, leaving the rest untouched.
    fn apply_to(self, record: &mut E);

    /// References introduced by the supplied fields.
    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
