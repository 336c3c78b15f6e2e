//! Request and response payloads that are not records themselves.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::ListFilter;
use crate::infrastructure::Pagination;

// =============================================================================
// List Query
// =============================================================================

/// Query parameters accepted by every list endpoint.
///
/// Dates are inclusive ISO-8601 calendar dates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub status: Option<String>,
    pub machine_id: Option<String>,
    pub assigned_team: Option<String>,
}

impl ListQuery {
    /// Splits the query into the record filter and the paging window.
    #[must_use]
    pub fn into_parts(self) -> (ListFilter, Pagination) {
        let filter = ListFilter {
            date_from: self.date_from,
            date_to: self.date_to,
            status: self.status,
            machine_id: self.machine_id,
            assigned_team: self.assigned_team,
        };
        let pagination = Pagination::new(self.offset.unwrap_or(0), self.limit);
        (filter, pagination)
    }
}

// =============================================================================
// Stock Movements
// =============================================================================

/// Body of `POST /parts/{code}/entry`. The date defaults to today (UTC).
#[derive(Debug, Clone, Deserialize)]
pub struct StockEntryRequest {
    pub quantity: u32,
    pub entry_date: Option<NaiveDate>,
}

/// Body of `POST /parts/{code}/exit`. The date defaults to today (UTC).
#[derive(Debug, Clone, Deserialize)]
pub struct StockExitRequest {
    pub quantity: u32,
    pub exit_date: Option<NaiveDate>,
}

// =============================================================================
// Responses
// =============================================================================

/// Body returned by a successful delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// Collection the record was removed from.
    pub kind: String,
    pub key: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
