use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Lifecycle status of an APO header.
///
/// Stored as text; the wire strings are the legacy status vocabulary
/// (`DRAFT`, `PENDING_DM_APPROVAL`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApoStatus {
    Draft,
    PendingDmApproval,
    PendingHoApproval,
    Sanctioned,
    Rejected,
}

impl fmt::Display for ApoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "DRAFT",
            Self::PendingDmApproval => "PENDING_DM_APPROVAL",
            Self::PendingHoApproval => "PENDING_HO_APPROVAL",
            Self::Sanctioned => "SANCTIONED",
            Self::Rejected => "REJECTED",
        };
        f.write_str(s)
    }
}

impl FromStr for ApoStatus {
    type Err = ApoStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(Self::Draft),
            "PENDING_DM_APPROVAL" => Ok(Self::PendingDmApproval),
            "PENDING_HO_APPROVAL" => Ok(Self::PendingHoApproval),
            "SANCTIONED" => Ok(Self::Sanctioned),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(ApoStatusParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`ApoStatus`] string.
#[derive(Debug, Clone)]
pub struct ApoStatusParseError(pub String);

impl fmt::Display for ApoStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid APO status: {:?}", self.0)
    }
}

impl std::error::Error for ApoStatusParseError {}

// ---------------------------------------------------------------------------

/// Estimate status of a single APO item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EstimateStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl fmt::Display for EstimateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "DRAFT",
            Self::Submitted => "SUBMITTED",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        };
        f.write_str(s)
    }
}

impl FromStr for EstimateStatus {
    type Err = EstimateStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(Self::Draft),
            "SUBMITTED" => Ok(Self::Submitted),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(EstimateStatusParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`EstimateStatus`] string.
#[derive(Debug, Clone)]
pub struct EstimateStatusParseError(pub String);

impl fmt::Display for EstimateStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid estimate status: {:?}", self.0)
    }
}

impl std::error::Error for EstimateStatusParseError {}

// ---------------------------------------------------------------------------

/// Caller role, resolved by the request-handling layer before any core
/// operation runs. Never persisted; passed in per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    CaseWorkerEstimates,
    PlantationSupervisor,
    RangeOfficer,
    DivisionManager,
    HeadOffice,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CaseWorkerEstimates => "CASE_WORKER_ESTIMATES",
            Self::PlantationSupervisor => "PLANTATION_SUPERVISOR",
            Self::RangeOfficer => "RANGE_OFFICER",
            Self::DivisionManager => "DIVISION_MANAGER",
            Self::HeadOffice => "HEAD_OFFICE",
        };
        f.write_str(s)
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CASE_WORKER_ESTIMATES" => Ok(Self::CaseWorkerEstimates),
            "PLANTATION_SUPERVISOR" => Ok(Self::PlantationSupervisor),
            "RANGE_OFFICER" => Ok(Self::RangeOfficer),
            "DIVISION_MANAGER" => Ok(Self::DivisionManager),
            "HEAD_OFFICE" => Ok(Self::HeadOffice),
            other => Err(RoleParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`Role`] string.
#[derive(Debug, Clone)]
pub struct RoleParseError(pub String);

impl fmt::Display for RoleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid role: {:?}", self.0)
    }
}

impl std::error::Error for RoleParseError {}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A plantation. Read-only to this service; only `species`,
/// `year_of_planting`, and `total_area_ha` feed the core logic.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Plantation {
    pub id: Uuid,
    pub name: String,
    pub species: String,
    pub year_of_planting: i32,
    pub total_area_ha: f64,
    pub created_at: DateTime<Utc>,
}

/// A maintenance activity from the activity master.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Activity {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub unit: String,
    pub ssr_no: Option<String>,
}

/// A standard cost norm: the per-unit rate for an activity at a given
/// plantation age in a given financial year. `species = NULL` means the
/// norm applies to any species.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Norm {
    pub id: Uuid,
    pub activity_id: Uuid,
    pub applicable_age: i32,
    pub species: Option<String>,
    pub standard_rate: f64,
    pub financial_year: String,
    pub created_at: DateTime<Utc>,
}

/// An APO header -- one budget plan for a plantation in a financial year.
///
/// `total_sanctioned_amount` is written once at draft generation and is the
/// immutable ceiling for all later item revisions.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApoHeader {
    pub id: Uuid,
    pub plantation_id: Uuid,
    pub financial_year: String,
    pub status: ApoStatus,
    pub total_sanctioned_amount: f64,
    pub created_by: Option<Uuid>,
    pub approved_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item of an APO. `sanctioned_qty` and `sanctioned_rate` are fixed
/// at draft generation; only `revised_qty` and `estimate_status` mutate.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApoItem {
    pub id: Uuid,
    pub apo_id: Uuid,
    pub activity_id: Uuid,
    pub activity_name: String,
    pub unit: String,
    pub sanctioned_qty: f64,
    pub sanctioned_rate: f64,
    pub total_cost: f64,
    pub revised_qty: Option<f64>,
    pub estimate_status: EstimateStatus,
    pub created_at: DateTime<Utc>,
}

impl ApoItem {
    /// The quantity that currently counts against the budget: the revised
    /// quantity when one has been recorded, else the sanctioned one.
    pub fn effective_qty(&self) -> f64 {
        self.revised_qty.unwrap_or(self.sanctioned_qty)
    }

    /// `effective_qty * sanctioned_rate`.
    pub fn effective_cost(&self) -> f64 {
        self.effective_qty() * self.sanctioned_rate
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apo_status_display_roundtrip() {
        let variants = [
            ApoStatus::Draft,
            ApoStatus::PendingDmApproval,
            ApoStatus::PendingHoApproval,
            ApoStatus::Sanctioned,
            ApoStatus::Rejected,
        ];
        for v in &variants {
            let s = v.to_string();
            let parsed: ApoStatus = s.parse().expect("should parse");
            assert_eq!(*v, parsed);
        }
    }

    #[test]
    fn apo_status_invalid() {
        let result = "PENDING".parse::<ApoStatus>();
        assert!(result.is_err());
    }

    #[test]
    fn estimate_status_display_roundtrip() {
        let variants = [
            EstimateStatus::Draft,
            EstimateStatus::Submitted,
            EstimateStatus::Approved,
            EstimateStatus::Rejected,
        ];
        for v in &variants {
            let s = v.to_string();
            let parsed: EstimateStatus = s.parse().expect("should parse");
            assert_eq!(*v, parsed);
        }
    }

    #[test]
    fn estimate_status_invalid() {
        let result = "draft".parse::<EstimateStatus>();
        assert!(result.is_err());
    }

    #[test]
    fn role_display_roundtrip() {
        let variants = [
            Role::CaseWorkerEstimates,
            Role::PlantationSupervisor,
            Role::RangeOfficer,
            Role::DivisionManager,
            Role::HeadOffice,
        ];
        for v in &variants {
            let s = v.to_string();
            let parsed: Role = s.parse().expect("should parse");
            assert_eq!(*v, parsed);
        }
    }

    #[test]
    fn role_invalid() {
        let result = "ADMIN".parse::<Role>();
        assert!(result.is_err());
    }

    fn item(revised: Option<f64>) -> ApoItem {
        ApoItem {
            id: Uuid::new_v4(),
            apo_id: Uuid::new_v4(),
            activity_id: Uuid::new_v4(),
            activity_name: "Clearing fire lines".to_owned(),
            unit: "Per Hectare".to_owned(),
            sanctioned_qty: 10.0,
            sanctioned_rate: 500.0,
            total_cost: 5000.0,
            revised_qty: revised,
            estimate_status: EstimateStatus::Draft,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn effective_qty_falls_back_to_sanctioned() {
        assert_eq!(item(None).effective_qty(), 10.0);
        assert_eq!(item(None).effective_cost(), 5000.0);
    }

    #[test]
    fn effective_qty_prefers_revision() {
        assert_eq!(item(Some(12.5)).effective_qty(), 12.5);
        assert_eq!(item(Some(12.5)).effective_cost(), 6250.0);
    }
}
