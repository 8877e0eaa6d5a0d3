//! Centralized role permission matrix.
//!
//! Call sites ask `enforce(ctx, action)`; they never compare roles directly.

use crate::domain::Role;
use crate::error::{AppError, Result};
use crate::tenant::TenantContext;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ManageOrganizations,
    ManageFuelLimits,
    AuditAnomalies,
    ManageTeams,
    ViewAnomalies,
    EditVehicles,
    EditPenalties,
    EditDocuments,
    EditExpenses,
    RecordFuelEvent,
    ViewFuelLimits,
    ViewFleetData,
}

impl Action {
    pub const ALL: [Action; 12] = [
        Action::ManageOrganizations,
        Action::ManageFuelLimits,
        Action::AuditAnomalies,
        Action::ManageTeams,
        Action::ViewAnomalies,
        Action::EditVehicles,
        Action::EditPenalties,
        Action::EditDocuments,
        Action::EditExpenses,
        Action::RecordFuelEvent,
        Action::ViewFuelLimits,
        Action::ViewFleetData,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ManageOrganizations => "manage-organizations",
            Action::ManageFuelLimits => "manage-fuel-limits",
            Action::AuditAnomalies => "audit-anomaly",
            Action::ManageTeams => "manage-teams",
            Action::ViewAnomalies => "view-anomalies",
            Action::EditVehicles => "edit-vehicles",
            Action::EditPenalties => "edit-penalties",
            Action::EditDocuments => "edit-documents",
            Action::EditExpenses => "edit-expenses",
            Action::RecordFuelEvent => "record-fuel-event",
            Action::ViewFuelLimits => "view-fuel-limits",
            Action::ViewFleetData => "view-fleet-data",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Action::ALL
            .iter()
            .copied()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| AppError::validation("action", format!("Unknown action '{}'", s)))
    }
}

/// Whether `role` may perform `action`
pub fn can(role: Role, action: Action) -> bool {
    use Role::*;

    match action {
        Action::ManageOrganizations
        | Action::ManageFuelLimits
        | Action::AuditAnomalies
        | Action::ManageTeams => matches!(role, Owner | Admin),
        Action::ViewAnomalies
        | Action::EditVehicles
        | Action::EditPenalties
        | Action::EditDocuments => matches!(role, Owner | Admin | Manager),
        Action::EditExpenses | Action::RecordFuelEvent => match role {
            Owner | Admin | Manager | Driver => true,
            Viewer => false,
        },
        Action::ViewFuelLimits | Action::ViewFleetData => match role {
            Owner | Admin | Manager | Viewer | Driver => true,
        },
    }
}

pub fn enforce(ctx: &TenantContext, action: Action) -> Result<()> {
    if can(ctx.role(), action) {
        return Ok(());
    }

    tracing::debug!(
        actor_id = %ctx.actor_id(),
        role = %ctx.role(),
        action = %action,
        "Permission denied"
    );
    Err(AppError::AuthorizationDenied(format!(
        "Role '{}' is not permitted to {}",
        ctx.role(),
        action
    )))
}
