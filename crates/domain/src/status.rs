// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Association status and approval route.
//!
//! The status values are the nodes of the association lifecycle. Which
//! edges between them may be taken, and by whom, is decided by the
//! permission table in the core crate; this module only names the nodes.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The approval state of an association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssociationStatus {
    /// Bulk-imported from the legacy system, keyed only by email.
    Migrated,
    /// Invited and waiting for the invitee to accept.
    AwaitingApproval,
    /// Active authorisation to act for the company.
    Confirmed,
    /// No longer active. Can be reactivated by a new add or invitation.
    Removed,
    /// Revoked administratively; must be re-claimed like a migrated record.
    Unauthorised,
}

impl AssociationStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Migrated,
        Self::AwaitingApproval,
        Self::Confirmed,
        Self::Removed,
        Self::Unauthorised,
    ];

    /// Returns the string representation of the status.
    ///
    /// This is used for persistence and API serialization.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Migrated => "migrated",
            Self::AwaitingApproval => "awaiting-approval",
            Self::Confirmed => "confirmed",
            Self::Removed => "removed",
            Self::Unauthorised => "unauthorised",
        }
    }

    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "migrated" => Ok(Self::Migrated),
            "awaiting-approval" => Ok(Self::AwaitingApproval),
            "confirmed" => Ok(Self::Confirmed),
            "removed" => Ok(Self::Removed),
            "unauthorised" => Ok(Self::Unauthorised),
            _ => Err(DomainError::InvalidStatus {
                status: s.to_string(),
            }),
        }
    }

    /// Returns true for statuses that stand in for an unverified owner.
    ///
    /// Placeholder associations cannot be confirmed by their own user and
    /// must be claimed instead.
    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        matches!(self, Self::Migrated | Self::Unauthorised)
    }

    /// Statuses returned by company listings when removed records are excluded.
    #[must_use]
    pub fn all_except_removed() -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|status| *status != Self::Removed)
            .collect()
    }
}

impl FromStr for AssociationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for AssociationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an association came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalRoute {
    /// Added directly with the company authentication code.
    AuthCode,
    /// Created or extended by an email invitation.
    Invitation,
    /// Bulk-imported from the legacy system.
    Migration,
}

impl ApprovalRoute {
    /// Returns the string representation of the route.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AuthCode => "auth_code",
            Self::Invitation => "invitation",
            Self::Migration => "migration",
        }
    }
}

impl FromStr for ApprovalRoute {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auth_code" => Ok(Self::AuthCode),
            "invitation" => Ok(Self::Invitation),
            "migration" => Ok(Self::Migration),
            _ => Err(DomainError::InvalidApprovalRoute {
                route: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for ApprovalRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
