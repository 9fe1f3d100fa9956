// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use company_assoc_domain::{AssociationStatus, DomainError};

use crate::role::ActorRole;

/// Errors that can occur while computing a change to an association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A domain rule was violated.
    DomainViolation(DomainError),
    /// The requested status change is not an edge of the lifecycle.
    InvalidTransition {
        from: AssociationStatus,
        to: AssociationStatus,
    },
    /// The actor's role does not permit the operation.
    Forbidden {
        /// Human readable description of what was attempted.
        action: String,
        role: ActorRole,
    },
    /// The newest invitation expired before it was accepted.
    InvitationExpired { association_id: String },
    /// The user already holds a confirmed association with the company.
    AlreadyAssociated { company_number: String },
    /// A claim needs the owning email resolved to a user, and it was not.
    UnresolvedOwner { association_id: String },
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainViolation(err) => write!(f, "Domain violation: {err}"),
            Self::InvalidTransition { from, to } => {
                write!(f, "Cannot change association status from '{from}' to '{to}'")
            }
            Self::Forbidden { action, role } => {
                write!(f, "Caller with role '{role}' may not {action}")
            }
            Self::InvitationExpired { association_id } => {
                write!(f, "Invitation for association '{association_id}' has expired")
            }
            Self::AlreadyAssociated { company_number } => {
                write!(
                    f,
                    "User is already associated with company '{company_number}'"
                )
            }
            Self::UnresolvedOwner { association_id } => {
                write!(
                    f,
                    "Owner of association '{association_id}' has not registered yet"
                )
            }
        }
    }
}

impl std::error::Error for CoreError {}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        Self::DomainViolation(err)
    }
}
