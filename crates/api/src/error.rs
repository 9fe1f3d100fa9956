// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use company_assoc::CoreError;
use company_assoc_domain::DomainError;
use company_assoc_persistence::PersistenceError;

use crate::gateways::GatewayError;

/// API-level errors.
///
/// These are distinct from domain/core errors and represent the API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// The caller is not permitted to perform the operation.
    Forbidden {
        /// The action that was attempted.
        action: String,
        /// The role the caller acted in.
        role: String,
    },
    /// A business rule was violated.
    DomainRuleViolation {
        /// The rule that was violated.
        rule: String,
        /// A human-readable description of the violation.
        message: String,
    },
    /// The association kept changing underneath the request.
    Conflict {
        /// A human-readable description of the conflict.
        message: String,
    },
    /// A collaborator the request depends on could not be reached.
    Unavailable {
        /// The collaborator that failed.
        collaborator: String,
        /// A description of the failure.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::Forbidden { action, role } => {
                write!(f, "Forbidden: caller acting as '{role}' may not {action}")
            }
            Self::DomainRuleViolation { rule, message } => {
                write!(f, "Domain rule violation ({rule}): {message}")
            }
            Self::Conflict { message } => write!(f, "Conflict: {message}"),
            Self::Unavailable {
                collaborator,
                message,
            } => {
                write!(f, "{collaborator} unavailable: {message}")
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

/// Translates a domain error into an API error.
///
/// Domain errors are all validation failures.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    let field: &str = match &err {
        DomainError::InvalidCompanyNumber(_) => "company_number",
        DomainError::InvalidUserId(_) => "user_id",
        DomainError::InvalidEmail(_) => "email",
        DomainError::InvalidAssociationId(_) => "association_id",
        DomainError::InvalidStatus { .. } => "status",
        DomainError::InvalidApprovalRoute { .. } => "approval_route",
        DomainError::InvalidPageIndex { .. } => "page_index",
        DomainError::InvalidItemsPerPage { .. } => "items_per_page",
        DomainError::InvalidTimestamp { .. } => "timestamp",
    };
    ApiError::InvalidInput {
        field: field.to_string(),
        message: err.to_string(),
    }
}

/// Translates a core error into an API error.
///
/// This translation is explicit and ensures core errors are not leaked directly.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
        CoreError::Forbidden { action, role } => ApiError::Forbidden {
            action,
            role: role.to_string(),
        },
        CoreError::InvalidTransition { .. } => ApiError::DomainRuleViolation {
            rule: String::from("status_transition"),
            message: err.to_string(),
        },
        CoreError::InvitationExpired { .. } => ApiError::DomainRuleViolation {
            rule: String::from("invitation_expiry"),
            message: err.to_string(),
        },
        CoreError::AlreadyAssociated { .. } => ApiError::DomainRuleViolation {
            rule: String::from("single_active_association"),
            message: err.to_string(),
        },
        CoreError::UnresolvedOwner { .. } => ApiError::DomainRuleViolation {
            rule: String::from("resolved_owner"),
            message: err.to_string(),
        },
    }
}

/// Translates a persistence error into an API error.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::NotFound(message) => ApiError::ResourceNotFound {
            resource_type: String::from("Association"),
            message,
        },
        PersistenceError::VersionConflict { .. } | PersistenceError::DuplicateKey(_) => {
            ApiError::Conflict {
                message: err.to_string(),
            }
        }
        PersistenceError::DatabaseConnectionFailed(message) => ApiError::Unavailable {
            collaborator: String::from("Association store"),
            message,
        },
        _ => ApiError::Internal {
            message: err.to_string(),
        },
    }
}

/// Translates a unique-key collision on an update.
///
/// Unlike an insert, an update that collides does so because another record
/// already holds the user's key, so re-reading cannot help.
#[must_use]
pub fn translate_key_collision(err: &PersistenceError) -> ApiError {
    ApiError::DomainRuleViolation {
        rule: String::from("single_active_association"),
        message: format!("Another association already holds this user for the company: {err}"),
    }
}

/// Translates a gateway error into an API error.
///
/// # Arguments
///
/// * `err` - The gateway error
/// * `resource_type` - What was being resolved ("Company", "User")
#[must_use]
pub fn translate_gateway_error(err: GatewayError, resource_type: &str) -> ApiError {
    match err {
        GatewayError::NotFound(key) => ApiError::ResourceNotFound {
            resource_type: resource_type.to_string(),
            message: format!("{resource_type} '{key}' does not exist"),
        },
        GatewayError::Unavailable(message) => ApiError::Unavailable {
            collaborator: format!("{resource_type} directory"),
            message,
        },
    }
}
