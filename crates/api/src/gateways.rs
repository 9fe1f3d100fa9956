// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Contracts for the services the association engine talks to.
//!
//! Each call may block and is expected to carry its own timeout. A timeout
//! surfaces as `Unavailable` like any other transient failure.

use company_assoc::EmailKind;
use company_assoc_domain::{CompanyDetails, UserDetails, normalize_email};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

/// Errors returned by the identity and company gateways.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("'{0}' not found")]
    NotFound(String),
    #[error("Gateway unavailable: {0}")]
    Unavailable(String),
}

/// Errors returned by the notification transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Transport rejected '{kind}' email: {message}")]
    Rejected { kind: EmailKind, message: String },
    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}

/// Looks up registered users.
pub trait IdentityGateway {
    /// Resolves a user by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such user exists, or `Unavailable`.
    fn resolve_by_id(&self, user_id: &str) -> Result<UserDetails, GatewayError>;

    /// Resolves the users registered under an email.
    ///
    /// No match is an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if the directory cannot be queried.
    fn resolve_by_email(&self, email: &str) -> Result<Vec<UserDetails>, GatewayError>;
}

/// Looks up companies.
pub trait CompanyGateway {
    /// Resolves a company by number.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such company exists, or `Unavailable`.
    fn resolve_company(&self, company_number: &str) -> Result<CompanyDetails, GatewayError>;
}

/// The fields every email template is filled from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailPayload {
    pub to: String,
    /// How the recipient is addressed: display name, or email when unset.
    pub recipient_name: String,
    pub company_number: String,
    pub company_name: Option<String>,
    pub association_id: String,
    /// Whoever the association belongs to.
    pub subject_name: Option<String>,
    /// Whoever made the change.
    pub actor_name: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub invitation_expires_at: Option<OffsetDateTime>,
}

/// Hands emails to the delivery pipeline.
///
/// Delivery and retries are the transport's business; a successful return
/// only means the email was accepted.
pub trait NotificationTransport {
    /// Publishes one email.
    ///
    /// # Errors
    ///
    /// Returns an error if the email was not accepted.
    fn publish(&self, kind: EmailKind, payload: &EmailPayload) -> Result<(), TransportError>;
}

/// Resolves an email to a single registered user.
///
/// Both an empty result and a `NotFound` error mean "unresolved" and give
/// `Ok(None)`. When several users share an address the first one wins.
///
/// # Errors
///
/// Returns the gateway error if the directory is unavailable.
pub fn resolve_user_by_email<G: IdentityGateway + ?Sized>(
    gateway: &G,
    email: &str,
) -> Result<Option<UserDetails>, GatewayError> {
    match gateway.resolve_by_email(&normalize_email(email)) {
        Ok(users) => Ok(users.into_iter().next()),
        Err(GatewayError::NotFound(_)) => Ok(None),
        Err(err) => Err(err),
    }
}
