// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used
)]

//! Caller context and audit records.
//!
//! The [`Actor`] is passed explicitly into every core operation. There is
//! no ambient "current user".

use company_assoc_domain::AssociationStatus;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[cfg(test)]
mod tests;

/// What kind of credential the caller presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActorKind {
    /// An interactive user session.
    User,
    /// A service API key.
    ApiKey,
}

impl ActorKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::ApiKey => "api-key",
        }
    }
}

impl std::fmt::Display for ActorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The entity performing an operation, together with its permission flags.
///
/// Authentication happens upstream; by the time an `Actor` exists the
/// caller's identity and flags are trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct Actor {
    /// User id for users, key id for API keys.
    pub id: String,
    pub kind: ActorKind,
    /// The user's email. Always `None` for API keys.
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub admin_read: bool,
    pub admin_update: bool,
    /// API key carrying the elevated scope.
    pub elevated: bool,
}

impl Actor {
    /// Creates a user actor with no admin flags.
    ///
    /// # Arguments
    ///
    /// * `id` - The user id
    /// * `email` - The user's email address
    #[must_use]
    pub const fn user(id: String, email: String) -> Self {
        Self {
            id,
            kind: ActorKind::User,
            email: Some(email),
            display_name: None,
            admin_read: false,
            admin_update: false,
            elevated: false,
        }
    }

    /// Creates an API key actor without the elevated scope.
    #[must_use]
    pub const fn api_key(id: String) -> Self {
        Self {
            id,
            kind: ActorKind::ApiKey,
            email: None,
            display_name: None,
            admin_read: false,
            admin_update: false,
            elevated: false,
        }
    }

    /// Creates an API key actor carrying the elevated scope.
    #[must_use]
    pub const fn elevated_api_key(id: String) -> Self {
        let mut actor = Self::api_key(id);
        actor.elevated = true;
        actor
    }

    #[must_use]
    pub fn with_display_name(mut self, display_name: String) -> Self {
        self.display_name = Some(display_name);
        self
    }

    #[must_use]
    pub const fn with_admin_read(mut self) -> Self {
        self.admin_read = true;
        self
    }

    /// Grants admin-update. Admin-update implies admin-read.
    #[must_use]
    pub const fn with_admin_update(mut self) -> Self {
        self.admin_read = true;
        self.admin_update = true;
        self
    }

    #[must_use]
    pub const fn is_api_key(&self) -> bool {
        matches!(self.kind, ActorKind::ApiKey)
    }

    #[must_use]
    pub const fn is_elevated_api_key(&self) -> bool {
        self.is_api_key() && self.elevated
    }

    #[must_use]
    pub const fn is_user(&self) -> bool {
        matches!(self.kind, ActorKind::User)
    }

    /// The user id, for user actors only.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        if self.is_user() {
            Some(&self.id)
        } else {
            None
        }
    }

    /// Display name, falling back to email, then to the raw id.
    #[must_use]
    pub fn display_identity(&self) -> &str {
        match (self.display_name.as_deref(), self.email.as_deref()) {
            (Some(name), _) if !name.trim().is_empty() => name,
            (_, Some(email)) => email,
            _ => &self.id,
        }
    }
}

/// Represents the reason or trigger for an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cause {
    /// A unique identifier for this cause (e.g. request id, job run id).
    pub id: String,
    pub description: String,
}

impl Cause {
    /// Creates a new Cause.
    ///
    /// # Arguments
    ///
    /// * `id` - The unique identifier for this cause
    /// * `description` - A description of what triggered this action
    #[must_use]
    pub const fn new(id: String, description: String) -> Self {
        Self { id, description }
    }
}

/// Represents the specific action performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// The name of the action (e.g. "`ClaimDirect`", "`Invite`").
    pub name: String,
    /// Optional additional details about the action.
    pub details: Option<String>,
}

impl Action {
    /// Creates a new Action.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the action
    /// * `details` - Optional additional details
    #[must_use]
    pub const fn new(name: String, details: Option<String>) -> Self {
        Self { name, details }
    }
}

/// The audited part of an association at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub status: AssociationStatus,
    pub etag: String,
}

impl StatusSnapshot {
    #[must_use]
    pub const fn new(status: AssociationStatus, etag: String) -> Self {
        Self { status, etag }
    }
}

/// An immutable audit event representing one committed change.
///
/// Every successful mutation produces exactly one audit event. `before`
/// is `None` when the association was created by the change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub actor: Actor,
    pub cause: Cause,
    pub action: Action,
    pub association_id: String,
    pub before: Option<StatusSnapshot>,
    pub after: StatusSnapshot,
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
}

impl AuditEvent {
    /// Creates a new `AuditEvent`.
    ///
    /// # Arguments
    ///
    /// * `actor` - The actor who initiated the change
    /// * `cause` - The reason for the change
    /// * `action` - The action that was performed
    /// * `association_id` - The association that changed
    /// * `before` - The state before the change, if the record existed
    /// * `after` - The state after the change
    /// * `at` - When the change was computed
    #[must_use]
    pub const fn new(
        actor: Actor,
        cause: Cause,
        action: Action,
        association_id: String,
        before: Option<StatusSnapshot>,
        after: StatusSnapshot,
        at: OffsetDateTime,
    ) -> Self {
        Self {
            actor,
            cause,
            action,
            association_id,
            before,
            after,
            at,
        }
    }
}
