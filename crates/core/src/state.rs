// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use company_assoc_audit::AuditEvent;
use company_assoc_domain::{Association, AssociationStatus, UserDetails};

use crate::notification::Notification;
use crate::role::ActorRole;

/// A requested status change, plus anything the caller resolved for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    pub requested_status: AssociationStatus,
    /// The registered user behind the association's email, if the caller
    /// could resolve one. Used when a claim replaces the email key.
    pub resolved_owner: Option<UserDetails>,
}

impl TransitionRequest {
    #[must_use]
    pub const fn new(requested_status: AssociationStatus) -> Self {
        Self {
            requested_status,
            resolved_owner: None,
        }
    }

    #[must_use]
    pub fn with_resolved_owner(mut self, owner: UserDetails) -> Self {
        self.resolved_owner = Some(owner);
        self
    }
}

/// The result of a successful change.
///
/// Nothing has been persisted yet. The caller writes `association` and only
/// then dispatches `notifications`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    /// The association after the change.
    pub association: Association,
    /// Emails owed once the change is committed.
    pub notifications: Vec<Notification>,
    /// The audit event recording this change.
    pub audit_event: AuditEvent,
    /// The role the actor acted in.
    pub role: ActorRole,
}

/// The result of importing a migrated association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// A new migrated record was built and must be inserted.
    Created(Box<TransitionResult>),
    /// A record already exists for the key; nothing changes.
    Existing(Association),
}
