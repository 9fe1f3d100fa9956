// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The association record and its embedded history.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::status::{ApprovalRoute, AssociationStatus};

/// Number of days an invitation stays valid after it was sent.
pub const INVITATION_TTL_DAYS: i64 = 7;

/// One invitation sent for an association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    /// User id of the inviter.
    pub invited_by: String,
    /// When the invitation was sent.
    #[serde(with = "time::serde::rfc3339")]
    pub invited_at: OffsetDateTime,
}

impl Invitation {
    /// Creates a new invitation.
    #[must_use]
    pub const fn new(invited_by: String, invited_at: OffsetDateTime) -> Self {
        Self {
            invited_by,
            invited_at,
        }
    }

    /// Returns the instant after which the invitation can no longer be accepted.
    #[must_use]
    pub fn expires_at(&self) -> OffsetDateTime {
        self.invited_at + Duration::days(INVITATION_TTL_DAYS)
    }

    /// Returns true if the invitation can still be accepted at `now`.
    #[must_use]
    pub fn is_active(&self, now: OffsetDateTime) -> bool {
        self.expires_at() > now
    }
}

/// An audit entry recording a status the association has left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviousState {
    /// The status held before the transition.
    pub status: AssociationStatus,
    /// Identifier of the actor that performed the transition.
    pub changed_by: String,
    /// When the transition was performed.
    #[serde(with = "time::serde::rfc3339")]
    pub changed_at: OffsetDateTime,
}

/// The authorisation relationship between a user identity and a company.
///
/// Exactly one of `user_id` and `user_email` is meaningful. Records that
/// were bulk-migrated, or that were created by inviting an email nobody
/// has registered yet, carry only the email until they are claimed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Association {
    pub id: String,
    pub company_number: String,
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    pub status: AssociationStatus,
    pub approval_route: ApprovalRoute,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub approved_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub removed_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub unauthorised_at: Option<OffsetDateTime>,
    pub unauthorised_by: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub approval_expiry_at: Option<OffsetDateTime>,
    /// Newest first.
    pub invitations: Vec<Invitation>,
    /// Append-only, in commit order.
    pub previous_states: Vec<PreviousState>,
    pub etag: String,
    /// Store-managed optimistic concurrency counter. Zero until first persisted.
    #[serde(skip)]
    pub version: i64,
}

impl Association {
    /// Creates a new, unpersisted association with empty history.
    ///
    /// # Arguments
    ///
    /// * `id` - The generated association id
    /// * `company_number` - The company the association grants access to
    /// * `user_id` - The resolved user id, if known
    /// * `user_email` - The user email, used when no user id is known
    /// * `status` - The initial status
    /// * `approval_route` - How the association came to exist
    /// * `etag` - The initial etag
    /// * `created_at` - The creation instant
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        id: String,
        company_number: String,
        user_id: Option<String>,
        user_email: Option<String>,
        status: AssociationStatus,
        approval_route: ApprovalRoute,
        etag: String,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            id,
            company_number,
            user_id,
            user_email,
            status,
            approval_route,
            created_at,
            approved_at: None,
            removed_at: None,
            unauthorised_at: None,
            unauthorised_by: None,
            approval_expiry_at: None,
            invitations: Vec::new(),
            previous_states: Vec::new(),
            etag,
            version: 0,
        }
    }

    /// Returns true if the record has never been written to the store.
    #[must_use]
    pub const fn is_new(&self) -> bool {
        self.version == 0
    }

    /// Returns the most recent invitation, if any.
    #[must_use]
    pub fn newest_invitation(&self) -> Option<&Invitation> {
        self.invitations.first()
    }

    /// Returns true if the newest invitation is still valid at `now`.
    #[must_use]
    pub fn has_active_invitation(&self, now: OffsetDateTime) -> bool {
        self.newest_invitation()
            .is_some_and(|invitation| invitation.is_active(now))
    }

    /// Returns true if `user_id` sent any of this association's invitations.
    #[must_use]
    pub fn was_invited_by(&self, user_id: &str) -> bool {
        self.invitations
            .iter()
            .any(|invitation| invitation.invited_by == user_id)
    }

    /// Returns true if the association belongs to the given identity.
    ///
    /// Email comparison is case-insensitive.
    #[must_use]
    pub fn belongs_to(&self, user_id: Option<&str>, email: Option<&str>) -> bool {
        let id_match = matches!((self.user_id.as_deref(), user_id), (Some(a), Some(b)) if a == b);
        let email_match = matches!(
            (self.user_email.as_deref(), email),
            (Some(a), Some(b)) if a.eq_ignore_ascii_case(b)
        );
        id_match || email_match
    }

    /// Replaces the email key with a resolved user id.
    pub fn swap_in_user(&mut self, user_id: String) {
        self.user_id = Some(user_id);
        self.user_email = None;
    }

    /// Clears what an earlier removal or unauthorisation left behind.
    pub fn clear_deactivation(&mut self) {
        self.removed_at = None;
        self.unauthorised_at = None;
        self.unauthorised_by = None;
    }

    /// Pushes a new invitation to the front and starts its approval window.
    pub fn push_invitation(&mut self, invited_by: String, now: OffsetDateTime) {
        let invitation = Invitation::new(invited_by, now);
        self.approval_expiry_at = Some(invitation.expires_at());
        self.invitations.insert(0, invitation);
    }

    /// Appends the current status to the audit trail.
    ///
    /// Must be called before the status is overwritten.
    pub fn record_previous_state(&mut self, changed_by: &str, changed_at: OffsetDateTime) {
        self.previous_states.push(PreviousState {
            status: self.status,
            changed_by: changed_by.to_string(),
            changed_at,
        });
    }
}
