// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Which emails a change owes, and to whom.
//!
//! The core only plans. Resolving recipients and publishing happens in the
//! dispatcher, after the change has been committed.

use company_assoc_audit::Actor;
use company_assoc_domain::Association;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::permissions::TransitionKind;
use crate::role::ActorRole;

/// Every email the service can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmailKind {
    AuthCodeConfirmation,
    /// Sent to the invitee.
    Invite,
    /// Sent to the company's members about someone being invited.
    Invitation,
    InvitationAccepted,
    InvitationCancelled,
    /// Sent to the invitee when someone else cancels their invitation.
    InviteCancelled,
    AuthorisationRemoved,
    YourAuthorisationRemoved,
    DelegatedRemovalOfMigrated,
    DelegatedRemovalOfMigratedBatch,
    RemovalOfOwnMigrated,
    RemovalOfOwnMigratedBatch,
}

impl EmailKind {
    pub const ALL: [Self; 12] = [
        Self::AuthCodeConfirmation,
        Self::Invite,
        Self::Invitation,
        Self::InvitationAccepted,
        Self::InvitationCancelled,
        Self::InviteCancelled,
        Self::AuthorisationRemoved,
        Self::YourAuthorisationRemoved,
        Self::DelegatedRemovalOfMigrated,
        Self::DelegatedRemovalOfMigratedBatch,
        Self::RemovalOfOwnMigrated,
        Self::RemovalOfOwnMigratedBatch,
    ];

    /// The topic name the transport publishes under.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AuthCodeConfirmation => "auth-code-confirmation",
            Self::Invite => "invite",
            Self::Invitation => "invitation",
            Self::InvitationAccepted => "invitation-accepted",
            Self::InvitationCancelled => "invitation-cancelled",
            Self::InviteCancelled => "invite-cancelled",
            Self::AuthorisationRemoved => "authorisation-removed",
            Self::YourAuthorisationRemoved => "your-authorisation-removed",
            Self::DelegatedRemovalOfMigrated => "delegated-removal-of-migrated",
            Self::DelegatedRemovalOfMigratedBatch => "delegated-removal-of-migrated-batch",
            Self::RemovalOfOwnMigrated => "removal-of-own-migrated",
            Self::RemovalOfOwnMigratedBatch => "removal-of-own-migrated-batch",
        }
    }
}

impl std::fmt::Display for EmailKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A person named in an email, identified as well as is known at planning time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl Party {
    /// The user an association belongs to.
    #[must_use]
    pub fn subject_of(association: &Association) -> Self {
        Self {
            user_id: association.user_id.clone(),
            email: association.user_email.clone(),
            display_name: None,
        }
    }

    #[must_use]
    pub fn from_actor(actor: &Actor) -> Self {
        Self {
            user_id: actor.user_id().map(str::to_string),
            email: actor.email.clone(),
            display_name: Some(actor.display_identity().to_string()),
        }
    }

    /// Display name, falling back to email, then user id.
    #[must_use]
    pub fn display_identity(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .or(self.email.as_deref())
            .or(self.user_id.as_deref())
    }
}

/// Who receives a planned email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum Recipient {
    /// One person. Missing addresses are resolved at dispatch.
    Direct(Party),
    /// Every confirmed member of the company except the association itself.
    CompanyMembers { exclude_association_id: String },
}

/// Template fields shared by every email planned for one change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationContext {
    pub company_number: String,
    pub association_id: String,
    /// The user the association belongs to.
    pub subject: Party,
    /// Whoever made the change.
    pub actor: Party,
    #[serde(with = "time::serde::rfc3339::option")]
    pub invitation_expires_at: Option<OffsetDateTime>,
}

/// One email owed by a committed change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: EmailKind,
    pub recipient: Recipient,
    pub context: NotificationContext,
}

/// The change a plan is drawn up for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannedChange {
    /// Direct add through the auth-code route.
    Added,
    Invited,
    Transition(TransitionKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Audience {
    Subject,
    CompanyMembers,
}

type Plan = &'static [(EmailKind, Audience)];

const NOTHING: Plan = &[];
const AUTH_CODE: Plan = &[(EmailKind::AuthCodeConfirmation, Audience::CompanyMembers)];
const INVITED: Plan = &[
    (EmailKind::Invite, Audience::Subject),
    (EmailKind::Invitation, Audience::CompanyMembers),
];
const ACCEPTED: Plan = &[(EmailKind::InvitationAccepted, Audience::CompanyMembers)];
const CANCELLED_BY_OWNER: Plan = &[(EmailKind::InvitationCancelled, Audience::CompanyMembers)];
const CANCELLED_BY_OTHER: Plan = &[
    (EmailKind::InvitationCancelled, Audience::CompanyMembers),
    (EmailKind::InviteCancelled, Audience::Subject),
];
const REMOVED_BY_OWNER: Plan = &[(EmailKind::AuthorisationRemoved, Audience::CompanyMembers)];
const REMOVED_BY_OTHER: Plan = &[
    (EmailKind::AuthorisationRemoved, Audience::CompanyMembers),
    (EmailKind::YourAuthorisationRemoved, Audience::Subject),
];
const OWN_MIGRATED_REMOVED: Plan = &[
    (EmailKind::RemovalOfOwnMigrated, Audience::Subject),
    (EmailKind::RemovalOfOwnMigratedBatch, Audience::CompanyMembers),
];
const DELEGATED_MIGRATED_REMOVED: Plan = &[
    (EmailKind::DelegatedRemovalOfMigrated, Audience::Subject),
    (
        EmailKind::DelegatedRemovalOfMigratedBatch,
        Audience::CompanyMembers,
    ),
];

const fn plan_for(change: PlannedChange, role: ActorRole) -> Plan {
    let by_owner = matches!(role, ActorRole::Owner);
    match change {
        PlannedChange::Added | PlannedChange::Transition(TransitionKind::ClaimDirect) => AUTH_CODE,
        PlannedChange::Invited | PlannedChange::Transition(TransitionKind::ClaimViaInvitation) => {
            INVITED
        }
        PlannedChange::Transition(TransitionKind::Confirm) => ACCEPTED,
        PlannedChange::Transition(TransitionKind::CancelInvitation) => {
            if by_owner {
                CANCELLED_BY_OWNER
            } else {
                CANCELLED_BY_OTHER
            }
        }
        PlannedChange::Transition(TransitionKind::Remove) => {
            if by_owner {
                REMOVED_BY_OWNER
            } else {
                REMOVED_BY_OTHER
            }
        }
        PlannedChange::Transition(TransitionKind::RemovePlaceholder) => {
            if by_owner {
                OWN_MIGRATED_REMOVED
            } else {
                DELEGATED_MIGRATED_REMOVED
            }
        }
        PlannedChange::Transition(TransitionKind::Unauthorise) => NOTHING,
    }
}

/// Plans the emails owed by a change.
///
/// # Arguments
///
/// * `change` - What happened
/// * `role` - The actor's role relative to the association
/// * `association` - The association as it is after the change
/// * `actor` - Whoever made the change
#[must_use]
pub fn plan_notifications(
    change: PlannedChange,
    role: ActorRole,
    association: &Association,
    actor: &Actor,
) -> Vec<Notification> {
    let context = NotificationContext {
        company_number: association.company_number.clone(),
        association_id: association.id.clone(),
        subject: Party::subject_of(association),
        actor: Party::from_actor(actor),
        invitation_expires_at: association.approval_expiry_at,
    };

    plan_for(change, role)
        .iter()
        .map(|(kind, audience)| Notification {
            kind: *kind,
            recipient: match audience {
                Audience::Subject => Recipient::Direct(context.subject.clone()),
                Audience::CompanyMembers => Recipient::CompanyMembers {
                    exclude_association_id: association.id.clone(),
                },
            },
            context: context.clone(),
        })
        .collect()
}
