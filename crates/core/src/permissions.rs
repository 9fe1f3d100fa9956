// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Who may move an association from one status to another.
//!
//! The whole rule set is the [`RULES`] table. Each row names one edge of
//! the lifecycle and the roles allowed to take it, together with the kind
//! of change that edge means for that role. Anything not listed is denied.

use company_assoc_domain::AssociationStatus;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::role::ActorRole;

/// What a permitted status change does to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransitionKind {
    /// `confirmed -> removed`.
    Remove,
    /// `awaiting-approval -> confirmed`, by the invitee.
    Confirm,
    /// `awaiting-approval -> removed`.
    CancelInvitation,
    /// Claiming a placeholder on its owner's behalf. Lands in awaiting-approval.
    ClaimViaInvitation,
    /// Claiming a placeholder straight to confirmed.
    ClaimDirect,
    /// Removing a migrated or unauthorised record.
    RemovePlaceholder,
    /// Administrative revocation.
    Unauthorise,
}

impl TransitionKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Remove => "Remove",
            Self::Confirm => "Confirm",
            Self::CancelInvitation => "CancelInvitation",
            Self::ClaimViaInvitation => "ClaimViaInvitation",
            Self::ClaimDirect => "ClaimDirect",
            Self::RemovePlaceholder => "RemovePlaceholder",
            Self::Unauthorise => "Unauthorise",
        }
    }
}

impl std::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One lifecycle edge and the roles that may take it.
#[derive(Debug)]
pub struct Rule {
    pub from: AssociationStatus,
    pub to: AssociationStatus,
    pub grants: &'static [(ActorRole, TransitionKind)],
}

use ActorRole as R;
use AssociationStatus as S;
use TransitionKind as K;

const REMOVE: &[(ActorRole, TransitionKind)] = &[
    (R::Owner, K::Remove),
    (R::Admin, K::Remove),
    (R::Inviter, K::Remove),
    (R::CompanyMember, K::Remove),
    (R::ApiKey, K::Remove),
    (R::ElevatedApiKey, K::Remove),
];

const CONFIRM: &[(ActorRole, TransitionKind)] =
    &[(R::Owner, K::Confirm), (R::ElevatedApiKey, K::Confirm)];

const CANCEL: &[(ActorRole, TransitionKind)] = &[
    (R::Owner, K::CancelInvitation),
    (R::Inviter, K::CancelInvitation),
    (R::CompanyMember, K::CancelInvitation),
    (R::Admin, K::CancelInvitation),
    (R::ApiKey, K::CancelInvitation),
    (R::ElevatedApiKey, K::CancelInvitation),
];

const CLAIM: &[(ActorRole, TransitionKind)] = &[
    (R::Inviter, K::ClaimViaInvitation),
    (R::CompanyMember, K::ClaimViaInvitation),
    (R::ElevatedApiKey, K::ClaimDirect),
];

const REMOVE_PLACEHOLDER: &[(ActorRole, TransitionKind)] = &[
    (R::Owner, K::RemovePlaceholder),
    (R::Inviter, K::RemovePlaceholder),
    (R::CompanyMember, K::RemovePlaceholder),
    (R::Admin, K::RemovePlaceholder),
    (R::ApiKey, K::RemovePlaceholder),
    (R::ElevatedApiKey, K::RemovePlaceholder),
];

const UNAUTHORISE: &[(ActorRole, TransitionKind)] = &[(R::ElevatedApiKey, K::Unauthorise)];

/// The complete permission table.
pub const RULES: &[Rule] = &[
    Rule {
        from: S::Confirmed,
        to: S::Removed,
        grants: REMOVE,
    },
    Rule {
        from: S::AwaitingApproval,
        to: S::Confirmed,
        grants: CONFIRM,
    },
    Rule {
        from: S::AwaitingApproval,
        to: S::Removed,
        grants: CANCEL,
    },
    Rule {
        from: S::Migrated,
        to: S::Confirmed,
        grants: CLAIM,
    },
    Rule {
        from: S::Unauthorised,
        to: S::Confirmed,
        grants: CLAIM,
    },
    Rule {
        from: S::Migrated,
        to: S::Removed,
        grants: REMOVE_PLACEHOLDER,
    },
    Rule {
        from: S::Unauthorised,
        to: S::Removed,
        grants: REMOVE_PLACEHOLDER,
    },
    Rule {
        from: S::Confirmed,
        to: S::Unauthorised,
        grants: UNAUTHORISE,
    },
    Rule {
        from: S::AwaitingApproval,
        to: S::Unauthorised,
        grants: UNAUTHORISE,
    },
];

/// Looks up the rule for one lifecycle edge.
#[must_use]
pub fn find_rule(from: AssociationStatus, to: AssociationStatus) -> Option<&'static Rule> {
    RULES.iter().find(|rule| rule.from == from && rule.to == to)
}

/// Decides whether `role` may move an association from `from` to `to`.
///
/// # Errors
///
/// Returns `CoreError::InvalidTransition` if the edge is not in the table
/// (including `from == to`), or `CoreError::Forbidden` if the edge exists
/// but the role is not granted it.
pub fn authorise(
    from: AssociationStatus,
    to: AssociationStatus,
    role: ActorRole,
) -> Result<TransitionKind, CoreError> {
    let rule = find_rule(from, to).ok_or(CoreError::InvalidTransition { from, to })?;

    rule.grants
        .iter()
        .find(|(granted, _)| *granted == role)
        .map(|(_, kind)| *kind)
        .ok_or_else(|| CoreError::Forbidden {
            action: format!("change an association from '{from}' to '{to}'"),
            role,
        })
}
