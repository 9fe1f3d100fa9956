// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The ways an association comes into being without an invitation, and
//! the retirement of records a merge leaves redundant.

use company_assoc_audit::{Action, Actor, AuditEvent, Cause, StatusSnapshot};
use company_assoc_domain::{
    ApprovalRoute, Association, AssociationStatus, UserDetails, normalize_email,
    validate_company_number, validate_email, validate_user_id,
};
use time::OffsetDateTime;

use crate::error::CoreError;
use crate::etag::{generate_etag, new_association_id};
use crate::notification::{PlannedChange, plan_notifications};
use crate::role::{ActorContext, ActorRole};
use crate::state::{ImportOutcome, TransitionResult};

/// Adds a user to a company directly, through the auth-code route.
///
/// An existing record that is not confirmed is reactivated in place.
///
/// # Arguments
///
/// * `existing` - The current association for (company, user), if any
/// * `company_number` - The company to associate with
/// * `user` - The resolved user being added
/// * `actor` - The caller; must be an API key or hold admin-update
/// * `cause` - Why the association was added
/// * `now` - The instant of the add
///
/// # Errors
///
/// Returns an error if:
/// - The company number or user id is malformed
/// - The actor may not add associations directly
/// - The user is already confirmed with the company
pub fn add(
    existing: Option<&Association>,
    company_number: &str,
    user: &UserDetails,
    actor: &Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<TransitionResult, CoreError> {
    validate_company_number(company_number)?;
    validate_user_id(&user.user_id)?;

    let role = ActorRole::for_company(actor, &ActorContext::outsider());
    if !matches!(
        role,
        ActorRole::ElevatedApiKey | ActorRole::ApiKey | ActorRole::Admin
    ) {
        return Err(CoreError::Forbidden {
            action: format!("add associations to company '{company_number}' directly"),
            role,
        });
    }

    let (next, before) = match existing {
        Some(current) if current.status == AssociationStatus::Confirmed => {
            return Err(CoreError::AlreadyAssociated {
                company_number: company_number.to_string(),
            });
        }
        Some(current) => {
            let mut next: Association = current.clone();
            next.record_previous_state(&actor.id, now);
            next.swap_in_user(user.user_id.clone());
            next.status = AssociationStatus::Confirmed;
            next.approval_route = ApprovalRoute::AuthCode;
            next.approved_at = Some(now);
            next.clear_deactivation();
            next.approval_expiry_at = None;
            next.etag = generate_etag();
            (
                next,
                Some(StatusSnapshot::new(current.status, current.etag.clone())),
            )
        }
        None => {
            let mut next = Association::new(
                new_association_id(),
                company_number.to_string(),
                Some(user.user_id.clone()),
                None,
                AssociationStatus::Confirmed,
                ApprovalRoute::AuthCode,
                generate_etag(),
                now,
            );
            next.approved_at = Some(now);
            (next, None)
        }
    };

    let notifications = plan_notifications(PlannedChange::Added, role, &next, actor);
    let audit_event = AuditEvent::new(
        actor.clone(),
        cause,
        Action::new(
            String::from("Add"),
            Some(format!("Added user {} to {company_number}", user.user_id)),
        ),
        next.id.clone(),
        before,
        StatusSnapshot::new(next.status, next.etag.clone()),
        now,
    );

    Ok(TransitionResult {
        association: next,
        notifications,
        audit_event,
        role,
    })
}

/// Imports a bulk-migrated association keyed only by email.
///
/// Importing the same (company, email) twice leaves the first record as is.
///
/// # Errors
///
/// Returns an error if:
/// - The company number or email is malformed
/// - The actor is not an elevated API key
pub fn import_migrated(
    existing: Option<&Association>,
    company_number: &str,
    email: &str,
    actor: &Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<ImportOutcome, CoreError> {
    validate_company_number(company_number)?;
    validate_email(email)?;

    let role = ActorRole::for_company(actor, &ActorContext::outsider());
    if role != ActorRole::ElevatedApiKey {
        return Err(CoreError::Forbidden {
            action: String::from("import migrated associations"),
            role,
        });
    }

    if let Some(current) = existing {
        return Ok(ImportOutcome::Existing(current.clone()));
    }

    let association = Association::new(
        new_association_id(),
        company_number.to_string(),
        None,
        Some(normalize_email(email)),
        AssociationStatus::Migrated,
        ApprovalRoute::Migration,
        generate_etag(),
        now,
    );
    let audit_event = AuditEvent::new(
        actor.clone(),
        cause,
        Action::new(String::from("ImportMigrated"), None),
        association.id.clone(),
        None,
        StatusSnapshot::new(association.status, association.etag.clone()),
        now,
    );

    Ok(ImportOutcome::Created(Box::new(TransitionResult {
        association,
        notifications: Vec::new(),
        audit_event,
        role,
    })))
}

/// Retires a record that another record for the same user has made redundant.
///
/// A user can end up with one record keyed by user id and an older one keyed
/// by their email. When the former is reactivated or confirmed, the latter is
/// removed in place so the pair never holds two live associations. Nobody is
/// notified.
///
/// # Arguments
///
/// * `duplicate` - The redundant record
/// * `survivor_id` - The record that stays live for the user
/// * `actor` - The caller whose change made the duplicate redundant
/// * `cause` - Why the surviving record changed
/// * `now` - The instant of the change
///
/// # Errors
///
/// Returns an error if the duplicate has already been removed.
pub fn retire_duplicate(
    duplicate: &Association,
    survivor_id: &str,
    actor: &Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<TransitionResult, CoreError> {
    if duplicate.status == AssociationStatus::Removed {
        return Err(CoreError::InvalidTransition {
            from: duplicate.status,
            to: AssociationStatus::Removed,
        });
    }

    let mut next: Association = duplicate.clone();
    next.record_previous_state(&actor.id, now);
    next.status = AssociationStatus::Removed;
    next.removed_at = Some(now);
    next.approval_expiry_at = None;
    next.etag = generate_etag();

    let audit_event = AuditEvent::new(
        actor.clone(),
        cause,
        Action::new(
            String::from("RetireDuplicate"),
            Some(format!("Superseded by {survivor_id}")),
        ),
        next.id.clone(),
        Some(StatusSnapshot::new(duplicate.status, duplicate.etag.clone())),
        StatusSnapshot::new(next.status, next.etag.clone()),
        now,
    );

    Ok(TransitionResult {
        association: next,
        notifications: Vec::new(),
        audit_event,
        role: ActorRole::for_company(actor, &ActorContext::outsider()),
    })
}
