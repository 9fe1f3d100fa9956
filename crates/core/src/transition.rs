// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use company_assoc_audit::{Action, Actor, AuditEvent, Cause, StatusSnapshot};
use company_assoc_domain::{ApprovalRoute, Association, AssociationStatus};
use time::OffsetDateTime;

use crate::error::CoreError;
use crate::etag::generate_etag;
use crate::notification::{PlannedChange, plan_notifications};
use crate::permissions::{TransitionKind, authorise};
use crate::role::{ActorContext, classify};
use crate::state::{TransitionRequest, TransitionResult};

/// Applies a requested status change to an association.
///
/// This is a pure function: the input record is not touched and nothing is
/// persisted. On success the returned association carries exactly one new
/// previous-state entry and a fresh etag.
///
/// # Arguments
///
/// * `current` - The association as last read from the store
/// * `request` - The requested status and any resolved owner
/// * `actor` - The caller
/// * `cause` - Why the change was requested
/// * `context` - Store-derived facts about the caller
/// * `now` - The instant the change happens at
///
/// # Errors
///
/// Returns an error if:
/// - The status change is not an edge of the lifecycle
/// - The actor's role is not allowed to take it
/// - The invitation being confirmed has expired
/// - A direct claim needs an owner that could not be resolved
pub fn transition(
    current: &Association,
    request: &TransitionRequest,
    actor: &Actor,
    cause: Cause,
    context: &ActorContext,
    now: OffsetDateTime,
) -> Result<TransitionResult, CoreError> {
    let from: AssociationStatus = current.status;
    let to: AssociationStatus = request.requested_status;
    let role = classify(actor, current, context);
    let kind: TransitionKind = authorise(from, to, role)?;

    let mut next: Association = current.clone();
    next.record_previous_state(&actor.id, now);

    match kind {
        TransitionKind::Remove
        | TransitionKind::CancelInvitation
        | TransitionKind::RemovePlaceholder => {
            next.status = AssociationStatus::Removed;
            next.removed_at = Some(now);
            next.approval_expiry_at = None;
        }
        TransitionKind::Confirm => {
            let expired = current.newest_invitation().map_or_else(
                || current.approval_expiry_at.is_some_and(|expiry| expiry <= now),
                |invitation| !invitation.is_active(now),
            );
            if expired {
                return Err(CoreError::InvitationExpired {
                    association_id: current.id.clone(),
                });
            }
            if next.user_id.is_none() {
                let owner_id = actor
                    .user_id()
                    .map(str::to_string)
                    .or_else(|| request.resolved_owner.as_ref().map(|u| u.user_id.clone()));
                if let Some(user_id) = owner_id {
                    next.swap_in_user(user_id);
                }
            }
            next.status = AssociationStatus::Confirmed;
            next.approved_at = Some(now);
            next.approval_expiry_at = None;
        }
        TransitionKind::ClaimDirect => {
            let user_id = current
                .user_id
                .clone()
                .or_else(|| request.resolved_owner.as_ref().map(|u| u.user_id.clone()))
                .ok_or_else(|| CoreError::UnresolvedOwner {
                    association_id: current.id.clone(),
                })?;
            next.swap_in_user(user_id);
            next.clear_deactivation();
            next.status = AssociationStatus::Confirmed;
            next.approval_route = ApprovalRoute::AuthCode;
            next.approved_at = Some(now);
            next.approval_expiry_at = None;
        }
        TransitionKind::ClaimViaInvitation => {
            if next.user_id.is_none()
                && let Some(owner) = &request.resolved_owner
            {
                next.swap_in_user(owner.user_id.clone());
            }
            next.clear_deactivation();
            next.status = AssociationStatus::AwaitingApproval;
            next.approval_route = ApprovalRoute::Invitation;
            next.push_invitation(actor.id.clone(), now);
        }
        TransitionKind::Unauthorise => {
            next.status = AssociationStatus::Unauthorised;
            next.unauthorised_at = Some(now);
            next.unauthorised_by = Some(actor.id.clone());
            next.approval_expiry_at = None;
        }
    }

    next.etag = generate_etag();

    let notifications = plan_notifications(PlannedChange::Transition(kind), role, &next, actor);
    let audit_event = AuditEvent::new(
        actor.clone(),
        cause,
        Action::new(
            kind.as_str().to_string(),
            Some(format!("{from} -> {}", next.status)),
        ),
        next.id.clone(),
        Some(StatusSnapshot::new(from, current.etag.clone())),
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
