// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use company_assoc_audit::{Action, Actor, AuditEvent, Cause, StatusSnapshot};
use company_assoc_domain::{
    ApprovalRoute, Association, AssociationStatus, UserDetails, normalize_email,
    validate_company_number, validate_email,
};
use time::OffsetDateTime;

use crate::error::CoreError;
use crate::etag::{generate_etag, new_association_id};
use crate::notification::{PlannedChange, plan_notifications};
use crate::role::{ActorContext, ActorRole};
use crate::state::TransitionResult;

const fn may_invite(role: ActorRole) -> bool {
    matches!(
        role,
        ActorRole::ElevatedApiKey | ActorRole::ApiKey | ActorRole::Admin | ActorRole::CompanyMember
    )
}

/// Invites an email address to associate with a company.
///
/// `existing` is whatever the store holds for the company and the invitee,
/// looked up by the resolved user id and by the bare email. When the record
/// found is still keyed by email and the email now resolves to a user, the
/// user id is swapped in rather than creating a second record.
///
/// # Arguments
///
/// * `existing` - The current association for (company, invitee), if any
/// * `company_number` - The company the invitee is invited to
/// * `invitee_email` - The invitee's email address
/// * `invitee` - The registered user behind the email, if there is one
/// * `actor` - The inviter
/// * `cause` - Why the invitation was sent
/// * `context` - Store-derived facts about the inviter
/// * `now` - The instant the invitation is sent
///
/// # Errors
///
/// Returns an error if:
/// - The company number or email is malformed
/// - The inviter is not allowed to invite for the company
/// - The invitee is already a confirmed member of the company
#[allow(clippy::too_many_arguments)]
pub fn invite(
    existing: Option<&Association>,
    company_number: &str,
    invitee_email: &str,
    invitee: Option<&UserDetails>,
    actor: &Actor,
    cause: Cause,
    context: &ActorContext,
    now: OffsetDateTime,
) -> Result<TransitionResult, CoreError> {
    validate_company_number(company_number)?;
    validate_email(invitee_email)?;
    let invitee_email: String = normalize_email(invitee_email);

    let role = ActorRole::for_company(actor, context);
    if !may_invite(role) {
        return Err(CoreError::Forbidden {
            action: format!("invite users to company '{company_number}'"),
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
            if next.user_id.is_none()
                && let Some(user) = invitee
            {
                next.swap_in_user(user.user_id.clone());
            }
            if next.status != AssociationStatus::AwaitingApproval {
                next.record_previous_state(&actor.id, now);
                next.status = AssociationStatus::AwaitingApproval;
                next.clear_deactivation();
            }
            next.approval_route = ApprovalRoute::Invitation;
            next.push_invitation(actor.id.clone(), now);
            next.etag = generate_etag();
            (
                next,
                Some(StatusSnapshot::new(current.status, current.etag.clone())),
            )
        }
        None => {
            let (user_id, user_email) = match invitee {
                Some(user) => (Some(user.user_id.clone()), None),
                None => (None, Some(invitee_email.clone())),
            };
            let mut next = Association::new(
                new_association_id(),
                company_number.to_string(),
                user_id,
                user_email,
                AssociationStatus::AwaitingApproval,
                ApprovalRoute::Invitation,
                generate_etag(),
                now,
            );
            next.push_invitation(actor.id.clone(), now);
            (next, None)
        }
    };

    let notifications = plan_notifications(PlannedChange::Invited, role, &next, actor);
    let audit_event = AuditEvent::new(
        actor.clone(),
        cause,
        Action::new(
            String::from("Invite"),
            Some(format!("Invited {invitee_email} to {company_number}")),
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
