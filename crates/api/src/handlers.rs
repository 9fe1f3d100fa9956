// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Request-level operations on associations.
//!
//! Every write goes through `commit_with_retry`: the change is computed from
//! a fresh read, written with the version that read returned, and
//! recomputed when the store reports that the record moved on.
//!
//! A user can hold one record keyed by user id and an older one keyed by
//! their email. Operations that reactivate the first retire the second in
//! the same write.

use company_assoc::{
    ActorContext, ImportOutcome, MAX_TRANSITION_ATTEMPTS, Notification, TransitionRequest,
    TransitionResult, add, classify, import_migrated as import_migrated_association, invite,
    retire_duplicate, transition,
};
use company_assoc_audit::{Actor, AuditEvent, Cause};
use company_assoc_domain::{
    Association, AssociationStatus, Page, PageRequest, PreviousState, normalize_email,
    validate_association_id, validate_company_number, validate_email, validate_user_id,
};
use company_assoc_persistence::{AssociationStore, PersistenceError};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::error::{
    ApiError, translate_core_error, translate_domain_error, translate_gateway_error,
    translate_key_collision, translate_persistence_error,
};
use crate::gateways::{CompanyGateway, IdentityGateway, resolve_user_by_email};
use crate::request_response::{
    ActiveInvitation, CompanyAssociationsQuery, CreateAssociationRequest, ImportMigratedRequest,
    ImportMigratedResponse, InviteUserRequest, UserAssociationsQuery,
};

/// Page size used when an operation needs every matching record.
pub const SCAN_PAGE_SIZE: i64 = 100;

/// A change that has been committed to the store.
///
/// The notifications have not been sent yet; the caller hands them to the
/// dispatcher once the response no longer depends on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedChange {
    /// The association as stored.
    pub association: Association,
    /// Emails owed by the change.
    pub notifications: Vec<Notification>,
    /// The audit event recording the change.
    pub audit_event: AuditEvent,
}

/// Logs an audit event for a committed change.
pub fn log_audit_event(event: &AuditEvent) {
    info!(
        association_id = %event.association_id,
        actor = %event.actor.id,
        actor_kind = %event.actor.kind,
        action = %event.action.name,
        before = ?event.before.as_ref().map(|snapshot| snapshot.status),
        after = %event.after.status,
        cause = %event.cause.id,
        "Association changed"
    );
}

/// A computed change and the duplicate record it retires, if any.
#[derive(Debug)]
struct PlannedWrite {
    change: TransitionResult,
    retired: Option<TransitionResult>,
}

impl From<TransitionResult> for PlannedWrite {
    fn from(change: TransitionResult) -> Self {
        Self {
            change,
            retired: None,
        }
    }
}

/// Computes and writes a change, recomputing it on version conflicts.
///
/// `compute` must read the records it changes from `store` on every call.
/// A change and the duplicate it retires are written atomically.
///
/// Inserts that collide with a unique key are recomputed too, since the
/// fresh read will find the record that won. An update that collides can
/// never succeed and is reported as a rule violation.
///
/// # Errors
///
/// Returns the error from `compute`, a translated store error, or
/// `Conflict` once `MAX_TRANSITION_ATTEMPTS` writes have been rejected.
fn commit_with_retry<S, F, P>(
    store: &mut S,
    operation: &str,
    mut compute: F,
) -> Result<CommittedChange, ApiError>
where
    S: AssociationStore + ?Sized,
    F: FnMut(&mut S) -> Result<P, ApiError>,
    P: Into<PlannedWrite>,
{
    for attempt in 1..=MAX_TRANSITION_ATTEMPTS {
        let plan: PlannedWrite = compute(store)?.into();
        let inserting: bool = plan.change.association.is_new();
        let expected_version: Option<i64> =
            (!inserting).then_some(plan.change.association.version);

        let mut writes: Vec<(&Association, Option<i64>)> =
            vec![(&plan.change.association, expected_version)];
        if let Some(retired) = &plan.retired {
            writes.push((&retired.association, Some(retired.association.version)));
        }

        match store.write_all(&writes) {
            Ok(stored) => {
                log_audit_event(&plan.change.audit_event);
                if let Some(retired) = &plan.retired {
                    log_audit_event(&retired.audit_event);
                }
                let association: Association =
                    stored.into_iter().next().ok_or_else(|| ApiError::Internal {
                        message: format!("Store returned nothing for {operation}"),
                    })?;
                return Ok(CommittedChange {
                    association,
                    notifications: plan.change.notifications,
                    audit_event: plan.change.audit_event,
                });
            }
            Err(err @ PersistenceError::VersionConflict { .. }) => {
                warn!(operation, attempt, error = %err, "Write rejected, recomputing from a fresh read");
            }
            Err(err @ PersistenceError::DuplicateKey(_)) if inserting => {
                warn!(operation, attempt, error = %err, "Insert collided, recomputing from a fresh read");
            }
            Err(err @ PersistenceError::DuplicateKey(_)) => {
                return Err(translate_key_collision(&err));
            }
            Err(err) => return Err(translate_persistence_error(err)),
        }
    }

    Err(ApiError::Conflict {
        message: format!(
            "Could not {operation} after {MAX_TRANSITION_ATTEMPTS} attempts; the association kept changing"
        ),
    })
}

/// What the store holds for one user within a company.
#[derive(Debug, Default)]
struct UserRecords {
    /// The record an operation on the user acts on.
    primary: Option<Association>,
    /// A second live record, keyed by the user's email, that `primary` supersedes.
    duplicate: Option<Association>,
}

/// Looks a user up by user id and by email separately.
///
/// A confirmed record always becomes the primary one, so callers reject
/// the user as already associated. Otherwise the user-id record wins and a
/// live email-keyed record beside it is reported as a duplicate.
fn find_user_records<S: AssociationStore + ?Sized>(
    store: &mut S,
    company_number: &str,
    user_id: Option<&str>,
    email: Option<&str>,
) -> Result<UserRecords, ApiError> {
    let by_id: Option<Association> = match user_id {
        Some(user_id) => store
            .find_by_company_and_user(company_number, Some(user_id), None)
            .map_err(translate_persistence_error)?,
        None => None,
    };
    let by_email: Option<Association> = match email {
        Some(email) => store
            .find_by_company_and_user(company_number, None, Some(email))
            .map_err(translate_persistence_error)?,
        None => None,
    };

    Ok(match (by_id, by_email) {
        (Some(by_id), Some(by_email)) if by_id.id != by_email.id => {
            if by_email.status == AssociationStatus::Confirmed
                && by_id.status != AssociationStatus::Confirmed
            {
                UserRecords {
                    primary: Some(by_email),
                    duplicate: None,
                }
            } else if by_id.status == AssociationStatus::Confirmed
                || by_email.status == AssociationStatus::Removed
            {
                UserRecords {
                    primary: Some(by_id),
                    duplicate: None,
                }
            } else {
                UserRecords {
                    primary: Some(by_id),
                    duplicate: Some(by_email),
                }
            }
        }
        (by_id, by_email) => UserRecords {
            primary: by_id.or(by_email),
            duplicate: None,
        },
    })
}

/// Pairs a change with the retirement of the duplicate it supersedes.
fn with_retired_duplicate(
    change: TransitionResult,
    duplicate: Option<&Association>,
    actor: &Actor,
    cause: &Cause,
    now: OffsetDateTime,
) -> Result<PlannedWrite, ApiError> {
    let retired: Option<TransitionResult> = duplicate
        .map(|duplicate| {
            retire_duplicate(duplicate, &change.association.id, actor, cause.clone(), now)
        })
        .transpose()
        .map_err(translate_core_error)?;
    if let Some(retired) = &retired {
        debug!(
            association_id = %change.association.id,
            retired_id = %retired.association.id,
            "Retiring duplicate email-keyed association"
        );
    }
    Ok(PlannedWrite { change, retired })
}

/// Establishes whether the actor is a confirmed member of the company.
fn actor_context<S: AssociationStore + ?Sized>(
    store: &mut S,
    actor: &Actor,
    company_number: &str,
) -> Result<ActorContext, ApiError> {
    let Some(user_id) = actor.user_id() else {
        return Ok(ActorContext::outsider());
    };

    let membership: UserRecords =
        find_user_records(store, company_number, Some(user_id), actor.email.as_deref())?;

    Ok(
        if membership
            .primary
            .is_some_and(|association| association.status == AssociationStatus::Confirmed)
        {
            ActorContext::member()
        } else {
            ActorContext::outsider()
        },
    )
}

const fn may_read_any(actor: &Actor) -> bool {
    actor.is_api_key() || actor.admin_read || actor.admin_update
}

fn require_user(actor: &Actor, action: &str) -> Result<String, ApiError> {
    actor
        .user_id()
        .map(str::to_string)
        .ok_or_else(|| ApiError::Forbidden {
            action: action.to_string(),
            role: actor.kind.to_string(),
        })
}

fn association_not_found(association_id: &str) -> ApiError {
    ApiError::ResourceNotFound {
        resource_type: String::from("Association"),
        message: format!("Association '{association_id}' does not exist"),
    }
}

/// Reads every page of a listing.
///
/// # Errors
///
/// Returns the translated store error if any page cannot be read.
pub fn collect_all_pages<F>(mut fetch: F) -> Result<Vec<Association>, ApiError>
where
    F: FnMut(PageRequest) -> Result<Page<Association>, PersistenceError>,
{
    let mut items: Vec<Association> = Vec::new();
    let mut index: i64 = 0;
    loop {
        let request: PageRequest =
            PageRequest::new(index, SCAN_PAGE_SIZE).map_err(translate_domain_error)?;
        let page: Page<Association> = fetch(request).map_err(translate_persistence_error)?;
        let total_pages: u64 = page.total_pages;
        let fetched: usize = page.items.len();
        items.extend(page.items);
        index += 1;
        if fetched == 0 || u64::try_from(index).unwrap_or(u64::MAX) >= total_pages {
            return Ok(items);
        }
    }
}

/// Adds a user to a company directly, through the auth-code route.
///
/// # Arguments
///
/// * `store` - The association store
/// * `identity` - Resolves the user being added
/// * `companies` - Confirms the company exists
/// * `request` - The company and user to associate
/// * `actor` - The caller; must be an API key or hold admin-update
/// * `cause` - Why the association is added
/// * `now` - The instant of the change
///
/// # Errors
///
/// Returns an error if:
/// - The company number or user id is malformed
/// - The company or user does not exist, or the directory is unavailable
/// - The caller may not add associations
/// - The user is already confirmed with the company
/// - The write keeps conflicting
#[allow(clippy::too_many_arguments)]
pub fn create_association<S, I, C>(
    store: &mut S,
    identity: &I,
    companies: &C,
    request: &CreateAssociationRequest,
    actor: &Actor,
    cause: &Cause,
    now: OffsetDateTime,
) -> Result<CommittedChange, ApiError>
where
    S: AssociationStore + ?Sized,
    I: IdentityGateway + ?Sized,
    C: CompanyGateway + ?Sized,
{
    validate_company_number(&request.company_number).map_err(translate_domain_error)?;
    validate_user_id(&request.user_id).map_err(translate_domain_error)?;

    companies
        .resolve_company(&request.company_number)
        .map_err(|e| translate_gateway_error(e, "Company"))?;
    let user = identity
        .resolve_by_id(&request.user_id)
        .map_err(|e| translate_gateway_error(e, "User"))?;

    commit_with_retry(store, "create association", |store| {
        let records: UserRecords = find_user_records(
            store,
            &request.company_number,
            Some(&user.user_id),
            Some(&user.email),
        )?;
        let change: TransitionResult = add(
            records.primary.as_ref(),
            &request.company_number,
            &user,
            actor,
            cause.clone(),
            now,
        )
        .map_err(translate_core_error)?;
        with_retired_duplicate(change, records.duplicate.as_ref(), actor, cause, now)
    })
}

/// Retrieves one association.
///
/// Visible to the owner, the company's confirmed members, admins and API keys.
///
/// # Errors
///
/// Returns an error if the id is malformed, the association does not exist,
/// or the caller may not see it.
pub fn get_association<S: AssociationStore + ?Sized>(
    store: &mut S,
    actor: &Actor,
    association_id: &str,
) -> Result<Association, ApiError> {
    validate_association_id(association_id).map_err(translate_domain_error)?;

    let association: Association = store
        .find_by_id(association_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| association_not_found(association_id))?;

    if may_read_any(actor)
        || association.belongs_to(actor.user_id(), actor.email.as_deref())
    {
        return Ok(association);
    }

    let context: ActorContext = actor_context(store, actor, &association.company_number)?;
    if context.is_company_member {
        return Ok(association);
    }

    Err(ApiError::Forbidden {
        action: format!("view association '{association_id}'"),
        role: classify(actor, &association, &context).to_string(),
    })
}

/// Lists a company's associations.
///
/// # Errors
///
/// Returns an error if the parameters are invalid, the company does not
/// exist, or the caller is not a member, an admin or an API key.
pub fn list_company_associations<S, C>(
    store: &mut S,
    companies: &C,
    actor: &Actor,
    company_number: &str,
    query: &CompanyAssociationsQuery,
) -> Result<Page<Association>, ApiError>
where
    S: AssociationStore + ?Sized,
    C: CompanyGateway + ?Sized,
{
    validate_company_number(company_number).map_err(translate_domain_error)?;
    let page: PageRequest = query.page_request()?;
    let statuses: Vec<AssociationStatus> = query.statuses()?;

    companies
        .resolve_company(company_number)
        .map_err(|e| translate_gateway_error(e, "Company"))?;

    if !may_read_any(actor) && !actor_context(store, actor, company_number)?.is_company_member {
        return Err(ApiError::Forbidden {
            action: format!("list associations of company '{company_number}'"),
            role: actor.kind.to_string(),
        });
    }

    let listed: Page<Association> = store
        .list_by_company(company_number, &statuses, page)
        .map_err(translate_persistence_error)?;
    debug!(
        company_number,
        total = listed.total_results,
        "Listed company associations"
    );
    Ok(listed)
}

/// Lists the caller's own associations.
///
/// # Errors
///
/// Returns an error if the parameters are invalid or the caller is not a user.
pub fn list_user_associations<S: AssociationStore + ?Sized>(
    store: &mut S,
    actor: &Actor,
    query: &UserAssociationsQuery,
) -> Result<Page<Association>, ApiError> {
    let user_id: String = require_user(actor, "list own associations")?;
    let page: PageRequest = query.page_request()?;
    let statuses: Vec<AssociationStatus> = query.statuses()?;
    let company_prefix: Option<&str> = query
        .company_number
        .as_deref()
        .map(str::trim)
        .filter(|prefix| !prefix.is_empty());
    if let Some(prefix) = company_prefix {
        validate_company_number(prefix).map_err(translate_domain_error)?;
    }

    store
        .list_by_user(
            Some(&user_id),
            actor.email.as_deref(),
            &statuses,
            company_prefix,
            page,
        )
        .map_err(translate_persistence_error)
}

/// Changes an association's status.
///
/// When a placeholder record is being confirmed, the owning email is
/// resolved so the claim can swap in the registered user.
///
/// # Errors
///
/// Returns an error if:
/// - The id is malformed or the association does not exist
/// - The change is not an edge of the lifecycle, or the caller may not take it
/// - The invitation being accepted has expired
/// - A direct claim needs an owner the directory cannot resolve
/// - The write keeps conflicting
#[allow(clippy::too_many_arguments)]
pub fn update_association_status<S, I>(
    store: &mut S,
    identity: &I,
    actor: &Actor,
    association_id: &str,
    requested_status: AssociationStatus,
    cause: &Cause,
    now: OffsetDateTime,
) -> Result<CommittedChange, ApiError>
where
    S: AssociationStore + ?Sized,
    I: IdentityGateway + ?Sized,
{
    validate_association_id(association_id).map_err(translate_domain_error)?;

    commit_with_retry(store, "update association status", |store| {
        let current: Association = store
            .find_by_id(association_id)
            .map_err(translate_persistence_error)?
            .ok_or_else(|| association_not_found(association_id))?;
        let context: ActorContext = actor_context(store, actor, &current.company_number)?;

        let mut request = TransitionRequest::new(requested_status);
        if requested_status == AssociationStatus::Confirmed
            && current.user_id.is_none()
            && let Some(email) = current.user_email.as_deref()
        {
            match resolve_user_by_email(identity, email) {
                Ok(Some(owner)) => request = request.with_resolved_owner(owner),
                Ok(None) => {}
                Err(err) if actor.is_elevated_api_key() => {
                    return Err(translate_gateway_error(err, "User"));
                }
                Err(err) => {
                    warn!(association_id, error = %err, "Could not resolve association owner");
                }
            }
        }

        transition(&current, &request, actor, cause.clone(), &context, now)
            .map_err(translate_core_error)
    })
}

/// Invites an email address to associate with a company.
///
/// # Errors
///
/// Returns an error if:
/// - The company number or email is malformed
/// - The company does not exist, or the directory is unavailable
/// - The caller may not invite for the company
/// - The invitee is already a confirmed member
/// - The write keeps conflicting
#[allow(clippy::too_many_arguments)]
pub fn invite_user<S, I, C>(
    store: &mut S,
    identity: &I,
    companies: &C,
    request: &InviteUserRequest,
    actor: &Actor,
    cause: &Cause,
    now: OffsetDateTime,
) -> Result<CommittedChange, ApiError>
where
    S: AssociationStore + ?Sized,
    I: IdentityGateway + ?Sized,
    C: CompanyGateway + ?Sized,
{
    validate_company_number(&request.company_number).map_err(translate_domain_error)?;
    validate_email(&request.invitee_email).map_err(translate_domain_error)?;
    let invitee_email: String = normalize_email(&request.invitee_email);

    companies
        .resolve_company(&request.company_number)
        .map_err(|e| translate_gateway_error(e, "Company"))?;
    let invitee = resolve_user_by_email(identity, &invitee_email)
        .map_err(|e| translate_gateway_error(e, "User"))?;

    commit_with_retry(store, "invite user", |store| {
        let context: ActorContext = actor_context(store, actor, &request.company_number)?;
        let records: UserRecords = find_user_records(
            store,
            &request.company_number,
            invitee.as_ref().map(|user| user.user_id.as_str()),
            Some(&invitee_email),
        )?;
        let change: TransitionResult = invite(
            records.primary.as_ref(),
            &request.company_number,
            &invitee_email,
            invitee.as_ref(),
            actor,
            cause.clone(),
            &context,
            now,
        )
        .map_err(translate_core_error)?;
        with_retired_duplicate(change, records.duplicate.as_ref(), actor, cause, now)
    })
}

/// Lists the invitations the caller can still accept, newest first.
///
/// # Errors
///
/// Returns an error if the caller is not a user or the store cannot be read.
pub fn list_active_invitations<S: AssociationStore + ?Sized>(
    store: &mut S,
    actor: &Actor,
    page: PageRequest,
    now: OffsetDateTime,
) -> Result<Page<ActiveInvitation>, ApiError> {
    let user_id: String = require_user(actor, "list own invitations")?;
    let email: Option<&str> = actor.email.as_deref();

    let awaiting: Vec<Association> = collect_all_pages(|request| {
        store.list_by_user(
            Some(&user_id),
            email,
            &[AssociationStatus::AwaitingApproval],
            None,
            request,
        )
    })?;

    let mut invitations: Vec<ActiveInvitation> = awaiting
        .iter()
        .filter_map(|association| {
            association
                .newest_invitation()
                .filter(|invitation| invitation.is_active(now))
                .map(|invitation| ActiveInvitation {
                    association_id: association.id.clone(),
                    company_number: association.company_number.clone(),
                    invited_by: invitation.invited_by.clone(),
                    invited_at: invitation.invited_at,
                    expires_at: invitation.expires_at(),
                })
        })
        .collect();
    invitations.sort_by(|a, b| b.invited_at.cmp(&a.invited_at));

    Ok(Page::from_vec(invitations, page))
}

/// Lists an association's previous states in commit order.
///
/// # Errors
///
/// Returns an error under the same conditions as `get_association`.
pub fn list_previous_states<S: AssociationStore + ?Sized>(
    store: &mut S,
    actor: &Actor,
    association_id: &str,
    page: PageRequest,
) -> Result<Page<PreviousState>, ApiError> {
    let association: Association = get_association(store, actor, association_id)?;
    Ok(Page::from_vec(association.previous_states, page))
}

/// Imports a bulk-migrated association keyed by email.
///
/// When the email already belongs to a registered user who holds a record
/// for the company, that record is returned and nothing is created.
///
/// # Errors
///
/// Returns an error if the input is malformed, the caller is not an elevated
/// API key, the directory is unavailable, or the write keeps conflicting.
pub fn import_migrated<S, I>(
    store: &mut S,
    identity: &I,
    actor: &Actor,
    request: &ImportMigratedRequest,
    cause: &Cause,
    now: OffsetDateTime,
) -> Result<ImportMigratedResponse, ApiError>
where
    S: AssociationStore + ?Sized,
    I: IdentityGateway + ?Sized,
{
    validate_email(&request.user_email).map_err(translate_domain_error)?;
    let owner = resolve_user_by_email(identity, &request.user_email)
        .map_err(|e| translate_gateway_error(e, "User"))?;

    for attempt in 1..=MAX_TRANSITION_ATTEMPTS {
        let records: UserRecords = find_user_records(
            store,
            &request.company_number,
            owner.as_ref().map(|user| user.user_id.as_str()),
            Some(&request.user_email),
        )?;

        let outcome = import_migrated_association(
            records.primary.as_ref(),
            &request.company_number,
            &request.user_email,
            actor,
            cause.clone(),
            now,
        )
        .map_err(translate_core_error)?;

        let result: TransitionResult = match outcome {
            ImportOutcome::Existing(association) => {
                debug!(association_id = %association.id, "Migrated association already present");
                return Ok(ImportMigratedResponse {
                    association,
                    created: false,
                });
            }
            ImportOutcome::Created(result) => *result,
        };

        match store.insert_or_update(&result.association, None) {
            Ok(stored) => {
                log_audit_event(&result.audit_event);
                return Ok(ImportMigratedResponse {
                    association: stored,
                    created: true,
                });
            }
            Err(err @ PersistenceError::DuplicateKey(_)) => {
                warn!(attempt, error = %err, "Import raced with another writer, re-reading");
            }
            Err(err) => return Err(translate_persistence_error(err)),
        }
    }

    Err(ApiError::Conflict {
        message: format!(
            "Could not import migrated association after {MAX_TRANSITION_ATTEMPTS} attempts"
        ),
    })
}
