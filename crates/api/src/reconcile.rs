// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Migration reconciliation.
//!
//! Walks every `migrated` association and claims the ones whose email now
//! belongs to a registered user. Records are walked by id, so claiming a
//! record mid-walk never shifts the ones after it. A record that cannot be
//! resolved is left alone; only losing the store aborts the run.
//!
//! When the owner already holds a record keyed by their user id, the
//! placeholder is merged into it instead of being claimed.

use company_assoc::{
    ActorContext, TransitionRequest, TransitionResult, add, retire_duplicate, transition,
};
use company_assoc_audit::{Actor, Cause};
use company_assoc_domain::{Association, AssociationStatus, UserDetails};
use company_assoc_persistence::{AssociationStore, PersistenceError};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::error::{ApiError, translate_persistence_error};
use crate::gateways::{IdentityGateway, resolve_user_by_email};
use crate::handlers::log_audit_event;

/// Outcome counts for a reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Migrated records examined.
    pub scanned: usize,
    /// Records claimed for a registered user.
    pub claimed: usize,
    /// Records retired because the owner already held a record by user id.
    pub merged: usize,
    /// Records whose email belongs to nobody yet.
    pub unresolved: usize,
    /// Records skipped because the identity lookup failed.
    pub lookup_failed: usize,
    /// Records changed by someone else while being claimed.
    pub conflicts: usize,
    /// Records whose claim could not be written.
    pub failed: usize,
}

fn reconciler_cause() -> Cause {
    Cause::new(
        String::from("migration-reconciler"),
        String::from("Claim migrated association for registered user"),
    )
}

/// Error raised when the store itself is lost mid-run.
fn connection_lost(err: PersistenceError) -> ApiError {
    warn!(error = %err, "Association store lost, aborting reconciliation");
    translate_persistence_error(err)
}

/// Claims one migrated record.
///
/// # Errors
///
/// Returns an error only when the store connection is lost.
fn claim_one<S, I>(
    store: &mut S,
    identity: &I,
    actor: &Actor,
    association: &Association,
    now: OffsetDateTime,
    report: &mut ReconcileReport,
) -> Result<(), ApiError>
where
    S: AssociationStore + ?Sized,
    I: IdentityGateway + ?Sized,
{
    report.scanned += 1;

    let Some(email) = association.user_email.as_deref() else {
        report.unresolved += 1;
        return Ok(());
    };

    let owner: UserDetails = match resolve_user_by_email(identity, email) {
        Ok(Some(owner)) => owner,
        Ok(None) => {
            debug!(association_id = %association.id, "Migrated owner not registered yet");
            report.unresolved += 1;
            return Ok(());
        }
        Err(err) => {
            warn!(association_id = %association.id, error = %err, "Identity lookup failed, skipping");
            report.lookup_failed += 1;
            return Ok(());
        }
    };

    let by_id: Option<Association> = match store.find_by_company_and_user(
        &association.company_number,
        Some(&owner.user_id),
        None,
    ) {
        Ok(found) => found,
        Err(err) if err.is_connection_loss() => return Err(connection_lost(err)),
        Err(err) => {
            warn!(association_id = %association.id, error = %err, "Owner lookup failed");
            report.failed += 1;
            return Ok(());
        }
    };
    if let Some(survivor) = by_id {
        return merge_into(store, actor, association, &survivor, &owner, now, report);
    }

    let mut current: Association = association.clone();
    for attempt in 0..2 {
        let request = TransitionRequest::new(AssociationStatus::Confirmed)
            .with_resolved_owner(owner.clone());
        let result = match transition(
            &current,
            &request,
            actor,
            reconciler_cause(),
            &ActorContext::outsider(),
            now,
        ) {
            Ok(result) => result,
            Err(err) => {
                warn!(association_id = %current.id, error = %err, "Claim rejected");
                report.failed += 1;
                return Ok(());
            }
        };

        match store.insert_or_update(&result.association, Some(current.version)) {
            Ok(stored) => {
                log_audit_event(&result.audit_event);
                debug!(association_id = %stored.id, user_id = %owner.user_id, "Migrated association claimed");
                report.claimed += 1;
                return Ok(());
            }
            Err(PersistenceError::VersionConflict { .. }) if attempt == 0 => {
                match store.find_by_id(&current.id) {
                    Ok(Some(fresh)) if fresh.status == AssociationStatus::Migrated => {
                        current = fresh;
                    }
                    Ok(_) => {
                        report.conflicts += 1;
                        return Ok(());
                    }
                    Err(err) if err.is_connection_loss() => return Err(connection_lost(err)),
                    Err(err) => {
                        warn!(association_id = %current.id, error = %err, "Re-read failed");
                        report.failed += 1;
                        return Ok(());
                    }
                }
            }
            Err(PersistenceError::VersionConflict { .. }) => {
                report.conflicts += 1;
                return Ok(());
            }
            Err(err) if err.is_connection_loss() => return Err(connection_lost(err)),
            Err(err) => {
                warn!(association_id = %current.id, error = %err, "Claim could not be written");
                report.failed += 1;
                return Ok(());
            }
        }
    }

    Ok(())
}

/// Retires a placeholder whose owner already holds a record by user id.
///
/// A removed survivor is reopened as confirmed in the same write, so the
/// access the placeholder stood for is kept. Any other survivor is left as
/// it is.
///
/// # Errors
///
/// Returns an error only when the store connection is lost.
fn merge_into<S: AssociationStore + ?Sized>(
    store: &mut S,
    actor: &Actor,
    placeholder: &Association,
    survivor: &Association,
    owner: &UserDetails,
    now: OffsetDateTime,
    report: &mut ReconcileReport,
) -> Result<(), ApiError> {
    let reopened: Option<TransitionResult> = if survivor.status == AssociationStatus::Removed {
        match add(
            Some(survivor),
            &survivor.company_number,
            owner,
            actor,
            reconciler_cause(),
            now,
        ) {
            Ok(result) => Some(result),
            Err(err) => {
                warn!(association_id = %survivor.id, error = %err, "Reopen rejected");
                report.failed += 1;
                return Ok(());
            }
        }
    } else {
        None
    };

    let retired: TransitionResult =
        match retire_duplicate(placeholder, &survivor.id, actor, reconciler_cause(), now) {
            Ok(result) => result,
            Err(err) => {
                warn!(association_id = %placeholder.id, error = %err, "Merge rejected");
                report.failed += 1;
                return Ok(());
            }
        };

    let mut writes: Vec<(&Association, Option<i64>)> = Vec::with_capacity(2);
    if let Some(reopened) = &reopened {
        writes.push((&reopened.association, Some(survivor.version)));
    }
    writes.push((&retired.association, Some(placeholder.version)));

    match store.write_all(&writes) {
        Ok(_) => {
            if let Some(reopened) = &reopened {
                log_audit_event(&reopened.audit_event);
            }
            log_audit_event(&retired.audit_event);
            debug!(
                association_id = %placeholder.id,
                survivor_id = %survivor.id,
                "Migrated association merged into existing record"
            );
            report.merged += 1;
        }
        Err(PersistenceError::VersionConflict { .. }) => report.conflicts += 1,
        Err(err) if err.is_connection_loss() => return Err(connection_lost(err)),
        Err(err) => {
            warn!(association_id = %placeholder.id, error = %err, "Merge could not be written");
            report.failed += 1;
        }
    }
    Ok(())
}

/// Processes one page of migrated records after `cursor`.
///
/// Returns the cursor for the next page, or `None` when the walk is done.
///
/// # Errors
///
/// Returns an error if the page cannot be listed or the store is lost.
pub fn reconcile_page<S, I>(
    store: &mut S,
    identity: &I,
    actor: &Actor,
    cursor: Option<&str>,
    page_size: i64,
    now: OffsetDateTime,
    report: &mut ReconcileReport,
) -> Result<Option<String>, ApiError>
where
    S: AssociationStore + ?Sized,
    I: IdentityGateway + ?Sized,
{
    if page_size <= 0 {
        return Err(ApiError::InvalidInput {
            field: String::from("page_size"),
            message: format!("Reconciliation page size must be greater than 0, got {page_size}"),
        });
    }

    let page: Vec<Association> = store
        .list_by_status_after(AssociationStatus::Migrated, cursor, page_size)
        .map_err(translate_persistence_error)?;

    for association in &page {
        claim_one(store, identity, actor, association, now, report)?;
    }

    let full_page: bool = i64::try_from(page.len()).unwrap_or(i64::MAX) >= page_size;
    Ok(if full_page {
        page.last().map(|association| association.id.clone())
    } else {
        None
    })
}

/// Reconciles every migrated record, one page at a time.
///
/// # Arguments
///
/// * `store` - The association store
/// * `identity` - Resolves migrated emails to users
/// * `actor` - The elevated API key claims are made as
/// * `page_size` - Records per page
/// * `now` - The instant claims are stamped with
///
/// # Errors
///
/// Returns an error if a page cannot be listed or the store is lost.
pub fn reconcile_batch<S, I>(
    store: &mut S,
    identity: &I,
    actor: &Actor,
    page_size: i64,
    now: OffsetDateTime,
) -> Result<ReconcileReport, ApiError>
where
    S: AssociationStore + ?Sized,
    I: IdentityGateway + ?Sized,
{
    let mut report = ReconcileReport::default();
    let mut cursor: Option<String> = None;

    loop {
        cursor = reconcile_page(
            store,
            identity,
            actor,
            cursor.as_deref(),
            page_size,
            now,
            &mut report,
        )?;
        if cursor.is_none() {
            break;
        }
    }

    info!(
        scanned = report.scanned,
        claimed = report.claimed,
        merged = report.merged,
        unresolved = report.unresolved,
        lookup_failed = report.lookup_failed,
        conflicts = report.conflicts,
        failed = report.failed,
        "Migration reconciliation finished"
    );
    Ok(report)
}
