// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Background migration reconciliation.
//!
//! The store lock is taken once per page, so live requests interleave with
//! a long walk instead of waiting for all of it.

use std::time::Duration;

use company_assoc_api::{ApiError, ReconcileReport, reconcile_page};
use company_assoc_audit::Actor;
use time::OffsetDateTime;
use tracing::{error, info};

use crate::AppState;

/// Identity the periodic reconciler acts as.
pub const RECONCILER_ID: &str = "migration-reconciler";

/// Walks every migrated association once.
///
/// # Errors
///
/// Returns an error if the page size is invalid or the store is lost.
pub async fn run_reconciliation(
    state: &AppState,
    actor: &Actor,
    page_size: i64,
) -> Result<ReconcileReport, ApiError> {
    let mut report = ReconcileReport::default();
    let mut cursor: Option<String> = None;

    loop {
        cursor = {
            let mut persistence = state.persistence.lock().await;
            reconcile_page(
                &mut *persistence,
                state.directory.as_ref(),
                actor,
                cursor.as_deref(),
                page_size,
                OffsetDateTime::now_utc(),
                &mut report,
            )?
        };
        if cursor.is_none() {
            break;
        }
        tokio::task::yield_now().await;
    }

    info!(
        scanned = report.scanned,
        claimed = report.claimed,
        unresolved = report.unresolved,
        merged = report.merged,
        lookup_failed = report.lookup_failed,
        conflicts = report.conflicts,
        failed = report.failed,
        "Migration reconciliation finished"
    );
    Ok(report)
}

/// Runs reconciliation every `interval` for the life of the process.
pub fn spawn_periodic(state: AppState, interval: Duration, page_size: i64) {
    info!(
        interval_secs = interval.as_secs(),
        page_size, "Starting periodic migration reconciliation"
    );
    tokio::spawn(async move {
        let actor: Actor = Actor::elevated_api_key(String::from(RECONCILER_ID));
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(err) = run_reconciliation(&state, &actor, page_size).await {
                error!(error = %err, "Migration reconciliation aborted");
            }
        }
    });
}
