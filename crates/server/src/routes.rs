// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! HTTP handlers and the route table.
//!
//! Handlers hold the store lock only for the synchronous api call. Emails
//! owed by a committed change are sent from a spawned task after the
//! response is built.

use axum::{
    Json, Router,
    extract::{Path, Query, State as AxumState},
    http::StatusCode,
    routing::{get, post},
};
use company_assoc::Notification;
use company_assoc_api::{
    ActiveInvitation, AssociationChangeResponse, CommittedChange, CompanyAssociationsQuery,
    CreateAssociationRequest, ImportMigratedRequest, ImportMigratedResponse, InviteUserRequest,
    PageQuery, ReconcileReport, UpdateStatusRequest, UserAssociationsQuery, create_association,
    dispatch, get_association, import_migrated, invite_user, list_active_invitations,
    list_company_associations, list_previous_states, list_user_associations,
    update_association_status,
};
use company_assoc_domain::{Association, AssociationStatus, Page, PageRequest, PreviousState};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::info;

use crate::AppState;
use crate::caller::Caller;
use crate::error::HttpError;
use crate::reconciler::run_reconciliation;

/// Query parameters for a reconciliation run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReconcileQuery {
    pub page_size: Option<i64>,
}

/// API response for a reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileResponse {
    pub scanned: usize,
    pub claimed: usize,
    pub merged: usize,
    pub unresolved: usize,
    pub lookup_failed: usize,
    pub conflicts: usize,
    pub failed: usize,
}

impl From<ReconcileReport> for ReconcileResponse {
    fn from(report: ReconcileReport) -> Self {
        Self {
            scanned: report.scanned,
            claimed: report.claimed,
            merged: report.merged,
            unresolved: report.unresolved,
            lookup_failed: report.lookup_failed,
            conflicts: report.conflicts,
            failed: report.failed,
        }
    }
}

/// Hands a committed change's emails to a background task.
fn spawn_dispatch(state: &AppState, notifications: Vec<Notification>) {
    if notifications.is_empty() {
        return;
    }
    let state: AppState = state.clone();
    tokio::spawn(async move {
        let mut persistence = state.persistence.lock().await;
        dispatch(
            &mut *persistence,
            state.directory.as_ref(),
            state.directory.as_ref(),
            state.transport.as_ref(),
            &notifications,
        );
    });
}

fn change_response(
    state: &AppState,
    change: CommittedChange,
    message: String,
) -> Json<AssociationChangeResponse> {
    spawn_dispatch(state, change.notifications);
    Json(AssociationChangeResponse {
        association: change.association,
        message,
    })
}

/// Handler for POST `/associations`.
///
/// Adds a user to a company through the auth-code route.
async fn handle_create_association(
    AxumState(state): AxumState<AppState>,
    caller: Caller,
    Json(req): Json<CreateAssociationRequest>,
) -> Result<(StatusCode, Json<AssociationChangeResponse>), HttpError> {
    info!(
        caller = %caller.actor.id,
        company_number = %req.company_number,
        user_id = %req.user_id,
        "Handling create_association request"
    );

    let mut persistence = state.persistence.lock().await;
    let change: CommittedChange = create_association(
        &mut *persistence,
        state.directory.as_ref(),
        state.directory.as_ref(),
        &req,
        &caller.actor,
        &caller.cause("Add association with auth code"),
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    let message: String = format!(
        "Associated user {} with company {}",
        req.user_id, req.company_number
    );
    Ok((StatusCode::CREATED, change_response(&state, change, message)))
}

/// Handler for GET `/associations`.
///
/// Lists the caller's own associations.
async fn handle_list_user_associations(
    AxumState(state): AxumState<AppState>,
    caller: Caller,
    Query(query): Query<UserAssociationsQuery>,
) -> Result<Json<Page<Association>>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    let page = list_user_associations(&mut *persistence, &caller.actor, &query)?;
    drop(persistence);
    Ok(Json(page))
}

/// Handler for GET `/associations/{association_id}`.
async fn handle_get_association(
    AxumState(state): AxumState<AppState>,
    caller: Caller,
    Path(association_id): Path<String>,
) -> Result<Json<Association>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    let association = get_association(&mut *persistence, &caller.actor, &association_id)?;
    drop(persistence);
    Ok(Json(association))
}

/// Handler for PATCH `/associations/{association_id}`.
async fn handle_update_status(
    AxumState(state): AxumState<AppState>,
    caller: Caller,
    Path(association_id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<AssociationChangeResponse>, HttpError> {
    let requested: AssociationStatus = req.requested_status()?;
    info!(
        caller = %caller.actor.id,
        association_id = %association_id,
        requested = %requested,
        "Handling update_status request"
    );

    let mut persistence = state.persistence.lock().await;
    let change: CommittedChange = update_association_status(
        &mut *persistence,
        state.directory.as_ref(),
        &caller.actor,
        &association_id,
        requested,
        &caller.cause("Update association status"),
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    let message: String = format!(
        "Association {association_id} is now {}",
        change.association.status
    );
    Ok(change_response(&state, change, message))
}

/// Handler for GET `/associations/{association_id}/previous-states`.
async fn handle_list_previous_states(
    AxumState(state): AxumState<AppState>,
    caller: Caller,
    Path(association_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<PreviousState>>, HttpError> {
    let page: PageRequest = query.page_request()?;
    let mut persistence = state.persistence.lock().await;
    let states = list_previous_states(&mut *persistence, &caller.actor, &association_id, page)?;
    drop(persistence);
    Ok(Json(states))
}

/// Handler for GET `/companies/{company_number}/associations`.
async fn handle_list_company_associations(
    AxumState(state): AxumState<AppState>,
    caller: Caller,
    Path(company_number): Path<String>,
    Query(query): Query<CompanyAssociationsQuery>,
) -> Result<Json<Page<Association>>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    let page = list_company_associations(
        &mut *persistence,
        state.directory.as_ref(),
        &caller.actor,
        &company_number,
        &query,
    )?;
    drop(persistence);
    Ok(Json(page))
}

/// Handler for POST `/associations/invitations`.
async fn handle_invite_user(
    AxumState(state): AxumState<AppState>,
    caller: Caller,
    Json(req): Json<InviteUserRequest>,
) -> Result<(StatusCode, Json<AssociationChangeResponse>), HttpError> {
    info!(
        caller = %caller.actor.id,
        company_number = %req.company_number,
        "Handling invite_user request"
    );

    let mut persistence = state.persistence.lock().await;
    let change: CommittedChange = invite_user(
        &mut *persistence,
        state.directory.as_ref(),
        state.directory.as_ref(),
        &req,
        &caller.actor,
        &caller.cause("Invite user"),
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    let message: String = format!(
        "Invited {} to company {}",
        req.invitee_email, req.company_number
    );
    Ok((StatusCode::CREATED, change_response(&state, change, message)))
}

/// Handler for GET `/associations/invitations`.
async fn handle_list_active_invitations(
    AxumState(state): AxumState<AppState>,
    caller: Caller,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<ActiveInvitation>>, HttpError> {
    let page: PageRequest = query.page_request()?;
    let mut persistence = state.persistence.lock().await;
    let invitations = list_active_invitations(
        &mut *persistence,
        &caller.actor,
        page,
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);
    Ok(Json(invitations))
}

/// Handler for POST `/internal/migrations`.
///
/// Responds 201 when a record was created and 200 when one already existed.
async fn handle_import_migrated(
    AxumState(state): AxumState<AppState>,
    caller: Caller,
    Json(req): Json<ImportMigratedRequest>,
) -> Result<(StatusCode, Json<ImportMigratedResponse>), HttpError> {
    let mut persistence = state.persistence.lock().await;
    let response: ImportMigratedResponse = import_migrated(
        &mut *persistence,
        state.directory.as_ref(),
        &caller.actor,
        &req,
        &caller.cause("Import migrated association"),
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    let status: StatusCode = if response.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(response)))
}

/// Handler for POST `/internal/reconcile`.
///
/// Runs one reconciliation pass as the calling elevated key.
async fn handle_reconcile(
    AxumState(state): AxumState<AppState>,
    caller: Caller,
    Query(query): Query<ReconcileQuery>,
) -> Result<Json<ReconcileResponse>, HttpError> {
    if !caller.actor.is_elevated_api_key() {
        return Err(HttpError {
            status: StatusCode::FORBIDDEN,
            message: String::from("Only elevated API keys may run reconciliation"),
        });
    }
    let page_size: i64 = query.page_size.unwrap_or(state.reconcile_page_size);
    let report = run_reconciliation(&state, &caller.actor, page_size).await?;
    Ok(Json(report.into()))
}

/// Builds the application router with all endpoints.
pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/associations",
            post(handle_create_association).get(handle_list_user_associations),
        )
        .route(
            "/associations/invitations",
            post(handle_invite_user).get(handle_list_active_invitations),
        )
        .route(
            "/associations/{association_id}",
            get(handle_get_association).patch(handle_update_status),
        )
        .route(
            "/associations/{association_id}/previous-states",
            get(handle_list_previous_states),
        )
        .route(
            "/companies/{company_number}/associations",
            get(handle_list_company_associations),
        )
        .route("/internal/migrations", post(handle_import_migrated))
        .route("/internal/reconcile", post(handle_reconcile))
        .with_state(app_state)
}
