// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API boundary for company associations.
//!
//! Validates requests, gathers what the core needs from the store and the
//! directories, runs the core, and commits the result with optimistic
//! retries. Notification dispatch and migration reconciliation live here
//! too, since both talk to collaborators the core never sees.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod dispatch;
mod error;
mod gateways;
mod handlers;
mod reconcile;
mod request_response;

#[cfg(test)]
mod tests;

pub use dispatch::{DispatchReport, dispatch};
pub use error::{
    ApiError, translate_core_error, translate_domain_error, translate_gateway_error,
    translate_key_collision, translate_persistence_error,
};
pub use gateways::{
    CompanyGateway, EmailPayload, GatewayError, IdentityGateway, NotificationTransport,
    TransportError, resolve_user_by_email,
};
pub use handlers::{
    CommittedChange, SCAN_PAGE_SIZE, collect_all_pages, create_association, get_association,
    import_migrated, invite_user, list_active_invitations, list_company_associations,
    list_previous_states, list_user_associations, log_audit_event, update_association_status,
};
pub use reconcile::{ReconcileReport, reconcile_batch, reconcile_page};
pub use request_response::{
    ActiveInvitation, AssociationChangeResponse, CompanyAssociationsQuery,
    CreateAssociationRequest, ImportMigratedRequest, ImportMigratedResponse, InviteUserRequest,
    PageQuery, UpdateStatusRequest, UserAssociationsQuery, parse_status_filter,
};
