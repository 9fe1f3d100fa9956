// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Caller extraction at the server boundary.
//!
//! Authentication happens upstream. The gateway in front of this service
//! forwards who the caller is in a fixed set of headers, and this module
//! turns them into an `Actor`.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use company_assoc_audit::{Actor, Cause};
use company_assoc_domain::normalize_email;
use tracing::{debug, warn};

use crate::error::ErrorResponse;

pub const CALLER_ID: &str = "x-caller-id";
pub const CALLER_TYPE: &str = "x-caller-type";
pub const CALLER_EMAIL: &str = "x-caller-email";
pub const CALLER_NAME: &str = "x-caller-name";
pub const CALLER_ROLES: &str = "x-caller-roles";
pub const CALLER_KEY_SCOPE: &str = "x-caller-key-scope";
pub const REQUEST_ID: &str = "x-request-id";

/// The authenticated caller of a request.
///
/// # Errors
///
/// Extraction fails with 401 if:
/// - `X-Caller-Id` or `X-Caller-Type` is missing
/// - The caller type is not `user` or `api-key`
/// - A user caller has no `X-Caller-Email`
/// - `X-Caller-Roles` or `X-Caller-Key-Scope` holds an unknown value
#[derive(Debug, Clone)]
pub struct Caller {
    pub actor: Actor,
    pub request_id: Option<String>,
}

impl Caller {
    /// Builds the cause for an operation performed on behalf of this caller.
    #[must_use]
    pub fn cause(&self, description: &str) -> Cause {
        Cause::new(
            self.request_id
                .clone()
                .unwrap_or_else(|| String::from("untracked")),
            description.to_string(),
        )
    }
}

/// Caller extraction errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallerError {
    /// A required header is absent or empty.
    MissingHeader(&'static str),
    /// A header is present but its value is not understood.
    InvalidHeader {
        header: &'static str,
        value: String,
    },
}

impl std::fmt::Display for CallerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingHeader(header) => write!(f, "Missing caller header '{header}'"),
            Self::InvalidHeader { header, value } => {
                write!(f, "Invalid value '{value}' for caller header '{header}'")
            }
        }
    }
}

impl IntoResponse for CallerError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.to_string(),
        });
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<Option<&'a str>, CallerError> {
    headers.get(name).map_or(Ok(None), |value| {
        value
            .to_str()
            .map(|v| Some(v.trim()).filter(|v| !v.is_empty()))
            .map_err(|_| CallerError::InvalidHeader {
                header: name,
                value: String::from("<non-ascii>"),
            })
    })
}

fn required<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, CallerError> {
    header(headers, name)?.ok_or(CallerError::MissingHeader(name))
}

/// Builds the actor described by the caller headers.
///
/// # Errors
///
/// Returns a `CallerError` if the headers do not describe a valid caller.
pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, CallerError> {
    let id: &str = required(headers, CALLER_ID)?;
    let caller_type: &str = required(headers, CALLER_TYPE)?;

    let mut actor: Actor = match caller_type {
        "user" => {
            let email: &str = required(headers, CALLER_EMAIL)?;
            Actor::user(id.to_string(), normalize_email(email))
        }
        "api-key" => match header(headers, CALLER_KEY_SCOPE)? {
            None | Some("standard") => Actor::api_key(id.to_string()),
            Some("elevated") => Actor::elevated_api_key(id.to_string()),
            Some(other) => {
                return Err(CallerError::InvalidHeader {
                    header: CALLER_KEY_SCOPE,
                    value: other.to_string(),
                });
            }
        },
        other => {
            return Err(CallerError::InvalidHeader {
                header: CALLER_TYPE,
                value: other.to_string(),
            });
        }
    };

    if let Some(name) = header(headers, CALLER_NAME)? {
        actor = actor.with_display_name(name.to_string());
    }

    if let Some(roles) = header(headers, CALLER_ROLES)? {
        for role in roles.split(',').map(str::trim).filter(|r| !r.is_empty()) {
            actor = match role {
                "admin-read" => actor.with_admin_read(),
                "admin-update" => actor.with_admin_update(),
                other => {
                    return Err(CallerError::InvalidHeader {
                        header: CALLER_ROLES,
                        value: other.to_string(),
                    });
                }
            };
        }
    }

    Ok(actor)
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = CallerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor: Actor = actor_from_headers(&parts.headers).map_err(|e| {
            warn!(error = %e, "Rejecting request without a valid caller");
            e
        })?;
        let request_id: Option<String> = header(&parts.headers, REQUEST_ID)
            .ok()
            .flatten()
            .map(str::to_string);

        debug!(caller = %actor.id, kind = %actor.kind, "Caller identified");
        Ok(Self { actor, request_id })
    }
}
