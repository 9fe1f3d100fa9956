// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]


use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, Response, request::Builder},
};
use company_assoc::EmailKind;
use company_assoc_api::{EmailPayload, NotificationTransport, TransportError};
use company_assoc_domain::{ApprovalRoute, Association, AssociationStatus};
use company_assoc_persistence::{AssociationStore, Persistence};
use serde::de::DeserializeOwned;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tower::ServiceExt;

use crate::AppState;
use crate::caller::{
    CALLER_EMAIL, CALLER_ID, CALLER_KEY_SCOPE, CALLER_NAME, CALLER_TYPE, REQUEST_ID,
};
use crate::directory::DirectoryFile;
use crate::routes::build_router;

pub const COMPANY: &str = "111111";

const DIRECTORY: &str = r#"{
    "users": [
        { "userId": "111", "email": "batman@gotham.city", "displayName": "Batman" },
        { "userId": "222", "email": "robin@gotham.city", "displayName": "Robin" }
    ],
    "companies": [
        { "companyNumber": "111111", "companyName": "Wayne Enterprises" }
    ]
}"#;

/// Records published emails.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub published: StdMutex<Vec<(EmailKind, String)>>,
}

impl RecordingTransport {
    pub fn sent(&self) -> Vec<(EmailKind, String)> {
        self.published.lock().unwrap().clone()
    }
}

impl NotificationTransport for RecordingTransport {
    fn publish(&self, kind: EmailKind, payload: &EmailPayload) -> Result<(), TransportError> {
        self.published
            .lock()
            .unwrap()
            .push((kind, payload.to.clone()));
        Ok(())
    }
}

/// Test harness: a router over an in-memory store where Batman is a
/// confirmed member of `COMPANY`.
pub struct TestServer {
    pub app: Router,
    pub transport: Arc<RecordingTransport>,
}

impl TestServer {
    pub fn new() -> Self {
        let mut persistence = Persistence::new_in_memory().unwrap();
        let mut batman = Association::new(
            String::from("1"),
            String::from(COMPANY),
            Some(String::from("111")),
            None,
            AssociationStatus::Confirmed,
            ApprovalRoute::AuthCode,
            String::from("etag-1"),
            OffsetDateTime::now_utc(),
        );
        batman.approved_at = Some(OffsetDateTime::now_utc());
        persistence.insert_or_update(&batman, None).unwrap();

        let transport = Arc::new(RecordingTransport::default());
        let state = AppState {
            persistence: Arc::new(Mutex::new(persistence)),
            directory: Arc::new(DirectoryFile::from_json(DIRECTORY).unwrap()),
            transport: transport.clone(),
            reconcile_page_size: 10,
        };
        Self {
            app: build_router(state),
            transport,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    /// Waits for the background dispatcher to publish `count` emails.
    pub async fn wait_for_emails(&self, count: usize) -> Vec<(EmailKind, String)> {
        for _ in 0..200 {
            let sent = self.transport.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.transport.sent()
    }
}

pub fn as_user(builder: Builder, id: &str, email: &str, name: &str) -> Builder {
    builder
        .header(CALLER_ID, id)
        .header(CALLER_TYPE, "user")
        .header(CALLER_EMAIL, email)
        .header(CALLER_NAME, name)
        .header(REQUEST_ID, "req-1")
}

pub fn as_batman(builder: Builder) -> Builder {
    as_user(builder, "111", "batman@gotham.city", "Batman")
}

pub fn as_robin(builder: Builder) -> Builder {
    as_user(builder, "222", "robin@gotham.city", "Robin")
}

pub fn as_api_key(builder: Builder) -> Builder {
    builder.header(CALLER_ID, "key-1").header(CALLER_TYPE, "api-key")
}

pub fn as_elevated_key(builder: Builder) -> Builder {
    as_api_key(builder).header(CALLER_KEY_SCOPE, "elevated")
}

pub fn json_request(builder: Builder, method: &str, uri: &str, body: &serde_json::Value) -> Request<Body> {
    builder
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(builder: Builder, method: &str, uri: &str) -> Request<Body> {
    builder.method(method).uri(uri).body(Body::empty()).unwrap()
}

pub async fn read_json<T: DeserializeOwned>(response: Response<Body>) -> T {
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body_bytes).unwrap()
}
