// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test fakes and fixtures.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use company_assoc::EmailKind;
use company_assoc_audit::{Actor, Cause};
use company_assoc_domain::{
    ApprovalRoute, Association, AssociationStatus, CompanyDetails, Page, PageRequest, UserDetails,
};
use company_assoc_persistence::{AssociationStore, Persistence, PersistenceError};
use time::{Duration, OffsetDateTime, macros::datetime};

use crate::gateways::{
    CompanyGateway, EmailPayload, GatewayError, IdentityGateway, NotificationTransport,
    TransportError,
};

pub const COMPANY: &str = "111111";
pub const OTHER_COMPANY: &str = "222222";

pub fn now() -> OffsetDateTime {
    datetime!(2026-03-01 12:00 UTC)
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("api-req-456"), String::from("API request"))
}

pub fn batman_details() -> UserDetails {
    UserDetails::new(
        String::from("111"),
        String::from("batman@gotham.city"),
        Some(String::from("Batman")),
    )
}

pub fn robin_details() -> UserDetails {
    UserDetails::new(
        String::from("222"),
        String::from("robin@gotham.city"),
        Some(String::from("Robin")),
    )
}

pub fn alfred_details() -> UserDetails {
    UserDetails::new(String::from("333"), String::from("alfred@wayne.manor"), None)
}

fn as_actor(user: &UserDetails) -> Actor {
    let actor = Actor::user(user.user_id.clone(), user.email.clone());
    match &user.display_name {
        Some(name) => actor.with_display_name(name.clone()),
        None => actor,
    }
}

pub fn batman() -> Actor {
    as_actor(&batman_details())
}

pub fn robin() -> Actor {
    as_actor(&robin_details())
}

pub fn joker() -> Actor {
    Actor::user(String::from("999"), String::from("joker@arkham.asylum"))
}

pub fn admin() -> Actor {
    Actor::user(String::from("admin-1"), String::from("admin@companies.gov")).with_admin_update()
}

pub fn support_reader() -> Actor {
    Actor::user(String::from("support-1"), String::from("support@companies.gov"))
        .with_admin_read()
}

pub fn api_key() -> Actor {
    Actor::api_key(String::from("key-1"))
}

pub fn elevated_key() -> Actor {
    Actor::elevated_api_key(String::from("key-elevated"))
}

/// An in-memory user and company directory with switchable failures.
#[derive(Debug, Default)]
pub struct FakeDirectory {
    users: Vec<UserDetails>,
    companies: Vec<CompanyDetails>,
    /// Lookups by these ids or emails fail as unavailable.
    pub broken_keys: HashSet<String>,
    /// Email lookups without a match fail with `NotFound` instead of `[]`.
    pub not_found_as_error: bool,
}

impl FakeDirectory {
    /// Batman, Robin and Alfred, plus two companies.
    pub fn new() -> Self {
        Self {
            users: vec![batman_details(), robin_details(), alfred_details()],
            companies: vec![
                CompanyDetails::new(
                    String::from(COMPANY),
                    String::from("Wayne Enterprises"),
                    Some(String::from("active")),
                ),
                CompanyDetails::new(
                    String::from(OTHER_COMPANY),
                    String::from("Gotham Gazette"),
                    Some(String::from("active")),
                ),
            ],
            broken_keys: HashSet::new(),
            not_found_as_error: false,
        }
    }

    pub fn breaking(mut self, key: &str) -> Self {
        self.broken_keys.insert(key.to_string());
        self
    }
}

impl IdentityGateway for FakeDirectory {
    fn resolve_by_id(&self, user_id: &str) -> Result<UserDetails, GatewayError> {
        if self.broken_keys.contains(user_id) {
            return Err(GatewayError::Unavailable(format!("lookup of {user_id} timed out")));
        }
        self.users
            .iter()
            .find(|user| user.user_id == user_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(user_id.to_string()))
    }

    fn resolve_by_email(&self, email: &str) -> Result<Vec<UserDetails>, GatewayError> {
        if self.broken_keys.contains(email) {
            return Err(GatewayError::Unavailable(format!("lookup of {email} timed out")));
        }
        let found: Vec<UserDetails> = self
            .users
            .iter()
            .filter(|user| user.email.eq_ignore_ascii_case(email))
            .cloned()
            .collect();
        if found.is_empty() && self.not_found_as_error {
            return Err(GatewayError::NotFound(email.to_string()));
        }
        Ok(found)
    }
}

impl CompanyGateway for FakeDirectory {
    fn resolve_company(&self, company_number: &str) -> Result<CompanyDetails, GatewayError> {
        if self.broken_keys.contains(company_number) {
            return Err(GatewayError::Unavailable(String::from("company directory down")));
        }
        self.companies
            .iter()
            .find(|company| company.company_number == company_number)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(company_number.to_string()))
    }
}

/// Records every publish; rejects emails to the addresses in `reject`.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub published: Mutex<Vec<(EmailKind, EmailPayload)>>,
    pub reject: HashSet<String>,
}

impl RecordingTransport {
    pub fn rejecting(address: &str) -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            reject: HashSet::from([address.to_string()]),
        }
    }

    pub fn sent(&self) -> Vec<(EmailKind, EmailPayload)> {
        self.published.lock().unwrap().clone()
    }

    pub fn kinds_to(&self, address: &str) -> Vec<EmailKind> {
        self.sent()
            .into_iter()
            .filter(|(_, payload)| payload.to == address)
            .map(|(kind, _)| kind)
            .collect()
    }
}

impl NotificationTransport for RecordingTransport {
    fn publish(&self, kind: EmailKind, payload: &EmailPayload) -> Result<(), TransportError> {
        if self.reject.contains(&payload.to) {
            return Err(TransportError::Rejected {
                kind,
                message: String::from("mailbox unavailable"),
            });
        }
        self.published
            .lock()
            .unwrap()
            .push((kind, payload.clone()));
        Ok(())
    }
}

type Race = Box<dyn FnOnce(&mut Persistence)>;

/// Wraps a real store and injects faults into it.
pub struct FaultyStore {
    pub inner: Persistence,
    /// Writes rejected with a version conflict before any reach the store.
    pub conflicts_to_inject: u32,
    /// Runs against the real store just before the first write.
    pub race: Option<Race>,
    /// Writes to these association ids fail with the given error.
    pub failing_writes: HashMap<String, PersistenceError>,
    /// Every write fails with this error.
    pub failing_all_writes: Option<PersistenceError>,
    /// Company listings fail with this error.
    pub failing_lists: Option<PersistenceError>,
    pub writes_attempted: u32,
}

impl FaultyStore {
    pub fn new(inner: Persistence) -> Self {
        Self {
            inner,
            conflicts_to_inject: 0,
            race: None,
            failing_writes: HashMap::new(),
            failing_all_writes: None,
            failing_lists: None,
            writes_attempted: 0,
        }
    }
}

impl AssociationStore for FaultyStore {
    fn find_by_id(&mut self, association_id: &str) -> Result<Option<Association>, PersistenceError> {
        self.inner.find_by_id(association_id)
    }

    fn find_by_company_and_user(
        &mut self,
        company_number: &str,
        user_id: Option<&str>,
        user_email: Option<&str>,
    ) -> Result<Option<Association>, PersistenceError> {
        self.inner
            .find_by_company_and_user(company_number, user_id, user_email)
    }

    fn list_by_company(
        &mut self,
        company_number: &str,
        statuses: &[AssociationStatus],
        page: PageRequest,
    ) -> Result<Page<Association>, PersistenceError> {
        if let Some(err) = &self.failing_lists {
            return Err(err.clone());
        }
        self.inner.list_by_company(company_number, statuses, page)
    }

    fn list_by_user(
        &mut self,
        user_id: Option<&str>,
        user_email: Option<&str>,
        statuses: &[AssociationStatus],
        company_prefix: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Association>, PersistenceError> {
        self.inner
            .list_by_user(user_id, user_email, statuses, company_prefix, page)
    }

    fn list_by_status_after(
        &mut self,
        status: AssociationStatus,
        after_id: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Association>, PersistenceError> {
        self.inner.list_by_status_after(status, after_id, limit)
    }

    fn write_all(
        &mut self,
        writes: &[(&Association, Option<i64>)],
    ) -> Result<Vec<Association>, PersistenceError> {
        self.writes_attempted += 1;
        if let Some(race) = self.race.take() {
            race(&mut self.inner);
        }
        if self.conflicts_to_inject > 0
            && let Some(&(association, expected_version)) = writes.first()
        {
            self.conflicts_to_inject -= 1;
            return Err(PersistenceError::VersionConflict {
                association_id: association.id.clone(),
                expected_version: expected_version.unwrap_or_default(),
            });
        }
        for &(association, _) in writes {
            if let Some(err) = self
                .failing_all_writes
                .as_ref()
                .or_else(|| self.failing_writes.get(&association.id))
            {
                return Err(err.clone());
            }
        }
        self.inner.write_all(writes)
    }
}

/// Inserts a confirmed, auth-code association for `user`.
pub fn seed_confirmed(
    store: &mut Persistence,
    id: &str,
    company_number: &str,
    user: &UserDetails,
) -> Association {
    let mut association = Association::new(
        id.to_string(),
        company_number.to_string(),
        Some(user.user_id.clone()),
        None,
        AssociationStatus::Confirmed,
        ApprovalRoute::AuthCode,
        format!("etag-{id}"),
        now() - Duration::days(30),
    );
    association.approved_at = Some(now() - Duration::days(30));
    store.insert_or_update(&association, None).unwrap()
}

/// Inserts an awaiting-approval association for `user`, invited by `inviter` at `invited_at`.
pub fn seed_awaiting(
    store: &mut Persistence,
    id: &str,
    company_number: &str,
    user: &UserDetails,
    inviter: &str,
    invited_at: OffsetDateTime,
) -> Association {
    let mut association = Association::new(
        id.to_string(),
        company_number.to_string(),
        Some(user.user_id.clone()),
        None,
        AssociationStatus::AwaitingApproval,
        ApprovalRoute::Invitation,
        format!("etag-{id}"),
        invited_at,
    );
    association.push_invitation(inviter.to_string(), invited_at);
    store.insert_or_update(&association, None).unwrap()
}

/// Inserts a migrated association keyed by `email`.
pub fn seed_migrated(
    store: &mut Persistence,
    id: &str,
    company_number: &str,
    email: &str,
) -> Association {
    let association = Association::new(
        id.to_string(),
        company_number.to_string(),
        None,
        Some(email.to_string()),
        AssociationStatus::Migrated,
        ApprovalRoute::Migration,
        format!("etag-{id}"),
        now() - Duration::days(365),
    );
    store.insert_or_update(&association, None).unwrap()
}

/// A store where Batman is a confirmed member of `COMPANY`.
pub fn store_with_batman() -> Persistence {
    let mut store = Persistence::new_in_memory().unwrap();
    seed_confirmed(&mut store, "1", COMPANY, &batman_details());
    store
}
