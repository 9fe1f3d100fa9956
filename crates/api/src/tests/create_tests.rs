// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use company_assoc::{EmailKind, Recipient};
use company_assoc_domain::{ApprovalRoute, Association, AssociationStatus};
use company_assoc_persistence::{AssociationStore, Persistence, PersistenceError};

use super::helpers::{
    COMPANY, FakeDirectory, FaultyStore, admin, api_key, batman, batman_details,
    create_test_cause, elevated_key, now, robin_details, seed_confirmed, seed_migrated,
    store_with_batman,
};
use crate::{
    ApiError, CreateAssociationRequest, ImportMigratedRequest, create_association,
    import_migrated,
};

fn add_robin() -> CreateAssociationRequest {
    CreateAssociationRequest {
        company_number: String::from(COMPANY),
        user_id: String::from("222"),
    }
}

#[test]
fn test_api_key_adds_user_through_auth_code() {
    let mut store = store_with_batman();
    let directory = FakeDirectory::new();

    let change = create_association(
        &mut store,
        &directory,
        &directory,
        &add_robin(),
        &api_key(),
        &create_test_cause(),
        now(),
    )
    .unwrap();

    assert_eq!(change.association.status, AssociationStatus::Confirmed);
    assert_eq!(change.association.approval_route, ApprovalRoute::AuthCode);
    assert_eq!(change.association.user_id.as_deref(), Some("222"));
    assert_eq!(change.association.approved_at, Some(now()));
    assert_eq!(change.notifications.len(), 1);
    assert_eq!(change.notifications[0].kind, EmailKind::AuthCodeConfirmation);
    assert!(matches!(
        change.notifications[0].recipient,
        Recipient::CompanyMembers { ref exclude_association_id } if *exclude_association_id == change.association.id
    ));

    let stored = store
        .find_by_company_and_user(COMPANY, Some("222"), None)
        .unwrap()
        .unwrap();
    assert_eq!(stored, change.association);
}

#[test]
fn test_admin_may_add_but_member_may_not() {
    let mut store = store_with_batman();
    let directory = FakeDirectory::new();

    let result = create_association(
        &mut store,
        &directory,
        &directory,
        &add_robin(),
        &batman(),
        &create_test_cause(),
        now(),
    );
    assert!(matches!(
        result,
        Err(ApiError::Forbidden { ref role, .. }) if role == "stranger"
    ));

    let change = create_association(
        &mut store,
        &directory,
        &directory,
        &add_robin(),
        &admin(),
        &create_test_cause(),
        now(),
    )
    .unwrap();
    assert_eq!(change.association.status, AssociationStatus::Confirmed);
}

#[test]
fn test_add_rejects_unknown_company_and_user() {
    let mut store = store_with_batman();
    let directory = FakeDirectory::new();

    let unknown_company = CreateAssociationRequest {
        company_number: String::from("999999"),
        user_id: String::from("222"),
    };
    let result = create_association(
        &mut store,
        &directory,
        &directory,
        &unknown_company,
        &api_key(),
        &create_test_cause(),
        now(),
    );
    assert!(matches!(
        result,
        Err(ApiError::ResourceNotFound { ref resource_type, .. }) if resource_type == "Company"
    ));

    let unknown_user = CreateAssociationRequest {
        company_number: String::from(COMPANY),
        user_id: String::from("404"),
    };
    let result = create_association(
        &mut store,
        &directory,
        &directory,
        &unknown_user,
        &api_key(),
        &create_test_cause(),
        now(),
    );
    assert!(matches!(
        result,
        Err(ApiError::ResourceNotFound { ref resource_type, .. }) if resource_type == "User"
    ));
}

#[test]
fn test_add_rejects_malformed_input() {
    let mut store = store_with_batman();
    let directory = FakeDirectory::new();

    let request = CreateAssociationRequest {
        company_number: String::from("bad!"),
        user_id: String::from("222"),
    };
    let result = create_association(
        &mut store,
        &directory,
        &directory,
        &request,
        &api_key(),
        &create_test_cause(),
        now(),
    );
    assert!(matches!(
        result,
        Err(ApiError::InvalidInput { ref field, .. }) if field == "company_number"
    ));
}

#[test]
fn test_add_rejects_confirmed_user() {
    let mut store = store_with_batman();
    let directory = FakeDirectory::new();
    let request = CreateAssociationRequest {
        company_number: String::from(COMPANY),
        user_id: batman_details().user_id,
    };

    let result = create_association(
        &mut store,
        &directory,
        &directory,
        &request,
        &api_key(),
        &create_test_cause(),
        now(),
    );

    assert!(matches!(
        result,
        Err(ApiError::DomainRuleViolation { ref rule, .. }) if rule == "single_active_association"
    ));
}

#[test]
fn test_add_reactivates_removed_association_in_place() {
    let mut store = store_with_batman();
    let directory = FakeDirectory::new();
    let mut removed = Association::new(
        String::from("7"),
        String::from(COMPANY),
        Some(robin_details().user_id),
        None,
        AssociationStatus::Removed,
        ApprovalRoute::Invitation,
        String::from("etag-7"),
        now(),
    );
    removed.removed_at = Some(now());
    store.insert_or_update(&removed, None).unwrap();

    let change = create_association(
        &mut store,
        &directory,
        &directory,
        &add_robin(),
        &api_key(),
        &create_test_cause(),
        now(),
    )
    .unwrap();

    assert_eq!(change.association.id, "7");
    assert_eq!(change.association.status, AssociationStatus::Confirmed);
    assert_eq!(change.association.removed_at, None);
    assert_eq!(change.association.previous_states.len(), 1);
    assert_eq!(
        change.association.previous_states[0].status,
        AssociationStatus::Removed
    );
    assert_eq!(
        change.audit_event.before.map(|snapshot| snapshot.status),
        Some(AssociationStatus::Removed)
    );
}

#[test]
fn test_add_retires_email_keyed_duplicate() {
    let mut store = store_with_batman();
    let directory = FakeDirectory::new();
    let mut removed = seed_confirmed(&mut store, "2", COMPANY, &robin_details());
    removed.status = AssociationStatus::Removed;
    removed.removed_at = Some(now());
    let version = removed.version;
    store.insert_or_update(&removed, Some(version)).unwrap();
    seed_migrated(&mut store, "18", COMPANY, "robin@gotham.city");

    let change = create_association(
        &mut store,
        &directory,
        &directory,
        &add_robin(),
        &api_key(),
        &create_test_cause(),
        now(),
    )
    .unwrap();

    assert_eq!(change.association.id, "2");
    assert_eq!(change.association.status, AssociationStatus::Confirmed);
    let retired = store.find_by_id("18").unwrap().unwrap();
    assert_eq!(retired.status, AssociationStatus::Removed);
    assert_eq!(
        store
            .find_by_company_and_user(COMPANY, None, Some("robin@gotham.city"))
            .unwrap()
            .map(|association| association.status),
        Some(AssociationStatus::Removed)
    );
}

#[test]
fn test_add_and_retirement_are_written_together() {
    let mut inner = store_with_batman();
    let mut removed = seed_confirmed(&mut inner, "2", COMPANY, &robin_details());
    removed.status = AssociationStatus::Removed;
    let version = removed.version;
    inner.insert_or_update(&removed, Some(version)).unwrap();
    seed_migrated(&mut inner, "18", COMPANY, "robin@gotham.city");
    let mut store = FaultyStore::new(inner);
    store.failing_writes.insert(
        String::from("18"),
        PersistenceError::QueryFailed(String::from("disk full")),
    );
    let directory = FakeDirectory::new();

    let result = create_association(
        &mut store,
        &directory,
        &directory,
        &add_robin(),
        &api_key(),
        &create_test_cause(),
        now(),
    );

    assert!(matches!(result, Err(ApiError::Internal { .. })));
    assert_eq!(
        store.inner.find_by_id("2").unwrap().unwrap().status,
        AssociationStatus::Removed
    );
    assert_eq!(
        store.inner.find_by_id("18").unwrap().unwrap().status,
        AssociationStatus::Migrated
    );
}

#[test]
fn test_add_surfaces_unavailable_directory() {
    let mut store = store_with_batman();
    let directory = FakeDirectory::new().breaking("222");

    let result = create_association(
        &mut store,
        &directory,
        &directory,
        &add_robin(),
        &api_key(),
        &create_test_cause(),
        now(),
    );

    assert!(matches!(
        result,
        Err(ApiError::Unavailable { ref collaborator, .. }) if collaborator == "User directory"
    ));
}

fn import_request(email: &str) -> ImportMigratedRequest {
    ImportMigratedRequest {
        company_number: String::from(COMPANY),
        user_email: email.to_string(),
    }
}

#[test]
fn test_import_creates_migrated_record_once() {
    let mut store = Persistence::new_in_memory().unwrap();

    let first = import_migrated(
        &mut store,
        &FakeDirectory::new(),
        &elevated_key(),
        &import_request("Mr.Freeze@Gotham.City"),
        &create_test_cause(),
        now(),
    )
    .unwrap();
    assert!(first.created);
    assert_eq!(first.association.status, AssociationStatus::Migrated);
    assert_eq!(first.association.approval_route, ApprovalRoute::Migration);
    assert_eq!(
        first.association.user_email.as_deref(),
        Some("mr.freeze@gotham.city")
    );
    assert_eq!(first.association.user_id, None);

    let second = import_migrated(
        &mut store,
        &FakeDirectory::new(),
        &elevated_key(),
        &import_request("mr.freeze@gotham.city"),
        &create_test_cause(),
        now(),
    )
    .unwrap();
    assert!(!second.created);
    assert_eq!(second.association.id, first.association.id);
}

#[test]
fn test_import_of_registered_users_email_returns_their_record() {
    let mut store = store_with_batman();
    let mut removed = seed_confirmed(&mut store, "2", COMPANY, &robin_details());
    removed.status = AssociationStatus::Removed;
    let version = removed.version;
    store.insert_or_update(&removed, Some(version)).unwrap();

    let response = import_migrated(
        &mut store,
        &FakeDirectory::new(),
        &elevated_key(),
        &import_request("Robin@Gotham.City"),
        &create_test_cause(),
        now(),
    )
    .unwrap();

    assert!(!response.created);
    assert_eq!(response.association.id, "2");
    assert!(
        store
            .find_by_company_and_user(COMPANY, None, Some("robin@gotham.city"))
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_import_of_registered_user_without_record_is_keyed_by_email() {
    let mut store = store_with_batman();

    let response = import_migrated(
        &mut store,
        &FakeDirectory::new(),
        &elevated_key(),
        &import_request("robin@gotham.city"),
        &create_test_cause(),
        now(),
    )
    .unwrap();

    assert!(response.created);
    assert_eq!(response.association.user_id, None);
    assert_eq!(
        response.association.user_email.as_deref(),
        Some("robin@gotham.city")
    );
}

#[test]
fn test_import_surfaces_unavailable_directory() {
    let mut store = FaultyStore::new(Persistence::new_in_memory().unwrap());

    let result = import_migrated(
        &mut store,
        &FakeDirectory::new().breaking("robin@gotham.city"),
        &elevated_key(),
        &import_request("robin@gotham.city"),
        &create_test_cause(),
        now(),
    );

    assert!(matches!(result, Err(ApiError::Unavailable { .. })));
    assert_eq!(store.writes_attempted, 0);
}

#[test]
fn test_import_requires_elevated_key() {
    let mut store = Persistence::new_in_memory().unwrap();

    for actor in [api_key(), admin(), batman()] {
        let result = import_migrated(
            &mut store,
            &FakeDirectory::new(),
            &actor,
            &import_request("mr.freeze@gotham.city"),
            &create_test_cause(),
            now(),
        );
        assert!(matches!(result, Err(ApiError::Forbidden { .. })));
    }
}

#[test]
fn test_import_returns_record_inserted_by_racing_writer() {
    let mut store = FaultyStore::new(Persistence::new_in_memory().unwrap());
    store.race = Some(Box::new(|inner: &mut Persistence| {
        seed_migrated(inner, "racer", COMPANY, "mr.freeze@gotham.city");
    }));

    let response = import_migrated(
        &mut store,
        &FakeDirectory::new(),
        &elevated_key(),
        &import_request("mr.freeze@gotham.city"),
        &create_test_cause(),
        now(),
    )
    .unwrap();

    assert!(!response.created);
    assert_eq!(response.association.id, "racer");
}

#[test]
fn test_import_rejects_malformed_email_without_writing() {
    let mut store = FaultyStore::new(Persistence::new_in_memory().unwrap());

    let result = import_migrated(
        &mut store,
        &FakeDirectory::new(),
        &elevated_key(),
        &import_request("not-an-email"),
        &create_test_cause(),
        now(),
    );

    assert!(matches!(
        result,
        Err(ApiError::InvalidInput { ref field, .. }) if field == "email"
    ));
    assert_eq!(store.writes_attempted, 0);
}

#[test]
fn test_import_surfaces_lost_store() {
    let mut store = FaultyStore::new(Persistence::new_in_memory().unwrap());
    store.failing_all_writes = Some(PersistenceError::DatabaseConnectionFailed(String::from(
        "connection reset",
    )));

    let result = import_migrated(
        &mut store,
        &FakeDirectory::new(),
        &elevated_key(),
        &import_request("mr.freeze@gotham.city"),
        &create_test_cause(),
        now(),
    );

    assert!(matches!(
        result,
        Err(ApiError::Unavailable { ref collaborator, .. }) if collaborator == "Association store"
    ));
    assert_eq!(store.writes_attempted, 1);
}
