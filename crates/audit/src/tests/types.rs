// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{Action, Actor, ActorKind, AuditEvent, Cause, StatusSnapshot};
use company_assoc_domain::AssociationStatus;
use time::macros::datetime;

#[test]
fn test_user_actor_has_no_flags() {
    let actor: Actor = Actor::user(String::from("111"), String::from("batman@gotham.city"));

    assert_eq!(actor.kind, ActorKind::User);
    assert_eq!(actor.user_id(), Some("111"));
    assert!(!actor.admin_read);
    assert!(!actor.admin_update);
    assert!(!actor.is_api_key());
}

#[test]
fn test_admin_update_implies_admin_read() {
    let actor: Actor =
        Actor::user(String::from("111"), String::from("batman@gotham.city")).with_admin_update();

    assert!(actor.admin_read);
    assert!(actor.admin_update);
}

#[test]
fn test_api_key_actors() {
    let key: Actor = Actor::api_key(String::from("key-1"));
    let elevated: Actor = Actor::elevated_api_key(String::from("key-2"));

    assert!(key.is_api_key());
    assert!(!key.is_elevated_api_key());
    assert!(elevated.is_elevated_api_key());
    assert_eq!(key.user_id(), None);
    assert_eq!(key.email, None);
}

#[test]
fn test_display_identity_fallbacks() {
    let named = Actor::user(String::from("111"), String::from("batman@gotham.city"))
        .with_display_name(String::from("Batman"));
    let unnamed = Actor::user(String::from("222"), String::from("robin@gotham.city"));
    let key = Actor::api_key(String::from("key-1"));

    assert_eq!(named.display_identity(), "Batman");
    assert_eq!(unnamed.display_identity(), "robin@gotham.city");
    assert_eq!(key.display_identity(), "key-1");
}

#[test]
fn test_action_creation_with_details() {
    let action: Action = Action::new(
        String::from("Remove"),
        Some(String::from("confirmed -> removed")),
    );

    assert_eq!(action.name, "Remove");
    assert_eq!(action.details.as_deref(), Some("confirmed -> removed"));
}

#[test]
fn test_audit_event_creation_requires_all_fields() {
    let actor: Actor = Actor::user(String::from("111"), String::from("batman@gotham.city"));
    let cause: Cause = Cause::new(String::from("req-456"), String::from("Status update"));
    let action: Action = Action::new(String::from("Confirm"), None);
    let before = StatusSnapshot::new(AssociationStatus::AwaitingApproval, String::from("a"));
    let after = StatusSnapshot::new(AssociationStatus::Confirmed, String::from("b"));
    let at = datetime!(2026-03-01 12:00 UTC);

    let event: AuditEvent = AuditEvent::new(
        actor.clone(),
        cause.clone(),
        action.clone(),
        String::from("1"),
        Some(before.clone()),
        after.clone(),
        at,
    );

    assert_eq!(event.actor, actor);
    assert_eq!(event.cause, cause);
    assert_eq!(event.action, action);
    assert_eq!(event.association_id, "1");
    assert_eq!(event.before, Some(before));
    assert_eq!(event.after, after);
    assert_eq!(event.at, at);
}

#[test]
fn test_audit_event_serializes_status_and_timestamp() {
    let event = AuditEvent::new(
        Actor::api_key(String::from("key-1")),
        Cause::new(String::from("import"), String::from("Migration import")),
        Action::new(String::from("ImportMigrated"), None),
        String::from("18"),
        None,
        StatusSnapshot::new(AssociationStatus::Migrated, String::from("e")),
        datetime!(2026-03-01 12:00 UTC),
    );

    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["after"]["status"], "migrated");
    assert_eq!(json["at"], "2026-03-01T12:00:00Z");
    assert!(json["before"].is_null());
}
