// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use company_assoc_audit::{Actor, Cause};
use company_assoc_domain::{ApprovalRoute, Association, AssociationStatus, UserDetails};
use time::{OffsetDateTime, macros::datetime};

pub const COMPANY: &str = "111111";

pub fn now() -> OffsetDateTime {
    datetime!(2026-03-01 12:00 UTC)
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("req-456"), String::from("Test request"))
}

pub fn batman() -> Actor {
    Actor::user(String::from("111"), String::from("batman@gotham.city"))
        .with_display_name(String::from("Batman"))
}

pub fn robin() -> Actor {
    Actor::user(String::from("222"), String::from("robin@gotham.city"))
}

pub fn joker() -> Actor {
    Actor::user(String::from("999"), String::from("joker@arkham.asylum"))
}

pub fn admin() -> Actor {
    Actor::user(String::from("admin-1"), String::from("admin@companies.gov")).with_admin_update()
}

pub fn api_key() -> Actor {
    Actor::api_key(String::from("key-1"))
}

pub fn elevated_key() -> Actor {
    Actor::elevated_api_key(String::from("key-elevated"))
}

pub fn robin_details() -> UserDetails {
    UserDetails::new(
        String::from("222"),
        String::from("robin@gotham.city"),
        Some(String::from("Robin")),
    )
}

/// A confirmed association owned by Robin.
pub fn confirmed_for_robin() -> Association {
    let mut association = Association::new(
        String::from("1"),
        String::from(COMPANY),
        Some(String::from("222")),
        None,
        AssociationStatus::Confirmed,
        ApprovalRoute::AuthCode,
        String::from("etag-1"),
        now() - time::Duration::days(30),
    );
    association.version = 1;
    association
}

/// An awaiting-approval association for Robin, invited by Batman at `invited_at`.
pub fn awaiting_for_robin(invited_at: OffsetDateTime) -> Association {
    let mut association = Association::new(
        String::from("2"),
        String::from(COMPANY),
        Some(String::from("222")),
        None,
        AssociationStatus::AwaitingApproval,
        ApprovalRoute::Invitation,
        String::from("etag-2"),
        invited_at,
    );
    association.push_invitation(String::from("111"), invited_at);
    association.version = 1;
    association
}

/// A migrated association keyed by Robin's email.
pub fn migrated_for_robin() -> Association {
    let mut association = Association::new(
        String::from("18"),
        String::from(COMPANY),
        None,
        Some(String::from("robin@gotham.city")),
        AssociationStatus::Migrated,
        ApprovalRoute::Migration,
        String::from("etag-18"),
        now() - time::Duration::days(365),
    );
    association.version = 1;
    association
}

/// Robin's confirmed association after an elevated key unauthorised it.
pub fn unauthorised_for_robin() -> Association {
    let mut association = confirmed_for_robin();
    association.status = AssociationStatus::Unauthorised;
    association.unauthorised_at = Some(now() - time::Duration::days(2));
    association.unauthorised_by = Some(String::from("key-elevated"));
    association
}
