// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod listing_tests;

use company_assoc_audit::{Actor, Cause};
use company_assoc_domain::{ApprovalRoute, Association, AssociationStatus};
use time::{Duration, OffsetDateTime, macros::datetime};

use crate::{AssociationStore, Persistence};

pub const COMPANY: &str = "111111";

pub fn base_time() -> OffsetDateTime {
    datetime!(2026-01-10 09:30:00.123456 UTC)
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("test-cause"), String::from("Test operation"))
}

pub fn create_test_actor() -> Actor {
    Actor::user(String::from("111"), String::from("batman@gotham.city"))
}

/// Builds an unpersisted association keyed by user id.
pub fn user_association(
    id: &str,
    company_number: &str,
    user_id: &str,
    status: AssociationStatus,
    minutes: i64,
) -> Association {
    Association::new(
        id.to_string(),
        company_number.to_string(),
        Some(user_id.to_string()),
        None,
        status,
        ApprovalRoute::AuthCode,
        format!("etag-{id}"),
        base_time() + Duration::minutes(minutes),
    )
}

/// Builds an unpersisted migrated association keyed by email.
pub fn migrated_association(id: &str, company_number: &str, email: &str) -> Association {
    Association::new(
        id.to_string(),
        company_number.to_string(),
        None,
        Some(email.to_string()),
        AssociationStatus::Migrated,
        ApprovalRoute::Migration,
        format!("etag-{id}"),
        base_time(),
    )
}

/// Inserts `association` and returns the stored copy.
pub fn insert(persistence: &mut Persistence, association: &Association) -> Association {
    persistence
        .insert_or_update(association, None)
        .expect("Failed to insert association")
}
