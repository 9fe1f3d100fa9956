// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use company_assoc_domain::{AssociationStatus, PageRequest};

use super::{COMPANY, insert, migrated_association, user_association};
use crate::{AssociationStore, Persistence};

/// Ids 1-13 confirmed or awaiting approval, 14-16 removed, 17 in another company.
fn seed_company_fixture(persistence: &mut Persistence) {
    for n in 1..=17_i64 {
        let status = match n {
            14..=16 => AssociationStatus::Removed,
            n if n % 2 == 0 => AssociationStatus::AwaitingApproval,
            _ => AssociationStatus::Confirmed,
        };
        let company = if n == 17 { "222222" } else { COMPANY };
        insert(
            persistence,
            &user_association(&n.to_string(), company, &format!("user-{n}"), status, n),
        );
    }
}

#[test]
fn test_company_listing_excludes_removed_with_default_page() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    seed_company_fixture(&mut persistence);

    let page = persistence
        .list_by_company(
            COMPANY,
            &AssociationStatus::all_except_removed(),
            PageRequest::default(),
        )
        .unwrap();

    assert_eq!(page.items.len(), 13);
    assert_eq!(page.total_results, 13);
    assert_eq!(page.total_pages, 1);
    assert_eq!(page.items_per_page, 15);
    assert_eq!(page.items[0].id, "1", "oldest first");
    assert!(
        page.items
            .iter()
            .all(|association| association.status != AssociationStatus::Removed)
    );
}

#[test]
fn test_company_listing_including_removed_pages() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    seed_company_fixture(&mut persistence);

    let second = persistence
        .list_by_company(
            COMPANY,
            &AssociationStatus::ALL,
            PageRequest::new(1, 10).unwrap(),
        )
        .unwrap();

    assert_eq!(second.total_results, 16);
    assert_eq!(second.total_pages, 2);
    assert_eq!(second.page_number, 1);
    assert_eq!(second.items.len(), 6);
    assert_eq!(second.items[0].id, "11");
}

#[test]
fn test_company_listing_for_unknown_company_is_empty() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    seed_company_fixture(&mut persistence);

    let page = persistence
        .list_by_company("999999", &AssociationStatus::ALL, PageRequest::default())
        .unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.total_pages, 0);
}

#[test]
fn test_user_listing_matches_id_or_email_and_prefix() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    insert(
        &mut persistence,
        &user_association("1", "111111", "222", AssociationStatus::Confirmed, 0),
    );
    insert(
        &mut persistence,
        &user_association("2", "AB1234", "222", AssociationStatus::AwaitingApproval, 1),
    );
    insert(
        &mut persistence,
        &migrated_association("3", "111222", "robin@gotham.city"),
    );
    insert(
        &mut persistence,
        &user_association("4", "111333", "333", AssociationStatus::Confirmed, 2),
    );

    let all = persistence
        .list_by_user(
            Some("222"),
            Some("robin@gotham.city"),
            &AssociationStatus::ALL,
            None,
            PageRequest::default(),
        )
        .unwrap();
    let ids: Vec<&str> = all.items.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids.len(), 3);
    assert!(!ids.contains(&"4"));

    let prefixed = persistence
        .list_by_user(
            Some("222"),
            Some("robin@gotham.city"),
            &[AssociationStatus::Confirmed, AssociationStatus::Migrated],
            Some("111"),
            PageRequest::default(),
        )
        .unwrap();
    let ids: Vec<&str> = prefixed.items.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&"1"));
    assert!(ids.contains(&"3"));
}

#[test]
fn test_user_listing_without_identity_is_empty() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    insert(
        &mut persistence,
        &user_association("1", COMPANY, "222", AssociationStatus::Confirmed, 0),
    );

    let page = persistence
        .list_by_user(None, None, &AssociationStatus::ALL, None, PageRequest::default())
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total_results, 0);
}

#[test]
fn test_keyset_walk_does_not_skip_records_claimed_mid_walk() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    for n in 1..=5 {
        insert(
            &mut persistence,
            &migrated_association(&format!("m{n}"), COMPANY, &format!("user{n}@example.com")),
        );
    }

    let first = persistence
        .list_by_status_after(AssociationStatus::Migrated, None, 2)
        .unwrap();
    assert_eq!(first.len(), 2);

    // Claim everything in the first batch before fetching the next.
    for association in &first {
        let mut claimed = association.clone();
        claimed.record_previous_state("key", association.created_at);
        claimed.status = AssociationStatus::Confirmed;
        persistence
            .insert_or_update(&claimed, Some(association.version))
            .unwrap();
    }

    let cursor = first.last().map(|a| a.id.clone());
    let second = persistence
        .list_by_status_after(AssociationStatus::Migrated, cursor.as_deref(), 2)
        .unwrap();
    let ids: Vec<&str> = second.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["m3", "m4"]);

    let third = persistence
        .list_by_status_after(AssociationStatus::Migrated, Some("m4"), 2)
        .unwrap();
    assert_eq!(third.len(), 1);
    assert_eq!(third[0].id, "m5");
}
