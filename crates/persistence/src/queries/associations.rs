// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Association lookups and listings.

use company_assoc_domain::{Association, AssociationStatus, Page, PageRequest, normalize_email};
use diesel::SqliteConnection;
use diesel::prelude::*;
#[cfg(feature = "mysql")]
use diesel::MysqlConnection;
use tracing::debug;

use crate::data_models::{AssociationRow, InvitationRow, PreviousStateRow, assemble};
use crate::diesel_schema::{association_invitations, association_previous_states, associations};
use crate::error::PersistenceError;

/// Loads the child rows for `$rows` and assembles full associations.
macro_rules! hydrate {
    ($conn:expr, $rows:expr) => {{
        let rows: Vec<AssociationRow> = $rows;
        if rows.is_empty() {
            Ok(Vec::new())
        } else {
            let ids: Vec<String> = rows.iter().map(|row| row.association_id.clone()).collect();

            let invitations: Vec<InvitationRow> = association_invitations::table
                .filter(association_invitations::association_id.eq_any(ids.clone()))
                .order((
                    association_invitations::association_id,
                    association_invitations::position,
                ))
                .select(InvitationRow::as_select())
                .load($conn)?;

            let previous_states: Vec<PreviousStateRow> = association_previous_states::table
                .filter(association_previous_states::association_id.eq_any(ids))
                .order((
                    association_previous_states::association_id,
                    association_previous_states::ordinal,
                ))
                .select(PreviousStateRow::as_select())
                .load($conn)?;

            assemble(rows, invitations, previous_states)
        }
    }};
}

fn status_names(statuses: &[AssociationStatus]) -> Vec<&'static str> {
    statuses.iter().map(AssociationStatus::as_str).collect()
}

fn total(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

backend_fn! {
/// Retrieves an association by id.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the association is not found.
pub fn find_by_id(
    conn: &mut _,
    association_id: &str,
) -> Result<Option<Association>, PersistenceError> {
    debug!(association_id, "Looking up association");

    let row: Option<AssociationRow> = associations::table
        .filter(associations::association_id.eq(association_id))
        .select(AssociationRow::as_select())
        .first(conn)
        .optional()?;

    match row {
        Some(row) => {
            let mut found: Vec<Association> = hydrate!(conn, vec![row])?;
            Ok(found.pop())
        }
        None => Ok(None),
    }
}
}

backend_fn! {
/// Retrieves the association linking a company to a user.
///
/// A record keyed by `user_id` wins over one keyed by `user_email`.
/// Emails are compared in normalized form.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn find_by_company_and_user(
    conn: &mut _,
    company_number: &str,
    user_id: Option<&str>,
    user_email: Option<&str>,
) -> Result<Option<Association>, PersistenceError> {
    debug!(company_number, ?user_id, ?user_email, "Looking up association by company and user");

    if let Some(user_id) = user_id {
        let row: Option<AssociationRow> = associations::table
            .filter(associations::company_number.eq(company_number))
            .filter(associations::user_id.eq(user_id))
            .select(AssociationRow::as_select())
            .first(conn)
            .optional()?;
        if let Some(row) = row {
            let mut found: Vec<Association> = hydrate!(conn, vec![row])?;
            return Ok(found.pop());
        }
    }

    if let Some(user_email) = user_email {
        let email: String = normalize_email(user_email);
        let row: Option<AssociationRow> = associations::table
            .filter(associations::company_number.eq(company_number))
            .filter(associations::user_email.eq(&email))
            .select(AssociationRow::as_select())
            .first(conn)
            .optional()?;
        if let Some(row) = row {
            let mut found: Vec<Association> = hydrate!(conn, vec![row])?;
            return Ok(found.pop());
        }
    }

    Ok(None)
}
}

backend_fn! {
/// Lists a company's associations with one of `statuses`, oldest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_by_company(
    conn: &mut _,
    company_number: &str,
    statuses: &[AssociationStatus],
    page: PageRequest,
) -> Result<Page<Association>, PersistenceError> {
    let names: Vec<&str> = status_names(statuses);

    let count: i64 = associations::table
        .filter(associations::company_number.eq(company_number))
        .filter(associations::status.eq_any(names.clone()))
        .count()
        .get_result(conn)?;

    let rows: Vec<AssociationRow> = associations::table
        .filter(associations::company_number.eq(company_number))
        .filter(associations::status.eq_any(names))
        .order((associations::created_at, associations::association_id))
        .offset(page.offset())
        .limit(page.limit())
        .select(AssociationRow::as_select())
        .load(conn)?;

    debug!(company_number, total = count, returned = rows.len(), "Listed company associations");

    let items: Vec<Association> = hydrate!(conn, rows)?;
    Ok(Page::new(items, page, total(count)))
}
}

backend_fn! {
/// Lists the associations belonging to a user, identified by id, email or both.
///
/// `company_prefix` restricts the listing to company numbers starting with it.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_by_user(
    conn: &mut _,
    user_id: Option<&str>,
    user_email: Option<&str>,
    statuses: &[AssociationStatus],
    company_prefix: Option<&str>,
    page: PageRequest,
) -> Result<Page<Association>, PersistenceError> {
    let names: Vec<&str> = status_names(statuses);
    let email: Option<String> = user_email.map(normalize_email);
    let pattern: String = format!("{}%", company_prefix.unwrap_or_default());

    // Email-keyed records never carry a user id, so matching either key
    // covers every record the user owns.
    let user_id_key: &str = user_id.unwrap_or_default();
    let email_key: &str = email.as_deref().unwrap_or_default();
    if user_id_key.is_empty() && email_key.is_empty() {
        return Ok(Page::new(Vec::new(), page, 0));
    }

    let count: i64 = associations::table
        .filter(
            associations::user_id
                .eq(user_id_key)
                .or(associations::user_email.eq(email_key)),
        )
        .filter(associations::status.eq_any(names.clone()))
        .filter(associations::company_number.like(&pattern))
        .count()
        .get_result(conn)?;

    let rows: Vec<AssociationRow> = associations::table
        .filter(
            associations::user_id
                .eq(user_id_key)
                .or(associations::user_email.eq(email_key)),
        )
        .filter(associations::status.eq_any(names))
        .filter(associations::company_number.like(&pattern))
        .order((associations::created_at, associations::association_id))
        .offset(page.offset())
        .limit(page.limit())
        .select(AssociationRow::as_select())
        .load(conn)?;

    debug!(?user_id, total = count, returned = rows.len(), "Listed user associations");

    let items: Vec<Association> = hydrate!(conn, rows)?;
    Ok(Page::new(items, page, total(count)))
}
}

backend_fn! {
/// Lists up to `limit` associations with `status` whose id sorts after `after_id`.
///
/// Keyset pagination: records that leave `status` while a caller walks the
/// listing do not shift the records after them.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_by_status_after(
    conn: &mut _,
    status: AssociationStatus,
    after_id: Option<&str>,
    limit: i64,
) -> Result<Vec<Association>, PersistenceError> {
    let rows: Vec<AssociationRow> = associations::table
        .filter(associations::status.eq(status.as_str()))
        .filter(associations::association_id.gt(after_id.unwrap_or_default()))
        .order(associations::association_id)
        .limit(limit)
        .select(AssociationRow::as_select())
        .load(conn)?;

    debug!(%status, ?after_id, returned = rows.len(), "Listed associations by status");

    hydrate!(conn, rows)
}
}
