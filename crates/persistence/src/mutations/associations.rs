// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The single write primitive for associations.
//!
//! Every insert and update, including multi-record merges, goes through
//! `write_associations`.

use company_assoc_domain::Association;
use diesel::SqliteConnection;
use diesel::prelude::*;
#[cfg(feature = "mysql")]
use diesel::MysqlConnection;
use tracing::{debug, info};

use crate::data_models::{at_storage_precision, column_index, format_optional, format_timestamp};
use crate::diesel_schema::{association_invitations, association_previous_states, associations};
use crate::error::PersistenceError;

backend_fn! {
/// Writes one or more associations in a single transaction.
///
/// Each write is an insert (`expected_version` of `None`, where a unique key
/// collision fails with `DuplicateKey`) or an update that only applies if the
/// stored version still equals `expected_version`. Either every write lands
/// or none does.
///
/// Invitations are rewritten in full. Previous states are append-only: rows
/// already stored are kept and only the new tail is inserted.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `writes` - The associations to write, each with the version it was computed from
///
/// # Returns
///
/// The associations as stored, in `writes` order, carrying their new
/// versions and timestamps at storage precision.
///
/// # Errors
///
/// Returns an error if:
/// - An insert collides with an existing (company, user) key
/// - A stored version differs from its `expected_version`
/// - The database write fails
pub fn write_associations(
    conn: &mut _,
    writes: &[(&Association, Option<i64>)],
) -> Result<Vec<Association>, PersistenceError> {
    conn.transaction::<Vec<Association>, PersistenceError, _>(|conn| {
        let mut written: Vec<Association> = Vec::with_capacity(writes.len());

        for &(association, expected_version) in writes {
            let created_at: String = format_timestamp(association.created_at)?;
            let approved_at: Option<String> = format_optional(association.approved_at)?;
            let removed_at: Option<String> = format_optional(association.removed_at)?;
            let unauthorised_at: Option<String> = format_optional(association.unauthorised_at)?;
            let approval_expiry_at: Option<String> =
                format_optional(association.approval_expiry_at)?;
            let id: &str = association.id.as_str();

            let new_version: i64 = match expected_version {
                None => {
                    diesel::insert_into(associations::table)
                        .values((
                            associations::association_id.eq(id),
                            associations::company_number.eq(&association.company_number),
                            associations::user_id.eq(&association.user_id),
                            associations::user_email.eq(&association.user_email),
                            associations::status.eq(association.status.as_str()),
                            associations::approval_route.eq(association.approval_route.as_str()),
                            associations::created_at.eq(&created_at),
                            associations::approved_at.eq(&approved_at),
                            associations::removed_at.eq(&removed_at),
                            associations::unauthorised_at.eq(&unauthorised_at),
                            associations::unauthorised_by.eq(&association.unauthorised_by),
                            associations::approval_expiry_at.eq(&approval_expiry_at),
                            associations::etag.eq(&association.etag),
                            associations::version.eq(1_i64),
                        ))
                        .execute(conn)?;
                    1
                }
                Some(expected) => {
                    let updated: usize = diesel::update(
                        associations::table
                            .filter(associations::association_id.eq(id))
                            .filter(associations::version.eq(expected)),
                    )
                    .set((
                        associations::user_id.eq(&association.user_id),
                        associations::user_email.eq(&association.user_email),
                        associations::status.eq(association.status.as_str()),
                        associations::approval_route.eq(association.approval_route.as_str()),
                        associations::approved_at.eq(&approved_at),
                        associations::removed_at.eq(&removed_at),
                        associations::unauthorised_at.eq(&unauthorised_at),
                        associations::unauthorised_by.eq(&association.unauthorised_by),
                        associations::approval_expiry_at.eq(&approval_expiry_at),
                        associations::etag.eq(&association.etag),
                        associations::version.eq(expected + 1),
                    ))
                    .execute(conn)?;

                    if updated == 0 {
                        return Err(PersistenceError::VersionConflict {
                            association_id: id.to_string(),
                            expected_version: expected,
                        });
                    }
                    expected + 1
                }
            };

            diesel::delete(
                association_invitations::table
                    .filter(association_invitations::association_id.eq(id)),
            )
            .execute(conn)?;

            for (index, invitation) in association.invitations.iter().enumerate() {
                diesel::insert_into(association_invitations::table)
                    .values((
                        association_invitations::association_id.eq(id),
                        association_invitations::position.eq(column_index(index)?),
                        association_invitations::invited_by.eq(&invitation.invited_by),
                        association_invitations::invited_at
                            .eq(format_timestamp(invitation.invited_at)?),
                    ))
                    .execute(conn)?;
            }

            let stored_states: i64 = association_previous_states::table
                .filter(association_previous_states::association_id.eq(id))
                .count()
                .get_result(conn)?;
            let stored_states: usize = usize::try_from(stored_states).unwrap_or(0);

            if stored_states > association.previous_states.len() {
                return Err(PersistenceError::QueryFailed(format!(
                    "Refusing to drop previous states of association '{id}'"
                )));
            }

            for (index, state) in association
                .previous_states
                .iter()
                .enumerate()
                .skip(stored_states)
            {
                diesel::insert_into(association_previous_states::table)
                    .values((
                        association_previous_states::association_id.eq(id),
                        association_previous_states::ordinal.eq(column_index(index)?),
                        association_previous_states::status.eq(state.status.as_str()),
                        association_previous_states::changed_by.eq(&state.changed_by),
                        association_previous_states::changed_at
                            .eq(format_timestamp(state.changed_at)?),
                    ))
                    .execute(conn)?;
            }

            debug!(association_id = id, version = new_version, "Association written");

            let mut stored: Association = at_storage_precision(association)?;
            stored.version = new_version;
            written.push(stored);
        }

        Ok(written)
    })
    .inspect(|written| {
        for stored in written {
            info!(
                association_id = %stored.id,
                status = %stored.status,
                version = stored.version,
                "Association committed"
            );
        }
    })
}
}
