// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Row types and conversions between rows and domain values.

use std::collections::HashMap;

use company_assoc_domain::{Association, Invitation, PreviousState};
use diesel::prelude::*;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::diesel_schema::{association_invitations, association_previous_states, associations};
use crate::error::PersistenceError;

/// Fixed-width UTC format so stored timestamps sort as text.
const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"
);

/// Formats a timestamp for storage.
///
/// # Errors
///
/// Returns an error if the timestamp cannot be formatted.
pub fn format_timestamp(at: OffsetDateTime) -> Result<String, PersistenceError> {
    at.to_offset(UtcOffset::UTC)
        .format(TIMESTAMP_FORMAT)
        .map_err(|e| PersistenceError::SerializationError(e.to_string()))
}

/// Formats an optional timestamp for storage.
///
/// # Errors
///
/// Returns an error if the timestamp cannot be formatted.
pub fn format_optional(at: Option<OffsetDateTime>) -> Result<Option<String>, PersistenceError> {
    at.map(format_timestamp).transpose()
}

/// Parses a stored timestamp.
///
/// # Errors
///
/// Returns an error if the stored text is not in the storage format.
pub fn parse_timestamp(value: &str) -> Result<OffsetDateTime, PersistenceError> {
    PrimitiveDateTime::parse(value, TIMESTAMP_FORMAT)
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|e| {
            PersistenceError::ReconstructionError(format!("Invalid timestamp '{value}': {e}"))
        })
}

fn parse_optional(value: Option<&str>) -> Result<Option<OffsetDateTime>, PersistenceError> {
    value.map(parse_timestamp).transpose()
}

/// Truncates a timestamp to the precision it is stored at.
fn stored(at: OffsetDateTime) -> Result<OffsetDateTime, PersistenceError> {
    parse_timestamp(&format_timestamp(at)?)
}

fn stored_optional(at: Option<OffsetDateTime>) -> Result<Option<OffsetDateTime>, PersistenceError> {
    at.map(stored).transpose()
}

/// Returns `association` as a later read would return it.
///
/// Every timestamp is truncated to storage precision and moved to UTC.
///
/// # Errors
///
/// Returns an error if a timestamp cannot be formatted.
pub fn at_storage_precision(association: &Association) -> Result<Association, PersistenceError> {
    let mut normalized: Association = association.clone();
    normalized.created_at = stored(association.created_at)?;
    normalized.approved_at = stored_optional(association.approved_at)?;
    normalized.removed_at = stored_optional(association.removed_at)?;
    normalized.unauthorised_at = stored_optional(association.unauthorised_at)?;
    normalized.approval_expiry_at = stored_optional(association.approval_expiry_at)?;
    for invitation in &mut normalized.invitations {
        invitation.invited_at = stored(invitation.invited_at)?;
    }
    for state in &mut normalized.previous_states {
        state.changed_at = stored(state.changed_at)?;
    }
    Ok(normalized)
}

/// Diesel Queryable struct for association rows.
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = associations)]
pub struct AssociationRow {
    pub association_id: String,
    pub company_number: String,
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    pub status: String,
    pub approval_route: String,
    pub created_at: String,
    pub approved_at: Option<String>,
    pub removed_at: Option<String>,
    pub unauthorised_at: Option<String>,
    pub unauthorised_by: Option<String>,
    pub approval_expiry_at: Option<String>,
    pub etag: String,
    pub version: i64,
}

/// Diesel Queryable struct for invitation rows.
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = association_invitations)]
pub struct InvitationRow {
    pub association_id: String,
    pub position: i32,
    pub invited_by: String,
    pub invited_at: String,
}

/// Diesel Queryable struct for previous-state rows.
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = association_previous_states)]
pub struct PreviousStateRow {
    pub association_id: String,
    pub ordinal: i32,
    pub status: String,
    pub changed_by: String,
    pub changed_at: String,
}

fn reconstruction(err: impl std::fmt::Display) -> PersistenceError {
    PersistenceError::ReconstructionError(err.to_string())
}

fn into_association(
    row: AssociationRow,
    invitations: Vec<InvitationRow>,
    previous_states: Vec<PreviousStateRow>,
) -> Result<Association, PersistenceError> {
    let invitations: Vec<Invitation> = invitations
        .into_iter()
        .map(|inv| -> Result<Invitation, PersistenceError> {
            let invited_at = parse_timestamp(&inv.invited_at)?;
            Ok(Invitation::new(inv.invited_by, invited_at))
        })
        .collect::<Result<_, _>>()?;

    let previous_states: Vec<PreviousState> = previous_states
        .into_iter()
        .map(|prev| -> Result<PreviousState, PersistenceError> {
            Ok(PreviousState {
                status: prev.status.parse().map_err(reconstruction)?,
                changed_by: prev.changed_by,
                changed_at: parse_timestamp(&prev.changed_at)?,
            })
        })
        .collect::<Result<_, _>>()?;

    Ok(Association {
        id: row.association_id,
        company_number: row.company_number,
        user_id: row.user_id,
        user_email: row.user_email,
        status: row.status.parse().map_err(reconstruction)?,
        approval_route: row.approval_route.parse().map_err(reconstruction)?,
        created_at: parse_timestamp(&row.created_at)?,
        approved_at: parse_optional(row.approved_at.as_deref())?,
        removed_at: parse_optional(row.removed_at.as_deref())?,
        unauthorised_at: parse_optional(row.unauthorised_at.as_deref())?,
        unauthorised_by: row.unauthorised_by,
        approval_expiry_at: parse_optional(row.approval_expiry_at.as_deref())?,
        invitations,
        previous_states,
        etag: row.etag,
        version: row.version,
    })
}

/// Joins association rows with their child rows, keeping the order of `rows`.
///
/// Child rows must already be sorted by position and ordinal.
///
/// # Errors
///
/// Returns an error if any stored value cannot be parsed.
pub fn assemble(
    rows: Vec<AssociationRow>,
    invitations: Vec<InvitationRow>,
    previous_states: Vec<PreviousStateRow>,
) -> Result<Vec<Association>, PersistenceError> {
    let mut invitations_by_id: HashMap<String, Vec<InvitationRow>> = HashMap::new();
    for invitation in invitations {
        invitations_by_id
            .entry(invitation.association_id.clone())
            .or_default()
            .push(invitation);
    }

    let mut states_by_id: HashMap<String, Vec<PreviousStateRow>> = HashMap::new();
    for state in previous_states {
        states_by_id
            .entry(state.association_id.clone())
            .or_default()
            .push(state);
    }

    rows.into_iter()
        .map(|row| {
            let invitations = invitations_by_id
                .remove(&row.association_id)
                .unwrap_or_default();
            let states = states_by_id
                .remove(&row.association_id)
                .unwrap_or_default();
            into_association(row, invitations, states)
        })
        .collect()
}

/// Storage index for a position in a list.
///
/// # Errors
///
/// Returns an error if the index does not fit the column type.
pub fn column_index(index: usize) -> Result<i32, PersistenceError> {
    i32::try_from(index).map_err(|_| {
        PersistenceError::SerializationError(format!("List index {index} is out of range"))
    })
}
