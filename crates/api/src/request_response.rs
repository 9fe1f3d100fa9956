// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.

use company_assoc_domain::{Association, AssociationStatus, PageRequest};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{ApiError, translate_domain_error};

/// API request to add a user to a company directly (auth-code route).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssociationRequest {
    pub company_number: String,
    pub user_id: String,
}

/// API request to invite an email address to a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteUserRequest {
    pub company_number: String,
    pub invitee_email: String,
}

/// API request to change an association's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    /// The requested status, e.g. `confirmed` or `removed`.
    pub status: String,
}

impl UpdateStatusRequest {
    /// Parses the requested status.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the value does not name a status.
    pub fn requested_status(&self) -> Result<AssociationStatus, ApiError> {
        self.status.parse().map_err(translate_domain_error)
    }
}

/// API request to import a bulk-migrated association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportMigratedRequest {
    pub company_number: String,
    pub user_email: String,
}

/// Query parameters shared by every paginated listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PageQuery {
    pub page_index: Option<i64>,
    pub items_per_page: Option<i64>,
}

impl PageQuery {
    /// Validates the pagination parameters, applying defaults.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a negative index or a non-positive size.
    pub fn page_request(&self) -> Result<PageRequest, ApiError> {
        PageRequest::from_optional(self.page_index, self.items_per_page)
            .map_err(translate_domain_error)
    }
}

/// Query parameters for listing a company's associations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CompanyAssociationsQuery {
    pub include_removed: Option<bool>,
    /// Comma separated status filter. Overrides `include_removed`.
    pub status: Option<String>,
    pub page_index: Option<i64>,
    pub items_per_page: Option<i64>,
}

impl CompanyAssociationsQuery {
    /// Validates the pagination parameters, applying defaults.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a negative index or a non-positive size.
    pub fn page_request(&self) -> Result<PageRequest, ApiError> {
        PageRequest::from_optional(self.page_index, self.items_per_page)
            .map_err(translate_domain_error)
    }

    /// The statuses to list.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the filter names an unknown status.
    pub fn statuses(&self) -> Result<Vec<AssociationStatus>, ApiError> {
        match parse_status_filter(self.status.as_deref())? {
            Some(statuses) => Ok(statuses),
            None if self.include_removed.unwrap_or(false) => Ok(AssociationStatus::ALL.to_vec()),
            None => Ok(AssociationStatus::all_except_removed()),
        }
    }
}

/// Query parameters for listing the caller's own associations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UserAssociationsQuery {
    /// Comma separated status filter.
    pub status: Option<String>,
    /// Restricts the listing to company numbers starting with this value.
    pub company_number: Option<String>,
    pub page_index: Option<i64>,
    pub items_per_page: Option<i64>,
}

impl UserAssociationsQuery {
    /// Validates the pagination parameters, applying defaults.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a negative index or a non-positive size.
    pub fn page_request(&self) -> Result<PageRequest, ApiError> {
        PageRequest::from_optional(self.page_index, self.items_per_page)
            .map_err(translate_domain_error)
    }

    /// The statuses to list: confirmed and awaiting approval unless filtered.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the filter names an unknown status.
    pub fn statuses(&self) -> Result<Vec<AssociationStatus>, ApiError> {
        Ok(parse_status_filter(self.status.as_deref())?.unwrap_or_else(|| {
            vec![
                AssociationStatus::Confirmed,
                AssociationStatus::AwaitingApproval,
            ]
        }))
    }
}

/// Parses a comma separated status filter. Blank means no filter.
///
/// # Errors
///
/// Returns `InvalidInput` if any entry is not a status.
pub fn parse_status_filter(
    filter: Option<&str>,
) -> Result<Option<Vec<AssociationStatus>>, ApiError> {
    let Some(filter) = filter.map(str::trim).filter(|f| !f.is_empty()) else {
        return Ok(None);
    };

    filter
        .split(',')
        .map(|status| status.trim().parse::<AssociationStatus>())
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
        .map_err(translate_domain_error)
}

/// API response for a committed change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationChangeResponse {
    pub association: Association,
    /// A success message.
    pub message: String,
}

/// API response for a migration import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportMigratedResponse {
    pub association: Association,
    /// False when a record already existed and was returned unchanged.
    pub created: bool,
}

/// One invitation the caller can still accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveInvitation {
    pub association_id: String,
    pub company_number: String,
    pub invited_by: String,
    #[serde(with = "time::serde::rfc3339")]
    pub invited_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}
