// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Company number is empty or malformed.
    InvalidCompanyNumber(String),
    /// User identifier is empty or malformed.
    InvalidUserId(String),
    /// Email address is empty or malformed.
    InvalidEmail(String),
    /// Association identifier is empty or malformed.
    InvalidAssociationId(String),
    /// Status string does not name a known association status.
    InvalidStatus {
        /// The rejected status string.
        status: String,
    },
    /// Approval route string does not name a known route.
    InvalidApprovalRoute {
        /// The rejected route string.
        route: String,
    },
    /// Page index is negative.
    InvalidPageIndex {
        /// The rejected index.
        page_index: i64,
    },
    /// Page size is zero or negative.
    InvalidItemsPerPage {
        /// The rejected size.
        items_per_page: i64,
    },
    /// A stored timestamp could not be parsed or formatted.
    InvalidTimestamp {
        /// The offending value.
        value: String,
        /// The underlying parse or format error.
        error: String,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCompanyNumber(msg) => write!(f, "Invalid company number: {msg}"),
            Self::InvalidUserId(msg) => write!(f, "Invalid user id: {msg}"),
            Self::InvalidEmail(msg) => write!(f, "Invalid email: {msg}"),
            Self::InvalidAssociationId(msg) => write!(f, "Invalid association id: {msg}"),
            Self::InvalidStatus { status } => {
                write!(f, "Invalid association status: '{status}'")
            }
            Self::InvalidApprovalRoute { route } => {
                write!(f, "Invalid approval route: '{route}'")
            }
            Self::InvalidPageIndex { page_index } => {
                write!(f, "Invalid page index: {page_index}. Must be zero or greater")
            }
            Self::InvalidItemsPerPage { items_per_page } => {
                write!(
                    f,
                    "Invalid items per page: {items_per_page}. Must be greater than 0"
                )
            }
            Self::InvalidTimestamp { value, error } => {
                write!(f, "Invalid timestamp '{value}': {error}")
            }
        }
    }
}

impl std::error::Error for DomainError {}
