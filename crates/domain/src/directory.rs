// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::{Deserialize, Serialize};

/// Identity details for a registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    pub user_id: String,
    pub email: String,
    pub display_name: Option<String>,
}

impl UserDetails {
    /// Creates a new `UserDetails`.
    #[must_use]
    pub const fn new(user_id: String, email: String, display_name: Option<String>) -> Self {
        Self {
            user_id,
            email,
            display_name,
        }
    }

    /// The identity shown to other people: display name, or email when unset.
    #[must_use]
    pub fn display_identity(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }
}

/// Profile details for a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDetails {
    pub company_number: String,
    pub company_name: String,
    pub company_status: Option<String>,
}

impl CompanyDetails {
    /// Creates a new `CompanyDetails`.
    #[must_use]
    pub const fn new(
        company_number: String,
        company_name: String,
        company_status: Option<String>,
    ) -> Self {
        Self {
            company_number,
            company_name,
            company_status,
        }
    }
}
