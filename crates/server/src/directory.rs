// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! File-backed collaborators.
//!
//! The directory file stands in for the identity and company services, and
//! the tracing transport stands in for the email service. Both are enough
//! to run the server on its own.

use std::path::Path;

use company_assoc::EmailKind;
use company_assoc_api::{
    CompanyGateway, EmailPayload, GatewayError, IdentityGateway, NotificationTransport,
    TransportError,
};
use company_assoc_domain::{CompanyDetails, UserDetails};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Failed to read directory file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse directory file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Users and companies loaded from a JSON file.
///
/// ```json
/// {
///   "users": [{ "userId": "111", "email": "batman@gotham.city", "displayName": "Batman" }],
///   "companies": [{ "companyNumber": "111111", "companyName": "Wayne Enterprises" }]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryFile {
    #[serde(default)]
    pub users: Vec<UserDetails>,
    #[serde(default)]
    pub companies: Vec<CompanyDetails>,
}

impl DirectoryFile {
    /// Parses a directory from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid directory document.
    pub fn from_json(json: &str) -> Result<Self, DirectoryError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a directory file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DirectoryError> {
        let text: String = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

impl IdentityGateway for DirectoryFile {
    fn resolve_by_id(&self, user_id: &str) -> Result<UserDetails, GatewayError> {
        self.users
            .iter()
            .find(|user| user.user_id == user_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(user_id.to_string()))
    }

    fn resolve_by_email(&self, email: &str) -> Result<Vec<UserDetails>, GatewayError> {
        Ok(self
            .users
            .iter()
            .filter(|user| user.email.eq_ignore_ascii_case(email))
            .cloned()
            .collect())
    }
}

impl CompanyGateway for DirectoryFile {
    fn resolve_company(&self, company_number: &str) -> Result<CompanyDetails, GatewayError> {
        self.companies
            .iter()
            .find(|company| company.company_number == company_number)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(company_number.to_string()))
    }
}

/// Writes every email to the log instead of sending it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTransport;

impl NotificationTransport for TracingTransport {
    fn publish(&self, kind: EmailKind, payload: &EmailPayload) -> Result<(), TransportError> {
        info!(
            kind = %kind,
            to = %payload.to,
            company_number = %payload.company_number,
            association_id = %payload.association_id,
            "Email published"
        );
        Ok(())
    }
}
