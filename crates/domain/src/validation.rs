// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;

const MAX_COMPANY_NUMBER_LEN: usize = 10;
const MAX_IDENTIFIER_LEN: usize = 64;
const MAX_EMAIL_LEN: usize = 254;

/// Validates a company number.
///
/// Company numbers are 1 to 10 characters of uppercase ASCII letters and digits.
///
/// # Errors
///
/// Returns `DomainError::InvalidCompanyNumber` if the value is malformed.
pub fn validate_company_number(company_number: &str) -> Result<(), DomainError> {
    if company_number.is_empty() || company_number.len() > MAX_COMPANY_NUMBER_LEN {
        return Err(DomainError::InvalidCompanyNumber(format!(
            "'{company_number}' must be between 1 and {MAX_COMPANY_NUMBER_LEN} characters"
        )));
    }

    if !company_number
        .chars()
        .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
    {
        return Err(DomainError::InvalidCompanyNumber(format!(
            "'{company_number}' may only contain digits and uppercase letters"
        )));
    }

    Ok(())
}

fn is_identifier(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_IDENTIFIER_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Validates a user identifier.
///
/// # Errors
///
/// Returns `DomainError::InvalidUserId` if the value is empty, too long, or
/// contains characters other than ASCII letters, digits, `-` and `_`.
pub fn validate_user_id(user_id: &str) -> Result<(), DomainError> {
    if is_identifier(user_id) {
        Ok(())
    } else {
        Err(DomainError::InvalidUserId(format!(
            "'{user_id}' is not a valid user identifier"
        )))
    }
}

/// Validates an association identifier.
///
/// # Errors
///
/// Returns `DomainError::InvalidAssociationId` if the value is malformed.
pub fn validate_association_id(association_id: &str) -> Result<(), DomainError> {
    if is_identifier(association_id) {
        Ok(())
    } else {
        Err(DomainError::InvalidAssociationId(format!(
            "'{association_id}' is not a valid association identifier"
        )))
    }
}

/// Validates an email address.
///
/// The check is structural only: one `@`, a non-empty local part, a domain
/// containing a dot, and no whitespace.
///
/// # Errors
///
/// Returns `DomainError::InvalidEmail` if the value is malformed.
pub fn validate_email(email: &str) -> Result<(), DomainError> {
    if email.is_empty() || email.len() > MAX_EMAIL_LEN {
        return Err(DomainError::InvalidEmail(String::from(
            "Email must be between 1 and 254 characters",
        )));
    }

    if email.chars().any(char::is_whitespace) {
        return Err(DomainError::InvalidEmail(format!(
            "'{email}' must not contain whitespace"
        )));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(DomainError::InvalidEmail(format!("'{email}' is missing '@'")));
    };

    if local.is_empty() || domain.contains('@') {
        return Err(DomainError::InvalidEmail(format!(
            "'{email}' must contain exactly one '@' after a non-empty local part"
        )));
    }

    let domain_ok = domain.contains('.') && domain.split('.').all(|label| !label.is_empty());
    if !domain_ok {
        return Err(DomainError::InvalidEmail(format!(
            "'{email}' has an invalid domain"
        )));
    }

    Ok(())
}

/// Normalizes an email for storage and comparison.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
