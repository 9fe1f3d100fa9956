// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod association;
mod directory;
mod error;
mod pagination;
mod status;
mod validation;

#[cfg(test)]
mod tests;

pub use association::{Association, INVITATION_TTL_DAYS, Invitation, PreviousState};
pub use directory::{CompanyDetails, UserDetails};
pub use error::DomainError;
pub use pagination::{DEFAULT_ITEMS_PER_PAGE, Page, PageRequest};
pub use status::{ApprovalRoute, AssociationStatus};
pub use validation::{
    normalize_email, validate_association_id, validate_company_number, validate_email,
    validate_user_id,
};
