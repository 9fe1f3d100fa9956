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

//! The association lifecycle engine.
//!
//! Every operation here is a pure computation over values and an explicit
//! `now`. Reading the current record, persisting the result and sending
//! the planned notifications are the caller's job.

mod error;
mod etag;
mod invitation;
mod notification;
mod onboarding;
mod permissions;
mod role;
mod state;
mod transition;

#[cfg(test)]
mod tests;

pub use error::CoreError;
pub use etag::{generate_etag, new_association_id};
pub use invitation::invite;
pub use notification::{
    EmailKind, Notification, NotificationContext, Party, PlannedChange, Recipient,
    plan_notifications,
};
pub use onboarding::{add, import_migrated, retire_duplicate};
pub use permissions::{RULES, Rule, TransitionKind, authorise, find_rule};
pub use role::{ActorContext, ActorRole, classify};
pub use state::{ImportOutcome, TransitionRequest, TransitionResult};
pub use transition::transition;

/// Attempts made to commit one change before a version conflict is
/// reported to the caller: the first try plus two retries from a fresh read.
pub const MAX_TRANSITION_ATTEMPTS: u32 = 3;
