// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use company_assoc_audit::Actor;
use company_assoc_domain::Association;
use serde::{Deserialize, Serialize};

/// Facts about the actor that need a store lookup to establish.
///
/// The caller gathers these before invoking the core, which stays free of I/O.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActorContext {
    /// The actor holds a confirmed association with the company in question.
    pub is_company_member: bool,
}

impl ActorContext {
    #[must_use]
    pub const fn member() -> Self {
        Self {
            is_company_member: true,
        }
    }

    #[must_use]
    pub const fn outsider() -> Self {
        Self {
            is_company_member: false,
        }
    }
}

/// The single role an actor plays relative to one association.
///
/// Variants are listed in precedence order: when several apply, the
/// first one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActorRole {
    ElevatedApiKey,
    ApiKey,
    /// The user the association belongs to.
    Owner,
    /// A user holding admin-update.
    Admin,
    /// A user who sent one of the association's invitations.
    Inviter,
    /// A user confirmed with the same company.
    CompanyMember,
    Stranger,
}

impl ActorRole {
    pub const ALL: [Self; 7] = [
        Self::ElevatedApiKey,
        Self::ApiKey,
        Self::Owner,
        Self::Admin,
        Self::Inviter,
        Self::CompanyMember,
        Self::Stranger,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ElevatedApiKey => "elevated-api-key",
            Self::ApiKey => "api-key",
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Inviter => "inviter",
            Self::CompanyMember => "company-member",
            Self::Stranger => "stranger",
        }
    }

    /// Classifies an actor relative to a company when no association is
    /// involved yet (adding, inviting, importing).
    #[must_use]
    pub const fn for_company(actor: &Actor, context: &ActorContext) -> Self {
        if actor.is_elevated_api_key() {
            Self::ElevatedApiKey
        } else if actor.is_api_key() {
            Self::ApiKey
        } else if actor.admin_update {
            Self::Admin
        } else if context.is_company_member {
            Self::CompanyMember
        } else {
            Self::Stranger
        }
    }
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies an actor relative to one association.
///
/// # Arguments
///
/// * `actor` - The caller
/// * `association` - The association being acted on
/// * `context` - Store-derived facts about the caller
#[must_use]
pub fn classify(actor: &Actor, association: &Association, context: &ActorContext) -> ActorRole {
    if actor.is_elevated_api_key() {
        return ActorRole::ElevatedApiKey;
    }
    if actor.is_api_key() {
        return ActorRole::ApiKey;
    }
    if association.belongs_to(actor.user_id(), actor.email.as_deref()) {
        return ActorRole::Owner;
    }
    if actor.admin_update {
        return ActorRole::Admin;
    }
    if association.was_invited_by(&actor.id) {
        return ActorRole::Inviter;
    }
    if context.is_company_member {
        return ActorRole::CompanyMember;
    }
    ActorRole::Stranger
}
