// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Notification dispatch.
//!
//! Turns the descriptors planned by the core into one publish call per
//! recipient. Runs after the change is committed: nothing here can fail the
//! change, and one recipient's failure never stops the others.

use std::collections::HashMap;

use company_assoc::{Notification, Party, Recipient};
use company_assoc_domain::{Association, AssociationStatus};
use company_assoc_persistence::AssociationStore;
use tracing::{debug, info, warn};

use crate::gateways::{
    CompanyGateway, EmailPayload, GatewayError, IdentityGateway, NotificationTransport,
};
use crate::handlers::collect_all_pages;

/// Outcome counts for one dispatch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Emails accepted by the transport.
    pub sent: usize,
    /// Recipients that could not be resolved.
    pub skipped: usize,
    /// Emails the transport rejected.
    pub failed: usize,
}

/// A resolved email address and how to address its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Addressee {
    email: String,
    name: String,
}

/// Resolves a party to an address.
///
/// A known email is used as is; otherwise the user id is looked up.
fn resolve_party<I: IdentityGateway + ?Sized>(
    identity: &I,
    party: &Party,
) -> Result<Addressee, GatewayError> {
    if let Some(email) = party.email.as_deref() {
        let name: &str = party
            .display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(email);
        return Ok(Addressee {
            email: email.to_string(),
            name: name.to_string(),
        });
    }

    let Some(user_id) = party.user_id.as_deref() else {
        return Err(GatewayError::NotFound(String::from("<anonymous party>")));
    };
    let user = identity.resolve_by_id(user_id)?;
    Ok(Addressee {
        name: user.display_identity().to_string(),
        email: user.email,
    })
}

/// The name shown for a party in email text.
fn display_name<I: IdentityGateway + ?Sized>(identity: &I, party: &Party) -> Option<String> {
    if party.display_name.is_none()
        && let Some(user_id) = party.user_id.as_deref()
        && let Ok(user) = identity.resolve_by_id(user_id)
    {
        return Some(user.display_identity().to_string());
    }
    party.display_identity().map(str::to_string)
}

/// Publishes every notification planned for a committed change.
///
/// # Arguments
///
/// * `store` - Used to find the company's confirmed members
/// * `identity` - Resolves recipients known only by user id
/// * `companies` - Supplies the company name for email text
/// * `transport` - Publishes the emails
/// * `notifications` - The planned emails
pub fn dispatch<S, I, C, T>(
    store: &mut S,
    identity: &I,
    companies: &C,
    transport: &T,
    notifications: &[Notification],
) -> DispatchReport
where
    S: AssociationStore + ?Sized,
    I: IdentityGateway + ?Sized,
    C: CompanyGateway + ?Sized,
    T: NotificationTransport + ?Sized,
{
    let mut report = DispatchReport::default();
    let mut company_names: HashMap<String, Option<String>> = HashMap::new();

    for notification in notifications {
        let context = &notification.context;

        let company_name: Option<String> = company_names
            .entry(context.company_number.clone())
            .or_insert_with(|| match companies.resolve_company(&context.company_number) {
                Ok(company) => Some(company.company_name),
                Err(err) => {
                    warn!(company_number = %context.company_number, error = %err, "Company name unavailable for email");
                    None
                }
            })
            .clone();

        let recipients: Vec<Result<Addressee, GatewayError>> = match &notification.recipient {
            Recipient::Direct(party) => vec![resolve_party(identity, party)],
            Recipient::CompanyMembers {
                exclude_association_id,
            } => {
                let members = collect_all_pages(|page| {
                    store.list_by_company(
                        &context.company_number,
                        &[AssociationStatus::Confirmed],
                        page,
                    )
                });
                match members {
                    Ok(members) => members
                        .iter()
                        .filter(|member| member.id != *exclude_association_id)
                        .map(|member: &Association| {
                            resolve_party(identity, &Party::subject_of(member))
                        })
                        .collect(),
                    Err(err) => {
                        warn!(
                            kind = %notification.kind,
                            company_number = %context.company_number,
                            error = %err,
                            "Could not list company members, skipping fan-out"
                        );
                        report.skipped += 1;
                        continue;
                    }
                }
            }
        };

        let subject_name: Option<String> = display_name(identity, &context.subject);
        let actor_name: Option<String> = display_name(identity, &context.actor);

        for recipient in recipients {
            let addressee = match recipient {
                Ok(addressee) => addressee,
                Err(err) => {
                    warn!(
                        kind = %notification.kind,
                        association_id = %context.association_id,
                        error = %err,
                        "Skipping recipient that could not be resolved"
                    );
                    report.skipped += 1;
                    continue;
                }
            };

            let payload = EmailPayload {
                to: addressee.email,
                recipient_name: addressee.name,
                company_number: context.company_number.clone(),
                company_name: company_name.clone(),
                association_id: context.association_id.clone(),
                subject_name: subject_name.clone(),
                actor_name: actor_name.clone(),
                invitation_expires_at: context.invitation_expires_at,
            };

            match transport.publish(notification.kind, &payload) {
                Ok(()) => {
                    debug!(kind = %notification.kind, to = %payload.to, "Email handed to transport");
                    report.sent += 1;
                }
                Err(err) => {
                    warn!(kind = %notification.kind, to = %payload.to, error = %err, "Email publish failed");
                    report.failed += 1;
                }
            }
        }
    }

    if !notifications.is_empty() {
        info!(
            sent = report.sent,
            skipped = report.skipped,
            failed = report.failed,
            "Notifications dispatched"
        );
    }
    report
}
