// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use company_assoc::{ActorRole, CoreError};
use company_assoc_domain::{AssociationStatus, DomainError};
use company_assoc_persistence::PersistenceError;

use crate::{
    ApiError, GatewayError, UpdateStatusRequest, parse_status_filter, translate_core_error,
    translate_domain_error, translate_gateway_error, translate_persistence_error,
};

#[test]
fn test_domain_errors_name_the_field() {
    let err = translate_domain_error(DomainError::InvalidEmail(String::from("no @")));
    assert!(matches!(err, ApiError::InvalidInput { ref field, .. } if field == "email"));

    let err = translate_domain_error(DomainError::InvalidPageIndex { page_index: -1 });
    assert!(matches!(err, ApiError::InvalidInput { ref field, .. } if field == "page_index"));
}

#[test]
fn test_core_errors_map_to_rules() {
    let err = translate_core_error(CoreError::InvalidTransition {
        from: AssociationStatus::Removed,
        to: AssociationStatus::Confirmed,
    });
    assert!(matches!(
        err,
        ApiError::DomainRuleViolation { ref rule, .. } if rule == "status_transition"
    ));

    let err = translate_core_error(CoreError::Forbidden {
        action: String::from("remove"),
        role: ActorRole::Stranger,
    });
    assert_eq!(
        err,
        ApiError::Forbidden {
            action: String::from("remove"),
            role: String::from("stranger"),
        }
    );

    let err = translate_core_error(CoreError::DomainViolation(DomainError::InvalidCompanyNumber(
        String::from("x"),
    )));
    assert!(matches!(err, ApiError::InvalidInput { ref field, .. } if field == "company_number"));
}

#[test]
fn test_persistence_errors() {
    let err = translate_persistence_error(PersistenceError::VersionConflict {
        association_id: String::from("1"),
        expected_version: 2,
    });
    assert!(matches!(err, ApiError::Conflict { .. }));

    let err = translate_persistence_error(PersistenceError::DatabaseConnectionFailed(
        String::from("refused"),
    ));
    assert!(matches!(err, ApiError::Unavailable { .. }));

    let err = translate_persistence_error(PersistenceError::QueryFailed(String::from("oops")));
    assert!(matches!(err, ApiError::Internal { .. }));
}

#[test]
fn test_gateway_errors() {
    let err = translate_gateway_error(GatewayError::NotFound(String::from("42")), "User");
    assert_eq!(
        err,
        ApiError::ResourceNotFound {
            resource_type: String::from("User"),
            message: String::from("User '42' does not exist"),
        }
    );

    let err = translate_gateway_error(GatewayError::Unavailable(String::from("timeout")), "Company");
    assert_eq!(
        err,
        ApiError::Unavailable {
            collaborator: String::from("Company directory"),
            message: String::from("timeout"),
        }
    );
}

#[test]
fn test_status_parsing() {
    let request = UpdateStatusRequest {
        status: String::from("awaiting-approval"),
    };
    assert_eq!(
        request.requested_status().unwrap(),
        AssociationStatus::AwaitingApproval
    );

    let request = UpdateStatusRequest {
        status: String::from("approved"),
    };
    assert!(request.requested_status().is_err());

    assert_eq!(parse_status_filter(Some("  ")).unwrap(), None);
    assert_eq!(
        parse_status_filter(Some("confirmed, removed")).unwrap(),
        Some(vec![AssociationStatus::Confirmed, AssociationStatus::Removed])
    );
}

#[test]
fn test_error_display() {
    let err = ApiError::Forbidden {
        action: String::from("list associations"),
        role: String::from("stranger"),
    };
    assert_eq!(
        err.to_string(),
        "Forbidden: caller acting as 'stranger' may not list associations"
    );
}

#[test]
fn test_requests_use_camel_case_and_queries_snake_case() {
    let request: crate::InviteUserRequest = serde_json::from_str(
        r#"{"companyNumber":"111111","inviteeEmail":"robin@gotham.city"}"#,
    )
    .unwrap();
    assert_eq!(request.company_number, "111111");

    let query: crate::CompanyAssociationsQuery =
        serde_json::from_str(r#"{"include_removed":true,"items_per_page":5}"#).unwrap();
    assert_eq!(query.include_removed, Some(true));
    assert_eq!(query.page_request().unwrap().items_per_page(), 5);
    assert_eq!(query.statuses().unwrap().len(), 5);
}
