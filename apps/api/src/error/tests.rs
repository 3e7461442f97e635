use axum::http::StatusCode;
use axum::response::IntoResponse;
use fieldcrew_core::AppError;

use super::ApiError;

fn status_of(error: AppError) -> StatusCode {
    ApiError::from(error).status_code()
}

#[test]
fn denials_map_to_auth_statuses() {
    assert_eq!(
        status_of(AppError::Unauthenticated("no session".to_owned())),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        status_of(AppError::Forbidden("missing canManageRoles".to_owned())),
        StatusCode::FORBIDDEN
    );
}

#[test]
fn unknown_roles_are_client_errors_not_denials() {
    assert_eq!(
        status_of(AppError::UnknownRole("supervisor".to_owned())),
        StatusCode::BAD_REQUEST
    );
}

#[test]
fn write_conflicts_map_to_409() {
    for error in [
        AppError::Conflict("stale version".to_owned()),
        AppError::DuplicateName("Regional Lead".to_owned()),
        AppError::DanglingAssignment {
            role_id: "r-1".to_owned(),
            holders: 3,
        },
        AppError::InvitationAlreadyConsumed("token".to_owned()),
    ] {
        assert_eq!(status_of(error), StatusCode::CONFLICT);
    }
}

#[test]
fn dead_invitations_map_to_410() {
    assert_eq!(
        status_of(AppError::InvitationExpired("past expiry".to_owned())),
        StatusCode::GONE
    );
    assert_eq!(
        status_of(AppError::InvitationRevoked("revoked".to_owned())),
        StatusCode::GONE
    );
}

#[test]
fn internal_errors_hide_their_detail() {
    let response =
        ApiError::from(AppError::Internal("password=hunter2".to_owned())).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
