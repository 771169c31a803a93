use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::AppError;
use crate::core::extractor::AppJson;
use crate::features::auth::dtos::{
    AuthUserDto, DeleteUserResponseDto, LoginDto, RegisterDto, UserProfileDto,
};
use crate::features::auth::guards::RequireAdmin;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::services::AuthService;
use crate::shared::types::ApiResponse;

/// Register a new user account
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = RegisterDto,
    responses(
        (status = 201, description = "User registered", body = ApiResponse<AuthUserDto>),
        (status = 400, description = "Validation error or email already in use")
    )
)]
pub async fn register(
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<RegisterDto>,
) -> Result<(StatusCode, Json<ApiResponse<AuthUserDto>>), AppError> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = service.register(dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(user), None)),
    ))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/api/users/login",
    tag = "users",
    request_body = LoginDto,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AuthUserDto>),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<LoginDto>,
) -> Result<Json<ApiResponse<AuthUserDto>>, AppError> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = service.login(dto).await?;

    Ok(Json(ApiResponse::success(Some(user), None)))
}

/// Get the authenticated user's profile
#[utoipa::path(
    get,
    path = "/api/users/profile",
    tag = "users",
    responses(
        (status = 200, description = "Profile", body = ApiResponse<UserProfileDto>),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_profile(
    user: AuthenticatedUser,
    State(service): State<Arc<AuthService>>,
) -> Result<Json<ApiResponse<UserProfileDto>>, AppError> {
    let profile = service.profile(user.id).await?;

    Ok(Json(ApiResponse::success(Some(profile), None)))
}

/// List photographer accounts (admin only)
#[utoipa::path(
    get,
    path = "/api/users/photographers",
    tag = "users",
    responses(
        (status = 200, description = "Photographers", body = ApiResponse<Vec<UserProfileDto>>),
        (status = 401, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_photographers(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<AuthService>>,
) -> Result<Json<ApiResponse<Vec<UserProfileDto>>>, AppError> {
    let photographers = service.list_photographers().await?;

    Ok(Json(ApiResponse::success(Some(photographers), None)))
}

/// Delete a user account (admin only)
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted", body = ApiResponse<DeleteUserResponseDto>),
        (status = 401, description = "Admin access required"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<AuthService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeleteUserResponseDto>>, AppError> {
    service.delete_user(id).await?;

    Ok(Json(ApiResponse::success(
        Some(DeleteUserResponseDto { deleted: true }),
        Some("User removed".to_string()),
    )))
}
