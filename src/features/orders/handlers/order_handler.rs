use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::AppError;
use crate::core::extractor::AppJson;
use crate::features::auth::guards::RequireAdmin;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::orders::dtos::{
    is_file_allowed, CreateOrderDto, DeleteOrderResponseDto, OrderOptions, OrderResponseDto,
    PublicAlbumDto, UpdateNotesDto, UpdateStatusDto,
};
use crate::features::orders::models::{CoverType, Lamination, PageType};
use crate::features::orders::services::OrderService;
use crate::modules::storage::StagedFile;
use crate::shared::constants::ALLOWED_EXTENSIONS;
use crate::shared::types::ApiResponse;

/// Parse a multipart text field into one of the option enums via its wire name
fn parse_option<T: DeserializeOwned>(field: &str, value: &str) -> Result<T, AppError> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| AppError::Validation(format!("Invalid value '{}' for {}", value, field)))
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "on")
}

/// Create a print order
///
/// Accepts multipart/form-data with the album archive under `file` plus the
/// print option fields (`albumName`, `pageType`, `lamination`, `transparent`,
/// `emboss`, `miniBook`, `coverType`).
#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "orders",
    request_body(
        content = CreateOrderDto,
        content_type = "multipart/form-data",
        description = "Album archive upload with print options",
    ),
    responses(
        (status = 201, description = "Order created", body = ApiResponse<OrderResponseDto>),
        (status = 400, description = "Missing file or invalid options"),
        (status = 401, description = "Authentication required"),
        (status = 413, description = "File too large")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_order(
    user: AuthenticatedUser,
    State(service): State<Arc<OrderService>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<OrderResponseDto>>), AppError> {
    let mut staged: Option<StagedFile> = None;

    let options = match read_order_form(&service, &mut multipart, &mut staged).await {
        Ok(options) => options,
        Err(e) => {
            // A staged file without an order row is an orphan on disk
            if let Some(staged) = staged {
                service.discard_upload(&staged).await;
            }
            return Err(e);
        }
    };

    let staged =
        staged.ok_or_else(|| AppError::BadRequest("Please upload a file".to_string()))?;

    let order = service.create_order(user.id, options, staged).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(order), None)),
    ))
}

/// Walk the multipart fields, streaming the file to disk as its chunks
/// arrive and collecting the print options.
///
/// On success the staged file is handed back through `staged`; the caller
/// owns its cleanup from that point on, including any error returned here
/// after the file field was already consumed.
async fn read_order_form(
    service: &OrderService,
    multipart: &mut Multipart,
    staged: &mut Option<StagedFile>,
) -> Result<OrderOptions, AppError> {
    let mut album_name: Option<String> = None;
    let mut page_type: Option<PageType> = None;
    let mut lamination: Option<Lamination> = None;
    let mut cover_type: Option<CoverType> = None;
    let mut transparent = false;
    let mut emboss = false;
    let mut mini_book = false;

    while let Some(mut field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let ct = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let fname = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unnamed".to_string());

                if !is_file_allowed(&fname, &ct) {
                    return Err(AppError::BadRequest(format!(
                        "File type not allowed. Allowed types: {}",
                        ALLOWED_EXTENSIONS.join(", ")
                    )));
                }

                let mut upload = service.begin_upload(&fname, &ct).await?;

                loop {
                    match field.chunk().await {
                        Ok(Some(chunk)) => {
                            if let Err(e) = upload.write_chunk(&chunk).await {
                                upload.discard().await;
                                return Err(e);
                            }
                        }
                        Ok(None) => break,
                        Err(e) => {
                            debug!("Failed to read file bytes: {}", e);
                            upload.discard().await;
                            return Err(AppError::BadRequest(format!(
                                "Failed to read file data: {}",
                                e
                            )));
                        }
                    }
                }

                *staged = Some(upload.finish().await?);
            }
            "albumName" => {
                let text = read_text(field).await?;
                if !text.trim().is_empty() {
                    album_name = Some(text);
                }
            }
            "pageType" => page_type = Some(parse_option("pageType", &read_text(field).await?)?),
            "lamination" => {
                lamination = Some(parse_option("lamination", &read_text(field).await?)?)
            }
            "coverType" => cover_type = Some(parse_option("coverType", &read_text(field).await?)?),
            "transparent" => transparent = parse_flag(&read_text(field).await?),
            "emboss" => emboss = parse_flag(&read_text(field).await?),
            "miniBook" => mini_book = parse_flag(&read_text(field).await?),
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    Ok(OrderOptions {
        album_name: album_name
            .ok_or_else(|| AppError::Validation("albumName is required".to_string()))?,
        page_type: page_type
            .ok_or_else(|| AppError::Validation("pageType is required".to_string()))?,
        lamination: lamination
            .ok_or_else(|| AppError::Validation("lamination is required".to_string()))?,
        transparent,
        emboss,
        mini_book,
        cover_type: cover_type
            .ok_or_else(|| AppError::Validation("coverType is required".to_string()))?,
    })
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    let name = field.name().unwrap_or("").to_string();
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read field '{}': {}", name, e)))
}

/// List the authenticated user's own orders
#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "orders",
    responses(
        (status = 200, description = "Orders", body = ApiResponse<Vec<OrderResponseDto>>),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_my_orders(
    user: AuthenticatedUser,
    State(service): State<Arc<OrderService>>,
) -> Result<Json<ApiResponse<Vec<OrderResponseDto>>>, AppError> {
    let orders = service.list_for_user(user.id).await?;

    Ok(Json(ApiResponse::success(Some(orders), None)))
}

/// List all orders with owner identity (admin only)
#[utoipa::path(
    get,
    path = "/api/orders/all",
    tag = "orders",
    responses(
        (status = 200, description = "All orders", body = ApiResponse<Vec<OrderResponseDto>>),
        (status = 401, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_all_orders(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<OrderService>>,
) -> Result<Json<ApiResponse<Vec<OrderResponseDto>>>, AppError> {
    let orders = service.list_all().await?;

    Ok(Json(ApiResponse::success(Some(orders), None)))
}

/// Get a single order, visible to its owner or an admin
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    tag = "orders",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order", body = ApiResponse<OrderResponseDto>),
        (status = 401, description = "Not authorized to access this order"),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_order_by_id(
    user: AuthenticatedUser,
    State(service): State<Arc<OrderService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderResponseDto>>, AppError> {
    let order = service.get_order(id, &user).await?;

    Ok(Json(ApiResponse::success(Some(order), None)))
}

/// Advance an order's status by one step (admin only)
#[utoipa::path(
    put,
    path = "/api/orders/{id}/status",
    tag = "orders",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateStatusDto,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<OrderResponseDto>),
        (status = 400, description = "Invalid status transition"),
        (status = 401, description = "Admin access required"),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_order_status(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<OrderService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateStatusDto>,
) -> Result<Json<ApiResponse<OrderResponseDto>>, AppError> {
    let order = service.update_status(id, dto.status).await?;

    Ok(Json(ApiResponse::success(
        Some(order),
        Some("Order status updated".to_string()),
    )))
}

/// Set admin notes on an order (admin only)
#[utoipa::path(
    put,
    path = "/api/orders/{id}/notes",
    tag = "orders",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateNotesDto,
    responses(
        (status = 200, description = "Notes saved", body = ApiResponse<OrderResponseDto>),
        (status = 401, description = "Admin access required"),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_order_notes(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<OrderService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateNotesDto>,
) -> Result<Json<ApiResponse<OrderResponseDto>>, AppError> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let order = service.set_notes(id, dto.notes).await?;

    Ok(Json(ApiResponse::success(Some(order), None)))
}

/// Download an order's file (admin only)
///
/// The first successful admin download is recorded on the order.
#[utoipa::path(
    get,
    path = "/api/orders/{id}/download",
    tag = "orders",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "File stream"),
        (status = 307, description = "Redirect for legacy records"),
        (status = 401, description = "Admin access required"),
        (status = 404, description = "Order or file not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn download_order_file(
    RequireAdmin(user): RequireAdmin,
    State(service): State<Arc<OrderService>>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    service.download(id, &user).await
}

/// Download a Drive-held file by its provider id
///
/// Available to the order's owner or an admin; authorization is derived
/// from the owning order.
#[utoipa::path(
    get,
    path = "/api/orders/drive/{file_id}/download",
    tag = "orders",
    params(("file_id" = String, Path, description = "Google Drive file id")),
    responses(
        (status = 200, description = "File stream"),
        (status = 401, description = "Not authorized to download this file"),
        (status = 404, description = "Order not found for this file"),
        (status = 503, description = "Remote storage not configured")
    ),
    security(("bearer_auth" = []))
)]
pub async fn download_drive_file(
    user: AuthenticatedUser,
    State(service): State<Arc<OrderService>>,
    Path(file_id): Path<String>,
) -> Result<Response, AppError> {
    service.download_by_drive_id(&file_id, &user).await
}

/// Delete an order and its stored file (admin only)
#[utoipa::path(
    delete,
    path = "/api/orders/{id}",
    tag = "orders",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order removed", body = ApiResponse<DeleteOrderResponseDto>),
        (status = 401, description = "Admin access required"),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_order(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<OrderService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeleteOrderResponseDto>>, AppError> {
    service.delete_order(id).await?;

    Ok(Json(ApiResponse::success(
        Some(DeleteOrderResponseDto { deleted: true }),
        Some("Order removed".to_string()),
    )))
}

/// Public album lookup for the QR landing page (no authentication)
#[utoipa::path(
    get,
    path = "/api/orders/album/{id}",
    tag = "orders",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Album summary", body = ApiResponse<PublicAlbumDto>),
        (status = 404, description = "Order not found")
    )
)]
pub async fn get_public_album(
    State(service): State<Arc<OrderService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PublicAlbumDto>>, AppError> {
    let album = service.public_album(id).await?;

    Ok(Json(ApiResponse::success(Some(album), None)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_enums_parse_from_wire_names() {
        assert_eq!(
            parse_option::<PageType>("pageType", "NT-Slim").ok(),
            Some(PageType::NtSlim)
        );
        assert_eq!(
            parse_option::<Lamination>("lamination", "Glossy").ok(),
            Some(Lamination::Glossy)
        );
        assert_eq!(
            parse_option::<CoverType>("coverType", "Softcover").ok(),
            Some(CoverType::Softcover)
        );
    }

    #[test]
    fn unknown_option_value_is_a_validation_error() {
        let err = parse_option::<PageType>("pageType", "Jumbo").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn flags_accept_common_truthy_spellings() {
        assert!(parse_flag("true"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(parse_flag("on"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
        assert!(!parse_flag("no"));
    }
}
