use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::orders::models::{CoverType, Lamination, Order, OrderStatus, PageType};
use crate::modules::storage::StorageProvider;
use crate::shared::constants::{ALLOWED_EXTENSIONS, ALLOWED_MIME_TYPES};

/// Order creation request DTO for OpenAPI documentation.
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler uses axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct CreateOrderDto {
    /// The album archive to upload (zip, rar, 7z or pdf)
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
    /// Display name of the album
    #[schema(example = "Wedding 2025")]
    pub album_name: String,
    /// Page type: "Regular", "NT-Slim" or "NT-Thick"
    #[schema(example = "Regular")]
    pub page_type: String,
    /// Lamination: "Matte", "Glossy" or "None"
    #[schema(example = "Matte")]
    pub lamination: String,
    /// Transparent cover flag ("true"/"false")
    pub transparent: Option<String>,
    /// Emboss flag ("true"/"false")
    pub emboss: Option<String>,
    /// Mini book flag ("true"/"false")
    pub mini_book: Option<String>,
    /// Cover type: "Leather", "Hardcover" or "Softcover"
    #[schema(example = "Hardcover")]
    pub cover_type: String,
}

/// Order options collected from the multipart form fields
#[derive(Debug, Clone)]
pub struct OrderOptions {
    pub album_name: String,
    pub page_type: PageType,
    pub lamination: Lamination,
    pub transparent: bool,
    pub emboss: bool,
    pub mini_book: bool,
    pub cover_type: CoverType,
}

/// Full order representation returned to clients
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponseDto {
    pub id: Uuid,
    /// Owning user id
    pub user: Uuid,
    /// Owner name, present on admin views only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    /// Owner email, present on admin views only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    pub album_name: String,
    pub file_url: String,
    pub public_id: Option<String>,
    pub server_filename: Option<String>,
    pub original_filename: String,
    pub file_size: i64,
    pub status: OrderStatus,
    pub page_type: PageType,
    pub lamination: Lamination,
    pub transparent: bool,
    pub emboss: bool,
    pub mini_book: bool,
    pub cover_type: CoverType,
    pub qr_code: Option<String>,
    pub album_pages_count: i32,
    pub cover_index: i32,
    pub downloaded_by_admin: bool,
    pub admin_notes: String,
    pub storage_provider: StorageProvider,
    pub drive_file_id: Option<String>,
    pub drive_file_link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderResponseDto {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            user: order.user_id,
            user_name: None,
            user_email: None,
            album_name: order.album_name,
            file_url: order.file_url,
            public_id: order.public_id,
            server_filename: order.server_filename,
            original_filename: order.original_filename,
            file_size: order.file_size,
            status: order.status,
            page_type: order.page_type,
            lamination: order.lamination,
            transparent: order.transparent,
            emboss: order.emboss,
            mini_book: order.mini_book,
            cover_type: order.cover_type,
            qr_code: order.qr_code,
            album_pages_count: order.album_pages_count,
            cover_index: order.cover_index,
            downloaded_by_admin: order.downloaded_by_admin,
            admin_notes: order.admin_notes,
            storage_provider: order.storage_provider,
            drive_file_id: order.drive_file_id,
            drive_file_link: order.drive_file_link,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

impl OrderResponseDto {
    pub fn with_owner(order: Order, name: String, email: String) -> Self {
        let mut dto = Self::from(order);
        dto.user_name = Some(name);
        dto.user_email = Some(email);
        dto
    }
}

/// Request DTO for status updates
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusDto {
    /// Target status; must be the immediate successor of the current one
    pub status: OrderStatus,
}

/// Request DTO for admin notes
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateNotesDto {
    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: String,
}

/// Public album lookup response, safe to expose without authentication
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicAlbumDto {
    pub album_name: String,
    pub order_id: Uuid,
    pub status: OrderStatus,
}

/// Response DTO for delete operations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteOrderResponseDto {
    /// Confirmation that the order was removed
    pub deleted: bool,
}

/// Check whether an upload is acceptable by extension or declared MIME type
pub fn is_file_allowed(filename: &str, content_type: &str) -> bool {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    let ext_ok = ext
        .as_deref()
        .is_some_and(|e| ALLOWED_EXTENSIONS.contains(&e));
    ext_ok || ALLOWED_MIME_TYPES.contains(&content_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_archives_by_extension() {
        assert!(is_file_allowed("album.zip", "application/octet-stream"));
        assert!(is_file_allowed("ALBUM.RAR", "application/octet-stream"));
        assert!(is_file_allowed("pages.7z", "application/octet-stream"));
        assert!(is_file_allowed("album.pdf", "application/octet-stream"));
    }

    #[test]
    fn accepts_known_mime_with_odd_extension() {
        assert!(is_file_allowed("upload.bin", "application/zip"));
        assert!(is_file_allowed("upload", "application/pdf"));
    }

    #[test]
    fn rejects_unrelated_files() {
        assert!(!is_file_allowed("photo.jpg", "image/jpeg"));
        assert!(!is_file_allowed("notes.txt", "text/plain"));
        assert!(!is_file_allowed("archive.tar.gz", "application/gzip"));
    }
}
