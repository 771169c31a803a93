use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::modules::storage::{StorageProvider, StoredRecord};

/// Order lifecycle status, stored as the `order_status` Postgres enum.
///
/// Status only moves forward, one step at a time; see
/// [`OrderStatus::can_transition_to`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema, Default,
)]
#[sqlx(type_name = "order_status", rename_all = "PascalCase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Acknowledged,
    Printing,
    GeneratingAlbum,
    Completed,
}

impl OrderStatus {
    /// The next state in the fixed forward sequence
    pub fn successor(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Acknowledged),
            OrderStatus::Acknowledged => Some(OrderStatus::Printing),
            OrderStatus::Printing => Some(OrderStatus::GeneratingAlbum),
            OrderStatus::GeneratingAlbum => Some(OrderStatus::Completed),
            OrderStatus::Completed => None,
        }
    }

    /// Whether `next` is reachable from this state in one step
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        self.successor() == Some(next)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "page_type")]
pub enum PageType {
    Regular,
    #[sqlx(rename = "NT-Slim")]
    #[serde(rename = "NT-Slim")]
    NtSlim,
    #[sqlx(rename = "NT-Thick")]
    #[serde(rename = "NT-Thick")]
    NtThick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lamination_type", rename_all = "PascalCase")]
pub enum Lamination {
    Matte,
    Glossy,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "cover_type", rename_all = "PascalCase")]
pub enum CoverType {
    Leather,
    Hardcover,
    Softcover,
}

/// Database model for orders.
///
/// Exactly one storage locator set is populated, matching
/// `storage_provider`: `server_filename` for local, `drive_file_id` and
/// `drive_file_link` for Google Drive, `public_id` for legacy records.
#[derive(Debug, Clone, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
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

impl Order {
    /// The storage-relevant slice handed to the dispatcher
    pub fn stored_record(&self) -> StoredRecord<'_> {
        StoredRecord {
            provider: self.storage_provider,
            original_filename: &self.original_filename,
            server_filename: self.server_filename.as_deref(),
            drive_file_id: self.drive_file_id.as_deref(),
            public_id: self.public_id.as_deref(),
            file_url: &self.file_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_moves_forward_one_step_at_a_time() {
        use OrderStatus::*;

        assert!(Pending.can_transition_to(Acknowledged));
        assert!(Acknowledged.can_transition_to(Printing));
        assert!(Printing.can_transition_to(GeneratingAlbum));
        assert!(GeneratingAlbum.can_transition_to(Completed));
    }

    #[test]
    fn skips_and_backward_moves_are_rejected() {
        use OrderStatus::*;

        assert!(!Pending.can_transition_to(Printing));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Acknowledged.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(GeneratingAlbum));
        // Re-entering the same state is not a transition either
        assert!(!Printing.can_transition_to(Printing));
    }

    #[test]
    fn completed_is_terminal() {
        assert_eq!(OrderStatus::Completed.successor(), None);
    }
}
