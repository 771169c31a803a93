use std::sync::Arc;

use axum::response::Response;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::orders::dtos::{OrderOptions, OrderResponseDto, PublicAlbumDto};
use crate::features::orders::models::{Order, OrderStatus};
use crate::modules::storage::{StagedFile, StagedUpload, StorageDispatcher};
use crate::shared::constants::MAX_FILE_SIZE;

/// Joined row for admin views that carry the owner's identity
#[derive(Debug, FromRow)]
struct OrderWithOwner {
    #[sqlx(flatten)]
    order: Order,
    owner_name: String,
    owner_email: String,
}

impl From<OrderWithOwner> for OrderResponseDto {
    fn from(row: OrderWithOwner) -> Self {
        OrderResponseDto::with_owner(row.order, row.owner_name, row.owner_email)
    }
}

/// Business logic for print orders: persistence, the status machine, and
/// the bridge into the storage dispatcher.
pub struct OrderService {
    pool: PgPool,
    dispatcher: Arc<StorageDispatcher>,
    qr_base_url: String,
}

impl OrderService {
    pub fn new(pool: PgPool, dispatcher: Arc<StorageDispatcher>, qr_base_url: String) -> Self {
        Self {
            pool,
            dispatcher,
            qr_base_url: qr_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Open a staged write for an incoming upload, capped at the configured
    /// maximum file size
    pub async fn begin_upload(
        &self,
        original_filename: &str,
        content_type: &str,
    ) -> Result<StagedUpload> {
        self.dispatcher
            .local()
            .begin_stage(original_filename, content_type, MAX_FILE_SIZE as u64)
            .await
    }

    /// Remove a staged file whose order never materialized
    pub async fn discard_upload(&self, staged: &StagedFile) {
        if let Err(e) = self.dispatcher.local().remove(&staged.path).await {
            tracing::warn!("Failed to remove staged file: {}", e);
        }
    }

    /// Resolve a staged upload to a storage provider and persist the order
    /// row. Storage resolution cannot fail the request; a Drive outage means
    /// the file simply stays local.
    pub async fn create_order(
        &self,
        user_id: Uuid,
        options: OrderOptions,
        staged: StagedFile,
    ) -> Result<OrderResponseDto> {
        let stored = self.dispatcher.store(&staged).await;

        let order = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (
                user_id, album_name, file_url, server_filename, original_filename,
                file_size, page_type, lamination, transparent, emboss, mini_book,
                cover_type, storage_provider, drive_file_id, drive_file_link
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&options.album_name)
        .bind(&stored.file_url)
        .bind(&stored.server_filename)
        .bind(&staged.original_filename)
        .bind(staged.size)
        .bind(options.page_type)
        .bind(options.lamination)
        .bind(options.transparent)
        .bind(options.emboss)
        .bind(options.mini_book)
        .bind(options.cover_type)
        .bind(stored.provider)
        .bind(&stored.drive_file_id)
        .bind(&stored.drive_file_link)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            order_id = %order.id,
            provider = ?order.storage_provider,
            "Order created"
        );

        Ok(order.into())
    }

    /// Orders owned by the requesting user, newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OrderResponseDto>> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders.into_iter().map(Into::into).collect())
    }

    /// All orders with owner identity, newest first (admin view)
    pub async fn list_all(&self) -> Result<Vec<OrderResponseDto>> {
        let rows = sqlx::query_as::<_, OrderWithOwner>(
            r#"
            SELECT o.*, u.name AS owner_name, u.email AS owner_email
            FROM orders o
            JOIN users u ON u.id = o.user_id
            ORDER BY o.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// A single order, visible to its owner or an admin
    pub async fn get_order(&self, id: Uuid, user: &AuthenticatedUser) -> Result<OrderResponseDto> {
        let row = self.fetch_with_owner(id).await?;
        if !user.can_access_order_of(row.order.user_id) {
            return Err(AppError::Unauthorized(
                "Not authorized to access this order".to_string(),
            ));
        }
        Ok(row.into())
    }

    /// Advance the status machine by exactly one step.
    ///
    /// The QR code is assigned at most once, on the GeneratingAlbum to
    /// Completed transition, and never overwritten afterwards.
    pub async fn update_status(&self, id: Uuid, next: OrderStatus) -> Result<OrderResponseDto> {
        let order = self.fetch(id).await?;

        if !order.status.can_transition_to(next) {
            return Err(AppError::Validation(format!(
                "Invalid status transition from {} to {}",
                order.status, next
            )));
        }

        let qr_code = if order.status == OrderStatus::GeneratingAlbum
            && next == OrderStatus::Completed
            && order.qr_code.is_none()
        {
            Some(format!("{}/album/{}", self.qr_base_url, order.id))
        } else {
            order.qr_code.clone()
        };

        let updated = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET status = $2, qr_code = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(next)
        .bind(&qr_code)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(order_id = %id, from = %order.status, to = %next, "Order status updated");

        Ok(updated.into())
    }

    pub async fn set_notes(&self, id: Uuid, notes: String) -> Result<OrderResponseDto> {
        let updated = sqlx::query_as::<_, Order>(
            "UPDATE orders SET admin_notes = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(notes)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        Ok(updated.into())
    }

    /// Stream the order's file to an admin, recording the first download
    pub async fn download(&self, id: Uuid, user: &AuthenticatedUser) -> Result<Response> {
        let order = self.fetch(id).await?;
        if !user.can_access_order_of(order.user_id) {
            return Err(AppError::Unauthorized(
                "Not authorized to download this file".to_string(),
            ));
        }

        if user.is_admin() && !order.downloaded_by_admin {
            sqlx::query("UPDATE orders SET downloaded_by_admin = TRUE, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
        }

        self.dispatcher.download(order.stored_record()).await
    }

    /// Stream a Drive-held file addressed by its provider id. Authorization
    /// is re-derived from the owning order, never taken from the URL alone.
    pub async fn download_by_drive_id(
        &self,
        file_id: &str,
        user: &AuthenticatedUser,
    ) -> Result<Response> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE drive_file_id = $1")
            .bind(file_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found for this file".to_string()))?;

        if !user.can_access_order_of(order.user_id) {
            return Err(AppError::Unauthorized(
                "Not authorized to download this file".to_string(),
            ));
        }

        self.dispatcher.download_drive(file_id).await
    }

    /// Remove the order row after a best-effort cleanup of its stored file.
    /// Storage failures are logged by the dispatcher and never block the
    /// delete; album pages go with the row via the foreign key cascade.
    pub async fn delete_order(&self, id: Uuid) -> Result<()> {
        let order = self.fetch(id).await?;

        self.dispatcher.remove(order.stored_record()).await;

        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::info!(order_id = %id, "Order removed");
        Ok(())
    }

    /// Unauthenticated album lookup used by the QR landing page
    pub async fn public_album(&self, id: Uuid) -> Result<PublicAlbumDto> {
        let order = self.fetch(id).await?;
        Ok(PublicAlbumDto {
            album_name: order.album_name,
            order_id: order.id,
            status: order.status,
        })
    }

    async fn fetch(&self, id: Uuid) -> Result<Order> {
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
    }

    async fn fetch_with_owner(&self, id: Uuid) -> Result<OrderWithOwner> {
        sqlx::query_as::<_, OrderWithOwner>(
            r#"
            SELECT o.*, u.name AS owner_name, u.email AS owner_email
            FROM orders o
            JOIN users u ON u.id = o.user_id
            WHERE o.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
    }
}
