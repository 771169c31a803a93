use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth::{dtos as auth_dtos, handlers as auth_handlers, model, models};
use crate::features::orders::{
    dtos as orders_dtos, handlers::order_handler, models as orders_models,
};
use crate::modules::storage::StorageProvider;
use crate::shared::types::ApiResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Users
        auth_handlers::register,
        auth_handlers::login,
        auth_handlers::get_profile,
        auth_handlers::list_photographers,
        auth_handlers::delete_user,
        // Orders
        order_handler::create_order,
        order_handler::get_my_orders,
        order_handler::get_all_orders,
        order_handler::get_order_by_id,
        order_handler::update_order_status,
        order_handler::add_order_notes,
        order_handler::download_order_file,
        order_handler::download_drive_file,
        order_handler::delete_order,
        order_handler::get_public_album,
    ),
    components(
        schemas(
            // Users
            models::UserRole,
            model::AuthenticatedUser,
            auth_dtos::RegisterDto,
            auth_dtos::LoginDto,
            auth_dtos::AuthUserDto,
            auth_dtos::UserProfileDto,
            auth_dtos::DeleteUserResponseDto,
            ApiResponse<auth_dtos::AuthUserDto>,
            ApiResponse<auth_dtos::UserProfileDto>,
            ApiResponse<Vec<auth_dtos::UserProfileDto>>,
            ApiResponse<auth_dtos::DeleteUserResponseDto>,
            // Orders
            orders_models::OrderStatus,
            orders_models::PageType,
            orders_models::Lamination,
            orders_models::CoverType,
            StorageProvider,
            orders_dtos::CreateOrderDto,
            orders_dtos::OrderResponseDto,
            orders_dtos::UpdateStatusDto,
            orders_dtos::UpdateNotesDto,
            orders_dtos::PublicAlbumDto,
            orders_dtos::DeleteOrderResponseDto,
            ApiResponse<orders_dtos::OrderResponseDto>,
            ApiResponse<Vec<orders_dtos::OrderResponseDto>>,
            ApiResponse<orders_dtos::PublicAlbumDto>,
            ApiResponse<orders_dtos::DeleteOrderResponseDto>,
        )
    ),
    tags(
        (name = "users", description = "Account registration, login and profiles"),
        (name = "orders", description = "Print orders, status tracking and file downloads"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Photofine API",
        version = "0.1.0",
        description = "Order management API for photo album printing",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
