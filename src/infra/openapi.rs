//! OpenAPI configuration.

use crate::{
    api::{info::info_api, item::item_api},
    domain::item::item_model,
    infra::error::ErrorBody,
};
use utoipa::OpenApi;

/// OpenApi configuration.
#[derive(OpenApi)]
#[openapi(
    info(title = "Inventory Manager", description = "Create, query and restock inventory items."),
    paths(
        info_api::info,
        item_api::list_items,
        item_api::list_low_stock,
        item_api::get_item,
        item_api::create_item,
        item_api::update_item,
        item_api::delete_item,
    ),
    components(
        schemas(
            info_api::AppInfo,
            item_model::CreateItemRequest,
            item_model::UpdateItemRequest,
            item_model::ItemResponse,
            ErrorBody,
        )
    ),
    tags(
        (name = "items", description = "Inventory items"),
        (name = "info", description = "Application information"),
    )
)]
#[derive(Clone, Copy, Debug)]
pub struct ApiDoc;
