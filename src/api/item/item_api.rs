//! The item API implementation.

use crate::{
    domain::item::{
        item_model::{CreateItemRequest, ItemResponse, UpdateItemRequest},
        item_service::{ItemQuery, SortKey, SortOrder},
    },
    infra::{
        config::InventoryConfig,
        error::{ApiResult, ClientError},
        extract::{Json, Query},
        state::{AppItemService, AppState},
        validation::Valid,
    },
};
use axum::{extract::State, Router};
use axum_extra::routing::{RouterExt, TypedPath};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::IntoParams;

/// The item API endpoints.
pub fn routes() -> Router<AppState> {
    Router::new()
        .typed_get(list_items)
        .typed_post(create_item)
        .typed_get(list_low_stock)
        .typed_get(get_item)
        .typed_put(update_item)
        .typed_delete(delete_item)
}

#[derive(Debug, Deserialize, TypedPath)]
#[typed_path("/items", rejection(ClientError))]
pub struct Items;

#[derive(Debug, Deserialize, TypedPath)]
#[typed_path("/items/low-stock", rejection(ClientError))]
pub struct LowStockItems;

#[derive(Debug, Deserialize, TypedPath)]
#[typed_path("/items/:id", rejection(ClientError))]
pub struct ItemsId(pub i64);

/// Filtering and sorting of the item listing.
#[derive(Clone, Debug, Default, Serialize, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Only include items costing at least this much.
    min_price: Option<f64>,
    /// Only include items costing at most this much.
    max_price: Option<f64>,
    /// `price` sorts by price, anything else by id.
    #[param(default = "id")]
    sort_by: Option<String>,
    /// `desc` sorts in descending order, anything else ascending.
    #[param(default = "asc")]
    order: Option<String>,
}

impl From<ListParams> for ItemQuery {
    fn from(params: ListParams) -> Self {
        ItemQuery {
            min_price: params.min_price,
            max_price: params.max_price,
            sort_by: params.sort_by.as_deref().map(SortKey::from).unwrap_or_default(),
            order: params.order.as_deref().map(SortOrder::from).unwrap_or_default(),
        }
    }
}

/// Options for the low-stock listing.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LowStockParams {
    /// Include items with at most this many units. Defaults to the configured threshold.
    threshold: Option<i32>,
}

/// Lists items, optionally filtered by price and sorted.
#[utoipa::path(
    get,
    path = "/api/items",
    params(ListParams),
    responses(
        (status = 200, description = "Ok", body = [ItemResponse]),
        (status = 400, description = "Bad Request", body = ErrorBody),
        (status = 502, description = "Bad Gateway", body = ErrorBody),
    ),
    tag = "items"
)]
#[instrument(skip_all)]
pub async fn list_items(
    Items: Items,
    State(items): State<AppItemService>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<ItemResponse>>> {
    let items = items.list_items(&params.into()).await?;
    Ok(Json(items))
}

/// Lists items that are running low.
#[utoipa::path(
    get,
    path = "/api/items/low-stock",
    params(LowStockParams),
    responses(
        (status = 200, description = "Ok", body = [ItemResponse]),
        (status = 400, description = "Bad Request", body = ErrorBody),
        (status = 502, description = "Bad Gateway", body = ErrorBody),
    ),
    tag = "items"
)]
#[instrument(skip_all)]
pub async fn list_low_stock(
    LowStockItems: LowStockItems,
    State(items): State<AppItemService>,
    State(inventory): State<InventoryConfig>,
    Query(params): Query<LowStockParams>,
) -> ApiResult<Json<Vec<ItemResponse>>> {
    let threshold = params.threshold.unwrap_or(inventory.low_stock_threshold);
    let items = items.list_low_stock(threshold).await?;
    Ok(Json(items))
}

/// Gets an item.
#[utoipa::path(
    get,
    path = "/api/items/{id}",
    params(("id" = i64, Path, description = "The item's id")),
    responses(
        (status = 200, description = "Ok", body = ItemResponse),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 502, description = "Bad Gateway", body = ErrorBody),
    ),
    tag = "items"
)]
#[instrument(skip(items))]
pub async fn get_item(
    ItemsId(id): ItemsId,
    State(items): State<AppItemService>,
) -> ApiResult<Json<ItemResponse>> {
    let item = items.get_item(id).await?;
    Ok(Json(item))
}

/// Creates a new item.
#[utoipa::path(
    post,
    path = "/api/items",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Created", body = ItemResponse),
        (status = 400, description = "Bad Request", body = ErrorBody),
        (status = 502, description = "Bad Gateway", body = ErrorBody),
    ),
    tag = "items"
)]
#[instrument(skip_all)]
pub async fn create_item(
    Items: Items,
    State(items): State<AppItemService>,
    Json(request): Json<CreateItemRequest>,
) -> ApiResult<(StatusCode, Json<ItemResponse>)> {
    let request = Valid::new(request)?;
    let item = items.create_item(request.into_inner()).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Replaces every field of an item.
#[utoipa::path(
    put,
    path = "/api/items/{id}",
    params(("id" = i64, Path, description = "The item's id")),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Ok", body = ItemResponse),
        (status = 400, description = "Bad Request", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 502, description = "Bad Gateway", body = ErrorBody),
    ),
    tag = "items"
)]
#[instrument(skip(items, request))]
pub async fn update_item(
    ItemsId(id): ItemsId,
    State(items): State<AppItemService>,
    Json(request): Json<UpdateItemRequest>,
) -> ApiResult<Json<ItemResponse>> {
    let request = Valid::new(request)?;
    let item = items.update_item(id, request.into_inner()).await?;
    Ok(Json(item))
}

/// Deletes an item.
#[utoipa::path(
    delete,
    path = "/api/items/{id}",
    params(("id" = i64, Path, description = "The item's id")),
    responses(
        (status = 204, description = "No Content"),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 502, description = "Bad Gateway", body = ErrorBody),
    ),
    tag = "items"
)]
#[instrument(skip(items))]
pub async fn delete_item(
    ItemsId(id): ItemsId,
    State(items): State<AppItemService>,
) -> ApiResult<StatusCode> {
    items.delete_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
