//! A service for interacting with items.
//!
//! # Examples
//!
//! ```rust
//! # use inventory_manager::domain::item::{
//! #     item_mapper::ItemMapper,
//! #     item_model::CreateItemRequest,
//! #     item_repository::InMemoryItemRepository,
//! #     item_service::{ItemQuery, ItemService, SortKey, SortOrder},
//! # };
//! # tokio_test::block_on(async {
//! let service = ItemService::new(InMemoryItemRepository::new(), ItemMapper);
//! for (name, price) in [("Cheap", 10.0), ("Pricey", 50.0)] {
//!     let request = CreateItemRequest {
//!         name: name.to_string(),
//!         description: None,
//!         quantity: 1,
//!         price,
//!     };
//!     service.create_item(request).await.unwrap();
//! }
//!
//! let query = ItemQuery {
//!     min_price: Some(20.0),
//!     max_price: None,
//!     sort_by: SortKey::Price,
//!     order: SortOrder::Asc,
//! };
//! let items = service.list_items(&query).await.unwrap();
//! assert_eq!(1, items.len());
//! assert_eq!("Pricey", items[0].name);
//! # });
//! ```

use super::{
    item_error::{ItemError, ItemResult},
    item_mapper::ItemMapper,
    item_model::{CreateItemRequest, Item, ItemResponse, UpdateItemRequest},
    item_repository::ItemRepository,
};
use std::cmp::Ordering;
use tracing::instrument;

/// The field items are sorted by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Id,
    Price,
}

impl SortKey {
    fn compare(self, a: &Item, b: &Item) -> Ordering {
        match self {
            SortKey::Id => a.id.cmp(&b.id),
            SortKey::Price => a.price.total_cmp(&b.price),
        }
    }
}

/// Anything but `price` (in any case) sorts by id.
impl From<&str> for SortKey {
    fn from(value: &str) -> Self {
        if value.eq_ignore_ascii_case("price") {
            SortKey::Price
        } else {
            SortKey::Id
        }
    }
}

/// The direction items are sorted in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Anything but `desc` (in any case) is ascending.
impl From<&str> for SortOrder {
    fn from(value: &str) -> Self {
        if value.eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }
}

/// How to filter and sort a listing of items.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ItemQuery {
    /// Inclusive lower price bound.
    pub min_price: Option<f64>,
    /// Inclusive upper price bound.
    pub max_price: Option<f64>,
    pub sort_by: SortKey,
    pub order: SortOrder,
}

impl ItemQuery {
    fn accepts(&self, item: &Item) -> bool {
        self.min_price.map_or(true, |min| item.price >= min)
            && self.max_price.map_or(true, |max| item.price <= max)
    }

    /// Keeps the items within the price bounds and sorts them.
    ///
    /// The sort is stable, so items with equal keys keep their relative order.
    pub fn apply(&self, items: Vec<Item>) -> Vec<Item> {
        let mut items: Vec<Item> = items.into_iter().filter(|i| self.accepts(i)).collect();
        items.sort_by(|a, b| self.order.apply(self.sort_by.compare(a, b)));
        items
    }
}

/// Item operations on top of a repository.
#[derive(Clone)]
pub struct ItemService<R> {
    repository: R,
    mapper: ItemMapper,
}

impl<R: ItemRepository> ItemService<R> {
    /// Creates a new service.
    pub fn new(repository: R, mapper: ItemMapper) -> Self {
        Self { repository, mapper }
    }

    /// Lists items within a price range, sorted.
    #[instrument(skip(self))]
    pub async fn list_items(&self, query: &ItemQuery) -> ItemResult<Vec<ItemResponse>> {
        let items = self.repository.find_all().await?;
        let total = items.len();
        let items = query.apply(items);
        tracing::debug!("Kept {} of {} items", items.len(), total);
        Ok(self.to_responses(items))
    }

    /// Reads an item.
    #[instrument(skip(self))]
    pub async fn get_item(&self, id: i64) -> ItemResult<ItemResponse> {
        let item = self.find_existing(id).await?;
        Ok(self.mapper.to_response(item))
    }

    /// Creates a new item.
    ///
    /// The request is expected to have passed validation already.
    #[instrument(skip(self))]
    pub async fn create_item(&self, request: CreateItemRequest) -> ItemResult<ItemResponse> {
        let new_item = self.mapper.to_entity(request);
        let item = self.repository.save(new_item).await?;
        tracing::info!(item_id = item.id, "Created item");
        Ok(self.mapper.to_response(item))
    }

    /// Replaces every field of an existing item.
    ///
    /// Returns the item exactly as it was handed to the repository.
    #[instrument(skip(self))]
    pub async fn update_item(
        &self,
        id: i64,
        request: UpdateItemRequest,
    ) -> ItemResult<ItemResponse> {
        let mut item = self.find_existing(id).await?;
        self.mapper.update_entity(&mut item, request);
        let rows = self.repository.update(&item).await?;
        if rows == 0 {
            tracing::warn!("Item {} disappeared before it could be updated", id);
        }
        Ok(self.mapper.to_response(item))
    }

    /// Deletes an item.
    #[instrument(skip(self))]
    pub async fn delete_item(&self, id: i64) -> ItemResult<()> {
        self.find_existing(id).await?;
        let rows = self.repository.delete(id).await?;
        if rows == 0 {
            tracing::warn!("Item {} disappeared before it could be deleted", id);
        }
        Ok(())
    }

    /// Lists items with a quantity at or below `threshold`.
    #[instrument(skip(self))]
    pub async fn list_low_stock(&self, threshold: i32) -> ItemResult<Vec<ItemResponse>> {
        let items = self.repository.find_low_stock(threshold).await?;
        Ok(self.to_responses(items))
    }

    async fn find_existing(&self, id: i64) -> ItemResult<Item> {
        self.repository.find_by_id(id).await?.ok_or_else(|| {
            tracing::warn!("Item {} not found", id);
            ItemError::NotFound(id)
        })
    }

    fn to_responses(&self, items: Vec<Item>) -> Vec<ItemResponse> {
        items
            .into_iter()
            .map(|item| self.mapper.to_response(item))
            .collect()
    }
}
