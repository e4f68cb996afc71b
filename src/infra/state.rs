//! Global application state.
//!
//! Used for access to the item service and the inventory settings
//! from request handlers.

use super::config::InventoryConfig;
use crate::domain::item::{
    item_mapper::ItemMapper,
    item_repository::{DynItemRepository, ItemRepository},
    item_service::ItemService,
};
use axum::extract::FromRef;
use std::sync::Arc;

/// The item service as wired into the application.
pub type AppItemService = ItemService<DynItemRepository>;

/// Global application state.
#[derive(Clone, FromRef)]
pub struct AppState {
    items: AppItemService,
    inventory: InventoryConfig,
}

impl AppState {
    /// Constructs a new [`AppState`] on top of a repository.
    pub fn new(repository: impl ItemRepository + 'static, inventory: InventoryConfig) -> Self {
        let repository: DynItemRepository = Arc::new(repository);
        Self {
            items: ItemService::new(repository, ItemMapper),
            inventory,
        }
    }
}
