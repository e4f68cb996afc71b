//! Conversions between item entities and the shapes exchanged with clients.

use super::item_model::{CreateItemRequest, Item, ItemResponse, NewItem, UpdateItemRequest};

/// Copies fields between [`Item`]s and their request/response shapes.
#[derive(Clone, Copy, Debug, Default)]
pub struct ItemMapper;

impl ItemMapper {
    /// An item ready to be stored. The id is left to the repository.
    pub fn to_entity(&self, request: CreateItemRequest) -> NewItem {
        NewItem {
            name: request.name,
            description: request.description,
            quantity: request.quantity,
            price: request.price,
        }
    }

    pub fn to_response(&self, item: Item) -> ItemResponse {
        ItemResponse {
            id: item.id,
            name: item.name,
            description: item.description,
            quantity: item.quantity,
            price: item.price,
        }
    }

    /// Overwrites every mutable field of `item`, keeping its id.
    pub fn update_entity(&self, item: &mut Item, request: UpdateItemRequest) {
        item.name = request.name;
        item.description = request.description;
        item.quantity = request.quantity;
        item.price = request.price;
    }
}
