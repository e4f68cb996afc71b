//! Item entities and the request/response shapes exchanged with clients.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// A stored item.
#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct Item {
    /// Assigned by storage on creation.
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub price: f64,
}

/// An item that has not been stored yet, and therefore has no id.
#[derive(Clone, Debug, PartialEq)]
pub struct NewItem {
    pub name: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub price: f64,
}

/// A request to create an item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateItemRequest {
    /// The item's name.
    #[schema(example = "Widget")]
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    /// The item's description.
    #[schema(example = "A small blue widget")]
    pub description: Option<String>,
    /// Units in stock.
    #[schema(example = 12)]
    #[validate(range(min = 0, message = "Quantity must be >= 0"))]
    pub quantity: i32,
    /// Unit price.
    #[schema(example = 9.99)]
    #[validate(range(min = 0.0, message = "Price must be >= 0"))]
    pub price: f64,
}

/// A request to replace the fields of an existing item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
pub struct UpdateItemRequest {
    /// The item's name.
    #[schema(example = "Widget")]
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    /// The item's description.
    #[schema(example = "A small blue widget")]
    pub description: Option<String>,
    /// Units in stock.
    #[schema(example = 3)]
    #[validate(range(min = 0, message = "Quantity must be >= 0"))]
    pub quantity: i32,
    /// Unit price.
    #[schema(example = 11.5)]
    #[validate(range(min = 0.0, message = "Price must be >= 0"))]
    pub price: f64,
}

/// An item as returned to clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ItemResponse {
    /// The item's id.
    #[schema(example = 1)]
    pub id: i64,
    /// The item's name.
    #[schema(example = "Widget")]
    pub name: String,
    /// The item's description.
    #[schema(example = "A small blue widget")]
    pub description: Option<String>,
    /// Units in stock.
    #[schema(example = 12)]
    pub quantity: i32,
    /// Unit price.
    #[schema(example = 9.99)]
    pub price: f64,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message(Cow::Borrowed("Name is required")));
    }
    Ok(())
}
