//! Inventory items.

pub mod item_error;
pub mod item_mapper;
pub mod item_model;
pub mod item_repository;
pub mod item_service;
