//! The business logic of the application, independent of HTTP.

pub mod item;
