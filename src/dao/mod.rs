//! Data access layer: entity models, filter/patch shapes, and the store
//! abstraction with its in-memory backend.

pub mod entity_store;
pub mod filters;
pub mod models;
pub mod storage;
