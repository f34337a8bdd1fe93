/// Database model definitions.
pub mod models;
/// Player dataset loading.
pub mod players;
/// User profile storage and retrieval operations.
pub mod profile_store;
/// Storage abstraction layer for profile persistence.
pub mod storage;
