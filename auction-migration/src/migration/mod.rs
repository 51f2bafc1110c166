pub mod entities;
pub mod repository;
pub mod service;

/// Version a full migration pass brings the document set to.
pub const SCHEMA_VERSION: i32 = 1;
/// Fixed id of the singleton version record in the store.
pub const SCHEMA_DOC: &str = "auctions_dgf_schema";
