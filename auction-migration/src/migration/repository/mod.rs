mod get_auction_page;
mod get_schema_version;
mod models;
mod save_auctions;
mod set_schema_version;

pub use models::*;

/// Auction documents fetched per page while scanning the store.
pub const AUCTION_PAGE_SIZE: i64 = 2_i64.pow(10);
/// Rewritten documents held back before a bulk write.
pub const BULK_UPDATE_SIZE: usize = 2_usize.pow(7);

#[derive(Debug)]
pub struct Repository {
    pub db: Box<dyn Database>,
}

impl Repository {
    pub fn new(db: impl Database) -> Self {
        Self { db: Box::new(db) }
    }
}
