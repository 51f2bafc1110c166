use {
    super::Repository,
    crate::migration::entities,
};

impl Repository {
    /// Page of decoded auction documents ordered by id, starting after the
    /// given cursor. A document the entity model cannot represent fails the
    /// whole page, so a migration never writes back a lossy decode.
    pub async fn get_auction_page(
        &self,
        after: Option<entities::AuctionId>,
        limit: i64,
    ) -> anyhow::Result<Vec<entities::Auction>> {
        let rows = self.db.get_auction_page(after, limit).await?;
        rows.iter()
            .map(|row| {
                row.get_auction_entity().inspect_err(|err| {
                    tracing::error!(
                        error = err.to_string(),
                        auction_id = row.id,
                        "Failed to decode auction document"
                    );
                })
            })
            .collect()
    }
}
