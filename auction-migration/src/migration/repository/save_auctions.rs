use {
    super::Repository,
    crate::migration::entities,
};

impl Repository {
    /// Writes the rewritten documents back in one transaction.
    pub async fn save_auctions(&self, auctions: &[entities::Auction]) -> anyhow::Result<()> {
        self.db.update_auctions(auctions).await?;
        tracing::info!(count = auctions.len(), "Saved migrated auction documents");
        Ok(())
    }
}
