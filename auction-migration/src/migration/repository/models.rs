#[cfg(test)]
use mockall::automock;
use {
    crate::{
        kernel::db::DB,
        migration::entities,
    },
    async_trait::async_trait,
    sqlx::{
        types::Json,
        FromRow,
        QueryBuilder,
    },
    std::fmt::Debug,
    tracing::instrument,
};

/// Raw auction row. The document is decoded separately so a broken document
/// can be reported with the path of the offending field.
#[derive(Clone, Debug, FromRow)]
pub struct AuctionRow {
    pub id:   entities::AuctionId,
    pub data: Json<serde_json::Value>,
}

impl AuctionRow {
    pub fn get_auction_entity(&self) -> anyhow::Result<entities::Auction> {
        serde_path_to_error::deserialize(&self.data.0).map_err(|err| {
            anyhow::anyhow!(
                "Invalid auction document {} at {}: {}",
                self.id,
                err.path(),
                err
            )
        })
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Database: Debug + Send + Sync + 'static {
    async fn get_schema_version(&self, id: &str) -> anyhow::Result<Option<i32>>;
    async fn set_schema_version(&self, id: &str, version: i32) -> anyhow::Result<()>;
    async fn get_auction_page(
        &self,
        after: Option<entities::AuctionId>,
        limit: i64,
    ) -> anyhow::Result<Vec<AuctionRow>>;
    async fn update_auctions(&self, auctions: &[entities::Auction]) -> anyhow::Result<()>;
}

#[async_trait]
impl Database for DB {
    #[instrument(
        target = "metrics",
        name = "db_get_schema_version",
        fields(
            category = "db_queries",
            result = "success",
            name = "get_schema_version",
            tracing_enabled
        ),
        skip_all
    )]
    async fn get_schema_version(&self, id: &str) -> anyhow::Result<Option<i32>> {
        let version =
            sqlx::query_scalar::<_, i32>("SELECT version FROM schema_version WHERE id = $1")
                .bind(id)
                .fetch_optional(self)
                .await
                .inspect_err(|_| {
                    tracing::Span::current().record("result", "error");
                })?;
        Ok(version)
    }

    #[instrument(
        target = "metrics",
        name = "db_set_schema_version",
        fields(
            category = "db_queries",
            result = "success",
            name = "set_schema_version",
            tracing_enabled
        ),
        skip_all
    )]
    async fn set_schema_version(&self, id: &str, version: i32) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO schema_version (id, version) VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET version = excluded.version",
        )
        .bind(id)
        .bind(version)
        .execute(self)
        .await
        .inspect_err(|_| {
            tracing::Span::current().record("result", "error");
        })?;
        Ok(())
    }

    #[instrument(
        target = "metrics",
        name = "db_get_auction_page",
        fields(
            category = "db_queries",
            result = "success",
            name = "get_auction_page",
            tracing_enabled
        ),
        skip_all
    )]
    async fn get_auction_page(
        &self,
        after: Option<entities::AuctionId>,
        limit: i64,
    ) -> anyhow::Result<Vec<AuctionRow>> {
        let mut query = QueryBuilder::new("SELECT id, data FROM auctions");
        if let Some(after) = after {
            query.push(" WHERE id > ");
            query.push_bind(after);
        }
        query.push(" ORDER BY id LIMIT ");
        query.push_bind(limit);
        let rows = query
            .build_query_as()
            .fetch_all(self)
            .await
            .map_err(|e| {
                tracing::Span::current().record("result", "error");
                tracing::error!(error = e.to_string(), "DB: Failed to fetch auction page");
                anyhow::anyhow!(e)
            })?;
        Ok(rows)
    }

    #[instrument(
        target = "metrics",
        name = "db_update_auctions",
        fields(
            category = "db_queries",
            result = "success",
            name = "update_auctions",
            tracing_enabled
        ),
        skip_all
    )]
    async fn update_auctions(&self, auctions: &[entities::Auction]) -> anyhow::Result<()> {
        let mut transaction = self.begin().await.inspect_err(|_| {
            tracing::Span::current().record("result", "error");
        })?;
        for auction in auctions {
            sqlx::query("UPDATE auctions SET data = $1 WHERE id = $2")
                .bind(Json(auction))
                .bind(&auction.id)
                .execute(&mut *transaction)
                .await
                .map_err(|e| {
                    tracing::Span::current().record("result", "error");
                    tracing::error!(
                        error = e.to_string(),
                        auction_id = auction.id,
                        "DB: Failed to update auction"
                    );
                    anyhow::anyhow!(e)
                })?;
        }
        transaction.commit().await.inspect_err(|_| {
            tracing::Span::current().record("result", "error");
        })?;
        Ok(())
    }
}
