use {
    super::Repository,
    crate::migration::{
        SCHEMA_DOC,
        SCHEMA_VERSION,
    },
};

impl Repository {
    /// Version recorded in the store. A store that predates version records
    /// reads as one step behind the current schema.
    pub async fn get_schema_version(&self) -> anyhow::Result<i32> {
        Ok(self
            .db
            .get_schema_version(SCHEMA_DOC)
            .await?
            .unwrap_or(SCHEMA_VERSION - 1))
    }
}
