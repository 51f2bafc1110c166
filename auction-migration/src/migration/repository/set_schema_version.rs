use {
    super::Repository,
    crate::migration::SCHEMA_DOC,
};

impl Repository {
    pub async fn set_schema_version(&self, version: i32) -> anyhow::Result<()> {
        self.db.set_schema_version(SCHEMA_DOC, version).await
    }
}
