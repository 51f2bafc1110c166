use {
    super::{
        Service,
        PLUGIN,
    },
    crate::migration::SCHEMA_VERSION,
};

pub struct MigrateInput {
    /// Version to stop at. `None` runs up to the current schema version.
    pub destination: Option<i32>,
}

impl Service {
    /// Runs every migration step between the stored version and the
    /// destination, bumping the stored version after each step.
    ///
    /// Returns the stored version when the store is already up to date and
    /// nothing was touched, `None` after steps have run. Steps without a
    /// registered rewrite still bump the stored version so later code can
    /// rely on it.
    #[tracing::instrument(skip_all, fields(current, target))]
    pub async fn migrate(&self, input: MigrateInput) -> anyhow::Result<Option<i32>> {
        if let Some(plugins) = &self.config.plugins {
            if !plugins.iter().any(|plugin| plugin == PLUGIN) {
                tracing::info!(plugin = PLUGIN, "Migration plugin not enabled, skipping");
                return Ok(None);
            }
        }
        let current = self.repo.get_schema_version().await?;
        tracing::Span::current().record("current", current);
        if current == SCHEMA_VERSION {
            return Ok(Some(current));
        }
        let target = input.destination.unwrap_or(SCHEMA_VERSION);
        tracing::Span::current().record("target", target);
        for step in current..target {
            tracing::info!(from = step, to = step + 1, "Migrating auction schema");
            match step {
                0 => self.apply_verification_flow().await?,
                _ => tracing::info!(step, "No rewrite registered for step"),
            }
            self.repo.set_schema_version(step + 1).await?;
        }
        Ok(None)
    }
}
