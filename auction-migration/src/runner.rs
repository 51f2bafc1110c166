use {
    crate::{
        config::{
            Config,
            RunOptions,
        },
        kernel::{
            calendar::WorkingDayCalendar,
            ranking::HighestValueRanker,
        },
        migration::service::{
            self,
            migrate::MigrateInput,
            Service,
        },
    },
    anyhow::anyhow,
    sqlx::postgres::PgPoolOptions,
};

pub async fn run_migration(run_options: RunOptions) -> anyhow::Result<()> {
    let config = Config::load(&run_options.config.config).map_err(|err| {
        anyhow!(
            "Failed to load config from file({path}): {:?}",
            err,
            path = run_options.config.config
        )
    })?;

    let pool = PgPoolOptions::new()
        .connect(&run_options.database_url)
        .await
        .map_err(|err| anyhow!("Failed to connect to the auction store: {:?}", err))?;

    let service = Service::new(
        pool,
        service::Config {
            plugins:            config.plugins,
            demote_dead_awards: config.demote_dead_awards,
        },
        WorkingDayCalendar,
        HighestValueRanker,
    );

    match service
        .migrate(MigrateInput {
            destination: run_options.target_version,
        })
        .await?
    {
        Some(version) => tracing::info!(version, "Auction schema already up to date"),
        None => tracing::info!("Auction schema migration finished"),
    }
    Ok(())
}
