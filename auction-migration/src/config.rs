use {
    anyhow::Result,
    clap::{crate_authors, crate_description, crate_name, crate_version, Args, Parser},
    std::fs,
};

#[derive(Parser, Debug)]
#[command(name = crate_name!())]
#[command(author = crate_authors!())]
#[command(about = crate_description!())]
#[command(version = crate_version!())]
pub enum Options {
    /// Run the pending schema migrations against the auction store and exit.
    Run(RunOptions),
}

#[derive(Args, Clone, Debug)]
pub struct RunOptions {
    #[command(flatten)]
    pub config: ConfigOptions,

    /// Connection string of the Postgres database holding the auction documents.
    #[arg(long = "database-url")]
    #[arg(env = "DATABASE_URL")]
    pub database_url: String,

    /// Schema version to migrate up to. Defaults to the version this build knows.
    #[arg(long = "target-version")]
    #[arg(env = "TARGET_SCHEMA_VERSION")]
    pub target_version: Option<i32>,
}

#[derive(Args, Clone, Debug)]
#[command(next_help_heading = "Config Options")]
#[group(id = "Config")]
pub struct ConfigOptions {
    /// Path to a configuration file describing the deployment.
    #[arg(long = "config")]
    #[arg(env = "MIGRATION_CONFIG")]
    #[arg(default_value = "config.yaml")]
    pub config: String,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Config {
    /// Plugins enabled for the deployment, matching the plugin list of the
    /// API instance this store belongs to. Omitting the list enables everything.
    #[serde(default)]
    pub plugins: Option<Vec<String>>,

    /// Write the `unsuccessful` status to awards whose bids were invalidated
    /// during the rollout instead of only closing their complaint period.
    #[serde(default)]
    pub demote_dead_awards: bool,
}

impl Config {
    pub fn load(path: &str) -> Result<Config> {
        // Open and read the YAML file
        let yaml_content = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&yaml_content)?;
        Ok(config)
    }
}
