pub mod config {
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct Config {
        pub db_url: String,
        #[serde(default = "default_port")]
        pub port: u16,
        /// Publish "Task Completed" events to EventBridge; otherwise only log them.
        #[serde(default = "default_true")]
        pub events_enabled: bool,
        /// Target event bus; the account's default bus when unset.
        #[serde(default)]
        pub event_bus_name: Option<String>,
        #[serde(default = "default_aws_region")]
        pub aws_region: String,
        /// Insert sample tasks on startup when the table is empty.
        #[serde(default = "default_true")]
        pub seed_sample_data: bool,
    }

    impl Config {
        /// Loads configuration from environment variables.
        pub fn from_env() -> anyhow::Result<Self> {
            let settings = config::Config::builder()
                .add_source(config::Environment::default().try_parsing(true))
                .build()?;

            let config: Config = settings.try_deserialize()?;
            Ok(config)
        }
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_true() -> bool {
        true
    }

    fn default_aws_region() -> String {
        "us-east-1".to_string()
    }
}
pub mod entities;
pub mod events;
pub mod task;
pub mod web;
