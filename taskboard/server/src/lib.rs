pub mod config {
    use crate::service::ParentScope;
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct Config {
        pub db_url: String,
        #[serde(default = "default_port")]
        pub port: u16,
        /// Whether nested paths must match the stored parent ids.
        #[serde(default)]
        pub parent_scope: ParentScope,
    }

    impl Config {
        /// Loads configuration from environment variables
        /// (`DB_URL`, `PORT`, `PARENT_SCOPE`).
        pub fn from_env() -> anyhow::Result<Self> {
            let settings = config::Config::builder()
                .add_source(config::Environment::default())
                .build()?;

            let config: Config = settings.try_deserialize()?;
            Ok(config)
        }
    }

    fn default_port() -> u16 {
        8080
    }
}
pub mod column;
pub mod comment;
pub mod entities;
pub mod project;
pub mod service;
pub mod storage;
pub mod task;
pub mod web;
