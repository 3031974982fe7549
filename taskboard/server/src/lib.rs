pub mod config {
    use serde::Deserialize;

    #[derive(Deserialize, Debug, Clone)]
    pub struct Config {
        pub db_url: String,
        #[serde(default = "default_port")]
        pub port: u16,
        pub jwt_secret: String,
    }

    impl Config {
        /// Loads configuration from environment variables.
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_builder(
                config::Config::builder().add_source(config::Environment::default()),
            )
        }

        /// Builds the configuration from an arbitrary set of sources.
        pub fn from_builder(
            builder: config::ConfigBuilder<config::builder::DefaultState>,
        ) -> anyhow::Result<Self> {
            let settings = builder.build()?;
            let config: Config = settings.try_deserialize()?;
            Ok(config)
        }
    }

    fn default_port() -> u16 {
        8080
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn can_load_config_with_default_port() {
            let builder = config::Config::builder()
                .set_override("db_url", "postgres://localhost/taskboard")
                .unwrap()
                .set_override("jwt_secret", "secret")
                .unwrap();

            let config = Config::from_builder(builder).unwrap();

            assert_eq!(config.db_url, "postgres://localhost/taskboard");
            assert_eq!(config.port, 8080);
            assert_eq!(config.jwt_secret, "secret");
        }

        #[test]
        fn can_reject_config_without_jwt_secret() {
            let builder = config::Config::builder()
                .set_override("db_url", "postgres://localhost/taskboard")
                .unwrap();

            assert!(Config::from_builder(builder).is_err());
        }
    }
}
pub mod auth;
pub mod clock;
pub mod entities;
pub mod task;
pub mod verification;
pub mod web;
