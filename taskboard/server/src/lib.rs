pub mod config {
    use serde::Deserialize;

    #[derive(Deserialize, Debug, Clone)]
    pub struct Config {
        pub db_url: String,
        #[serde(default = "default_port")]
        pub port: u16,
        pub jwt_secret: String,
        /// Origin of the web client allowed by CORS. Any origin when unset.
        #[serde(default)]
        pub frontend_url: Option<String>,
        /// Credential for the completion service. The assistant is disabled without it.
        #[serde(default)]
        pub openai_api_key: Option<String>,
        #[serde(default = "default_openai_base_url")]
        pub openai_base_url: String,
        #[serde(default = "default_openai_model")]
        pub openai_model: String,
    }

    impl Config {
        /// Loads configuration from environment variables.
        pub fn from_env() -> Result<Self, config::ConfigError> {
            let settings = config::Config::builder()
                .add_source(config::Environment::default())
                .build()?;

            settings.try_deserialize()
        }
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_openai_base_url() -> String {
        "https://api.openai.com/v1".to_string()
    }

    fn default_openai_model() -> String {
        "gpt-4o-mini".to_string()
    }
}

pub mod assist;
pub mod auth;
pub mod entities;
pub mod task;
pub mod web;
