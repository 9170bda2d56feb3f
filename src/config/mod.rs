use std::{env, path::PathBuf};

use config::{Config as config_config, File as config_file};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::logging;

const CONFIG_PATH: &str = "app.json";

pub static SETTINGS: Lazy<App> = Lazy::new(|| App::get().expect("Config error"));

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct App {
    #[serde(default)]
    pub web: Web,
}

const WEB_HOST: &str = "WEB_HOST";
const WEB_PORT: &str = "WEB_PORT";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Web {
    #[serde(default = "Web::default_host")]
    pub host: String,
    #[serde(default = "Web::default_port")]
    pub port: u16,
}

impl Default for Web {
    fn default() -> Self {
        Web {
            host: Web::default_host(),
            port: Web::default_port(),
        }
    }
}

impl Web {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }
}

impl Default for App {
    fn default() -> Self {
        App {
            web: Default::default(),
        }
    }
}

impl App {
    fn get() -> Result<Self, config::ConfigError> {
        let config_path = config_path();
        if config_path.exists() {
            let config: App = config_config::builder()
                .add_source(config_file::from(config_path))
                .build()?
                .try_deserialize()?;
            return Ok(config.override_with_env());
        }

        Ok(App::default().override_with_env())
    }

    /// Environment variables win over the config file.
    fn override_with_env(mut self) -> Self {
        if let Ok(host) = env::var(WEB_HOST) {
            self.web.host = host;
        }

        if let Ok(port) = env::var(WEB_PORT) {
            match port.parse::<u16>() {
                Ok(p) => self.web.port = p,
                Err(why) => {
                    logging::error_file_async(format!(
                        "Failed to parse {} because {:?}",
                        WEB_PORT, why
                    ));
                }
            }
        }

        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.web.host, self.web.port)
    }
}

fn config_path() -> PathBuf {
    PathBuf::from(CONFIG_PATH)
}
