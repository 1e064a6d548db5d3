#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::path;
use std::str::FromStr;

use anyhow::bail;
use anyhow::Result;
use clap::ArgMatches;
use clap::Command;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::fs;

use crate::domain::models::BackendName;
use crate::domain::models::Fanout;
use crate::domain::models::ModelName;
use crate::domain::models::OutputMode;
use crate::domain::models::PlaygroundSettings;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    Backend,
    BackendHealthCheckTimeout,
    ConfigFile,
    GeminiToken,
    GeminiURL,
    FigmaToken,
    FigmaURL,
    ProxyURL,
    Mode,
    Fanout,
    Model,
    BatchSize,
    Versus,
    Temperature,
    Search,
    Concurrency,
    MaxAttempts,
    AttemptTimeout,
    RetryBaseDelay,
    OutputDir,
}

fn parse_number<T: FromStr>(key: ConfigKey, val: &str) -> Result<T> {
    if let Ok(res) = val.trim().parse::<T>() {
        return Ok(res);
    }

    bail!(format!("Config value for '{key}' is not a valid number: {val}"))
}

pub struct Config {}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    /// Reads a numeric key, naming the key when the value does not parse.
    pub fn get_number<T: FromStr>(key: ConfigKey) -> Result<T> {
        return parse_number(key, &Config::get(key));
    }

    pub fn default(key: ConfigKey) -> String {
        let default_backend = BackendName::Gemini.to_string();
        let default_mode = OutputMode::default().to_string();
        let default_fanout = Fanout::Batch.to_string();
        let default_model = ModelName::FlashThinking.to_string();
        let default_versus = ModelName::iter()
            .map(|e| return e.to_string())
            .collect::<Vec<_>>()
            .join(",");

        #[cfg(not(target_os = "macos"))]
        let config_path = dirs::config_dir()
            .unwrap_or_default()
            .join("glaze/config.toml");
        #[cfg(target_os = "macos")]
        let config_path = dirs::home_dir()
            .unwrap_or_default()
            .join(".config/glaze/config.toml");
        let config_path = config_path.to_string_lossy().to_string();

        let res = match key {
            ConfigKey::Backend => &default_backend,
            ConfigKey::BackendHealthCheckTimeout => "1000",
            ConfigKey::GeminiToken => "",
            ConfigKey::GeminiURL => "https://generativelanguage.googleapis.com",
            ConfigKey::FigmaToken => "",
            ConfigKey::FigmaURL => "https://api.figma.com",
            ConfigKey::ProxyURL => "https://api.allorigins.win",
            ConfigKey::Mode => &default_mode,
            ConfigKey::Fanout => &default_fanout,
            ConfigKey::Model => &default_model,
            ConfigKey::BatchSize => "3",
            ConfigKey::Versus => &default_versus,
            ConfigKey::Temperature => "0.9",
            ConfigKey::Search => "false",
            ConfigKey::Concurrency => "9",
            ConfigKey::MaxAttempts => "5",
            ConfigKey::AttemptTimeout => "193333",
            ConfigKey::RetryBaseDelay => "1233",
            ConfigKey::OutputDir => "glaze-output",

            // Special
            ConfigKey::ConfigFile => &config_path,
        };

        return res.to_string();
    }

    pub async fn load(cmd: Command, clap_arg_matches: Vec<&ArgMatches>) -> Result<()> {
        let mut config_file = Config::default(ConfigKey::ConfigFile);
        for matches in clap_arg_matches.as_slice() {
            if let Some(arg_config_file) =
                matches.get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config_file = arg_config_file.to_string();
            }
        }

        // File values are validated before anything is written.
        let mut file_values: Vec<(ConfigKey, String)> = vec![];
        let config_path = path::PathBuf::from(config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(config_path).await?;
            let doc = toml_str.parse::<toml_edit::Document>()?;

            for key in ConfigKey::iter() {
                if let Some(val) = doc.get(&key.to_string()) {
                    // Use clap value parsers to do validation.
                    let mut possible_values = vec![];
                    if let Some(arg) = cmd
                        .get_arguments()
                        .find(|e| return e.get_long() == Some(key.to_string().as_str()))
                    {
                        possible_values = arg
                            .get_possible_values()
                            .iter()
                            .map(|e| return e.get_name().to_string())
                            .collect::<Vec<String>>();
                    }

                    if let Some(val_int) = val.as_integer() {
                        file_values.push((key, val_int.to_string()));
                    } else if let Some(val_float) = val.as_float() {
                        file_values.push((key, val_float.to_string()));
                    } else if let Some(val_bool) = val.as_bool() {
                        file_values.push((key, val_bool.to_string()));
                    } else if let Some(val_str) = val.as_str() {
                        if val_str.is_empty() {
                            continue;
                        }
                        if !possible_values.is_empty()
                            && !possible_values.contains(&val_str.to_string())
                        {
                            bail!(format!("config.toml has an invalid value for key '{key}': {val_str}\nPossible values are: {}", possible_values.join(", ")));
                        }
                        file_values.push((key, val_str.to_string()));
                    }
                }
            }
        }

        for key in ConfigKey::iter() {
            Config::set(key, &Config::default(key))
        }
        for (key, val) in file_values {
            Config::set(key, &val);
        }

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    Config::set(key, val)
                }
            }
        }

        tracing::debug!(
            backend = Config::get(ConfigKey::Backend),
            mode = Config::get(ConfigKey::Mode),
            fanout = Config::get(ConfigKey::Fanout),
            model = Config::get(ConfigKey::Model),
            batch_size = Config::get(ConfigKey::BatchSize),
            versus = Config::get(ConfigKey::Versus),
            concurrency = Config::get(ConfigKey::Concurrency),
            "config"
        );

        return Ok(());
    }

    /// Playground settings described by the loaded config.
    pub fn playground_settings() -> Result<PlaygroundSettings> {
        let output_mode = match OutputMode::parse(&Config::get(ConfigKey::Mode)) {
            Some(mode) => mode,
            None => bail!(format!("Unknown mode {}", Config::get(ConfigKey::Mode))),
        };
        let fanout = match Fanout::parse(&Config::get(ConfigKey::Fanout)) {
            Some(fanout) => fanout,
            None => bail!(format!("Unknown fanout {}", Config::get(ConfigKey::Fanout))),
        };
        let batch_model = match ModelName::parse(&Config::get(ConfigKey::Model)) {
            Some(model) => model,
            None => bail!(format!("Unknown model {}", Config::get(ConfigKey::Model))),
        };
        let versus_models = match ModelName::parse_list(&Config::get(ConfigKey::Versus)) {
            Ok(models) => models,
            Err(name) => bail!(format!("Unknown model {name} in '{}'", ConfigKey::Versus)),
        };

        let mut settings = PlaygroundSettings {
            output_mode,
            fanout,
            batch_size: Config::get_number(ConfigKey::BatchSize)?,
            batch_model,
            temperature: Config::get_number(ConfigKey::Temperature)?,
            use_retrieval: Config::get(ConfigKey::Search) == "true",
            ..PlaygroundSettings::default()
        };
        settings.set_versus_models(&versus_models);

        return Ok(settings);
    }

    pub fn serialize_default(cmd: Command) -> String {
        let toml_str = ConfigKey::iter()
            .filter_map(|key| {
                if key == ConfigKey::ConfigFile {
                    return None;
                }

                let arg = cmd
                    .get_arguments()
                    .find(|e| return e.get_long() == Some(key.to_string().as_str()))?;

                let mut description = arg
                    .get_help()
                    .map(|e| return e.to_string())
                    .unwrap_or_default();

                description = description
                    .split("[default:")
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();

                if !arg.get_possible_values().is_empty() {
                    let possible_values = arg
                        .get_possible_values()
                        .iter()
                        .map(|e| return e.get_name().to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    description = format!("{description} [possible values: {}]", possible_values);
                }

                let mut val = Config::default(key);
                if val.is_empty() {
                    val = format!("# {key} = \"\"");
                } else if val.parse::<i64>().is_ok()
                    || val.parse::<f64>().is_ok()
                    || val.parse::<bool>().is_ok()
                {
                    val = format!("{key} = {val}");
                } else {
                    val = format!("{key} = \"{val}\"");
                }

                return Some(format!("# {description}\n{val}"));
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }
}
