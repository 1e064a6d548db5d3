use anyhow::Result;

use super::parse_number;
use super::Config;
use super::ConfigKey;
use crate::application::cli;
use crate::domain::models::Fanout;
use crate::domain::models::ModelName;
use crate::domain::models::OutputMode;

#[test]
fn it_serializes_to_valid_toml() {
    let res = Config::serialize_default(cli::build());
    let toml_res = res.parse::<toml_edit::Document>();
    assert!(toml_res.is_ok());

    assert!(res.contains("mode = \"html\""));
    assert!(res.contains("batch-size = 3"));
    assert!(res.contains("temperature = 0.9"));
    assert!(res.contains("# gemini-token = \"\""));
    assert!(!res.contains("config-file"));
}

#[tokio::test]
async fn it_loads_config_from_file() -> Result<()> {
    let matches = cli::build().try_get_matches_from(vec!["glaze", "-c", "./config.example.toml"])?;
    Config::load(cli::build(), vec![&matches]).await?;

    assert_eq!(Config::get(ConfigKey::Mode), "wireframe");
    assert_eq!(Config::get(ConfigKey::BatchSize), "4");
    assert_eq!(Config::get(ConfigKey::Temperature), "0.7");
    assert_eq!(Config::get(ConfigKey::Search), "true");

    let settings = Config::playground_settings()?;
    assert_eq!(settings.output_mode, OutputMode::Wireframe);
    assert_eq!(settings.fanout, Fanout::Versus);
    assert_eq!(settings.batch_size, 4);
    assert_eq!(settings.temperature, 0.7);
    assert!(settings.use_retrieval);
    assert_eq!(settings.enabled_versus_models(), vec![ModelName::Flash]);

    return Ok(());
}

#[tokio::test]
async fn it_fails_to_loads_config_from_file() -> Result<()> {
    let matches =
        cli::build().try_get_matches_from(vec!["glaze", "-c", "./test/bad-config.toml"])?;
    let res = Config::load(cli::build(), vec![&matches]).await;
    assert!(res.is_err());
    return Ok(());
}

#[test]
fn it_parses_numbers_with_surrounding_whitespace() -> Result<()> {
    assert_eq!(parse_number::<usize>(ConfigKey::BatchSize, " 7 ")?, 7);
    return Ok(());
}

#[test]
fn it_names_keys_that_are_not_numbers() {
    let err = parse_number::<u32>(ConfigKey::MaxAttempts, "lots").unwrap_err();

    insta::assert_snapshot!(err.to_string(), @"Config value for 'max-attempts' is not a valid number: lots");
}
