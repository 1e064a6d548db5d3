#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgMatches;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use rand::seq::SliceRandom;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::report;
use super::runner::GenerateOptions;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendName;
use crate::domain::models::Fanout;
use crate::domain::models::ModelName;
use crate::domain::models::OutputMode;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(config_file_path.clone()).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_generate() -> Command {
    return Command::new("generate")
        .about("Generate UI for a prompt. Outputs are written to the output directory as they settle.")
        .arg(
            Arg::new("prompt")
                .help("What to build. In refactor mode this is the code to refactor, in clone mode the changes to make.")
                .required(true),
        )
        .arg(
            Arg::new("clone-url")
                .short('u')
                .long("clone-url")
                .num_args(1)
                .help("Page URL or Figma frame link to start from. Only used in clone mode."),
        )
        .arg(
            Arg::new("refine")
                .short('r')
                .long("refine")
                .num_args(1)
                .help("Instruction applied to every successful output once the round settles."),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the settled round as JSON instead of progress.")
                .action(ArgAction::SetTrue),
        );
}

fn subcommand_presets() -> Command {
    return Command::new("presets")
        .about("List example prompts for the configured mode.")
        .arg(
            Arg::new("random")
                .long("random")
                .help("Print a single example prompt picked at random.")
                .action(ArgAction::SetTrue),
        );
}

fn arg_backend() -> Arg {
    return Arg::new(ConfigKey::Backend.to_string())
        .short('b')
        .long(ConfigKey::Backend.to_string())
        .env("GLAZE_BACKEND")
        .num_args(1)
        .help(format!(
            "The backend hosting the models to generate with. [default: {}]",
            Config::default(ConfigKey::Backend)
        ))
        .value_parser(PossibleValuesParser::new(BackendName::VARIANTS))
        .global(true);
}

fn arg_backend_health_check_timeout() -> Arg {
    return Arg::new(ConfigKey::BackendHealthCheckTimeout.to_string())
        .long(ConfigKey::BackendHealthCheckTimeout.to_string())
        .env("GLAZE_BACKEND_HEALTH_CHECK_TIMEOUT")
        .num_args(1)
        .help(
            format!("Time to wait in milliseconds before timing out when doing a healthcheck for a backend. [default: {}]", Config::default(ConfigKey::BackendHealthCheckTimeout)),
        )
        .global(true);
}

fn arg_mode() -> Arg {
    return Arg::new(ConfigKey::Mode.to_string())
        .long(ConfigKey::Mode.to_string())
        .env("GLAZE_MODE")
        .num_args(1)
        .help(format!(
            "What kind of UI to generate. [default: {}]",
            Config::default(ConfigKey::Mode)
        ))
        .value_parser(PossibleValuesParser::new(OutputMode::VARIANTS))
        .global(true);
}

fn arg_fanout() -> Arg {
    return Arg::new(ConfigKey::Fanout.to_string())
        .short('f')
        .long(ConfigKey::Fanout.to_string())
        .env("GLAZE_FANOUT")
        .num_args(1)
        .help(format!(
            "Run one model several times (batch) or every enabled model once (versus). [default: {}]",
            Config::default(ConfigKey::Fanout)
        ))
        .value_parser(PossibleValuesParser::new(Fanout::VARIANTS))
        .global(true);
}

fn arg_model() -> Arg {
    return Arg::new(ConfigKey::Model.to_string())
        .short('m')
        .long(ConfigKey::Model.to_string())
        .env("GLAZE_MODEL")
        .num_args(1)
        .help(format!(
            "The model used for batch rounds. [default: {}]",
            Config::default(ConfigKey::Model)
        ))
        .value_parser(PossibleValuesParser::new(ModelName::VARIANTS))
        .global(true);
}

fn arg_batch_size() -> Arg {
    return Arg::new(ConfigKey::BatchSize.to_string())
        .short('n')
        .long(ConfigKey::BatchSize.to_string())
        .env("GLAZE_BATCH_SIZE")
        .num_args(1)
        .help(format!(
            "How many outputs a batch round generates, between 1 and 9. [default: {}]",
            Config::default(ConfigKey::BatchSize)
        ))
        .global(true);
}

fn arg_versus() -> Arg {
    return Arg::new(ConfigKey::Versus.to_string())
        .long(ConfigKey::Versus.to_string())
        .env("GLAZE_VERSUS")
        .num_args(1)
        .help(format!(
            "Comma separated models enabled for versus rounds. [default: {}]",
            Config::default(ConfigKey::Versus)
        ))
        .global(true);
}

fn arg_temperature() -> Arg {
    return Arg::new(ConfigKey::Temperature.to_string())
        .short('t')
        .long(ConfigKey::Temperature.to_string())
        .env("GLAZE_TEMPERATURE")
        .num_args(1)
        .help(format!(
            "Sampling temperature between 0.0 and 1.0. [default: {}]",
            Config::default(ConfigKey::Temperature)
        ))
        .global(true);
}

fn arg_search() -> Arg {
    return Arg::new(ConfigKey::Search.to_string())
        .long(ConfigKey::Search.to_string())
        .env("GLAZE_SEARCH")
        .num_args(0..=1)
        .require_equals(true)
        .default_missing_value("true")
        .help(format!(
            "Ground generations with web search results. [default: {}]",
            Config::default(ConfigKey::Search)
        ))
        .value_parser(PossibleValuesParser::new(["true", "false"]))
        .global(true);
}

pub fn build() -> Command {
    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("glaze")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .arg_required_else_help(false)
        .subcommand(subcommand_generate())
        .subcommand(Command::new("modes").about("List the output modes."))
        .subcommand(Command::new("models").about("List the models rounds can run on."))
        .subcommand(subcommand_presets())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .arg(arg_backend())
        .arg(arg_backend_health_check_timeout())
        .arg(arg_mode())
        .arg(arg_fanout())
        .arg(arg_model())
        .arg(arg_batch_size())
        .arg(arg_versus())
        .arg(arg_temperature())
        .arg(arg_search())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("GLAZE_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(
            Arg::new(ConfigKey::GeminiURL.to_string())
                .long(ConfigKey::GeminiURL.to_string())
                .env("GLAZE_GEMINI_URL")
                .num_args(1)
                .help(format!("Gemini API URL when using the Gemini backend. [default: {}]", Config::default(ConfigKey::GeminiURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::GeminiToken.to_string())
                .long(ConfigKey::GeminiToken.to_string())
                .env("GLAZE_GEMINI_TOKEN")
                .num_args(1)
                .help("Gemini API key when using the Gemini backend.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::FigmaURL.to_string())
                .long(ConfigKey::FigmaURL.to_string())
                .env("GLAZE_FIGMA_URL")
                .num_args(1)
                .help(format!("Figma API URL used to export frames in clone mode. [default: {}]", Config::default(ConfigKey::FigmaURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::FigmaToken.to_string())
                .long(ConfigKey::FigmaToken.to_string())
                .env("GLAZE_FIGMA_TOKEN")
                .num_args(1)
                .help("Figma personal access token, required to clone Figma frames.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::ProxyURL.to_string())
                .long(ConfigKey::ProxyURL.to_string())
                .env("GLAZE_PROXY_URL")
                .num_args(1)
                .help(format!("Proxy used to fetch pages in clone mode. [default: {}]", Config::default(ConfigKey::ProxyURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Concurrency.to_string())
                .long(ConfigKey::Concurrency.to_string())
                .env("GLAZE_CONCURRENCY")
                .num_args(1)
                .help(format!("How many generation requests may run at once. [default: {}]", Config::default(ConfigKey::Concurrency)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::MaxAttempts.to_string())
                .long(ConfigKey::MaxAttempts.to_string())
                .env("GLAZE_MAX_ATTEMPTS")
                .num_args(1)
                .help(format!("Attempts made per generation before giving up. [default: {}]", Config::default(ConfigKey::MaxAttempts)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::AttemptTimeout.to_string())
                .long(ConfigKey::AttemptTimeout.to_string())
                .env("GLAZE_ATTEMPT_TIMEOUT")
                .num_args(1)
                .help(format!("Time to wait in milliseconds for a single generation attempt. [default: {}]", Config::default(ConfigKey::AttemptTimeout)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::RetryBaseDelay.to_string())
                .long(ConfigKey::RetryBaseDelay.to_string())
                .env("GLAZE_RETRY_BASE_DELAY")
                .num_args(1)
                .help(format!("Base delay in milliseconds of the exponential backoff between attempts. [default: {}]", Config::default(ConfigKey::RetryBaseDelay)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::OutputDir.to_string())
                .short('o')
                .long(ConfigKey::OutputDir.to_string())
                .env("GLAZE_OUTPUT_DIR")
                .num_args(1)
                .help(format!("Directory generated outputs are written to. [default: {}]", Config::default(ConfigKey::OutputDir)))
                .global(true),
        );
}

fn generate_options(matches: &ArgMatches) -> GenerateOptions {
    return GenerateOptions {
        prompt: matches
            .get_one::<String>("prompt")
            .cloned()
            .unwrap_or_default(),
        clone_url: matches.get_one::<String>("clone-url").cloned(),
        refine: matches.get_one::<String>("refine").cloned(),
        json: matches.get_flag("json"),
    };
}

fn pick_preset(mode: OutputMode) -> Option<&'static str> {
    return mode
        .presets()
        .choose(&mut rand::thread_rng())
        .map(|e| return e.prompt);
}

/// Parses the command line. Returns the generation to run, if any.
pub async fn parse() -> Result<Option<GenerateOptions>> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("generate", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            return Ok(Some(generate_options(subcmd_matches)));
        }
        Some(("modes", _)) => {
            println!("{}", report::modes());
        }
        Some(("models", _)) => {
            println!("{}", report::models());
        }
        Some(("presets", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            let mode = match OutputMode::parse(&Config::get(ConfigKey::Mode)) {
                Some(mode) => mode,
                None => bail!(format!("Unknown mode {}", Config::get(ConfigKey::Mode))),
            };

            if subcmd_matches.get_flag("random") {
                if let Some(prompt) = pick_preset(mode) {
                    println!("{prompt}");
                }
            } else {
                println!("{}", report::presets(mode));
            }
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
            }
            _ => {
                subcommand_config().print_long_help()?;
            }
        },
        _ => {
            build().print_long_help()?;
        }
    }

    return Ok(None);
}
