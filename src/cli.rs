//! The command line interface for the cost model.
use crate::input::load_scenario;
use crate::log;
use crate::output::{DataWriter, create_output_directory, get_output_dir};
use crate::parameter::ParameterName;
use crate::registry;
use crate::settings::Settings;
use ::log::{info, warn};
use anyhow::{Context, Result, ensure};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod example;
use example::ExampleSubcommands;
pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for the cost model.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Options for the run command
#[derive(Args, Default)]
pub struct RunOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
    /// Override the value of a parameter, given as NAME=VALUE (may be repeated)
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub overrides: Vec<String>,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Compute the cost of a scenario.
    Run {
        /// Path to the scenario file.
        scenario_path: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Manage example scenarios.
    Example {
        /// The available subcommands for managing example scenarios.
        #[command(subcommand)]
        subcommand: ExampleSubcommands,
    },
    /// Validate a scenario.
    Validate {
        /// Path to the scenario file.
        scenario_path: PathBuf,
    },
    /// List the parameters of a scenario.
    Parameters {
        /// Path to the scenario file.
        scenario_path: PathBuf,
    },
    /// Manage settings file.
    Settings {
        /// The subcommands for managing the settings file.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run {
                scenario_path,
                opts,
            } => handle_run_command(&scenario_path, &opts, None),
            Self::Example { subcommand } => subcommand.execute(),
            Self::Validate { scenario_path } => handle_validate_command(&scenario_path, None),
            Self::Parameters { scenario_path } => handle_parameters_command(&scenario_path, None),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and run the requested command
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ house-energy-cost --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    let Some(command) = cli.command else {
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Parse a parameter override of the form `NAME=VALUE`
fn parse_override(arg: &str) -> Result<(ParameterName, f64)> {
    let (name, value) = arg
        .split_once('=')
        .with_context(|| format!("Invalid parameter override {arg}: expected NAME=VALUE"))?;
    let name = name.trim();
    ensure!(!name.is_empty(), "Invalid parameter override {arg}: missing name");
    let value = value
        .trim()
        .parse()
        .with_context(|| format!("Invalid value for parameter {name}"))?;

    Ok((name.into(), value))
}

/// Load the program settings, if not provided
fn load_settings(settings: Option<Settings>) -> Result<Settings> {
    match settings {
        Some(settings) => Ok(settings),
        None => Settings::load().context("Failed to load settings."),
    }
}

/// Handle the `run` command.
pub fn handle_run_command(
    scenario_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = load_settings(settings)?;

    // Parse overrides before touching the file system
    let overrides: Vec<_> = opts
        .overrides
        .iter()
        .map(|arg| parse_override(arg))
        .collect::<Result<_>>()?;

    // Get path to output folder
    let pathbuf: PathBuf;
    let output_path = if let Some(p) = opts.output_dir.as_deref() {
        p
    } else {
        pathbuf = get_output_dir(scenario_path)?;
        &pathbuf
    };

    let allow_overwrite = opts.overwrite || settings.overwrite;
    let overwrite = create_output_directory(output_path, allow_overwrite).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            output_path.display()
        )
    })?;

    log::init(Some(settings.log_level.as_str()), Some(output_path))
        .context("Failed to initialise logging.")?;

    let mut scenario = load_scenario(scenario_path).context("Failed to load scenario.")?;
    info!("Loaded scenario from {}", scenario_path.display());
    info!("Output folder: {}", output_path.display());

    // NB: We have to wait until the logger is initialised to display this warning
    if overwrite {
        warn!("Output folder will be overwritten");
    }

    let mut values = scenario.inputs();
    for (name, value) in overrides {
        info!("Setting {name} to {value}");
        values.insert(name, value);
    }
    scenario.apply(&values)?;
    let breakdown = scenario.compute_cost()?;

    let mut writer = DataWriter::create(output_path)?;
    writer.write_costs(&scenario, &breakdown)?;
    writer.write_parameters(&scenario)?;
    writer.write_price_projections(&scenario)?;
    writer.flush()?;

    info!("Results written to {}", output_path.display());

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(scenario_path: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = load_settings(settings)?;

    // Initialise program logger (we won't save log files when running the validate command)
    log::init(Some(settings.log_level.as_str()), None).context("Failed to initialise logging.")?;

    load_scenario(scenario_path).context("Failed to validate scenario.")?;
    info!("Scenario validation successful!");

    Ok(())
}

/// Handle the `parameters` command.
pub fn handle_parameters_command(scenario_path: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = load_settings(settings)?;
    log::init(Some(settings.log_level.as_str()), None).context("Failed to initialise logging.")?;

    let scenario = load_scenario(scenario_path).context("Failed to load scenario.")?;
    for (name, parameter) in registry::collect(&scenario.items, &scenario.parameters) {
        if parameter.is_uncertain() {
            println!(
                "{name} = {} in [{}, {}]",
                parameter.default_value(),
                parameter.min_value(),
                parameter.max_value()
            );
        } else {
            println!("{name} = {}", parameter.default_value());
        }
    }

    Ok(())
}
