use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use turtles_serverconfig::paths::{AppSettings, Resources, ServerLayout, scan_directory};
use turtles_serverconfig::{ConfigStore, GuiOptions, Metadata, Session, statics};

/// Command-line arguments for turtles-serverconfig
#[derive(Parser, Debug)]
#[command(name = "turtles-serverconfig")]
#[command(version, about = "Editor for SPT server configuration files", long_about = None)]
pub struct Args {
    /// Base directory of the SPT install (the one containing SPT_Data)
    #[arg(short, long, env = "TSC_BASE_DIR")]
    pub base_dir: Option<PathBuf>,

    /// Metadata file describing tabs, files, and fields
    #[arg(long)]
    pub metadata: Option<PathBuf>,

    /// JSON list of config files to load, relative to SPT_Data/Server
    #[arg(long)]
    pub required_files: Option<PathBuf>,

    /// Settings file remembering the chosen base directory
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Write logs to file (in addition to stderr)
    #[arg(long, default_value = statics::LOG_FILE)]
    pub log_file: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the editor window (default)
    Gui,
    #[command(flatten)]
    Headless(Headless),
}

/// Commands that work on the config files without opening a window.
#[derive(Subcommand, Debug)]
pub enum Headless {
    /// Print the value of a dotted key
    Get {
        key: String,
        /// Config file relative to SPT_Data/Server; looked up in the metadata when omitted
        #[arg(short, long)]
        file: Option<String>,
    },
    /// Set a dotted key and write the file if it changed
    Set {
        key: String,
        value: String,
        #[arg(short, long)]
        file: Option<String>,
    },
    /// Save all loaded config files as a preset (a name lands in the presets directory)
    SavePreset { target: String },
    /// Load a preset and apply it to the config files
    LoadPreset { target: String },
    /// List the JSON files under SPT_Data/Server/configs
    Scan,
    /// Load everything and report missing files and unbindable fields
    Check,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting");

    let resources = resources(&args);
    let settings_path = args
        .settings
        .clone()
        .unwrap_or_else(AppSettings::default_path);

    let command = match &args.command {
        None | Some(Command::Gui) => {
            let options = GuiOptions {
                base_dir: args.base_dir.clone(),
                resources,
                settings_path,
            };
            return turtles_serverconfig::run_gui(options)
                .map_err(|e| anyhow::anyhow!("GUI error: {e}"));
        }
        Some(Command::Headless(command)) => command,
    };

    let result = run_command(command, &args, &resources, &settings_path);
    if let Err(e) = &result {
        tracing::error!(error = %format!("{e:#}"), "command failed");
    }
    result
}

fn init_logging(args: &Args) -> Result<()> {
    use std::fs::File;

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "turtles_serverconfig={level},warn",
            level = log_level
        ))
    });

    let file = File::create(&args.log_file)
        .with_context(|| format!("creating log file {:?}", args.log_file))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file)
                .with_ansi(false),
        )
        .init();

    Ok(())
}

fn resources(args: &Args) -> Resources {
    let bundled = Resources::bundled();
    Resources {
        metadata: args.metadata.clone().unwrap_or(bundled.metadata),
        required_files: args.required_files.clone().unwrap_or(bundled.required_files),
    }
}

/// Flag first, then the saved setting.
fn base_dir(args: &Args, settings_path: &Path) -> Result<PathBuf> {
    if let Some(dir) = &args.base_dir {
        return Ok(dir.clone());
    }
    match AppSettings::load(settings_path).existing_base_dir() {
        Some(dir) => Ok(dir.to_path_buf()),
        None => bail!("no base directory configured; pass --base-dir or pick one in the GUI"),
    }
}

fn run_command(
    command: &Headless,
    args: &Args,
    resources: &Resources,
    settings_path: &Path,
) -> Result<()> {
    let layout = ServerLayout::new(base_dir(args, settings_path)?);

    match command {
        Headless::Get { key, file } => {
            let (session, _) = Session::open(layout, resources)?;
            let file = owning_file(&session.metadata, key, file.as_deref())?;
            let value = session.store.get(&file, key)?;
            if value.is_scalar() {
                println!("{}", value.display_text());
            } else {
                println!("{}", value.to_pretty_json());
            }
            Ok(())
        }
        Headless::Set { key, value, file } => {
            let (mut session, _) = Session::open(layout, resources)?;
            let file = owning_file(&session.metadata, key, file.as_deref())?;
            let written = set_value(&mut session.store, &session.metadata, &file, key, value)?;
            if written {
                println!("{file}: {key} = {value}");
            } else {
                println!("{file}: unchanged");
            }
            Ok(())
        }
        Headless::SavePreset { target } => {
            let (session, _) = Session::open(layout, resources)?;
            let path = preset_path(&session, target);
            session.save_preset(&path)?;
            println!("{} ({})", statics::EN_MSG_PRESET_SAVED, path.display());
            Ok(())
        }
        Headless::LoadPreset { target } => {
            let (mut session, _) = Session::open(layout, resources)?;
            let path = preset_path(&session, target);
            let (replaced, warnings) = session.load_preset(&path)?;
            for warning in &warnings {
                eprintln!("warning: {warning}");
            }
            tracing::info!(files = replaced.len(), "preset loaded");

            let report = session.apply();
            for file in &report.written {
                println!("wrote {file}");
            }
            if !report.is_success() {
                for line in report.error_lines() {
                    eprintln!("{line}");
                }
                bail!(report.summary());
            }
            println!("{}", report.summary());
            Ok(())
        }
        Headless::Scan => {
            let required = resources.load_required_files().unwrap_or_default();
            for (relative, _) in scan_directory(&layout.config_dir, statics::JSON_EXT) {
                let relative = format!("{}/{relative}", statics::SPT_CONFIGS_DIR);
                let mark = if required.contains(&relative) { "*" } else { " " };
                println!("{mark} {relative}");
            }
            Ok(())
        }
        Headless::Check => {
            let (session, warnings) = Session::open(layout, resources)?;
            println!(
                "{} of {} files loaded, {} fields bound",
                session.store.len(),
                session.required.len(),
                session.form.len()
            );
            for warning in &warnings {
                eprintln!("warning: {warning}");
            }
            if !warnings.is_empty() {
                bail!("{} warnings", warnings.len());
            }
            Ok(())
        }
    }
}

fn owning_file(metadata: &Metadata, key: &str, explicit: Option<&str>) -> Result<String> {
    match explicit {
        Some(file) => Ok(file.to_string()),
        None => Ok(metadata.resolve(key)?.0.to_string()),
    }
}

/// Coerce `text` by the declared (or current) type, store it, and flush the file.
fn set_value(
    store: &mut ConfigStore,
    metadata: &Metadata,
    file: &str,
    key: &str,
    text: &str,
) -> Result<bool> {
    let field_type = metadata.type_for(file, key, store.get(file, key)?);
    let value = field_type.coerce(key, text)?;
    store.set(file, key, value)?;
    store
        .flush(file)
        .with_context(|| format!("Error processing file {file}"))
}

/// A bare name lands in the presets directory; anything with a directory part is a path.
fn preset_path(session: &Session, target: &str) -> PathBuf {
    let path = Path::new(target);
    if path.is_absolute() || path.components().count() > 1 {
        path.to_path_buf()
    } else {
        session.default_preset_path(target)
    }
}

#[cfg(test)]
mod tests {
    use super::{Args, Command, Headless};
    use clap::Parser;

    #[test]
    fn gui_and_headless_commands_parse_apart() {
        let args = Args::try_parse_from(["turtles-serverconfig"]).unwrap();
        assert!(args.command.is_none());

        let args = Args::try_parse_from(["turtles-serverconfig", "gui"]).unwrap();
        assert!(matches!(args.command, Some(Command::Gui)));

        let args =
            Args::try_parse_from(["turtles-serverconfig", "set", "save.loot", "false", "-f", "configs/inraid.json"])
                .unwrap();
        match args.command {
            Some(Command::Headless(Headless::Set { key, value, file })) => {
                assert_eq!(key, "save.loot");
                assert_eq!(value, "false");
                assert_eq!(file.as_deref(), Some("configs/inraid.json"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
