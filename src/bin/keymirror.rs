// Keymirror CLI
// Grab a keyboard and mirror its left half onto the right while space is held

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use keymirror_core::{
    find_device, list_devices, run_loop, Config, EventLogger, GrabbedDevice, Injector, KeyTable,
    Pipeline, Translator,
};

/// One-handed typing for evdev keyboards
#[derive(Parser, Debug)]
#[command(name = "keymirror")]
#[command(version)]
#[command(about = "Mirror the left-hand keyboard rows onto the right while space is held", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log every event entering the translator
    #[arg(long, global = true)]
    trace_events: bool,

    /// Validate config and exit
    #[arg(long)]
    check_config: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// List input devices
    Ls,

    /// Grab DEVICE and run the translator until the exit key is pressed
    Mirror {
        /// Device path (/dev/input/eventN) or part of its name
        device: String,
    },
}

fn init_logging(args: &Args) {
    let level = if args.trace_events {
        "trace"
    } else if args.verbose {
        "debug"
    } else {
        "info"
    };

    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level));
    // Explicit flags win over RUST_LOG
    if args.trace_events || args.verbose {
        builder.filter_level(level.parse().unwrap_or(log::LevelFilter::Info));
    }
    builder.format_timestamp_millis().init();
}

fn check_config(config: &Config, table: &KeyTable) {
    println!("Configuration is valid");
    println!("  trigger key: {}", config.trigger_key);
    println!("  tap key:     {}", config.tap_key);
    println!("  exit key:    {}", config.exit_key);
    println!("  tap timeout: {} ms", config.tap_timeout.as_millis());
    println!("  output name: {}", config.output_name);
    println!("Mirror table ({} keys):", table.len());
    for (from, to) in table.iter() {
        println!("  {:<10} -> {}", from.to_string(), to);
    }
}

fn list() {
    let devices = list_devices();
    if devices.is_empty() {
        println!("No input devices found (is /dev/input readable?)");
        return;
    }
    for device in &devices {
        let marker = if device.is_keyboard { "*" } else { " " };
        println!("{} {}  {}", marker, device.path.display(), device.name);
    }
    println!();
    println!("* usable keyboard");
}

fn mirror(query: &str, config: &Config, table: KeyTable, trace_events: bool) -> Result<()> {
    let path = find_device(query, &config.output_name)?;
    let mut source = GrabbedDevice::acquire(&path)
        .with_context(|| format!("cannot take exclusive access to {}", path.display()))?;
    log::info!("Mirroring {} ({})", source.name(), source.path().display());

    let extra_keys: Vec<_> = table.mirrored_keys().chain([config.tap_key]).collect();
    let injector = Injector::create_mirror(source.device(), &config.output_name, extra_keys)
        .context("cannot create virtual output device")?;

    let mut builder = Pipeline::builder();
    if trace_events {
        builder = builder.then(EventLogger::new("input"));
    }
    let mut pipeline = builder
        .then(Translator::new(table, config.translator_config()))
        .sink(injector);

    log::info!("Hold {} to mirror; press {} to quit", config.trigger_key, config.exit_key);
    let processed = run_loop(&mut source, &mut pipeline, config.exit_key)?;
    source.ungrab();
    log::debug!("Processed {} events", processed);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let config = Config::load(args.config.as_deref()).context("failed to load configuration")?;
    let table = KeyTable::mirrored().context("failed to build mirror table")?;

    if args.check_config {
        check_config(&config, &table);
        return Ok(());
    }

    match args.command {
        Some(Command::Ls) => {
            list();
            Ok(())
        }
        Some(Command::Mirror { ref device }) => mirror(device, &config, table, args.trace_events),
        None => bail!("no command given; try `keymirror ls` or `keymirror mirror <DEVICE>`"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["keymirror", "mirror", "/dev/input/event3"]);

        assert_eq!(
            args.command,
            Some(Command::Mirror {
                device: "/dev/input/event3".to_string()
            })
        );
        assert_eq!(args.config, None);
        assert!(!args.verbose);
        assert!(!args.trace_events);
        assert!(!args.check_config);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::parse_from([
            "keymirror",
            "mirror",
            "Keychron",
            "--config",
            "/tmp/keymirror.toml",
            "-v",
            "--trace-events",
        ]);

        assert_eq!(args.config, Some(PathBuf::from("/tmp/keymirror.toml")));
        assert!(args.verbose);
        assert!(args.trace_events);
    }

    #[test]
    fn test_ls_and_check_config() {
        let args = Args::parse_from(["keymirror", "ls"]);
        assert_eq!(args.command, Some(Command::Ls));

        let args = Args::parse_from(["keymirror", "--check-config"]);
        assert!(args.check_config);
        assert_eq!(args.command, None);
    }

    #[test]
    fn test_mirror_requires_device() {
        assert!(Args::try_parse_from(["keymirror", "mirror"]).is_err());
    }
}
