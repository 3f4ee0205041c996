use anyhow::Context;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use tpkbdctl::{Paths, Selection, Setting, Value, parse_choice};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "ThinkPad USB keyboard TrackPoint control", long_about = None)]
struct Args {
    /// List all available devices
    #[arg(short, long)]
    list: bool,

    /// Specify device, formatted as printed with --list (repeatable)
    #[arg(short, long, value_name = "ID")]
    device: Vec<String>,

    /// Set TrackPoint sensitivity, range 1-255
    #[arg(short, long, value_name = "N", allow_negative_numbers = true)]
    sensitivity: Option<i64>,

    /// Set press speed, range 1-255
    #[arg(short = 'S', long, value_name = "SPEED", allow_negative_numbers = true)]
    press_speed: Option<i64>,

    /// Enable press-to-select? (y/n)
    #[arg(short, long, value_name = "?")]
    press_to_select: Option<String>,

    /// Enable press-right? (y/n)
    #[arg(short = 'R', long, value_name = "?")]
    press_right: Option<String>,

    /// Enable dragging? (y/n)
    #[arg(short = 'D', long, value_name = "?")]
    dragging: Option<String>,

    /// Enable release-to-select? (y/n)
    #[arg(short, long, value_name = "?")]
    release_to_select: Option<String>,

    /// Print the current settings of each device
    #[arg(long)]
    show: bool,

    /// Print --list and --show output as JSON
    #[arg(long)]
    json: bool,

    /// Increase verbosity (repeatable)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// HID device listing [env: TPKBDCTL_HID_ROOT]
    #[arg(long, value_name = "DIR")]
    hid_root: Option<PathBuf>,

    /// sysfs device hierarchy [env: TPKBDCTL_DEVICES_ROOT]
    #[arg(long, value_name = "DIR")]
    devices_root: Option<PathBuf>,

    /// Directory holding hidraw nodes [env: TPKBDCTL_DEV_ROOT]
    #[arg(long, value_name = "DIR")]
    dev_root: Option<PathBuf>,
}

impl Args {
    fn paths(&self) -> Paths {
        let mut paths = Paths::from_env();
        if let Some(root) = &self.hid_root {
            paths.hid_root = root.clone();
        }
        if let Some(root) = &self.devices_root {
            paths.devices_root = root.clone();
        }
        if let Some(root) = &self.dev_root {
            paths.dev_root = root.clone();
        }
        paths
    }

    /// Requested changes, in the order they are applied.
    /// Out of range levels are reported and left out.
    fn changes(&self) -> Vec<(Setting, Value)> {
        let mut changes = Vec::new();

        for (setting, level) in [
            (Setting::Sensitivity, self.sensitivity),
            (Setting::PressSpeed, self.press_speed),
        ] {
            let Some(level) = level else { continue };
            match setting.level(level) {
                Ok(value) => changes.push((setting, value)),
                // Shown even when logging is filtered out
                Err(e) => eprintln!("{}, ignored", e),
            }
        }

        for (setting, choice) in [
            (Setting::PressToSelect, &self.press_to_select),
            (Setting::PressRight, &self.press_right),
            (Setting::Dragging, &self.dragging),
            (Setting::ReleaseToSelect, &self.release_to_select),
        ] {
            // An empty answer counts as not given
            if let Some(choice) = choice.as_deref().filter(|c| !c.is_empty()) {
                changes.push((setting, Value::Flag(parse_choice(choice))));
            }
        }

        changes
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

fn print_list(selection: &Selection, json: bool) -> anyhow::Result<()> {
    if json {
        let summaries: Vec<_> = selection.devices().iter().map(|d| d.summary()).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        for device in selection.devices() {
            println!("{}", device);
        }
    }
    Ok(())
}

/// Print current settings; returns how many devices could not be read
fn print_settings(selection: &Selection, json: bool) -> anyhow::Result<usize> {
    let mut failures = 0;
    let mut records = Vec::new();

    for device in selection.devices() {
        let settings = if device.can_get() {
            match device.read_all() {
                Ok(settings) => Some(settings),
                Err(e) => {
                    error!("Failed to read settings of {}: {}", device, e);
                    failures += 1;
                    continue;
                }
            }
        } else {
            None
        };

        if json {
            records.push(serde_json::json!({
                "device": device.summary(),
                "settings": settings,
            }));
            continue;
        }

        println!("{}", device);
        match settings {
            Some(settings) => {
                for setting in Setting::ALL {
                    println!("  {:<20}{}", setting.attribute(), settings.get(setting));
                }
            }
            None => println!("  settings cannot be read back"),
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    }
    Ok(failures)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let paths = args.paths();
    let mut selection = Selection::new(paths.clone());
    let mut failures = 0;

    if args.device.is_empty() {
        selection.enumerate().with_context(|| {
            format!("Failed to list devices in {}", paths.hid_root.display())
        })?;
    } else {
        for identifier in &args.device {
            match selection.select(identifier) {
                Ok(true) => {}
                Ok(false) => failures += 1,
                Err(e) => {
                    error!("{}", e);
                    failures += 1;
                }
            }
        }
    }

    if args.list {
        print_list(&selection, args.json)?;
        return Ok(());
    }

    let changes = args.changes();
    if !changes.is_empty() {
        if selection.is_empty() {
            warn!("No devices to configure");
        }
        for device in selection.devices_mut() {
            info!("Configuring {}", device);
            for (setting, value) in &changes {
                info!("  {:<20}{}", setting.attribute(), value);
            }
            if let Err(e) = device.apply(&changes) {
                error!("Could not set values on {}: {}", device, e);
                failures += 1;
            }
        }
    }

    if args.show {
        failures += print_settings(&selection, args.json)?;
    }

    if failures > 0 {
        anyhow::bail!("{} operation(s) failed", failures);
    }
    Ok(())
}
