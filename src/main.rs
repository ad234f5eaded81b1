// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! # Button action daemon.
//!
//! Watches a Linux input device (typically a GPIO button) and runs shell
//! commands when keys are pressed, released, held past a threshold, or held
//! long enough for an auto-fire.
//!
//! ## Architecture
//!
//! * The **Main Thread** runs a cooperative loop: dispatch of at most one
//!   pending key event to the [`engine::Engine`] (reading the device
//!   without blocking when nothing is queued), one sweep of the auto-fire
//!   timers, then a short sleep.
//! * A **Background Worker** spawns the configured commands through the
//!   shell and reaps them, so the loop never waits on a child process.
//!   Commands reach it over a `std::sync::mpsc` channel.
//!
//! Start-up follows a strict order: detach (if asked), set up logging, load
//! settings and rules, open the device, and only then enter the loop. Any
//! failure before the loop ends the process with a non-zero status.

mod config;
mod engine;
mod events;
mod executor;
mod input;
mod rules;
mod util;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use crate::{
    config::AppConfig,
    engine::Engine,
    executor::ShellExecutor,
    input::InputDevice,
    rules::{RuleSet, load_rule_file},
    util::logging::{LogTarget, init_logging},
};

#[derive(Parser, Debug)]
#[command(name = "buttond", about = "Run commands on input device button presses")]
struct Args {
    /// Log to the system log instead of stdout.
    #[arg(short, long)]
    silent: bool,

    /// Detach and run in the background. Implies --silent.
    #[arg(short, long)]
    daemon: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,

    /// Rule file to load instead of the configured one.
    #[arg(long, value_name = "PATH")]
    rules: Option<PathBuf>,

    /// Input device to watch. When given, no rule file is loaded.
    device: Option<PathBuf>,
}

impl Args {
    fn log_target(&self) -> LogTarget {
        if self.silent || self.daemon {
            LogTarget::Syslog
        } else {
            LogTarget::Stdout
        }
    }
}

/// The entry point of the application.
///
/// Detaches first when running as a daemon, since forking is only safe while
/// the process is still single threaded.
fn main() -> Result<()> {
    let args = Args::parse();

    if args.daemon {
        util::daemon::daemonize().context("Failed to detach")?;
    }

    init_logging(args.log_target(), args.verbose).context("Failed to initialise logging")?;
    info!("buttond started");
    if args.log_target() == LogTarget::Syslog {
        info!("running in silent mode, logging to syslog");
    }

    let res = run(&args);
    if let Err(e) = &res {
        error!("{e:#}");
    }
    res
}

/// Loads the rules, opens the device and hands control to the event loop.
///
/// # Errors
///
/// Returns an error if the rule file cannot be read, the device cannot be
/// opened, signal handlers cannot be installed, or the device fails while
/// the loop is running.
fn run(args: &Args) -> Result<()> {
    let config = config::load_config();

    let (device_path, rules) = select_device_and_rules(args, &config)?;
    if rules.is_empty() {
        warn!("no rules loaded, key events will be ignored");
    }

    let shutdown = events::register_shutdown_flag()?;

    let mut device = InputDevice::open(&device_path).context("Failed to open event device")?;
    info!("input device {} opened", device.path().display());

    let executor = ShellExecutor::new(config.shell.clone());
    let mut engine = Engine::new(rules, executor);
    info!("watching with {} rule(s)", engine.rules().len());

    events::process_events(&mut device, &mut engine, config.tick_interval(), &shutdown)
}

/// A device given on the command line bypasses the rule file entirely.
/// Otherwise the rule file is loaded and its `DEVICE=` line, if any, picks
/// the device.
fn select_device_and_rules(args: &Args, config: &AppConfig) -> Result<(PathBuf, RuleSet)> {
    if let Some(device) = &args.device {
        return Ok((device.clone(), RuleSet::with_limit(config.max_rules)));
    }

    let rules_path = args.rules.as_deref().unwrap_or(&config.rules_file);
    let file = load_rule_file(rules_path, config.max_rules)?;
    info!("loaded {} rule(s) from {}", file.rules.len(), rules_path.display());

    let device = file.device.unwrap_or_else(|| config.default_device.clone());
    Ok((device, file.rules))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("buttond").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn parses_flags_and_device() {
        let args = args(&["-s", "-v", "/dev/input/event3"]);
        assert!(args.silent && args.verbose && !args.daemon);
        assert_eq!(args.device, Some(PathBuf::from("/dev/input/event3")));
        assert_eq!(args.log_target(), LogTarget::Syslog);
    }

    #[test]
    fn daemon_implies_syslog() {
        assert_eq!(args(&["-d"]).log_target(), LogTarget::Syslog);
        assert_eq!(args(&[]).log_target(), LogTarget::Stdout);
    }

    #[test]
    fn rejects_unknown_flags() {
        assert!(Args::try_parse_from(["buttond", "-x"]).is_err());
    }

    #[test]
    fn device_argument_skips_the_rule_file() {
        let config = AppConfig {
            rules_file: PathBuf::from("/nonexistent/rules.conf"),
            ..AppConfig::default()
        };

        let (device, rules) = select_device_and_rules(&args(&["/dev/input/event7"]), &config).unwrap();
        assert_eq!(device, PathBuf::from("/dev/input/event7"));
        assert!(rules.is_empty());
    }

    #[test]
    fn rule_file_device_overrides_the_default() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "DEVICE=/dev/input/event2\nKEY_ENTER PRESS echo hi").unwrap();
        let path = tmp.path().to_str().unwrap();

        let (device, rules) = select_device_and_rules(&args(&["--rules", path]), &AppConfig::default()).unwrap();
        assert_eq!(device, PathBuf::from("/dev/input/event2"));
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn default_device_without_device_line() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "KEY_ENTER PRESS echo hi").unwrap();
        let config = AppConfig {
            rules_file: tmp.path().to_path_buf(),
            ..AppConfig::default()
        };

        let (device, _) = select_device_and_rules(&args(&[]), &config).unwrap();
        assert_eq!(device, config.default_device);
    }

    #[test]
    fn missing_rule_file_is_fatal() {
        let config = AppConfig {
            rules_file: PathBuf::from("/nonexistent/rules.conf"),
            ..AppConfig::default()
        };
        assert!(select_device_and_rules(&args(&[]), &config).is_err());
    }
}
