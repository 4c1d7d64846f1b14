//! `typr-consumer`: a small command-line driver for the typr-io library.
//!
//! Prints the active backends and their capabilities, then performs the
//! requested actions in a fixed order:
//!
//! ```text
//! --request-permissions   ask the OS for injection permission
//! --key-delay <us>        inter-event pause for the Sender
//! --tap <KEY>...          tap each key in turn
//! --combo <MODS+KEY>      e.g. "ctrl+shift+a"
//! --type <TEXT>           inject Unicode text (if the backend can)
//! --listen <SECS>         print every observed key transition for SECS
//! ```
//!
//! Without any action flag it prints the capability report and the help
//! text.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{CommandFactory, Parser};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use typr_io::infrastructure::config::{load_config, load_config_from};
use typr_io::{
    library_version, string_to_key, Capabilities, Key, Listener, Modifier, Sender, TyprConfig,
};

#[derive(Debug, Parser)]
#[command(name = "typr-consumer", version, about = "Exercise the typr-io Sender and Listener")]
struct Cli {
    /// Text to inject through the Sender.
    #[arg(long = "type", value_name = "TEXT")]
    text: Option<String>,

    /// Key to tap; may be repeated.
    #[arg(long, value_name = "KEY")]
    tap: Vec<String>,

    /// Modifier chord plus key, e.g. "ctrl+shift+a".
    #[arg(long, value_name = "MODS+KEY")]
    combo: Option<String>,

    /// Listen for global key events for this many seconds.
    #[arg(long, value_name = "SECS")]
    listen: Option<u64>,

    /// Ask the OS for the permissions the Sender needs.
    #[arg(long)]
    request_permissions: bool,

    /// Inter-event delay in microseconds (overrides the config file).
    #[arg(long, value_name = "US")]
    key_delay: Option<u32>,

    /// Read configuration from this file instead of the default location.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Cli {
    fn has_action(&self) -> bool {
        self.text.is_some()
            || !self.tap.is_empty()
            || self.combo.is_some()
            || self.listen.is_some()
            || self.request_permissions
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_result = match &cli.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    };
    let (config, config_error) = match config_result {
        Ok(config) => (config, None),
        Err(e) => (TyprConfig::default(), Some(e)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    if let Some(e) = config_error {
        warn!("using default configuration: {e}");
    }
    info!(version = library_version(), "typr-consumer starting");

    let mut sender = Sender::with_config(&config.sender);
    if let Some(us) = cli.key_delay {
        sender.set_key_delay(us);
    }

    println!("typr-io {}", library_version());
    println!("sender backend: {}", sender.backend_type());
    print_capabilities(&sender.capabilities());
    if let Some(diagnostic) = sender.diagnostic() {
        println!("sender diagnostic: {diagnostic}");
    }

    if !cli.has_action() {
        println!();
        Cli::command().print_help()?;
        return Ok(());
    }

    if cli.request_permissions {
        let ready = sender.request_permissions();
        println!("request permissions -> ready = {ready}");
    }

    for name in &cli.tap {
        let key: Key = name
            .parse()
            .map_err(|_| anyhow::anyhow!("unknown key name '{name}'"))?;
        println!("tap {key} -> {}", sender.tap(key));
    }

    if let Some(spec) = &cli.combo {
        let (mods, key) = parse_combo(spec)?;
        println!("combo {mods}+{key} -> {}", sender.combo(mods, key));
    }

    if let Some(text) = &cli.text {
        if !sender.capabilities().can_inject_text {
            warn!("backend {} cannot inject text", sender.backend_type());
        }
        println!("type {text:?} -> {}", sender.type_text(text));
    }

    if let Some(secs) = cli.listen {
        run_listener(&config, Duration::from_secs(secs))?;
    }

    Ok(())
}

fn print_capabilities(caps: &Capabilities) {
    println!("capabilities:");
    for (name, value) in [
        ("can_inject_keys", caps.can_inject_keys),
        ("can_inject_text", caps.can_inject_text),
        ("can_simulate_hid", caps.can_simulate_hid),
        ("supports_key_repeat", caps.supports_key_repeat),
        ("needs_accessibility_perm", caps.needs_accessibility_perm),
        ("needs_input_monitoring_perm", caps.needs_input_monitoring_perm),
        ("needs_uinput_access", caps.needs_uinput_access),
    ] {
        println!("  {name:<28} {value}");
    }
}

fn run_listener(config: &TyprConfig, duration: Duration) -> anyhow::Result<()> {
    let listener = Listener::with_config(&config.listener);
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);

    let started = listener.try_start(Some(Box::new(move |event| {
        counter.fetch_add(1, Ordering::Relaxed);
        let ch = event.character().map(String::from).unwrap_or_default();
        println!(
            "{:<5} {:<14} {:<20} {}",
            if event.pressed { "down" } else { "up" },
            event.key,
            event.modifiers,
            ch
        );
    })));
    started.context("failed to start listener")?;

    println!("listening for {}s (backend: {})", duration.as_secs(), listener.backend_type());
    std::thread::sleep(duration);
    listener.stop();
    println!("{} events observed", seen.load(Ordering::Relaxed));
    Ok(())
}

/// Parses `"ctrl+shift+a"` into its modifier mask and final key.
fn parse_combo(spec: &str) -> anyhow::Result<(Modifier, Key)> {
    let parts: Vec<&str> = spec.split('+').map(str::trim).collect();
    let Some((key_name, mod_names)) = parts.split_last() else {
        bail!("empty combo");
    };

    let mut mods = Modifier::NONE;
    for name in mod_names {
        mods |= match name.to_ascii_lowercase().as_str() {
            "shift" => Modifier::SHIFT,
            "ctrl" | "control" => Modifier::CTRL,
            "alt" | "option" => Modifier::ALT,
            "super" | "cmd" | "command" | "meta" | "win" => Modifier::SUPER,
            other => bail!("unknown modifier '{other}' in '{spec}'"),
        };
    }

    match string_to_key(key_name) {
        Key::Unknown => bail!("unknown key '{key_name}' in '{spec}'"),
        key => Ok((mods, key)),
    }
}
