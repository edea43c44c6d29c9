pub mod commands;
pub mod kubectl;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use ksw_core::Config;
use ksw_core::ConfigStore;
use ksw_core::Outcome;
use ksw_core::Restriction;
use ksw_tui::PickerParams;
use owo_colors::OwoColorize;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::kubectl::ContextProvider;
use crate::kubectl::Kubectl;

#[derive(Debug, Parser)]
#[command(
    name = "ksw",
    version,
    about = "Interactive Kubernetes context switcher",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    /// Context name or @alias to switch to directly.
    pub target: Option<String>,

    /// List contexts without entering the interactive picker.
    #[arg(short = 'l', long = "list")]
    pub list: bool,

    /// Restrict the picker to members of a named group.
    #[arg(long, value_name = "NAME")]
    pub group: Option<String>,

    /// Restrict the picker to pinned contexts.
    #[arg(long)]
    pub pinned: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage aliases for context names.
    Alias {
        #[command(subcommand)]
        action: AliasCommand,
    },
    /// Manage pinned contexts.
    Pin {
        #[command(subcommand)]
        action: PinCommand,
    },
    /// Manage named context groups.
    Group {
        #[command(subcommand)]
        action: GroupCommand,
    },
    /// Show recently used contexts, most recent first.
    History,
    /// Adjust persisted preferences.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum AliasCommand {
    /// List all aliases.
    Ls,
    /// Show where an alias points.
    Show { name: String },
    /// Create or update an alias for a context.
    Set { name: String, context: String },
    /// Remove an alias.
    Rm { name: String },
}

#[derive(Debug, Subcommand)]
pub enum PinCommand {
    /// List pinned contexts in pin order.
    Ls,
    /// Pin a context to the top of the picker.
    Add { context: String },
    /// Unpin a context.
    Rm { context: String },
}

#[derive(Debug, Subcommand)]
pub enum GroupCommand {
    /// List groups and their members.
    Ls,
    /// Create or replace a group with the given member contexts.
    Set {
        name: String,
        #[arg(required = true)]
        contexts: Vec<String>,
    },
    /// Remove a group.
    Rm { name: String },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Render only the last path segment of context names.
    ShortNames { state: Toggle },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

pub fn run(cli: Cli) -> Result<()> {
    init_logging();
    let Cli {
        target,
        list,
        group,
        pinned,
        command,
    } = cli;
    let store = ConfigStore::default_location();
    let config = store.load().unwrap_or_else(|err| {
        warn!("failed to load {}: {err}", store.path().display());
        Config::default()
    });
    let kubectl = Kubectl::new();

    if list {
        return commands::list_contexts(&kubectl, &config);
    }
    if let Some(command) = command {
        return commands::dispatch(command, &store, config);
    }
    if let Some(target) = target {
        return commands::switch_to(&kubectl, &store, &config, &target);
    }
    interactive(group, pinned, store, config, &kubectl)
}

fn interactive(
    group: Option<String>,
    pinned: bool,
    store: ConfigStore,
    config: Config,
    kubectl: &dyn ContextProvider,
) -> Result<()> {
    let contexts = kubectl.list_contexts()?;
    if contexts.is_empty() {
        bail!("no contexts found in kubeconfig");
    }
    let current = kubectl.current_context();

    let restriction = if pinned {
        Restriction::PinnedOnly
    } else if let Some(name) = &group {
        let members = config
            .groups
            .get(name)
            .with_context(|| format!("unknown group '{name}'; run `ksw group ls`"))?;
        Restriction::Group(members.iter().cloned().collect())
    } else {
        Restriction::All
    };

    let outcome = ksw_tui::run_picker(PickerParams {
        contexts,
        current: current.clone(),
        config: config.clone(),
        store: store.clone(),
        restriction,
    })?;

    match outcome {
        Outcome::Committed(chosen) if chosen != current => {
            kubectl.use_context(&chosen)?;
            if let Err(err) = store.update(|on_disk| on_disk.record_switch(&chosen)) {
                warn!("failed to record history: {err}");
            }
            let alias = config
                .alias_for(&chosen)
                .map(|alias| format!(" @{alias}").magenta().bold().to_string())
                .unwrap_or_default();
            println!("{} Switched to {}{alias}", "✔".green().bold(), chosen.bold());
        }
        Outcome::Committed(chosen) => {
            println!("{} Already on {chosen}", "·".dimmed());
        }
        Outcome::Cancelled => {}
    }
    Ok(())
}

/// Logs go to a file so the alternate screen stays clean. Level comes
/// from `KSW_LOG` (falling back to `RUST_LOG`), default `warn`.
fn init_logging() {
    let Some(home) = dirs::home_dir() else {
        return;
    };
    let log_dir = home.join(".ksw").join("log");
    if std::fs::create_dir_all(&log_dir).is_err() {
        return;
    }
    let appender = tracing_appender::rolling::never(log_dir, "ksw.log");
    let filter = EnvFilter::try_from_env("KSW_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(appender)
        .with_ansi(false)
        .try_init();
}
