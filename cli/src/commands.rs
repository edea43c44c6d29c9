//! Non-interactive subcommands: direct switching, listing, and
//! alias / pin / group / history / preference management.

use crate::AliasCommand;
use crate::Command;
use crate::ConfigCommand;
use crate::GroupCommand;
use crate::PinCommand;
use crate::Toggle;
use crate::kubectl::ContextProvider;
use crate::kubectl::resolve_context;
use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use ksw_core::Config;
use ksw_core::ConfigStore;
use owo_colors::OwoColorize;
use tracing::warn;

/// `ksw <name>` / `ksw @alias`: switch directly, resolving the name
/// against the context list.
pub fn switch_to(
    provider: &dyn ContextProvider,
    store: &ConfigStore,
    config: &Config,
    target: &str,
) -> Result<()> {
    let (requested, alias_tag) = match target.strip_prefix('@') {
        Some(alias) => {
            let context = config
                .aliases
                .get(alias)
                .with_context(|| format!("alias '@{alias}' not found; run `ksw alias ls`"))?;
            (context.clone(), Some(alias.to_string()))
        }
        None => (target.to_string(), None),
    };

    let resolved = resolve_context(provider, &requested)?;
    provider.use_context(&resolved)?;
    if let Err(err) = store.update(|on_disk| on_disk.record_switch(&resolved)) {
        warn!("failed to record history: {err}");
    }

    let tag = alias_tag
        .map(|alias| format!(" @{alias}").magenta().bold().to_string())
        .unwrap_or_default();
    println!("{} Switched to {}{tag}", "✔".green().bold(), resolved.bold());
    Ok(())
}

/// `ksw --list`: the context list with current / alias / pin marks.
pub fn list_contexts(provider: &dyn ContextProvider, config: &Config) -> Result<()> {
    let contexts = provider.list_contexts()?;
    let current = provider.current_context();
    for context in &contexts {
        let mut decorations = String::new();
        if let Some(alias) = config.alias_for(context) {
            decorations.push_str(&format!(" @{alias}").magenta().to_string());
        }
        if config.is_pinned(context) {
            decorations.push_str(&" ★".yellow().to_string());
        }
        let display = config.display_name(context);
        if *context == current {
            println!(
                "{}{decorations} {}",
                format!("▸ {display}").green().bold(),
                "●".green()
            );
        } else {
            println!("  {display}{decorations}");
        }
    }
    Ok(())
}

pub fn dispatch(command: Command, store: &ConfigStore, config: Config) -> Result<()> {
    match command {
        Command::Alias { action } => alias(action, store, config),
        Command::Pin { action } => pin(action, store, config),
        Command::Group { action } => group(action, store, config),
        Command::History => history(&config),
        Command::Config { action } => preferences(action, store),
    }
}

fn alias(action: AliasCommand, store: &ConfigStore, config: Config) -> Result<()> {
    match action {
        AliasCommand::Ls => {
            if config.aliases.is_empty() {
                println!(
                    "{}",
                    "No aliases configured. Use: ksw alias set <name> <context>".dimmed()
                );
                return Ok(());
            }
            for (name, context) in &config.aliases {
                println!("  {} → {context}", format!("@{name}").magenta().bold());
            }
            Ok(())
        }
        AliasCommand::Show { name } => {
            let context = config
                .aliases
                .get(&name)
                .with_context(|| format!("alias '@{name}' not found"))?;
            println!("  {} → {context}", format!("@{name}").magenta().bold());
            Ok(())
        }
        AliasCommand::Set { name, context } => {
            store.update(|on_disk| {
                on_disk.aliases.insert(name.clone(), context.clone());
            })?;
            println!(
                "{} Alias {} → {context}",
                "✔".green().bold(),
                format!("@{name}").magenta().bold()
            );
            Ok(())
        }
        AliasCommand::Rm { name } => {
            if !config.aliases.contains_key(&name) {
                bail!("alias '@{name}' not found");
            }
            store.update(|on_disk| {
                on_disk.aliases.remove(&name);
            })?;
            println!(
                "{} Removed alias {}",
                "✔".green().bold(),
                format!("@{name}").magenta().bold()
            );
            Ok(())
        }
    }
}

fn pin(action: PinCommand, store: &ConfigStore, config: Config) -> Result<()> {
    match action {
        PinCommand::Ls => {
            if config.pins.is_empty() {
                println!("{}", "No pinned contexts. Use: ksw pin add <context>".dimmed());
                return Ok(());
            }
            for context in &config.pins {
                println!("  {} {context}", "★".yellow());
            }
            Ok(())
        }
        PinCommand::Add { context } => {
            if config.is_pinned(&context) {
                println!("{} Already pinned: {context}", "·".dimmed());
                return Ok(());
            }
            store.update(|on_disk| {
                if !on_disk.is_pinned(&context) {
                    on_disk.pins.push(context.clone());
                }
            })?;
            println!("{} Pinned {}", "✔".green().bold(), context.bold());
            Ok(())
        }
        PinCommand::Rm { context } => {
            if !config.is_pinned(&context) {
                bail!("'{context}' is not pinned");
            }
            store.update(|on_disk| {
                on_disk.pins.retain(|pin| *pin != context);
            })?;
            println!("{} Unpinned {}", "✔".green().bold(), context.bold());
            Ok(())
        }
    }
}

fn group(action: GroupCommand, store: &ConfigStore, config: Config) -> Result<()> {
    match action {
        GroupCommand::Ls => {
            if config.groups.is_empty() {
                println!(
                    "{}",
                    "No groups configured. Use: ksw group set <name> <context>...".dimmed()
                );
                return Ok(());
            }
            for (name, members) in &config.groups {
                println!("  {} ({})", name.bold(), members.len());
                for member in members {
                    println!("    {member}");
                }
            }
            Ok(())
        }
        GroupCommand::Set { name, contexts } => {
            let count = contexts.len();
            store.update(|on_disk| {
                on_disk.groups.insert(name.clone(), contexts.clone());
            })?;
            println!(
                "{} Group {} → {count} context{}",
                "✔".green().bold(),
                name.bold(),
                if count == 1 { "" } else { "s" }
            );
            Ok(())
        }
        GroupCommand::Rm { name } => {
            if !config.groups.contains_key(&name) {
                bail!("group '{name}' not found");
            }
            store.update(|on_disk| {
                on_disk.groups.remove(&name);
            })?;
            println!("{} Removed group {}", "✔".green().bold(), name.bold());
            Ok(())
        }
    }
}

fn history(config: &Config) -> Result<()> {
    if config.history.is_empty() {
        println!("{}", "No switch history yet.".dimmed());
        return Ok(());
    }
    for context in &config.history {
        println!("  {context}");
    }
    Ok(())
}

fn preferences(action: ConfigCommand, store: &ConfigStore) -> Result<()> {
    match action {
        ConfigCommand::ShortNames { state } => {
            let enabled = matches!(state, Toggle::On);
            store.update(|on_disk| on_disk.short_names = enabled)?;
            println!(
                "{} Short names {}",
                "✔".green().bold(),
                if enabled { "on" } else { "off" }
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kubectl::tests::FakeProvider;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn store_in(dir: &tempfile::TempDir) -> ConfigStore {
        ConfigStore::new(dir.path().join(".ksw.json"))
    }

    #[test]
    fn switch_records_history_front_first() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);
        let provider = FakeProvider::new(&["eks-payments-dev", "eks-orders-dev"]);
        switch_to(&provider, &store, &Config::default(), "payments").expect("switch");
        switch_to(&provider, &store, &Config::default(), "orders").expect("switch");
        let config = store.load().expect("load");
        assert_eq!(
            config.history,
            vec!["eks-orders-dev".to_string(), "eks-payments-dev".to_string()]
        );
        assert_eq!(provider.current_context(), "eks-orders-dev");
    }

    #[test]
    fn switch_through_alias_resolves_its_target() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);
        let provider = FakeProvider::new(&["arn:aws:eks/payments"]);
        let mut config = Config::default();
        config
            .aliases
            .insert("pay".into(), "payments".into());
        switch_to(&provider, &store, &config, "@pay").expect("switch");
        assert_eq!(provider.current_context(), "arn:aws:eks/payments");
    }

    #[test]
    fn unknown_alias_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);
        let provider = FakeProvider::new(&["dev"]);
        let err = switch_to(&provider, &store, &Config::default(), "@nope").expect_err("missing");
        assert!(err.to_string().contains("@nope"));
    }

    #[test]
    fn alias_set_and_rm_round_trip() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);
        alias(
            AliasCommand::Set {
                name: "pay".into(),
                context: "eks-payments".into(),
            },
            &store,
            Config::default(),
        )
        .expect("set");
        let config = store.load().expect("load");
        assert_eq!(config.aliases.get("pay").map(String::as_str), Some("eks-payments"));
        alias(AliasCommand::Rm { name: "pay".into() }, &store, config).expect("rm");
        assert!(store.load().expect("load").aliases.is_empty());
    }

    #[test]
    fn removing_a_missing_alias_fails() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);
        let err = alias(AliasCommand::Rm { name: "pay".into() }, &store, Config::default())
            .expect_err("missing");
        assert!(err.to_string().contains("@pay"));
    }

    #[test]
    fn pin_add_is_idempotent_and_ordered() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);
        pin(PinCommand::Add { context: "a".into() }, &store, Config::default()).expect("add");
        let config = store.load().expect("load");
        pin(PinCommand::Add { context: "b".into() }, &store, config).expect("add");
        let config = store.load().expect("load");
        pin(PinCommand::Add { context: "a".into() }, &store, config).expect("re-add");
        assert_eq!(
            store.load().expect("load").pins,
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn pin_rm_rejects_unpinned_contexts() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);
        let err = pin(PinCommand::Rm { context: "a".into() }, &store, Config::default())
            .expect_err("unpinned");
        assert!(err.to_string().contains("not pinned"));
    }

    #[test]
    fn group_set_replaces_members() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);
        group(
            GroupCommand::Set {
                name: "prod".into(),
                contexts: vec!["a".into(), "b".into()],
            },
            &store,
            Config::default(),
        )
        .expect("set");
        let config = store.load().expect("load");
        group(
            GroupCommand::Set {
                name: "prod".into(),
                contexts: vec!["c".into()],
            },
            &store,
            config,
        )
        .expect("replace");
        assert_eq!(
            store.load().expect("load").groups.get("prod"),
            Some(&vec!["c".to_string()])
        );
    }

    #[test]
    fn short_name_preference_toggles_on_disk() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);
        preferences(ConfigCommand::ShortNames { state: Toggle::On }, &store).expect("on");
        assert!(store.load().expect("load").short_names);
        preferences(ConfigCommand::ShortNames { state: Toggle::Off }, &store).expect("off");
        assert!(!store.load().expect("load").short_names);
    }
}
