//! User preference persistence.
//!
//! Aliases, pins, groups, the short-name display preference and the
//! switch history all live in one pretty-printed JSON file, `~/.ksw.json`.
//! Writes are last-write-wins with no locking; every mutation goes
//! through a load-modify-save cycle so independent edits from another
//! process are not clobbered wholesale.

use crate::error::ConfigError;
use crate::selector::PinSink;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

pub const CONFIG_FILENAME: &str = ".ksw.json";
const MAX_HISTORY: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// alias -> context name.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    /// Pinned context names, in pin order.
    #[serde(default)]
    pub pins: Vec<String>,
    /// group name -> member context names.
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<String>>,
    /// Render only the last path segment of context names.
    #[serde(default)]
    pub short_names: bool,
    /// Most-recent-first record of successful switches.
    #[serde(default)]
    pub history: Vec<String>,
}

impl Config {
    /// All aliases pointing at `context`, in alias order.
    pub fn aliases_for(&self, context: &str) -> Vec<&str> {
        self.aliases
            .iter()
            .filter(|(_, target)| target.as_str() == context)
            .map(|(alias, _)| alias.as_str())
            .collect()
    }

    /// First alias pointing at `context`, for decorations.
    pub fn alias_for(&self, context: &str) -> Option<&str> {
        self.aliases_for(context).first().copied()
    }

    pub fn is_pinned(&self, context: &str) -> bool {
        self.pins.iter().any(|pin| pin == context)
    }

    /// Pushes `context` to the front of the history, deduplicated and
    /// capped.
    pub fn record_switch(&mut self, context: &str) {
        self.history.retain(|entry| entry != context);
        self.history.insert(0, context.to_string());
        self.history.truncate(MAX_HISTORY);
    }

    /// Display form of a context name under the short-name preference.
    pub fn display_name<'a>(&self, context: &'a str) -> &'a str {
        if self.short_names {
            context.rsplit('/').next().unwrap_or(context)
        } else {
            context
        }
    }
}

/// On-disk home of a [`Config`]. A missing file reads as defaults so a
/// first run needs no setup step.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at `~/.ksw.json`, falling back to the working directory
    /// when the home directory cannot be determined.
    pub fn default_location() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            path: home.join(CONFIG_FILENAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Config, ConfigError> {
        match fs::read(&self.path) {
            Ok(data) => Ok(serde_json::from_slice(&data)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(config)?;
        fs::write(&self.path, data)?;
        Ok(())
    }

    /// Load-modify-save in one step.
    pub fn update(&self, apply: impl FnOnce(&mut Config)) -> Result<(), ConfigError> {
        let mut config = self.load()?;
        apply(&mut config);
        self.save(&config)
    }
}

impl PinSink for ConfigStore {
    fn save_pins(&mut self, pins: &[String]) -> Result<(), ConfigError> {
        self.update(|config| config.pins = pins.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn store_in(dir: &tempfile::TempDir) -> ConfigStore {
        ConfigStore::new(dir.path().join(CONFIG_FILENAME))
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);
        let config = store.load().expect("load");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn round_trip_preserves_every_field() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);
        let mut config = Config::default();
        config.aliases.insert("pay".into(), "eks-payments".into());
        config.pins.push("eks-payments".into());
        config
            .groups
            .insert("prod".into(), vec!["eks-payments".into()]);
        config.short_names = true;
        config.record_switch("eks-payments");
        store.save(&config).expect("save");
        assert_eq!(store.load().expect("load"), config);
    }

    #[test]
    fn older_files_without_new_fields_still_load() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, r#"{"aliases":{"pay":"eks-payments"}}"#).expect("write");
        let config = ConfigStore::new(path).load().expect("load");
        assert_eq!(config.aliases.len(), 1);
        assert!(config.pins.is_empty());
        assert!(!config.short_names);
    }

    #[test]
    fn malformed_file_is_an_error_not_a_reset() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "not json").expect("write");
        assert!(matches!(
            ConfigStore::new(path).load(),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn update_preserves_unrelated_fields() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);
        let mut config = Config::default();
        config.aliases.insert("pay".into(), "eks-payments".into());
        store.save(&config).expect("save");

        let mut sink = store.clone();
        sink.save_pins(&["eks-payments".to_string()])
            .expect("save pins");

        let loaded = store.load().expect("load");
        assert_eq!(loaded.pins, vec!["eks-payments".to_string()]);
        assert_eq!(loaded.aliases.len(), 1);
    }

    #[test]
    fn history_is_deduplicated_and_capped() {
        let mut config = Config::default();
        for i in 0..30 {
            config.record_switch(&format!("ctx-{i}"));
        }
        config.record_switch("ctx-5");
        assert_eq!(config.history.len(), 20);
        assert_eq!(config.history[0], "ctx-5");
        assert_eq!(config.history.iter().filter(|h| *h == "ctx-5").count(), 1);
    }

    #[test]
    fn reverse_alias_lookup_finds_all_names() {
        let mut config = Config::default();
        config.aliases.insert("pay".into(), "eks-payments".into());
        config.aliases.insert("money".into(), "eks-payments".into());
        config.aliases.insert("ord".into(), "eks-orders".into());
        assert_eq!(config.aliases_for("eks-payments"), vec!["money", "pay"]);
        assert_eq!(config.alias_for("eks-orders"), Some("ord"));
        assert_eq!(config.alias_for("eks-unknown"), None);
    }

    #[test]
    fn short_name_preference_trims_path_segments() {
        let mut config = Config::default();
        assert_eq!(config.display_name("arn:aws/eks/payments"), "arn:aws/eks/payments");
        config.short_names = true;
        assert_eq!(config.display_name("arn:aws/eks/payments"), "payments");
        assert_eq!(config.display_name("plain"), "plain");
    }
}
