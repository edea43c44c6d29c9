//! kubectl collaborator: enumerating, reading and switching contexts
//! through the `kubectl config` subcommands.

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use std::process::Command;
use tracing::debug;

/// Narrow seam to the context-providing tool, so the switch logic can
/// be exercised against a fake in tests.
pub trait ContextProvider {
    fn list_contexts(&self) -> Result<Vec<String>>;
    /// Best-effort; an unset or unreadable current context is an empty
    /// string, not an error.
    fn current_context(&self) -> String;
    fn use_context(&self, name: &str) -> Result<()>;
}

/// The real collaborator, shelling out to `kubectl`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Kubectl;

impl Kubectl {
    pub fn new() -> Self {
        Self
    }
}

impl ContextProvider for Kubectl {
    fn list_contexts(&self) -> Result<Vec<String>> {
        let output = Command::new("kubectl")
            .args(["config", "get-contexts", "-o", "name"])
            .output()
            .context("failed to run kubectl")?;
        if !output.status.success() {
            bail!(
                "kubectl config get-contexts failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn current_context(&self) -> String {
        let output = Command::new("kubectl")
            .args(["config", "current-context"])
            .output();
        match output {
            Ok(output) if output.status.success() => {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            }
            _ => String::new(),
        }
    }

    fn use_context(&self, name: &str) -> Result<()> {
        debug!("switching context to {name}");
        let output = Command::new("kubectl")
            .args(["config", "use-context", name])
            .output()
            .context("failed to run kubectl")?;
        if !output.status.success() {
            bail!(
                "kubectl config use-context {name} failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

/// Resolves a requested name against the context list: exact match
/// first, then a `…/name` or `…name` suffix, then a substring. A
/// unique fallback match resolves; several matches is an ambiguity
/// error listing them all.
pub fn resolve_context(provider: &dyn ContextProvider, requested: &str) -> Result<String> {
    let contexts = provider.list_contexts()?;
    if contexts.iter().any(|context| context == requested) {
        return Ok(requested.to_string());
    }
    let suffix = format!("/{requested}");
    let matches: Vec<&String> = contexts
        .iter()
        .filter(|context| {
            context.ends_with(&suffix)
                || context.ends_with(requested)
                || context.contains(requested)
        })
        .collect();
    match matches.as_slice() {
        [only] => Ok((*only).clone()),
        [] => bail!("context '{requested}' not found"),
        many => {
            let listing: Vec<String> = many.iter().map(|context| format!("  {context}")).collect();
            bail!(
                "ambiguous context '{requested}', matches:\n{}",
                listing.join("\n")
            );
        }
    }
}
