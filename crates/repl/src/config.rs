//! REPL configuration.
//!
//! An optional `schemy.toml` in the working directory tweaks the
//! interactive front end:
//!
//! ```toml
//! prompt = "λ> "
//! banner = false
//! load_init_script = true
//! ```

use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReplConfig {
    /// Prompt printed before each expression.
    pub prompt: String,
    /// Print the version banner when the REPL starts.
    pub banner: bool,
    /// Evaluate `./.init.ss` before entering file or REPL mode.
    pub load_init_script: bool,
}

impl Default for ReplConfig {
    fn default() -> Self {
        ReplConfig {
            prompt: "Schemy> ".to_string(),
            banner: true,
            load_init_script: true,
        }
    }
}

impl ReplConfig {
    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<ReplConfig, String> {
        if !path.exists() {
            return Ok(ReplConfig::default());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        toml::from_str(&text).map_err(|e| format!("invalid config {}: {e}", path.display()))
    }
}
