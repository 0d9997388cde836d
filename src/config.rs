use lazy_static::lazy_static;
use parking_lot::RwLock;
use std::env;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::rfb::h264::MAX_CONTEXTS;

lazy_static! {
    static ref CONFIG: RwLock<Config> = RwLock::new(Config::load());
}

const CONFIG_PATHS: [&str; 2] = ["./rfbdecode.toml", "./config.toml"];

/// Tunables for the tile decoders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Upper bound on live H.264 decode contexts, clamped to `1..=MAX_CONTEXTS`
    pub max_contexts: usize,
    /// Ask hardware sessions to favour latency over throughput
    pub optimize_for_latency: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_contexts: MAX_CONTEXTS,
            optimize_for_latency: true,
        }
    }
}

impl Config {
    /// Builds the configuration from defaults, then the environment, then config files.
    pub fn load() -> Self {
        let mut config = Config::default();

        if let Ok(value) = env::var("RFBDECODE_MAX_CONTEXTS") {
            config.apply("max_contexts", &value);
        }
        if let Ok(value) = env::var("RFBDECODE_LOW_LATENCY") {
            config.apply("optimize_for_latency", &value);
        }

        for path in &CONFIG_PATHS {
            if let Ok(mut file) = File::open(path) {
                let mut content = String::new();
                if file.read_to_string(&mut content).is_ok() {
                    config.apply_file(&content);
                }
            }
        }

        config
    }

    /// Applies `key = value` lines, ignoring comments and unknown keys.
    pub fn apply_file(&mut self, content: &str) {
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                let value = value.trim().trim_matches('"').trim_matches('\'');
                self.apply(key.trim(), value);
            }
        }
    }

    fn apply(&mut self, key: &str, value: &str) {
        match key {
            "max_contexts" => match value.trim().parse::<usize>() {
                Ok(n) => self.max_contexts = n.clamp(1, MAX_CONTEXTS),
                Err(e) => log::warn!("ignoring max_contexts {:?}: {}", value, e),
            },
            "optimize_for_latency" => match value.trim() {
                "1" | "true" | "yes" | "on" => self.optimize_for_latency = true,
                "0" | "false" | "no" | "off" => self.optimize_for_latency = false,
                other => log::warn!("ignoring optimize_for_latency {:?}", other),
            },
            _ => {}
        }
    }

    /// Re-reads the environment and config files into the process-wide configuration.
    pub fn reload() {
        let new_config = Config::load();
        *CONFIG.write() = new_config;
    }
}

/// Returns a snapshot of the process-wide configuration
pub fn current() -> Config {
    CONFIG.read().clone()
}

/// Creates a default config template file if it doesn't exist
pub fn create_default_config_template<P: AsRef<Path>>(path: P) -> std::io::Result<()> {
    if !path.as_ref().exists() {
        std::fs::write(path, TEMPLATE)?;
    }
    Ok(())
}

pub(crate) const TEMPLATE: &str = r#"# rfbdecode configuration
# Copy this file to 'rfbdecode.toml' and adjust the values.

# Maximum number of live H.264 decode contexts (1-64)
max_contexts = 64

# Request low-latency decoding from hardware sessions
optimize_for_latency = true
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_contexts, 64);
        assert!(config.optimize_for_latency);
    }

    #[test]
    fn test_apply_file() {
        let mut config = Config::default();
        config.apply_file("# comment\nmax_contexts = 8\noptimize_for_latency = \"false\"\nunknown = 1\n");
        assert_eq!(
            config,
            Config {
                max_contexts: 8,
                optimize_for_latency: false,
            }
        );
    }

    #[test]
    fn test_max_contexts_is_clamped() {
        let mut config = Config::default();
        config.apply_file("max_contexts = 1000");
        assert_eq!(config.max_contexts, MAX_CONTEXTS);
        config.apply_file("max_contexts = 0");
        assert_eq!(config.max_contexts, 1);
        config.apply_file("max_contexts = lots");
        assert_eq!(config.max_contexts, 1);
    }

    #[test]
    fn test_template_parses_to_defaults() {
        let mut config = Config {
            max_contexts: 3,
            optimize_for_latency: false,
        };
        config.apply_file(TEMPLATE);
        assert_eq!(config, Config::default());
    }
}
