use crate::error::ConfigError;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = ".sysaudit_config";

/// Defaults read from a `KEY=VALUE` file. Command-line flags take precedence.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AuditConfig {
    pub min_size_kb: Option<f64>,
    pub extension: Option<String>,
    pub exclude_prefix: Option<String>,
    pub watch_services: Vec<String>,
    pub max_events: Option<u32>,
}

impl AuditConfig {
    /// Loads `path`, or the default file in the working directory when `path`
    /// is `None`. A missing default file yields an empty config; a missing
    /// explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(p) => (p, true),
            None => (Path::new(DEFAULT_CONFIG_FILE), false),
        };

        match fs::read_to_string(path) {
            Ok(content) => {
                log::debug!("loaded config from {}", path.display());
                Self::parse(&content)
            }
            Err(e) if e.kind() == ErrorKind::NotFound && !explicit => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut map = HashMap::new();

        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((k, v)) = line.split_once('=') {
                let key = k.trim();
                let val = v.trim().trim_matches('"');
                map.insert(key, (val, idx + 1));
            } else {
                log::warn!("ignoring config line {}: no `=`", idx + 1);
            }
        }

        let invalid = |key: &str, (value, line): (&str, usize)| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            line,
        };

        let min_size_kb = match map.get("MIN_SIZE_KB") {
            Some(&(value, line)) => {
                let kb = value
                    .parse::<f64>()
                    .ok()
                    .filter(|kb| kb.is_finite() && *kb >= 0.0)
                    .ok_or_else(|| invalid("MIN_SIZE_KB", (value, line)))?;
                Some(kb)
            }
            None => None,
        };

        let max_events = match map.get("MAX_EVENTS") {
            Some(&(value, line)) => Some(
                value
                    .parse::<u32>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| invalid("MAX_EVENTS", (value, line)))?,
            ),
            None => None,
        };

        let watch_services: Vec<String> = map
            .get("WATCH_SERVICES")
            .map(|(value, _)| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(AuditConfig {
            min_size_kb,
            extension: map
                .get("EXTENSION")
                .map(|(v, _)| v.trim_start_matches('.').to_string()),
            exclude_prefix: map.get("EXCLUDE_PREFIX").map(|(v, _)| (*v).to_string()),
            watch_services,
            max_events,
        })
    }
}
