//! INI-backed CLI configuration.
//!
//! Settings live in `geolocator/config.ini` under the platform config
//! directory. Every value has a default, so a missing file or section
//! just means defaults.

use std::path::PathBuf;

use ini::Ini;

use crate::error::CliError;

/// Starting point and step of the simulated walk, plus logging paths.
#[derive(Debug, Clone, PartialEq)]
pub struct CliConfig {
    /// Starting latitude of the simulated route, degrees.
    pub start_latitude: f64,
    /// Starting longitude of the simulated route, degrees.
    pub start_longitude: f64,
    /// Latitude step between simulated fixes, degrees.
    pub step_degrees: f64,
    /// Fixes generated for the simulated route.
    pub route_length: usize,
    /// Emitter period when no request constrains the interval, ms.
    pub tick_ms: u64,
    pub log_dir: String,
    pub log_file: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            // Brandenburg Gate, a scenic default walk.
            start_latitude: 52.5163,
            start_longitude: 13.3777,
            step_degrees: 0.0005,
            route_length: 120,
            tick_ms: 1000,
            log_dir: geolocator::logging::default_log_dir().to_owned(),
            log_file: geolocator::logging::default_log_file().to_owned(),
        }
    }
}

/// Path of the configuration file, if a config directory exists on
/// this platform.
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("geolocator").join("config.ini"))
}

impl CliConfig {
    /// Load from the default location, falling back to defaults when
    /// the file is absent.
    pub fn load() -> Result<Self, CliError> {
        match config_file_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load from an explicit path.
    pub fn from_file(path: &std::path::Path) -> Result<Self, CliError> {
        let ini = Ini::load_from_file(path)
            .map_err(|e| CliError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, CliError> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some("simulation")) {
            if let Some(value) = section.get("start_latitude") {
                config.start_latitude = parse(value, "simulation.start_latitude")?;
            }
            if let Some(value) = section.get("start_longitude") {
                config.start_longitude = parse(value, "simulation.start_longitude")?;
            }
            if let Some(value) = section.get("step_degrees") {
                config.step_degrees = parse(value, "simulation.step_degrees")?;
            }
            if let Some(value) = section.get("route_length") {
                config.route_length = parse(value, "simulation.route_length")?;
            }
            if let Some(value) = section.get("tick_ms") {
                config.tick_ms = parse(value, "simulation.tick_ms")?;
            }
        }

        if let Some(section) = ini.section(Some("logging")) {
            if let Some(value) = section.get("dir") {
                config.log_dir = value.to_owned();
            }
            if let Some(value) = section.get("file") {
                config.log_file = value.to_owned();
            }
        }

        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, CliError> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("invalid value '{value}' for {key}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = CliConfig::default();
        assert_eq!(config.tick_ms, 1000);
        assert_eq!(config.route_length, 120);
    }

    #[test]
    fn test_partial_file_overrides_only_named_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[simulation]").unwrap();
        writeln!(file, "tick_ms = 250").unwrap();
        writeln!(file, "[logging]").unwrap();
        writeln!(file, "dir = /tmp/geolog").unwrap();

        let config = CliConfig::from_file(&path).unwrap();
        assert_eq!(config.tick_ms, 250);
        assert_eq!(config.log_dir, "/tmp/geolog");
        assert_eq!(config.route_length, CliConfig::default().route_length);
    }

    #[test]
    fn test_invalid_number_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[simulation]\ntick_ms = fast\n").unwrap();

        let error = CliConfig::from_file(&path).unwrap_err();
        assert!(error.to_string().contains("tick_ms"));
    }
}
