//! Persisted user configuration.
//!
//! Stored as JSON in the user's home directory. Missing keys fall back to
//! defaults so older files keep loading after new keys are added; an
//! unreadable or unparsable file falls back to defaults entirely.

use std::fs;
use std::path::{Path, PathBuf};

use engine_logging::{engine_error, engine_info, engine_warn};
use lector_core::Config;

const CONFIG_FILENAME: &str = ".lector_config.json";

fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_FILENAME))
}

// An empty destination means "never configured"; point it at the user's
// Downloads directory like the first-run default.
fn fill_destination(config: &mut Config) {
    if config.destination_dir.as_os_str().is_empty() {
        if let Some(downloads) = dirs::download_dir().or_else(dirs::home_dir) {
            config.destination_dir = downloads;
        }
    }
}

/// Loads the user configuration, creating the file from defaults on first
/// use.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        engine_warn!("no home directory found; using default configuration");
        let mut config = Config::default();
        fill_destination(&mut config);
        return config;
    };
    load_from(&path)
}

fn load_from(path: &Path) -> Config {
    let mut config = match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(err) => {
                engine_warn!("could not parse {}: {err}; using defaults", path.display());
                Config::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            let mut config = Config::default();
            fill_destination(&mut config);
            save_to(path, &config);
            return config;
        }
        Err(err) => {
            engine_warn!("could not read {}: {err}; using defaults", path.display());
            Config::default()
        }
    };
    fill_destination(&mut config);
    config
}

/// Persists the active configuration.
pub fn save(config: &Config) {
    if let Some(path) = config_path() {
        save_to(&path, config);
    }
}

fn save_to(path: &Path, config: &Config) {
    let content = match serde_json::to_string_pretty(config) {
        Ok(content) => content,
        Err(err) => {
            engine_error!("could not serialize configuration: {err}");
            return;
        }
    };
    if let Err(err) = fs::write(path, content) {
        engine_error!("could not write {}: {err}", path.display());
    } else {
        engine_info!("configuration saved to {}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lector_core::OutputMode;
    use tempfile::TempDir;

    #[test]
    fn first_load_creates_the_file_with_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);

        let config = load_from(&path);
        assert_eq!(config.dpi, 300);
        assert!(path.exists());

        // The created file loads back to the same snapshot.
        assert_eq!(load_from(&path), config);
    }

    #[test]
    fn roundtrips_a_saved_configuration() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);

        let config = Config {
            language: "eng".to_string(),
            dpi: 600,
            output_mode: OutputMode::Text,
            destination_dir: temp.path().join("out"),
            open_destination_on_finish: false,
        };
        save_to(&path, &config);
        assert_eq!(load_from(&path), config);
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);
        std::fs::write(&path, r#"{ "language": "eng" }"#).unwrap();

        let config = load_from(&path);
        assert_eq!(config.language, "eng");
        assert_eq!(config.dpi, 300);
        assert_eq!(config.output_mode, OutputMode::Both);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "{ not json").unwrap();

        let config = load_from(&path);
        assert_eq!(config.language, "spa+eng");
        assert_eq!(config.dpi, 300);
    }
}
