//! stitchoptix configuration.
//!
//! Loaded from `~/.stitchoptix/config.toml`. A missing file means defaults.
//!
//! The minimum stitch length is resolved through a chain:
//!
//! 1. `--min-length <n>`: explicit per-command override
//! 2. `STITCHOPTIX_MIN_LENGTH` env var
//! 3. `min-length` in the config file
//! 4. the built-in default of 15 (1.5 mm)

use std::{env, fs, io, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::preview::PreviewOptions;
use crate::reduce::DEFAULT_MIN_LENGTH;

/// Environment variable overriding the configured minimum length.
pub const MIN_LENGTH_ENV: &str = "STITCHOPTIX_MIN_LENGTH";

/// Smallest usable preview, padding included.
const MIN_PREVIEW_SIDE: u32 = 32;

/// stitchoptix configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Config {
    /// Shortest stitch to keep, in tenths of a millimeter.
    pub min_length: u32,

    /// Whether to render a PNG preview next to each output.
    pub preview: bool,

    /// Longest side of preview images, in pixels.
    pub preview_max_side: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_LENGTH,
            preview: true,
            preview_max_side: PreviewOptions::default().max_side,
        }
    }
}

impl Config {
    /// Load config from `~/.stitchoptix/config.toml`.
    /// Returns defaults if the home directory or the file is missing.
    pub fn load() -> Result<Self, String> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from `path`, falling back to defaults if it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };

        let config: Self = toml::from_str(&contents)
            .map_err(|e| format!("invalid config at {}: {e}", path.display()))?;

        if config.preview_max_side < MIN_PREVIEW_SIDE {
            return Err(format!(
                "preview-max-side must be at least {MIN_PREVIEW_SIDE} pixels in {}",
                path.display()
            ));
        }

        Ok(config)
    }

    /// The config file path: `~/.stitchoptix/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".stitchoptix").join("config.toml"))
    }

    pub fn preview_options(&self) -> PreviewOptions {
        PreviewOptions {
            max_side: self.preview_max_side,
        }
    }

    /// Resolve the minimum stitch length: flag, then env var, then config.
    pub fn resolve_min_length(&self, explicit: Option<u32>) -> Result<u32, String> {
        self.resolve_min_length_with(explicit, env::var(MIN_LENGTH_ENV).ok())
    }

    fn resolve_min_length_with(
        &self,
        explicit: Option<u32>,
        from_env: Option<String>,
    ) -> Result<u32, String> {
        // 1. Explicit --min-length flag.
        if let Some(n) = explicit {
            return Ok(n);
        }

        // 2. Environment variable.
        if let Some(raw) = from_env
            && !raw.trim().is_empty()
        {
            return raw.trim().parse().map_err(|e| {
                format!("{MIN_LENGTH_ENV} must be a whole number of tenths of a millimeter: {e}")
            });
        }

        // 3. Config file, which already holds the default when unset.
        Ok(self.min_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.min_length, 15);
        assert!(config.preview);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "min-length = 20\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.min_length, 20);
        assert!(config.preview);
        assert_eq!(config.preview_max_side, 1024);
    }

    #[test]
    fn full_file_is_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "min-length = 8\npreview = false\npreview-max-side = 512\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(
            config,
            Config {
                min_length: 8,
                preview: false,
                preview_max_side: 512,
            }
        );
        assert_eq!(config.preview_options().max_side, 512);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "minimum = 3\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.contains("invalid config"));
    }

    #[test]
    fn tiny_preview_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "preview-max-side = 5\n").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn explicit_wins() {
        let config = Config::default();
        let n = config
            .resolve_min_length_with(Some(30), Some("40".into()))
            .unwrap();
        assert_eq!(n, 30);
    }

    #[test]
    fn env_beats_config() {
        let config = Config {
            min_length: 12,
            ..Config::default()
        };
        assert_eq!(
            config.resolve_min_length_with(None, Some(" 40 ".into())),
            Ok(40)
        );
        assert_eq!(config.resolve_min_length_with(None, Some(String::new())), Ok(12));
        assert_eq!(config.resolve_min_length_with(None, None), Ok(12));
    }

    #[test]
    fn invalid_env_is_an_error() {
        let err = Config::default()
            .resolve_min_length_with(None, Some("1.5mm".into()))
            .unwrap_err();
        assert!(err.contains(MIN_LENGTH_ENV));
    }
}
