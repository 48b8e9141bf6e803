use crate::fluid::{FontSizeRange, Keep, SizeRange, ViewportRange};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "fluidsize.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FluidOptions {
    /// Inserted between the utility token and the size name, e.g. `p-{prefix}-xs1`.
    pub prefix: String,
    pub view_min: f64,
    pub view_max: f64,
    pub font_min: f64,
    pub font_max: f64,
    pub font_min_keep: bool,
    pub font_max_keep: bool,
    pub space_min_keep: bool,
    pub space_max_keep: bool,
    pub font_sizes: BTreeMap<String, FontSizeRange>,
    pub space_sizes: BTreeMap<String, SizeRange>,
}

impl Default for FluidOptions {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            view_min: 320.0,
            view_max: 1920.0,
            font_min: 12.0,
            font_max: 16.0,
            font_min_keep: false,
            font_max_keep: false,
            space_min_keep: false,
            space_max_keep: false,
            font_sizes: BTreeMap::new(),
            space_sizes: BTreeMap::new(),
        }
    }
}

impl FluidOptions {
    pub fn viewport(&self) -> ViewportRange {
        ViewportRange::new(self.view_min, self.view_max)
    }

    pub fn font_keep(&self) -> Keep {
        Keep {
            min: self.font_min_keep,
            max: self.font_max_keep,
        }
    }

    pub fn space_keep(&self) -> Keep {
        Keep {
            min: self.space_min_keep,
            max: self.space_max_keep,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to parse config {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub fn load(path: &Path) -> Result<FluidOptions, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(path, &text)
}

fn parse(path: &Path, text: &str) -> Result<FluidOptions, ConfigError> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    } else {
        toml::from_str(text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, FluidOptions, load};
    use crate::fluid::SizeRange;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn defaults_when_file_is_empty() {
        let path = temp_path("fluidsize_config_default", "toml");
        let _ = fs::write(&path, "");
        let options = load(&path).expect("config should parse");
        assert_eq!(options, FluidOptions::default());
        assert_eq!(options.view_min, 320.0);
        assert_eq!(options.view_max, 1920.0);
        assert_eq!(options.font_min, 12.0);
        assert_eq!(options.font_max, 16.0);
        assert!(options.prefix.is_empty());
        assert!(options.font_sizes.is_empty());
        assert!(options.space_sizes.is_empty());
    }

    #[test]
    fn loads_toml_tables() {
        let path = temp_path("fluidsize_config_toml", "toml");
        let _ = fs::write(
            &path,
            r#"
prefix = "fl"
viewMin = 375
spaceMaxKeep = true

[fontSizes.smol]
min = 0.625
max = 0.7
lineHeight = 1

[fontSizes.base]
min = 1
max = 1
lh = 1.6

[spaceSizes.chonk]
min = 100
max = 200
minKeep = false
"#,
        );
        let options = load(&path).expect("config should parse");

        assert_eq!(options.prefix, "fl");
        assert_eq!(options.view_min, 375.0);
        assert_eq!(options.view_max, 1920.0);
        assert!(options.space_max_keep);
        assert!(!options.space_min_keep);
        assert_eq!(options.font_sizes["smol"].line_height, Some(1.0));
        assert_eq!(options.font_sizes["base"].line_height, Some(1.6));
        assert_eq!(
            options.space_sizes["chonk"],
            SizeRange {
                min_keep: Some(false),
                ..SizeRange::new(100.0, 200.0)
            }
        );
    }

    #[test]
    fn loads_json_by_extension() {
        let path = temp_path("fluidsize_config_json", "json");
        let _ = fs::write(
            &path,
            r#"{ "viewMax": 1440, "spaceSizes": { "megachonk": { "min": 120, "max": 320 } } }"#,
        );
        let options = load(&path).expect("config should parse");

        assert_eq!(options.view_max, 1440.0);
        assert_eq!(
            options.space_sizes["megachonk"],
            SizeRange::new(120.0, 320.0)
        );
    }

    #[test]
    fn reports_parse_errors_with_path() {
        let path = temp_path("fluidsize_config_invalid", "toml");
        let _ = fs::write(&path, "viewMin = \"wide\"");
        let err = load(&path).expect_err("config should not parse");
        assert!(matches!(err, ConfigError::Toml { .. }));
        assert!(err.to_string().contains(&path.display().to_string()));
    }

    #[test]
    fn reports_missing_file() {
        let path = temp_path("fluidsize_config_missing", "toml");
        let err = load(&path).expect_err("missing config should fail");
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    fn temp_path(prefix: &str, ext: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        std::env::temp_dir().join(format!("{}_{}.{}", prefix, nanos, ext))
    }
}
