use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigFileError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub parser: Option<ParserConfig>,
    pub output: Option<OutputConfig>,
}

/// Vocabulary and threshold overrides for the recipe parser.
///
/// A plain list key replaces the built-in list; the matching `extra_*` key
/// appends to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParserConfig {
    pub ingredient_headers: Option<Vec<String>>,
    pub extra_ingredient_headers: Option<Vec<String>>,
    pub step_headers: Option<Vec<String>>,
    pub extra_step_headers: Option<Vec<String>>,
    pub title_headers: Option<Vec<String>>,
    pub extra_title_headers: Option<Vec<String>>,
    pub noise_phrases: Option<Vec<String>>,
    pub extra_noise_phrases: Option<Vec<String>>,
    pub unit_words: Option<Vec<String>>,
    pub extra_unit_words: Option<Vec<String>>,
    pub imperative_verbs: Option<Vec<String>>,
    pub extra_imperative_verbs: Option<Vec<String>>,
    pub servings_keywords: Option<Vec<String>>,
    pub extra_servings_keywords: Option<Vec<String>>,
    pub time_keywords: Option<Vec<String>>,
    pub extra_time_keywords: Option<Vec<String>>,

    pub header_max_tokens: Option<usize>,
    pub header_max_chars: Option<usize>,
    pub ingredient_gap_tolerance: Option<usize>,
    pub title_scan_lines: Option<usize>,
    pub title_rescan_lines: Option<usize>,
    pub title_max_chars: Option<usize>,
    pub title_rescan_max_words: Option<usize>,
    pub title_rescan_max_chars: Option<usize>,

    pub servings_regex: Option<String>,
    pub step_prefix_regex: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub pretty: Option<bool>,
}

/// Platform config directory path: `<config_dir>/recipenow/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("recipenow").join("config.toml"))
}

/// Load config by cascading CWD `.recipenow.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".recipenow.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Load a config the user asked for explicitly; unlike [`load_from_path`]
/// a missing or malformed file is an error.
pub fn load_required(path: &Path) -> Result<ConfigFile, ConfigFileError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigFileError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

fn pick<T: Clone>(overlay: &Option<T>, base: &Option<T>) -> Option<T> {
    overlay.clone().or_else(|| base.clone())
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let bp = base.parser.unwrap_or_default();
    let op = overlay.parser.unwrap_or_default();
    let bo = base.output.unwrap_or_default();
    let oo = overlay.output.unwrap_or_default();

    ConfigFile {
        parser: Some(ParserConfig {
            ingredient_headers: pick(&op.ingredient_headers, &bp.ingredient_headers),
            extra_ingredient_headers: pick(
                &op.extra_ingredient_headers,
                &bp.extra_ingredient_headers,
            ),
            step_headers: pick(&op.step_headers, &bp.step_headers),
            extra_step_headers: pick(&op.extra_step_headers, &bp.extra_step_headers),
            title_headers: pick(&op.title_headers, &bp.title_headers),
            extra_title_headers: pick(&op.extra_title_headers, &bp.extra_title_headers),
            noise_phrases: pick(&op.noise_phrases, &bp.noise_phrases),
            extra_noise_phrases: pick(&op.extra_noise_phrases, &bp.extra_noise_phrases),
            unit_words: pick(&op.unit_words, &bp.unit_words),
            extra_unit_words: pick(&op.extra_unit_words, &bp.extra_unit_words),
            imperative_verbs: pick(&op.imperative_verbs, &bp.imperative_verbs),
            extra_imperative_verbs: pick(&op.extra_imperative_verbs, &bp.extra_imperative_verbs),
            servings_keywords: pick(&op.servings_keywords, &bp.servings_keywords),
            extra_servings_keywords: pick(
                &op.extra_servings_keywords,
                &bp.extra_servings_keywords,
            ),
            time_keywords: pick(&op.time_keywords, &bp.time_keywords),
            extra_time_keywords: pick(&op.extra_time_keywords, &bp.extra_time_keywords),
            header_max_tokens: op.header_max_tokens.or(bp.header_max_tokens),
            header_max_chars: op.header_max_chars.or(bp.header_max_chars),
            ingredient_gap_tolerance: op.ingredient_gap_tolerance.or(bp.ingredient_gap_tolerance),
            title_scan_lines: op.title_scan_lines.or(bp.title_scan_lines),
            title_rescan_lines: op.title_rescan_lines.or(bp.title_rescan_lines),
            title_max_chars: op.title_max_chars.or(bp.title_max_chars),
            title_rescan_max_words: op.title_rescan_max_words.or(bp.title_rescan_max_words),
            title_rescan_max_chars: op.title_rescan_max_chars.or(bp.title_rescan_max_chars),
            servings_regex: pick(&op.servings_regex, &bp.servings_regex),
            step_prefix_regex: pick(&op.step_prefix_regex, &bp.step_prefix_regex),
        }),
        output: Some(OutputConfig {
            pretty: oo.pretty.or(bo.pretty),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_toml() {
        let cfg: ConfigFile = toml::from_str(
            r#"
            [parser]
            extra_unit_words = ["sachet"]
            ingredient_gap_tolerance = 3
            "#,
        )
        .unwrap();
        let parser = cfg.parser.unwrap();
        assert_eq!(parser.extra_unit_words, Some(vec!["sachet".to_string()]));
        assert_eq!(parser.ingredient_gap_tolerance, Some(3));
        assert!(parser.unit_words.is_none());
        assert!(cfg.output.is_none());
    }

    #[test]
    fn test_merge_overlay_wins() {
        let base = ConfigFile {
            parser: Some(ParserConfig {
                ingredient_gap_tolerance: Some(1),
                extra_noise_phrases: Some(vec!["ad".into()]),
                ..Default::default()
            }),
            output: Some(OutputConfig { pretty: Some(true) }),
        };
        let overlay = ConfigFile {
            parser: Some(ParserConfig {
                ingredient_gap_tolerance: Some(4),
                ..Default::default()
            }),
            output: None,
        };
        let merged = merge(base, overlay);
        let parser = merged.parser.unwrap();
        assert_eq!(parser.ingredient_gap_tolerance, Some(4));
        assert_eq!(parser.extra_noise_phrases, Some(vec!["ad".to_string()]));
        assert_eq!(merged.output.unwrap().pretty, Some(true));
    }

    #[test]
    fn test_merge_title_limits_and_extra_keywords() {
        let base = ConfigFile {
            parser: Some(ParserConfig {
                title_max_chars: Some(90),
                extra_time_keywords: Some(vec!["resting".into()]),
                ..Default::default()
            }),
            output: None,
        };
        let overlay: ConfigFile = toml::from_str(
            r#"
            [parser]
            title_rescan_max_words = 5
            extra_servings_keywords = ["portions"]
            "#,
        )
        .unwrap();
        let parser = merge(base, overlay).parser.unwrap();
        assert_eq!(parser.title_max_chars, Some(90));
        assert_eq!(parser.title_rescan_max_words, Some(5));
        assert_eq!(parser.extra_time_keywords, Some(vec!["resting".to_string()]));
        assert_eq!(parser.extra_servings_keywords, Some(vec!["portions".to_string()]));
    }

    #[test]
    fn test_load_from_path_missing_is_none() {
        assert!(load_from_path(Path::new("/nonexistent/recipenow.toml")).is_none());
    }

    #[test]
    fn test_load_required_reports_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[parser\nunit_words = 3").unwrap();
        let err = load_required(&path).unwrap_err();
        assert!(matches!(err, ConfigFileError::Toml { .. }));
    }

    #[test]
    fn test_load_required_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.toml");
        std::fs::write(&path, "[output]\npretty = true\n").unwrap();
        let cfg = load_required(&path).unwrap();
        assert_eq!(cfg.output.unwrap().pretty, Some(true));
    }
}
