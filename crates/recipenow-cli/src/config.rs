use std::path::Path;

use anyhow::Context;
use recipenow_core::ConfigFile;
use recipenow_core::config_file::{self, ParserConfig};
use recipenow_parsing::{ParsingConfig, ParsingConfigBuilder};

/// Resolve the config file: an explicit `--config` path must load, otherwise
/// the platform and CWD files cascade and any failure falls back to defaults.
pub fn load(explicit: Option<&Path>) -> anyhow::Result<ConfigFile> {
    match explicit {
        Some(path) => Ok(config_file::load_required(path)?),
        None => Ok(config_file::load_config()),
    }
}

/// Translate the `[parser]` table into a compiled [`ParsingConfig`].
pub fn parsing_config(file: &ConfigFile) -> anyhow::Result<ParsingConfig> {
    let Some(p) = &file.parser else {
        return Ok(ParsingConfig::default());
    };
    builder_from(p).build().context("invalid [parser] settings")
}

fn builder_from(p: &ParserConfig) -> ParsingConfigBuilder {
    let mut b = ParsingConfigBuilder::new();

    if let Some(v) = &p.ingredient_headers {
        b = b.set_ingredient_headers(v.clone());
    }
    for w in p.extra_ingredient_headers.iter().flatten() {
        b = b.add_ingredient_header(w.clone());
    }
    if let Some(v) = &p.step_headers {
        b = b.set_step_headers(v.clone());
    }
    for w in p.extra_step_headers.iter().flatten() {
        b = b.add_step_header(w.clone());
    }
    if let Some(v) = &p.title_headers {
        b = b.set_title_headers(v.clone());
    }
    for w in p.extra_title_headers.iter().flatten() {
        b = b.add_title_header(w.clone());
    }
    if let Some(v) = &p.noise_phrases {
        b = b.set_noise_phrases(v.clone());
    }
    for w in p.extra_noise_phrases.iter().flatten() {
        b = b.add_noise_phrase(w.clone());
    }
    if let Some(v) = &p.unit_words {
        b = b.set_unit_words(v.clone());
    }
    for w in p.extra_unit_words.iter().flatten() {
        b = b.add_unit_word(w.clone());
    }
    if let Some(v) = &p.imperative_verbs {
        b = b.set_imperative_verbs(v.clone());
    }
    for w in p.extra_imperative_verbs.iter().flatten() {
        b = b.add_imperative_verb(w.clone());
    }
    if let Some(v) = &p.servings_keywords {
        b = b.set_servings_keywords(v.clone());
    }
    for w in p.extra_servings_keywords.iter().flatten() {
        b = b.add_servings_keyword(w.clone());
    }
    if let Some(v) = &p.time_keywords {
        b = b.set_time_keywords(v.clone());
    }
    for w in p.extra_time_keywords.iter().flatten() {
        b = b.add_time_keyword(w.clone());
    }

    if let Some(n) = p.header_max_tokens {
        b = b.header_max_tokens(n);
    }
    if let Some(n) = p.header_max_chars {
        b = b.header_max_chars(n);
    }
    if let Some(n) = p.ingredient_gap_tolerance {
        b = b.ingredient_gap_tolerance(n);
    }
    if let Some(n) = p.title_scan_lines {
        b = b.title_scan_lines(n);
    }
    if let Some(n) = p.title_rescan_lines {
        b = b.title_rescan_lines(n);
    }
    if let Some(n) = p.title_max_chars {
        b = b.title_max_chars(n);
    }
    if let Some(n) = p.title_rescan_max_words {
        b = b.title_rescan_max_words(n);
    }
    if let Some(n) = p.title_rescan_max_chars {
        b = b.title_rescan_max_chars(n);
    }
    if let Some(re) = &p.servings_regex {
        b = b.servings_regex(re);
    }
    if let Some(re) = &p.step_prefix_regex {
        b = b.step_prefix_regex(re);
    }
    b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let cfg = parsing_config(&ConfigFile::default()).unwrap();
        assert_eq!(cfg.ingredient_gap_tolerance(), 2);
    }

    #[test]
    fn test_parser_table_applies() {
        let file: ConfigFile = toml_file(
            r#"
            [parser]
            ingredient_gap_tolerance = 5
            header_max_tokens = 4
            "#,
        );
        let cfg = parsing_config(&file).unwrap();
        assert_eq!(cfg.ingredient_gap_tolerance(), 5);
        assert_eq!(cfg.header_max_tokens(), 4);
    }

    #[test]
    fn test_title_limits_apply() {
        let file = toml_file(
            r#"
            [parser]
            title_max_chars = 40
            extra_servings_keywords = ["portions"]
            "#,
        );
        let cfg = parsing_config(&file).unwrap();
        assert_eq!(cfg.title_max_chars(), 40);
    }

    #[test]
    fn test_bad_regex_is_an_error() {
        let file = toml_file(
            r#"
            [parser]
            servings_regex = "(unclosed"
            "#,
        );
        assert!(parsing_config(&file).is_err());
    }

    fn toml_file(s: &str) -> ConfigFile {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.toml");
        std::fs::write(&path, s).unwrap();
        load(Some(&path)).unwrap()
    }
}
