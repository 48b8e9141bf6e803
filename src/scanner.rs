use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub classes: Vec<String>,
    pub files_scanned: usize,
}

impl ScanResult {
    /// Candidates reduced to bare utility names, with variant prefixes such
    /// as `lg:` or `hover:` and a leading `!` removed.
    pub fn utility_names(&self) -> BTreeSet<String> {
        self.classes
            .iter()
            .map(|class| base_utility(class).to_string())
            .filter(|class| !class.is_empty())
            .collect()
    }
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scan requires at least one pattern")]
    NoPatterns,
    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        source: globset::Error,
    },
    #[error("path not found: {}", .0.display())]
    NotFound(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanGlobOptions {
    pub base_path: PathBuf,
    pub respect_gitignore: bool,
    pub include_node_modules: bool,
}

impl Default for ScanGlobOptions {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            respect_gitignore: true,
            include_node_modules: false,
        }
    }
}

pub fn scan(paths: &[PathBuf]) -> Result<ScanResult, ScanError> {
    let mut classes = Vec::new();
    let mut seen = HashSet::new();
    let mut files_scanned = 0;

    for path in paths {
        if !path.is_file() {
            return Err(ScanError::NotFound(path.clone()));
        }
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "skipping unreadable file");
                continue;
            }
        };
        files_scanned += 1;
        for class in extract_classes(&text) {
            if seen.insert(class.clone()) {
                classes.push(class);
            }
        }
    }

    Ok(ScanResult {
        classes,
        files_scanned,
    })
}

pub fn scan_globs_with_ignore(
    patterns: &[String],
    ignore_patterns: &[String],
) -> Result<ScanResult, ScanError> {
    scan_globs_with_options(patterns, ignore_patterns, &ScanGlobOptions::default())
}

pub fn scan_globs_with_options(
    patterns: &[String],
    ignore_patterns: &[String],
    options: &ScanGlobOptions,
) -> Result<ScanResult, ScanError> {
    if patterns.is_empty() {
        return Err(ScanError::NoPatterns);
    }

    let globset = build_globset(patterns)?;
    let ignore_set = build_globset(ignore_patterns)?;
    let mut paths = Vec::new();
    let mut seen = HashSet::new();

    let mut builder = WalkBuilder::new(&options.base_path);
    builder
        .hidden(false)
        .git_ignore(options.respect_gitignore)
        .git_global(options.respect_gitignore)
        .git_exclude(options.respect_gitignore);

    for entry in builder.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => continue,
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let path = entry.path();
        let relative_path = path.strip_prefix(&options.base_path).unwrap_or(path);
        if !globset.is_match(relative_path) && !globset.is_match(path) {
            continue;
        }
        if ignore_set.is_match(relative_path) || ignore_set.is_match(path) {
            continue;
        }
        if should_skip_file(path, options) {
            continue;
        }
        if seen.insert(path.to_path_buf()) {
            paths.push(path.to_path_buf());
        }
    }

    scan(&paths)
}

pub fn build_globset(patterns: &[String]) -> Result<GlobSet, ScanError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| ScanError::InvalidGlob {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| ScanError::InvalidGlob {
        pattern: patterns.join(","),
        source,
    })
}

fn should_skip_file(path: &Path, options: &ScanGlobOptions) -> bool {
    if !options.include_node_modules
        && path
            .components()
            .any(|component| component.as_os_str() == "node_modules")
    {
        return true;
    }

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("");
    if is_common_lock_file(file_name) {
        return true;
    }

    path.extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .is_some_and(|ext| is_css_extension(&ext) || is_binary_extension(&ext))
}

fn is_css_extension(ext: &str) -> bool {
    matches!(ext, "css" | "scss" | "sass" | "less" | "styl" | "pcss")
}

fn is_binary_extension(ext: &str) -> bool {
    matches!(
        ext,
        "png"
            | "jpg"
            | "jpeg"
            | "gif"
            | "webp"
            | "ico"
            | "avif"
            | "mp4"
            | "webm"
            | "mp3"
            | "zip"
            | "gz"
            | "pdf"
            | "woff"
            | "woff2"
            | "ttf"
            | "otf"
    )
}

fn is_common_lock_file(file_name: &str) -> bool {
    matches!(
        file_name,
        "package-lock.json"
            | "pnpm-lock.yaml"
            | "yarn.lock"
            | "bun.lockb"
            | "bun.lock"
            | "Cargo.lock"
            | "composer.lock"
    )
}

/// Splits `text` on anything that cannot appear in a class token and keeps
/// the plausible candidates, in first-seen order.
pub fn extract_classes(text: &str) -> Vec<String> {
    let mut results = Vec::new();
    let mut seen = HashSet::new();

    for token in text.split(is_token_boundary) {
        let token = token.trim_end_matches([':', '.', '/']);
        if is_valid_candidate(token) && seen.insert(token) {
            results.push(token.to_string());
        }
    }

    results
}

/// `lg:hover:!neg-mt-xs1` -> `neg-mt-xs1`
pub fn base_utility(candidate: &str) -> &str {
    let base = match candidate.rfind(':') {
        Some(idx) => &candidate[idx + 1..],
        None => candidate,
    };
    base.strip_prefix('!').unwrap_or(base)
}

fn is_token_boundary(ch: char) -> bool {
    ch.is_whitespace()
        || matches!(
            ch,
            '"' | '\'' | '`' | '<' | '>' | '=' | '{' | '}' | '(' | ')' | ',' | ';' | '\\'
        )
}

fn is_valid_candidate(token: &str) -> bool {
    if token.is_empty() || token.starts_with('.') || token.starts_with('/') {
        return false;
    }
    token.chars().any(|ch| ch.is_ascii_alphabetic())
        && token.chars().all(|ch| {
            ch.is_ascii_alphanumeric()
                || matches!(ch, '-' | '_' | ':' | '.' | '/' | '!' | '[' | ']' | '%' | '#' | '@')
        })
}
