// src/watch/ignore.rs

//! Ignore rules: decides, per changed path, whether it may trigger a reload.
//!
//! Rules are evaluated in a fixed order and short-circuit on the first hit:
//!
//! 1. editor temp files (base name ending in `~`)
//! 2. ignored directories (segment equality, or a dir pattern matching the
//!    whole path)
//! 3. ignored file names (patterns against the base name)
//! 4. the watched-extension allow-list, when non-empty
//! 5. lines from the VCS ignore file, when enabled
//!
//! Paths are expected relative to the watch root with `/` separators, as
//! produced by [`crate::watch::path_utils::relative_str`].

use std::path::Path;

use tracing::{debug, trace};

use crate::config::IgnoreSection;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::watch::pattern::{matches, matches_any};

/// Name of the VCS ignore file read from the watch root.
pub const VCS_IGNORE_FILE: &str = ".gitignore";

/// Loaded once at startup; read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreRuleSet {
    pub dir_patterns: Vec<String>,
    pub file_patterns: Vec<String>,
    pub watched_extensions: Vec<String>,
    pub vcs_ignore_lines: Vec<String>,
}

impl IgnoreRuleSet {
    /// Build the rule set from the `[ignore]` section, reading the VCS ignore
    /// file under `root` when `git = true`.
    pub fn load(section: &IgnoreSection, root: &Path, fs: &dyn FileSystem) -> Result<Self> {
        let vcs_ignore_lines = if section.git {
            read_vcs_ignore(fs, root)?
        } else {
            Vec::new()
        };

        Ok(Self {
            dir_patterns: section.dir.clone(),
            file_patterns: section.file.clone(),
            watched_extensions: section.watched_extension.clone(),
            vcs_ignore_lines,
        })
    }
}

/// Read and parse `<root>/.gitignore`. A missing file yields no rules.
pub fn read_vcs_ignore(fs: &dyn FileSystem, root: &Path) -> Result<Vec<String>> {
    let path = root.join(VCS_IGNORE_FILE);
    if !fs.is_file(&path) {
        debug!(?path, "no VCS ignore file found");
        return Ok(Vec::new());
    }
    let contents = fs.read_to_string(&path)?;
    let lines = parse_vcs_ignore(&contents);
    debug!(?path, count = lines.len(), "read VCS ignore rules");
    Ok(lines)
}

/// Turn ignore-file contents into matcher patterns.
///
/// - blank lines and `#` comments are skipped
/// - `!` re-include lines are skipped; the matcher would read them as
///   "ignore everything except this"
/// - a line not starting with `*` gets one prepended, so `bin/app` also
///   matches `sub/bin/app`
/// - a trailing `/` (directory rule) gets a `*` appended so it covers the
///   directory's contents
pub fn parse_vcs_ignore(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| !line.starts_with('!'))
        .map(|line| {
            let mut pattern = if line.starts_with('*') {
                line.to_string()
            } else {
                format!("*{line}")
            };
            if pattern.ends_with('/') {
                pattern.push('*');
            }
            pattern
        })
        .collect()
}

/// Evaluates an [`IgnoreRuleSet`] against changed paths.
///
/// `should_ignore` is a pure function of the path and the rules.
#[derive(Debug, Clone, Default)]
pub struct IgnoreEvaluator {
    rules: IgnoreRuleSet,
}

impl IgnoreEvaluator {
    pub fn new(rules: IgnoreRuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &IgnoreRuleSet {
        &self.rules
    }

    pub fn should_ignore(&self, path: &str) -> bool {
        let base = base_name(path);

        if is_temp_file(base) {
            trace!(path, "ignored: temp file");
            return true;
        }
        if self.is_ignored_dir(path) {
            trace!(path, "ignored: directory rule");
            return true;
        }
        if matches_any(&self.rules.file_patterns, base) {
            trace!(path, "ignored: file rule");
            return true;
        }
        if !self.rules.watched_extensions.is_empty() && !self.is_watched_extension(path) {
            trace!(path, "ignored: extension not watched");
            return true;
        }
        if matches_any(&self.rules.vcs_ignore_lines, path) {
            trace!(path, "ignored: VCS ignore rule");
            return true;
        }
        false
    }

    fn is_ignored_dir(&self, path: &str) -> bool {
        let dirs = &self.rules.dir_patterns;
        if dirs.is_empty() {
            return false;
        }
        path.split('/')
            .any(|segment| dirs.iter().any(|dir| dir == segment))
            || matches_any(dirs, path)
    }

    /// An entry is either a bare extension (`.go`, compared against the
    /// path's extension) or a pattern matched against the whole path
    /// (`*.go`).
    pub fn is_watched_extension(&self, path: &str) -> bool {
        let ext = extension_of(path);
        self.rules.watched_extensions.iter().any(|entry| {
            if entry.starts_with('.') && !entry.contains(['*', '?']) {
                ext == Some(entry.as_str())
            } else {
                matches(entry, path)
            }
        })
    }
}

fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn is_temp_file(base: &str) -> bool {
    base.ends_with('~')
}

/// Extension including the leading dot, e.g. `.go`.
fn extension_of(path: &str) -> Option<&str> {
    let base = base_name(path);
    match base.rfind('.') {
        Some(0) | None => None,
        Some(idx) => Some(&base[idx..]),
    }
}
