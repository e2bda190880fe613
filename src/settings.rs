//! Finder settings as the host application configures them.
//!
//! `Settings` mirrors the keys an application puts in its TOML settings
//! file. It is resolved into a `Config` at the start of every discovery
//! pass, which is where missing or malformed values are rejected.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use serde_derive::Deserialize;

use crate::error::{FinderError, Result};

/// Every stylesheet source anywhere under the root, except Sass partials.
pub const DEFAULT_PATTERNS: &[&str] = &["**/[!_]*.scss", "**/[!_]*.sass"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    #[default]
    Nested,
    Expanded,
    Compact,
    Compressed,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory scanned for stylesheet sources. Required.
    pub scss_root: Option<PathBuf>,
    /// Glob patterns relative to `scss_root`.
    pub scss_compile: Option<Vec<String>>,
    pub scss_include_paths: Vec<PathBuf>,
    pub css_style: Option<OutputStyle>,
    /// Also write a `.map` file next to each stylesheet.
    pub css_map: bool,
    /// Where compiled files go. Alongside the sources when unset.
    pub css_compile_dir: Option<PathBuf>,
    /// Roots the application serves and collects static files from.
    pub staticfiles_dirs: Vec<PathBuf>,
}

/// Settings after validation, as used by a single discovery pass.
#[derive(Clone, Debug)]
pub struct Config {
    pub root: PathBuf,
    pub patterns: Vec<String>,
    /// False when `patterns` are the defaults.
    pub patterns_configured: bool,
    pub include_paths: Vec<PathBuf>,
    pub style: OutputStyle,
    pub source_map: bool,
    pub output_dir: Option<PathBuf>,
    pub static_roots: Vec<PathBuf>,
}

impl Config {
    /// Directory the output paths are laid out under.
    pub fn output_base(&self) -> &Path {
        self.output_dir.as_deref().unwrap_or(&self.root)
    }
}

impl Settings {
    pub fn new(scss_root: impl Into<PathBuf>) -> Settings {
        Settings {
            scss_root: Some(scss_root.into()),
            ..Settings::default()
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Settings> {
        toml::from_str(text).map_err(|e| FinderError::config("settings", e.to_string()))
    }

    /// Reads a settings file. Relative paths inside it are taken relative
    /// to the file's own directory.
    pub fn load(path: &Path) -> Result<Settings> {
        let text = std::fs::read_to_string(path).map_err(|e| FinderError::fs(path, e))?;
        let settings = Settings::from_toml_str(&text)?;
        Ok(match path.parent() {
            Some(base) => settings.rebased(base),
            None => settings,
        })
    }

    fn rebased(self, base: &Path) -> Settings {
        let rebase = |p: PathBuf| if p.is_relative() { base.join(p) } else { p };
        Settings {
            scss_root: self.scss_root.map(rebase),
            scss_include_paths: self.scss_include_paths.into_iter().map(rebase).collect(),
            css_compile_dir: self.css_compile_dir.map(rebase),
            staticfiles_dirs: self.staticfiles_dirs.into_iter().map(rebase).collect(),
            ..self
        }
    }

    /// Validates the settings without touching the filesystem.
    pub fn resolve(&self) -> Result<Config> {
        let root = match &self.scss_root {
            Some(root) if !root.as_os_str().is_empty() => root.clone(),
            _ => return Err(FinderError::config("scss_root", "setting is required")),
        };

        let patterns = match &self.scss_compile {
            Some(patterns) => patterns.clone(),
            None => DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect(),
        };
        if patterns.iter().any(|p| p.trim().is_empty()) {
            return Err(FinderError::config("scss_compile", "patterns must not be empty"));
        }

        Ok(Config {
            root,
            patterns,
            patterns_configured: self.scss_compile.is_some(),
            include_paths: self.scss_include_paths.clone(),
            style: self.css_style.unwrap_or_default(),
            source_map: self.css_map,
            output_dir: self.css_compile_dir.clone(),
            static_roots: self.staticfiles_dirs.clone(),
        })
    }
}

/// Where a finder gets its settings from on each pass.
#[derive(Clone, Debug)]
pub enum SettingsSource {
    Fixed(Settings),
    /// Re-read on every pass, so edits apply without a restart.
    File(PathBuf),
}

impl SettingsSource {
    pub fn settings(&self) -> Result<Cow<'_, Settings>> {
        match self {
            SettingsSource::Fixed(settings) => Ok(Cow::Borrowed(settings)),
            SettingsSource::File(path) => Settings::load(path).map(Cow::Owned),
        }
    }
}

impl From<Settings> for SettingsSource {
    fn from(settings: Settings) -> Self {
        SettingsSource::Fixed(settings)
    }
}
