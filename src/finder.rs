//! The finder: scans the source root, recompiles stale stylesheets and
//! reports the compiled files to the application's static-file handling.
//!
//! Every public operation is one discovery pass. Settings are resolved at
//! the start of the pass and nothing is remembered between passes except
//! what the output files' timestamps record on disk.

use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use ignore::WalkBuilder;
use tracing::{debug, info, warn};

use crate::compiler::{SassCompiler, StylesheetCompiler};
use crate::error::{FinderError, Result};
use crate::patterns::PatternSet;
use crate::settings::{Config, SettingsSource};
use crate::staleness;
use crate::target::CompilationTarget;

/// Outcome of a discovery pass.
#[derive(Clone, Debug, Default)]
pub struct Discovery {
    /// Every matched source, in file-name order.
    pub targets: Vec<CompilationTarget>,
    /// Outputs written during this pass.
    pub compiled: Vec<PathBuf>,
}

/// A compiled file as the application sees it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticFile {
    /// Path relative to the output base, as it is requested and collected.
    pub path: PathBuf,
    /// Where the file is on disk.
    pub location: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckLevel {
    Error,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckMessage {
    pub level: CheckLevel,
    pub id: &'static str,
    pub message: String,
}

impl fmt::Display for CheckMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.message)
    }
}

pub struct ScssFinder {
    settings: SettingsSource,
    compiler: Box<dyn StylesheetCompiler>,
}

impl ScssFinder {
    /// A finder compiling with libsass.
    pub fn new(settings: impl Into<SettingsSource>) -> ScssFinder {
        ScssFinder::with_compiler(settings, SassCompiler)
    }

    pub fn with_compiler(
        settings: impl Into<SettingsSource>,
        compiler: impl StylesheetCompiler + 'static,
    ) -> ScssFinder {
        ScssFinder {
            settings: settings.into(),
            compiler: Box::new(compiler),
        }
    }

    /// Resolves the current settings.
    pub fn config(&self) -> Result<Config> {
        self.settings.settings()?.resolve()
    }

    pub fn discover(&self) -> Result<Discovery> {
        let config = self.config()?;
        discover(&config, self.compiler.as_ref())
    }

    /// Compiles what is stale and lists every compiled file.
    pub fn list(&self) -> Result<Vec<StaticFile>> {
        let config = self.config()?;
        let discovery = discover(&config, self.compiler.as_ref())?;
        Ok(static_files(&config, &discovery))
    }

    /// Compiles what is stale, then resolves `path` against the compiled
    /// outputs and the static roots. Returns the first existing file.
    pub fn find(&self, path: impl AsRef<Path>) -> Result<Option<PathBuf>> {
        let config = self.config()?;
        let discovery = discover(&config, self.compiler.as_ref())?;
        Ok(locate(&config, &discovery, path.as_ref(), false).into_iter().next())
    }

    /// Like [`ScssFinder::find`], returning every location holding `path`.
    pub fn find_all(&self, path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let config = self.config()?;
        let discovery = discover(&config, self.compiler.as_ref())?;
        Ok(locate(&config, &discovery, path.as_ref(), true))
    }

    /// Compiles what is stale and copies every compiled file (and its map,
    /// when maps are enabled) into `destination`, keeping relative paths.
    pub fn collect(&self, destination: &Path) -> Result<Vec<PathBuf>> {
        let config = self.config()?;
        let discovery = discover(&config, self.compiler.as_ref())?;

        let mut written = Vec::new();
        for target in &discovery.targets {
            let rel = target.relative_output(config.output_base());
            let dest = destination.join(&rel);
            copy_file(&target.output, &dest)?;
            written.push(dest);

            if config.source_map && target.map_output.is_file() {
                let dest = destination.join(rel.with_extension("map"));
                copy_file(&target.map_output, &dest)?;
                written.push(dest);
            }
        }
        info!(destination = %destination.display(), files = written.len(), "collected compiled stylesheets");
        Ok(written)
    }

    /// Reports configuration problems without compiling anything.
    pub fn check(&self) -> Result<Vec<CheckMessage>> {
        let config = self.config()?;
        let patterns = PatternSet::new(&config.patterns)?;
        let sources = source_files(&config.root)?;

        let mut matched = vec![false; patterns.len()];
        for rel in &sources {
            for i in patterns.matching(rel) {
                matched[i] = true;
            }
        }

        let mut messages = Vec::new();
        if config.patterns_configured {
            for (i, _) in matched.iter().enumerate().filter(|(_, m)| !**m) {
                messages.push(CheckMessage {
                    level: CheckLevel::Error,
                    id: "sass.E001",
                    message: format!(
                        "{} returned no files in {}",
                        patterns.pattern(i),
                        config.root.display()
                    ),
                });
            }
        } else if !matched.contains(&true) {
            // Defaults are checked as one set.
            messages.push(CheckMessage {
                level: CheckLevel::Error,
                id: "sass.E001",
                message: format!("no stylesheet sources in {}", config.root.display()),
            });
        }

        let output_base = config.output_base();
        if !config.static_roots.is_empty()
            && !config.static_roots.iter().any(|root| output_base.starts_with(root))
        {
            messages.push(CheckMessage {
                level: CheckLevel::Warning,
                id: "sass.W001",
                message: format!(
                    "{} is not inside any of the static file directories",
                    output_base.display()
                ),
            });
        }

        for message in &messages {
            warn!("{message}");
        }
        Ok(messages)
    }
}

impl fmt::Debug for ScssFinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScssFinder")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// One discovery pass: match sources, recompile the stale ones.
///
/// Stops at the first compile error. Nothing is written for the failing
/// source; outputs compiled earlier in the pass stay on disk.
pub fn discover(config: &Config, compiler: &dyn StylesheetCompiler) -> Result<Discovery> {
    let targets = scan(config)?;

    let mut compiled = Vec::new();
    for target in &targets {
        let map_missing = config.source_map
            && compiler.supports_source_maps()
            && !target.map_output.is_file();
        if !map_missing && !staleness::needs_compile(&target.source, &target.output)? {
            debug!(output = %target.output.display(), "stylesheet is fresh");
            continue;
        }
        compile_target(config, compiler, target)?;
        compiled.push(target.output.clone());
    }

    info!(
        root = %config.root.display(),
        targets = targets.len(),
        compiled = compiled.len(),
        "stylesheet discovery finished"
    );
    Ok(Discovery { targets, compiled })
}

/// Matches the source tree against the configured patterns.
///
/// Two sources compiling to the same output (`site.scss` next to
/// `site.sass`) are a configuration error.
pub fn scan(config: &Config) -> Result<Vec<CompilationTarget>> {
    let patterns = PatternSet::new(&config.patterns)?;

    let mut targets = Vec::new();
    let mut outputs: HashMap<PathBuf, PathBuf> = HashMap::new();
    for rel in source_files(&config.root)? {
        let Some(pattern) = patterns.first_match(&rel) else {
            continue;
        };
        let target = CompilationTarget::new(&config.root.join(&rel), pattern, config);
        if let Some(other) = outputs.insert(target.output.clone(), target.source.clone()) {
            return Err(FinderError::config(
                "scss_compile",
                format!(
                    "{} and {} both compile to {}",
                    other.display(),
                    target.source.display(),
                    target.output.display()
                ),
            ));
        }
        debug!(source = %target.source.display(), pattern, "matched stylesheet source");
        targets.push(target);
    }
    Ok(targets)
}

fn compile_target(
    config: &Config,
    compiler: &dyn StylesheetCompiler,
    target: &CompilationTarget,
) -> Result<()> {
    let compiled = compiler
        .compile(
            &target.source,
            &config.include_paths,
            config.style,
            config.source_map,
        )
        .map_err(|e| FinderError::Compilation {
            source_path: target.source.clone(),
            message: e.message,
        })?;

    write_file(&target.output, compiled.css.as_bytes())?;
    if config.source_map {
        if let Some(map) = compiled.source_map {
            write_file(&target.map_output, map.as_bytes())?;
        }
    }
    info!(
        source = %target.source.display(),
        output = %target.output.display(),
        "compiled stylesheet"
    );
    Ok(())
}

/// Regular files under `root`, relative to it, in file-name order.
fn source_files(root: &Path) -> Result<Vec<PathBuf>> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(FinderError::config(
                "scss_root",
                format!("{} is not a directory", root.display()),
            ))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(FinderError::config(
                "scss_root",
                format!("{} does not exist", root.display()),
            ))
        }
        Err(e) => return Err(FinderError::fs(root, e)),
    }

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| walk_error(root, e))?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        files.push(rel.to_path_buf());
    }
    Ok(files)
}

/// Pins a walk error on the entry that failed, when the walker knows it.
fn walk_error(root: &Path, err: ignore::Error) -> FinderError {
    match err {
        ignore::Error::WithPath { path, err } => {
            FinderError::fs(&path, walk_io_error(*err))
        }
        ignore::Error::WithDepth { err, .. } => walk_error(root, *err),
        err => FinderError::fs(root, walk_io_error(err)),
    }
}

fn walk_io_error(err: ignore::Error) -> std::io::Error {
    match err.io_error() {
        Some(io) => std::io::Error::new(io.kind(), io.to_string()),
        None => std::io::Error::other(err),
    }
}

fn static_files(config: &Config, discovery: &Discovery) -> Vec<StaticFile> {
    discovery
        .targets
        .iter()
        .map(|target| StaticFile {
            path: target.relative_output(config.output_base()),
            location: target.output.clone(),
        })
        .collect()
}

/// Resolves a requested relative path against this pass's compiled outputs,
/// then the static roots. Anything else under the output base, sources
/// included, never resolves; neither do paths that could leave the roots.
fn locate(config: &Config, discovery: &Discovery, requested: &Path, all: bool) -> Vec<PathBuf> {
    let requested: PathBuf = requested
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let is_plain = requested
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !is_plain || requested.as_os_str().is_empty() {
        return Vec::new();
    }

    let compiled = discovery
        .targets
        .iter()
        .find(|target| target.relative_output(config.output_base()) == requested)
        .map(|target| target.output.clone())
        .filter(|output| output.is_file());
    let from_static = config
        .static_roots
        .iter()
        .map(|root| root.join(&requested))
        .filter(|candidate| candidate.is_file());

    let mut found: Vec<PathBuf> = Vec::new();
    for candidate in compiled.into_iter().chain(from_static) {
        if !found.contains(&candidate) {
            found.push(candidate);
            if !all {
                break;
            }
        }
    }
    found
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| FinderError::fs(dir, e))?;
    }
    std::fs::write(path, contents).map_err(|e| FinderError::fs(path, e))
}

fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(dir) = to.parent() {
        std::fs::create_dir_all(dir).map_err(|e| FinderError::fs(dir, e))?;
    }
    std::fs::copy(from, to)
        .map(|_| ())
        .map_err(|e| FinderError::fs(from, e))
}
