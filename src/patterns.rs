use std::path::Path;

use globset::{GlobBuilder, GlobMatcher};

use crate::error::{FinderError, Result};

/// The configured source patterns, each matched against the whole path
/// relative to the source root. `*` stays within one directory, `**` spans
/// any number of them.
#[derive(Debug)]
pub(crate) struct PatternSet {
    patterns: Vec<(String, GlobMatcher)>,
}

impl PatternSet {
    pub(crate) fn new(patterns: &[String]) -> Result<PatternSet> {
        let patterns = patterns
            .iter()
            .map(|pattern| -> Result<(String, GlobMatcher)> {
                let glob = GlobBuilder::new(relative(pattern))
                    .literal_separator(true)
                    .build()
                    .map_err(|e| {
                        FinderError::config("scss_compile", format!("invalid pattern {pattern:?}: {e}"))
                    })?;
                Ok((pattern.clone(), glob.compile_matcher()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(PatternSet { patterns })
    }

    pub(crate) fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Indices of the patterns selecting `rel_path`, in configured order.
    pub(crate) fn matching<'a>(&'a self, rel_path: &'a Path) -> impl Iterator<Item = usize> + 'a {
        self.patterns
            .iter()
            .enumerate()
            .filter(move |(_, (_, matcher))| matcher.is_match(rel_path))
            .map(|(i, _)| i)
    }

    pub(crate) fn first_match(&self, rel_path: &Path) -> Option<&str> {
        self.matching(rel_path)
            .next()
            .map(|i| self.patterns[i].0.as_str())
    }

    pub(crate) fn pattern(&self, index: usize) -> &str {
        &self.patterns[index].0
    }
}

/// Patterns are written relative to the root; a leading `./` or `/` means
/// the same thing.
fn relative(pattern: &str) -> &str {
    let pattern = pattern.trim();
    let pattern = pattern.strip_prefix("./").unwrap_or(pattern);
    pattern.trim_start_matches('/')
}
