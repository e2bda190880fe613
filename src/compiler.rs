//! The stylesheet compiler the finder delegates to.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::settings::OutputStyle;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompiledStylesheet {
    pub css: String,
    pub source_map: Option<String>,
}

/// The compiler's own description of why a source was rejected.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("{message}")]
pub struct CompileError {
    pub message: String,
}

impl From<String> for CompileError {
    fn from(message: String) -> Self {
        CompileError { message }
    }
}

/// Compiles one source file. Implementations must not write anything;
/// the finder owns the output files.
pub trait StylesheetCompiler: Send + Sync {
    fn compile(
        &self,
        source: &Path,
        include_paths: &[PathBuf],
        style: OutputStyle,
        source_map: bool,
    ) -> Result<CompiledStylesheet, CompileError>;

    /// Whether `compile` returns a map when one is asked for. When it does,
    /// a missing map file makes its stylesheet stale.
    fn supports_source_maps(&self) -> bool {
        false
    }
}

/// libsass, through `sass-rs`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SassCompiler;

impl StylesheetCompiler for SassCompiler {
    fn compile(
        &self,
        source: &Path,
        include_paths: &[PathBuf],
        style: OutputStyle,
        source_map: bool,
    ) -> Result<CompiledStylesheet, CompileError> {
        if source_map {
            warn!(source = %source.display(), "libsass bindings cannot emit source maps, skipping map");
        }
        let options = sass_rs::Options {
            output_style: match style {
                OutputStyle::Nested => sass_rs::OutputStyle::Nested,
                OutputStyle::Expanded => sass_rs::OutputStyle::Expanded,
                OutputStyle::Compact => sass_rs::OutputStyle::Compact,
                OutputStyle::Compressed => sass_rs::OutputStyle::Compressed,
            },
            indented_syntax: source.extension().is_some_and(|ext| ext == "sass"),
            include_paths: include_paths
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect(),
            ..Default::default()
        };
        let css = sass_rs::compile_file(source, options)?;
        Ok(CompiledStylesheet {
            css,
            source_map: None,
        })
    }
}
