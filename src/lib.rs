//! Finds Sass/SCSS sources, compiles the stale ones with libsass and hands
//! the compiled CSS to the application's static-file handling.
//!
//! The whole cache is the filesystem: a stylesheet is recompiled when its
//! output is missing or older than the source.

pub mod compiler;
pub mod error;
mod finder;
mod patterns;
pub mod serve;
pub mod settings;
pub mod staleness;
pub mod target;

pub use compiler::{CompileError, CompiledStylesheet, SassCompiler, StylesheetCompiler};
pub use error::{FinderError, Result};
pub use finder::{discover, scan, CheckLevel, CheckMessage, Discovery, ScssFinder, StaticFile};
pub use settings::{Config, OutputStyle, Settings, SettingsSource, DEFAULT_PATTERNS};
pub use target::CompilationTarget;
