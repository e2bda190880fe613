use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::settings::Config;

/// One matched source file and where its compiled output goes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompilationTarget {
    pub source: PathBuf,
    pub root: PathBuf,
    /// First configured pattern that selected the source.
    pub pattern: String,
    pub output: PathBuf,
    pub map_output: PathBuf,
}

impl CompilationTarget {
    pub fn new(source: &Path, pattern: &str, config: &Config) -> CompilationTarget {
        let output = output_path(source, &config.root, config.output_dir.as_deref());
        CompilationTarget {
            source: source.to_path_buf(),
            root: config.root.clone(),
            pattern: pattern.to_string(),
            map_output: output.with_extension("map"),
            output,
        }
    }

    /// The output path relative to the directory outputs are laid out under.
    pub fn relative_output(&self, output_base: &Path) -> PathBuf {
        match self.output.strip_prefix(output_base) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => self.output.file_name().map(PathBuf::from).unwrap_or_default(),
        }
    }
}

/// `<output_dir>/<dir relative to root>/<stem>.css`, or `<stem>.css` next
/// to the source when no output directory is set.
pub fn output_path(source: &Path, root: &Path, output_dir: Option<&Path>) -> PathBuf {
    let mut file_name = source.file_stem().map(OsString::from).unwrap_or_default();
    file_name.push(".css");

    let source_dir = source.parent().unwrap_or(Path::new(""));
    let dir = match output_dir {
        Some(output_dir) => match source_dir.strip_prefix(root) {
            Ok(rel) => output_dir.join(rel),
            Err(_) => output_dir.to_path_buf(),
        },
        None => source_dir.to_path_buf(),
    };
    dir.join(file_name)
}
