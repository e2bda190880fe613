use std::path::{Path, PathBuf};

use actix_web::http::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FinderError>;

/// Everything that can abort a discovery pass.
#[derive(Error, Debug)]
pub enum FinderError {
    /// A setting is missing or unusable.
    #[error("{setting}: {message}")]
    Configuration {
        setting: &'static str,
        message: String,
    },

    /// The stylesheet compiler rejected a source file.
    #[error("failed to compile {}: {message}", source_path.display())]
    Compilation { source_path: PathBuf, message: String },

    #[error("{}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FinderError {
    pub(crate) fn config(setting: &'static str, message: impl Into<String>) -> Self {
        FinderError::Configuration {
            setting,
            message: message.into(),
        }
    }

    pub(crate) fn fs(path: &Path, source: std::io::Error) -> Self {
        FinderError::Filesystem {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, FinderError::Configuration { .. })
    }

    pub fn is_compilation(&self) -> bool {
        matches!(self, FinderError::Compilation { .. })
    }

    pub fn is_filesystem(&self) -> bool {
        matches!(self, FinderError::Filesystem { .. })
    }
}

impl actix_web::ResponseError for FinderError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}
