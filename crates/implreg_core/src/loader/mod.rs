//! Documentation tree loading.
//!
//! # Responsibility
//! - Find fragment scripts under a generated documentation root.
//! - Replay one page load: fragments and consumers in a chosen order.
//!
//! # Invariants
//! - A fragment that fails to load or parse contributes nothing; the rest of
//!   the page load continues.
//! - Scan results are sorted so replays are deterministic.

mod scan;
mod session;

use crate::fragment::FragmentError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub use scan::{load_fragment, scan_doc_root, LoadedFragment, FRAGMENT_DIRS};
pub use session::{
    run_session, ChannelReport, FragmentFailure, LoadPlan, PageSession, SessionReport,
};

pub type LoaderResult<T> = Result<T, LoaderError>;

/// Doc tree loading errors.
#[derive(Debug)]
pub enum LoaderError {
    /// Documentation root does not exist or is not a directory.
    MissingRoot(PathBuf),
    /// Reading one file failed.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Directory traversal failed.
    Walk(walkdir::Error),
    /// File was read but is not a valid fragment.
    Fragment {
        path: PathBuf,
        source: FragmentError,
    },
}

impl Display for LoaderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRoot(path) => {
                write!(f, "documentation root not found: {}", path.display())
            }
            Self::Io { path, source } => write!(f, "failed to read `{}`: {source}", path.display()),
            Self::Walk(err) => write!(f, "failed to walk documentation tree: {err}"),
            Self::Fragment { path, source } => write!(f, "{}: {source}", path.display()),
        }
    }
}

impl Error for LoaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MissingRoot(_) => None,
            Self::Io { source, .. } => Some(source),
            Self::Walk(err) => Some(err),
            Self::Fragment { source, .. } => Some(source),
        }
    }
}

impl From<walkdir::Error> for LoaderError {
    fn from(value: walkdir::Error) -> Self {
        Self::Walk(value)
    }
}
