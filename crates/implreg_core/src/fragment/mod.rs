//! Generated documentation fragment scripts.
//!
//! # Responsibility
//! - Recognize the self-registering script wrapper around one payload.
//! - Decode the payload into the model type of its channel.
//! - Emit the same wrapper for a map, as a documentation generator would.
//!
//! # Invariants
//! - Payload text is never interpreted beyond its JSON structure.
//! - Rendering a parsed fragment reproduces the generated script.
//! - The declared variable, the registration function and the pending global
//!   must all name the same channel.

mod script;

use crate::model::{Channel, ImplementorMap, TypeImplMap};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use script::{parse_fragment, render_fragment};

pub type FragmentResult<T> = Result<T, FragmentError>;

/// One decoded fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Implementors(ImplementorMap),
    TypeImpls(TypeImplMap),
}

impl Fragment {
    /// Parses one fragment script.
    pub fn parse(script: &str) -> FragmentResult<Self> {
        parse_fragment(script)
    }

    pub fn channel(&self) -> Channel {
        match self {
            Self::Implementors(_) => Channel::Implementors,
            Self::TypeImpls(_) => Channel::TypeImpls,
        }
    }

    /// Sorted library names carried by this fragment.
    pub fn library_names(&self) -> Vec<&str> {
        match self {
            Self::Implementors(map) => map.library_names(),
            Self::TypeImpls(map) => map.library_names(),
        }
    }

    pub fn entry_count(&self) -> usize {
        match self {
            Self::Implementors(map) => map.entry_count(),
            Self::TypeImpls(map) => map.entry_count(),
        }
    }

    /// Renders this fragment back to its self-registering script form.
    pub fn to_script(&self) -> FragmentResult<String> {
        render_fragment(self)
    }
}

/// Fragment recognition and decoding errors.
#[derive(Debug)]
pub enum FragmentError {
    /// Script does not have the expected wrapper; names the missing part.
    UnrecognizedScript(&'static str),
    /// Declared variable is not a known channel.
    UnknownChannel(String),
    /// Wrapper names disagree with the declared channel.
    ChannelMismatch {
        channel: Channel,
        expected: String,
        found: String,
    },
    /// Payload is not valid JSON of the expected shape.
    InvalidPayload(serde_json::Error),
}

impl Display for FragmentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnrecognizedScript(part) => {
                write!(f, "unrecognized fragment script: missing {part}")
            }
            Self::UnknownChannel(value) => write!(f, "unknown fragment channel `{value}`"),
            Self::ChannelMismatch {
                channel,
                expected,
                found,
            } => write!(
                f,
                "fragment for channel `{channel}` expected `{expected}`, found `{found}`"
            ),
            Self::InvalidPayload(err) => write!(f, "invalid fragment payload: {err}"),
        }
    }
}

impl Error for FragmentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidPayload(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for FragmentError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidPayload(value)
    }
}
