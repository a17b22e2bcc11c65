// src/error.rs
//! Error handling for the PBR shading core.
//!
//! - **Fatal**: configuration invariant violations. They abort the draw that hit
//!   them and nothing else.
//! - **API misuse**: unknown parameter names and kind mismatches on the
//!   `ParameterSet` API.
//! - **Chaining**: `context()` wraps any error with a message, like anyhow.
//!
//! Optional textures that are simply absent are *not* errors; they resolve
//! through the fallback table in `textures.rs`.

use thiserror::Error;

use crate::params::ParameterKind;
use crate::variant::VariantKey;

/// Main error type.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A parameter the resolver always populates is undefined or unloaded.
    #[error("required parameter `{0}` does not resolve to a texture")]
    MissingRequiredParameter(&'static str),

    /// Depth and water fog were both selected for the destination alpha channel.
    #[error("cannot write depth and water fog to destination alpha at the same time")]
    ConflictingAlphaWrites,

    /// The permutation registry has nothing compiled for this key.
    #[error("no compiled permutation for {key} (static combo {combo})")]
    PermutationMissing { key: VariantKey, combo: u32 },

    /// The snapshot was taken for a flashlight pass but the draw has no light state.
    #[error("flashlight snapshot drawn without projected light state")]
    MissingFlashlightState,

    /// Name lookup on a parameter set failed.
    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),

    /// Typed access against a slot of another kind.
    #[error("parameter `{name}` is {found:?}, expected {expected:?}")]
    TypeMismatch {
        name: String,
        expected: ParameterKind,
        found: ParameterKind,
    },

    /// Shading configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// Simple custom message.
    #[error("{0}")]
    Custom(String),

    /// Context chaining.
    #[error("{message}: {source}")]
    WithContext {
        message: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    #[inline]
    pub fn custom<S: Into<String>>(msg: S) -> Self {
        Self::Custom(msg.into())
    }

    #[inline]
    pub fn context<C: Into<String>>(self, context: C) -> Self {
        Self::WithContext {
            message: context.into(),
            source: Box::new(self),
        }
    }

    #[inline]
    pub fn msg(msg: &'static str) -> Self {
        Self::Custom(msg.into())
    }

    /// Configuration invariant violations: an upstream setup defect. Callers
    /// must abort the draw rather than guess.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::MissingRequiredParameter(_)
            | Error::ConflictingAlphaWrites
            | Error::PermutationMissing { .. }
            | Error::MissingFlashlightState => true,
            Error::WithContext { source, .. } => source.is_fatal(),
            _ => false,
        }
    }
}

/// Convenient `Result` alias; use `crate::Result<T>` everywhere.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_survives_context_chaining() {
        let err = Error::ConflictingAlphaWrites.context("draw aborted");
        assert!(err.is_fatal());
        assert_eq!(
            err.to_string(),
            "draw aborted: cannot write depth and water fog to destination alpha at the same time"
        );
    }

    #[test]
    fn api_misuse_is_not_fatal() {
        assert!(!Error::UnknownParameter("$nope".into()).is_fatal());
        assert!(!Error::msg("x").is_fatal());
    }
}
