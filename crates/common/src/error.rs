//! Common error types.

use thiserror::Error;

/// Error type for composition and flow layout.
///
/// Every structural problem with a request is reported before any pixel is
/// painted, so a failed call never produces partial output.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GfxError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Missing layers: required but absent {missing:?}, present but not required {unexpected:?}")]
    MissingLayer {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("Layer '{child}' references missing parent '{parent}'")]
    MissingParent { child: String, parent: String },

    #[error("Ambiguous z-order: parent '{parent}' is referenced by {children:?}")]
    AmbiguousZOrder {
        parent: String,
        children: Vec<String>,
    },

    #[error("Cyclic layer reference among {0:?}")]
    CyclicReference(Vec<String>),

    #[error("Invalid alignment token: '{0}'")]
    InvalidAlignmentToken(String),

    #[error("Invalid opacity: {0}")]
    InvalidOpacity(String),

    #[error("Unknown blend mode: '{0}'")]
    UnknownBlendMode(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Codec error: {0}")]
    Codec(String),
}

pub type GfxResult<T> = Result<T, GfxError>;

impl GfxError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn empty_input(msg: impl Into<String>) -> Self {
        Self::EmptyInput(msg.into())
    }

    pub fn invalid_opacity(msg: impl Into<String>) -> Self {
        Self::InvalidOpacity(msg.into())
    }

    pub fn codec(msg: impl Into<String>) -> Self {
        Self::Codec(msg.into())
    }

    /// Whether the error describes the shape of the layer graph rather than
    /// a bad scalar parameter.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::MissingLayer { .. }
                | Self::MissingParent { .. }
                | Self::AmbiguousZOrder { .. }
                | Self::CyclicReference(_)
        )
    }
}
