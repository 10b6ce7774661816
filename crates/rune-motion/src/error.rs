//! Error types for the animation scheduler.

use thiserror::Error;

use crate::animator::AnimationKey;

/// Result type for animation operations.
pub type Result<T> = std::result::Result<T, MotionError>;

/// Errors that can occur while configuring or driving animations.
///
/// Frame stepping itself never fails; these cover the edges where caller
/// input is parsed or looked up.
#[derive(Error, Debug)]
pub enum MotionError {
    /// A `cubic-bezier(...)` curve could not be parsed.
    #[error("invalid timing curve `{input}`: {reason}")]
    InvalidCurve { input: String, reason: String },

    /// Animation options could not be decoded.
    #[error("invalid animation options: {0}")]
    Options(#[from] serde_json::Error),

    /// No animation is stored under the given key.
    #[error("unknown animation {0:?}")]
    UnknownAnimation(AnimationKey),

    /// Configuration could not be loaded or is out of range.
    #[error(transparent)]
    Config(#[from] rune_config::ConfigError),
}
