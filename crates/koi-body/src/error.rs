//! Error types for the `koi-body` crate.
//!
//! Bodies are validated once at construction. After that every operation
//! is infallible: degenerate geometry is guarded inside the relaxation
//! step instead of being reported.

/// Errors that can occur while building a spine or a fish body.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BodyError {
    /// The body length is zero, negative, or not finite.
    #[error("body length must be positive and finite, got {length}")]
    InvalidLength {
        /// The rejected length.
        length: f32,
    },

    /// The spine resolution is zero, negative, or not finite.
    #[error("spine resolution must be positive and finite, got {resolution}")]
    InvalidResolution {
        /// The rejected resolution.
        resolution: f32,
    },

    /// The length/resolution ratio needs more segments than a spine may hold.
    #[error("a body of length {length} at resolution {resolution} exceeds {max} segments")]
    TooManySegments {
        /// The requested body length.
        length: f32,
        /// The configured spine resolution.
        resolution: f32,
        /// The segment limit.
        max: usize,
    },

    /// A spring or swim parameter is out of range.
    #[error("invalid body config: {reason}")]
    InvalidConfig {
        /// Which parameter was rejected and why.
        reason: String,
    },

    /// The body outline is out of range.
    #[error("invalid body shape: {reason}")]
    InvalidShape {
        /// Which shape parameter was rejected and why.
        reason: String,
    },
}
