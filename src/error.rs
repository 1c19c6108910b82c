//! Engine error types.

/// Errors raised while building an engine. Setters and rendering never fail.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Canvas with a zero-length side.
    #[error("invalid canvas dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// The RGBA buffer could not be sized or reserved.
    #[error("failed to allocate {width}x{height} canvas")]
    CanvasAllocation { width: u32, height: u32 },
}
