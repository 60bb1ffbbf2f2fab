use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum WorldError {
    #[error("World dimensions must be positive")]
    InvalidDimensions,
    #[error("Mine percentage must be within [0, 1)")]
    InvalidMinePercentage,
    #[error("Chunk edge length must be positive")]
    InvalidChunkSize,
    #[error("Coordinates are outside of the world")]
    OutOfBounds,
    #[error("Mine layout does not fit the declared size")]
    InvalidMineLayout,
}

pub type Result<T> = core::result::Result<T, WorldError>;
