use thiserror::Error;

/// Reasons a drawing pass refuses to start.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PassError {
    #[error("tile size must be positive and finite, got {0}")]
    NonPositiveTileSize(f64),

    #[error("canvas width must be non-negative and finite, got {0}")]
    InvalidWidth(f64),

    #[error("pass would cover {0} cells, which does not fit a cell index")]
    TooManyCells(f64),
}
