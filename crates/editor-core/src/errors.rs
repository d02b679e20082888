pub type EditorResult<T> = Result<T, EditorError>;

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// A position or length argument fell outside `[0, len]`.
    #[error("position {pos} out of range (len={len})")]
    OutOfRange { pos: u64, len: u64 },
    #[error("no match")]
    NoMatch,
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("integer conversion failed: {0}")]
    Conversion(#[from] std::num::TryFromIntError),
    #[error("arithmetic overflow")]
    Overflow,
}

impl EditorError {
    #[inline]
    #[must_use]
    pub fn out_of_range(pos: u64, len: u64) -> Self {
        EditorError::OutOfRange { pos, len }
    }
}
