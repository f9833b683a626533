#[derive(Debug)]
pub enum Error {
    DimensionMisMatch { expected: usize, found: usize },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DimensionMisMatch { expected, found } => write!(
                f,
                "dimension mismatch: store expects {expected}, got {found}"
            ),
        }
    }
}

impl std::error::Error for Error {}
