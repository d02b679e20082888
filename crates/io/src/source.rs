/// Where the bytes behind a [`SharedBytes`] handle live.
#[derive(Debug)]
enum Backing {
    Mapped(crate::mmap::MmapFile),
    Owned(Box<[u8]>),
}

/// Immutable, reference-counted byte source.
///
/// Cloning is O(1). The underlying mapping (or allocation) is released only
/// when the last clone is dropped, so every piece that points into it stays
/// valid for as long as its owner holds a handle.
#[derive(Clone, Debug)]
pub struct SharedBytes {
    backing: std::sync::Arc<Backing>,
}

impl SharedBytes {
    /// Maps `path` read-only.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or mapped.
    pub fn open(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let mmap = crate::mmap::MmapFile::open(path)?;

        Ok(Self {
            backing: std::sync::Arc::new(Backing::Mapped(mmap)),
        })
    }

    #[must_use]
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self {
            backing: std::sync::Arc::new(Backing::Owned(bytes.into_boxed_slice())),
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::from_vec(Vec::new())
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        match self.backing.as_ref() {
            Backing::Mapped(mmap) => mmap.as_slice(),
            Backing::Owned(bytes) => bytes,
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Path of the backing file, if the bytes are memory-mapped.
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        match self.backing.as_ref() {
            Backing::Mapped(mmap) => Some(mmap.path()),
            Backing::Owned(_) => None,
        }
    }
}

impl From<&str> for SharedBytes {
    fn from(value: &str) -> Self {
        Self::from_vec(value.as_bytes().to_vec())
    }
}
