#[derive(Debug)]
pub struct MmapFile {
    _file: std::fs::File,
    /// `None` for zero-length files, which cannot be mapped on every platform.
    mmap: Option<memmap2::Mmap>,
    path: std::path::PathBuf,
}

impl MmapFile {
    /// # Errors
    ///
    /// - `std::io::Error` if the file cannot be opened or mapped.
    pub fn open(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        let file = std::fs::File::open(&path_buf)?;
        let size = file.metadata()?.len();
        let mmap = if size == 0 {
            None
        } else {
            // SAFETY:
            // - File is opened read-only
            // - We keep the file handle alive in struct
            // - Caller only gets immutable &[u8]
            Some(unsafe { memmap2::Mmap::map(&file)? })
        };

        Ok(Self {
            _file: file,
            mmap,
            path: path_buf,
        })
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or_default()
    }

    /// File length in bytes.
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

    /// Path of mapped file.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}
