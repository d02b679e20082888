use std::io::Write;

/// Safely writes `chunks` to `path`.
///
/// The bytes go to a temporary file in the *same directory* as the target
/// (an atomic rename cannot cross file systems), are flushed to disk, and the
/// temporary file is then renamed over `path`. A failure at any step leaves
/// the original file untouched and removes the temporary file.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created or written, or if
/// the final rename fails.
pub fn write_atomic<'a, I>(path: &std::path::Path, chunks: I) -> std::io::Result<u64>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let parent_dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => std::path::Path::new("."),
    };
    let mut temp_save_file = tempfile::Builder::new()
        .prefix(".save_tmp_")
        .tempfile_in(parent_dir)?;
    let mut written = 0u64;

    for chunk in chunks {
        temp_save_file.write_all(chunk)?;
        written += chunk.len() as u64;
    }

    temp_save_file.as_file().sync_all()?;
    temp_save_file.persist(path).map_err(|e| e.error)?;

    tracing::debug!(path = %path.display(), bytes = written, "atomic save complete");

    Ok(written)
}
