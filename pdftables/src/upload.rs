//! Staging of uploaded files on disk.
//!
//! Extraction backends read from a path, so each upload is streamed into its own temporary
//! file. A [`StagedUpload`] owns that file; dropping it closes and deletes it.

use std::io;
use std::path::Path;
use tempfile::TempPath;
use tokio::{fs::File, io::AsyncWriteExt};

/// Reduces a client-supplied filename to a safe, flat ASCII name.
///
/// Path separators and whitespace runs become `_`, anything outside `[A-Za-z0-9_.-]` is
/// dropped, and leading/trailing `.` and `_` are trimmed. The result may be empty.
///
/// Non-ASCII characters are dropped rather than transliterated, so `résumé.pdf` becomes
/// `rsum.pdf`. Only the extension reaches the staged file name, so this is only visible when
/// the whole stem is non-ASCII: `отчёт.pdf` becomes `pdf` and the staged file has no suffix.
pub fn secure_filename(filename: &str) -> String {
    let flattened = filename.replace(['/', '\\'], " ");
    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Extension of `filename` including the leading dot, or an empty string.
fn dotted_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}

/// An upload written to a uniquely named temporary file.
#[derive(Debug)]
pub struct StagedUpload {
    // Declared before `path` so the handle is closed before the file is removed
    file: File,
    path: TempPath,
    size: u64,
}

impl StagedUpload {
    /// Creates an empty staging file in `dir` (or the system temp dir) whose name ends with the
    /// extension of `filename`.
    pub fn create(dir: Option<&Path>, filename: &str) -> io::Result<Self> {
        let suffix = dotted_extension(filename);
        let mut builder = tempfile::Builder::new();
        builder.prefix("upload-").suffix(&suffix);

        let named = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        let (file, path) = named.into_parts();

        Ok(Self {
            file: File::from_std(file),
            path,
            size: 0,
        })
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.file.write_all(chunk).await?;
        self.size += chunk.len() as u64;
        Ok(())
    }

    /// Waits until every written chunk has reached the file.
    pub async fn finish(&mut self) -> io::Result<()> {
        self.file.flush().await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}
