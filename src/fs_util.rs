use std::io::{self, Write};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tempfile::NamedTempFile;

use crate::error::PhytoError;

static UNSAFE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("static regex"));

/// Turns a compound or plant name into a token that is a valid file name on
/// every platform: each run of characters outside `[A-Za-z0-9._-]` becomes a
/// single `_`. Applying it twice gives the same result as applying it once.
pub fn sanitize_file_token(name: &str) -> String {
    let token = UNSAFE_RUN.replace_all(name, "_");
    match token.as_ref() {
        "" | "." | ".." => "_".to_string(),
        _ => token.into_owned(),
    }
}

/// Empty hidden `.part` file inside `dir`, removed on drop unless persisted.
pub fn temp_file_in(dir: &Path) -> Result<NamedTempFile, PhytoError> {
    tempfile::Builder::new()
        .prefix(".phytofetch")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(|err| PhytoError::persistence(dir.display(), err))
}

/// Stages `content` in a temp file inside `dir`; nothing at the final
/// destination is touched unless the whole payload was written.
pub fn stage_in(dir: &Path, content: &[u8]) -> Result<NamedTempFile, PhytoError> {
    let mut temp = temp_file_in(dir)?;
    let written = temp.write_all(content).and_then(|_| temp.flush());
    if let Err(err) = written {
        return Err(PhytoError::persistence(temp.path().display(), err));
    }
    Ok(temp)
}

pub enum Persisted {
    Written,
    /// `dest` was taken; the staged file is handed back untouched.
    Taken(NamedTempFile),
}

/// Persists a staged file at `dest` only if nothing exists there yet.
pub fn persist_new(temp: NamedTempFile, dest: &Path) -> Result<Persisted, PhytoError> {
    match temp.persist_noclobber(dest) {
        Ok(_) => Ok(Persisted::Written),
        Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => {
            Ok(Persisted::Taken(err.file))
        }
        Err(err) => Err(PhytoError::persistence(dest.display(), err.error)),
    }
}
