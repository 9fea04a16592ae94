//! Locating and sniffing the `.aux` sidecar of a raw image

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use super::text::starts_with_ci;

/// Tag opening every sidecar; the misspelling is what producers write
pub const TARGET_TAG: &str = "AuxilaryTarget";

/// Corrected spelling, accepted on read
pub const TARGET_TAG_CORRECTED: &str = "AuxiliaryTarget";

/// Most bytes examined when sniffing a sidecar's first line
pub const SIDECAR_LINE_LIMIT: usize = 1024;

/// Whether a first line carries either spelling of the target tag
pub fn has_target_tag(line: &str) -> bool {
    starts_with_ci(line, TARGET_TAG) || starts_with_ci(line, TARGET_TAG_CORRECTED)
}

/// Reads the first line of a file, capped at [`SIDECAR_LINE_LIMIT`] bytes.
///
/// Returns `Ok(None)` for an empty file.
pub fn read_first_line(path: &Path) -> io::Result<Option<String>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file).take(SIDECAR_LINE_LIMIT as u64);
    let mut raw = Vec::new();
    let read = reader.read_until(b'\n', &mut raw)?;
    if read == 0 {
        return Ok(None);
    }

    let line = String::from_utf8_lossy(&raw);
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Returns the file named by a sidecar's `AuxilaryTarget: <name>` line.
///
/// Only paths with an `aux` extension (any case) are examined; anything
/// else, or a sidecar without the tag, is itself the target.
pub fn resolve_target(path: &Path) -> PathBuf {
    let is_aux = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("aux"));
    if !is_aux {
        return path.to_path_buf();
    }

    let Ok(Some(line)) = read_first_line(path) else {
        return path.to_path_buf();
    };

    for tag in [TARGET_TAG, TARGET_TAG_CORRECTED] {
        let prefix = format!("{}: ", tag);
        if starts_with_ci(&line, &prefix) {
            let name = &line[prefix.len()..];
            let dir = path.parent().unwrap_or_else(|| Path::new(""));
            log::debug!("{} names target {}", path.display(), name);
            return dir.join(name);
        }
    }

    path.to_path_buf()
}

/// The sidecar path for a target, `target` with its extension replaced
pub fn sidecar_path(target: &Path, extension: &str) -> PathBuf {
    target.with_extension(extension)
}

/// Finds the sidecar of `target`: `.aux`, falling back to `.AUX`.
///
/// With a sibling listing, the `.aux` name must appear in it (compared
/// case-insensitively).
pub fn locate_sidecar(target: &Path, siblings: Option<&[String]>) -> Result<PathBuf> {
    let lower = sidecar_path(target, "aux");

    if let Some(siblings) = siblings {
        let name = lower
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !siblings.iter().any(|s| s.eq_ignore_ascii_case(&name)) {
            return Err(Error::FormatMismatch(format!(
                "{} is not among the sibling files",
                name
            )));
        }
    }

    let upper = sidecar_path(target, "AUX");
    [lower, upper]
        .into_iter()
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| {
            Error::FormatMismatch(format!("{} has no .aux sidecar", target.display()))
        })
}

/// Checks that a sidecar starts with the target tag
pub fn sniff(sidecar: &Path) -> Result<()> {
    let line = read_first_line(sidecar).map_err(|source| Error::FileOpen {
        path: sidecar.to_path_buf(),
        source,
    })?;

    match line {
        Some(line) if has_target_tag(&line) => Ok(()),
        _ => Err(Error::FormatMismatch(format!(
            "{} does not start with {}",
            sidecar.display(),
            TARGET_TAG
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_has_target_tag() {
        assert!(has_target_tag("AuxilaryTarget: a.raw"));
        assert!(has_target_tag("auxiliarytarget: a.raw"));
        assert!(!has_target_tag("RawDefinition: 1 1 1"));
    }

    #[test]
    fn test_read_first_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.aux");
        fs::write(&path, "AuxilaryTarget: a.raw\r\nRawDefinition: 1 1 1\n").unwrap();
        assert_eq!(read_first_line(&path).unwrap().as_deref(), Some("AuxilaryTarget: a.raw"));

        fs::write(&path, "").unwrap();
        assert_eq!(read_first_line(&path).unwrap(), None);
    }

    #[test]
    fn test_first_line_is_capped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("long.aux");
        fs::write(&path, "x".repeat(5000)).unwrap();
        assert_eq!(read_first_line(&path).unwrap().unwrap().len(), SIDECAR_LINE_LIMIT);
    }

    #[test]
    fn test_resolve_target_from_sidecar() {
        let dir = tempdir().unwrap();
        let aux = dir.path().join("scene.aux");
        fs::write(&aux, "AuxiliaryTarget: scene.img\n").unwrap();
        assert_eq!(resolve_target(&aux), dir.path().join("scene.img"));
    }

    #[test]
    fn test_resolve_target_plain_file() {
        let dir = tempdir().unwrap();
        let raw = dir.path().join("scene.raw");
        assert_eq!(resolve_target(&raw), raw);
    }

    #[test]
    fn test_locate_sidecar_upper_case_fallback() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("scene.raw");
        fs::write(dir.path().join("scene.AUX"), "AuxilaryTarget: scene.raw\n").unwrap();

        let found = locate_sidecar(&target, None).unwrap();
        assert_eq!(found.extension().unwrap(), "AUX");
    }

    #[test]
    fn test_locate_sidecar_respects_siblings() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("scene.raw");
        fs::write(dir.path().join("scene.aux"), "AuxilaryTarget: scene.raw\n").unwrap();

        let siblings = vec!["scene.raw".to_string()];
        assert!(matches!(
            locate_sidecar(&target, Some(&siblings)),
            Err(Error::FormatMismatch(_))
        ));

        let siblings = vec!["scene.raw".to_string(), "SCENE.AUX".to_string()];
        assert!(locate_sidecar(&target, Some(&siblings)).is_ok());
    }

    #[test]
    fn test_sniff_rejects_foreign_sidecar() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("other.aux");
        fs::write(&path, "HFA auxiliary\n").unwrap();
        assert!(matches!(sniff(&path), Err(Error::FormatMismatch(_))));
    }
}
