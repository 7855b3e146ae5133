//! Atomic file replacement
//!
//! Every artifact is written to a temporary file in the destination
//! directory and renamed over the final path, so readers see either the
//! previous file, no file, or the complete new one.

use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Mode given to written files unless configured otherwise (`rw-r--r--`).
pub const DEFAULT_PERMISSIONS: u32 = 0o644;

/// Writes whole files atomically with a fixed permission mode.
///
/// The mode is applied explicitly, so it does not depend on the umask. It
/// is ignored on platforms without unix permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtomicWriter {
    mode: u32,
}

impl Default for AtomicWriter {
    fn default() -> Self {
        Self::new(DEFAULT_PERMISSIONS)
    }
}

impl AtomicWriter {
    pub fn new(mode: u32) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> u32 {
        self.mode
    }

    /// Replace `path` with `contents` in a single rename.
    pub fn write(&self, path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> io::Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        // The temp file is removed on drop if anything below fails.
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(contents.as_ref())?;
        self.apply_mode(tmp.as_file())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;

        tracing::trace!(
            path = %path.display(),
            bytes = contents.as_ref().len(),
            mode = %format_args!("{:o}", self.mode),
            "atomically wrote file"
        );
        Ok(())
    }

    /// Serialize `value` as pretty JSON and write it atomically.
    pub fn write_json<T: Serialize + ?Sized>(
        &self,
        path: impl AsRef<Path>,
        value: &T,
    ) -> io::Result<()> {
        let json = serde_json::to_vec_pretty(value).map_err(io::Error::other)?;
        self.write(path, json)
    }

    #[cfg(unix)]
    fn apply_mode(&self, file: &std::fs::File) -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(self.mode))
    }

    #[cfg(not(unix))]
    fn apply_mode(&self, _file: &std::fs::File) -> io::Result<()> {
        Ok(())
    }
}

/// Replace `path` with `contents` using [`DEFAULT_PERMISSIONS`].
pub fn atomic_write(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> io::Result<()> {
    AtomicWriter::default().write(path, contents)
}

/// Write `value` as pretty JSON using [`DEFAULT_PERMISSIONS`].
pub fn atomic_write_json<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> io::Result<()> {
    AtomicWriter::default().write_json(path, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    const WRITER_TARGET_ENV: &str = "HANZO_READABILITY_WRITER_TARGET";
    const PAYLOAD_LEN: usize = 4 * 1024 * 1024;

    /// Generation `n` is `PAYLOAD_LEN` copies of a single letter.
    fn payload(generation: usize) -> Vec<u8> {
        vec![b'a' + (generation % 26) as u8; PAYLOAD_LEN]
    }

    /// A file at `path` is either absent or one complete payload.
    fn assert_absent_or_complete(path: &Path) {
        match std::fs::read(path) {
            Ok(bytes) => {
                assert_eq!(bytes.len(), PAYLOAD_LEN, "partial file at {}", path.display());
                assert!(bytes.iter().all(|b| *b == bytes[0]), "mixed file at {}", path.display());
            }
            Err(e) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
        }
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_write_creates_file_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("content.txt");

        atomic_write(&target, "hello").unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "hello");
        assert_eq!(entries(dir.path()), vec!["content.txt"]);
    }

    #[test]
    fn test_write_replaces_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("content.html");
        atomic_write(&target, "a much longer previous body").unwrap();

        atomic_write(&target, "<p>x</p>").unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "<p>x</p>");
        assert_eq!(entries(dir.path()), vec!["content.html"]);
    }

    #[test]
    fn test_failed_write_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("article.json");
        atomic_write(&target, "{}").unwrap();

        // Renaming a file over a non-empty directory fails after the temp
        // file has been fully written.
        let blocked = dir.path().join("blocked");
        std::fs::create_dir(&blocked).unwrap();
        std::fs::write(blocked.join("inner"), "x").unwrap();
        assert!(atomic_write(&blocked, "new").is_err());

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "{}");
        assert_eq!(entries(dir.path()), vec!["article.json", "blocked"]);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing").join("content.txt");
        assert!(atomic_write(&target, "x").is_err());
        assert!(!target.exists());
    }

    #[test]
    fn test_write_json_sorts_keys() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("article.json");
        let value = json!({"title": "T", "byline": "B"});

        atomic_write_json(&target, &value).unwrap();

        let written = std::fs::read_to_string(&target).unwrap();
        assert!(written.find("byline").unwrap() < written.find("title").unwrap());
        let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, value);
    }

    #[cfg(unix)]
    #[test]
    fn test_files_get_configured_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let default = dir.path().join("content.txt");
        let private = dir.path().join("article.json");

        atomic_write(&default, "x").unwrap();
        AtomicWriter::new(0o640).write_json(&private, &json!({})).unwrap();

        let mode = |p: &Path| std::fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&default), DEFAULT_PERMISSIONS);
        assert_eq!(mode(&private), 0o640);
    }

    #[test]
    fn test_concurrent_reader_sees_only_whole_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("content.html");
        let done = Arc::new(AtomicBool::new(false));

        let writer = {
            let target = target.clone();
            let done = done.clone();
            std::thread::spawn(move || {
                for generation in 0..20 {
                    atomic_write(&target, payload(generation)).unwrap();
                }
                done.store(true, Ordering::SeqCst);
            })
        };

        let mut reads = 0;
        while !done.load(Ordering::SeqCst) {
            assert_absent_or_complete(&target);
            reads += 1;
        }
        writer.join().unwrap();

        assert!(reads > 0);
        assert_eq!(std::fs::read(&target).unwrap(), payload(19));
    }

    /// Body of the child process used by
    /// `test_killed_writer_never_leaves_partial_file`; a no-op otherwise.
    #[test]
    fn writer_loop() {
        let Some(target) = std::env::var_os(WRITER_TARGET_ENV) else {
            return;
        };
        let deadline = Instant::now() + Duration::from_secs(30);
        let mut generation = 0;
        while Instant::now() < deadline {
            atomic_write(&target, payload(generation)).unwrap();
            generation += 1;
        }
    }

    #[test]
    fn test_killed_writer_never_leaves_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("article.json");
        let exe = std::env::current_exe().unwrap();

        for round in 0..5u64 {
            let mut child = std::process::Command::new(&exe)
                .args(["--exact", "atomic::tests::writer_loop", "--test-threads=1"])
                .env(WRITER_TARGET_ENV, &target)
                .stdout(std::process::Stdio::null())
                .stderr(std::process::Stdio::null())
                .spawn()
                .unwrap();

            std::thread::sleep(Duration::from_millis(100 + 60 * round));
            let _ = child.kill();
            child.wait().unwrap();

            assert_absent_or_complete(&target);
        }
    }
}
