//! Filesystem operations behind the file directives.
//!
//! Every path the operator types is resolved against an explicit working
//! root, never the process working directory, and reported back in the form
//! it was typed (`generated/notes.txt`, not an absolute path).

use crate::error_handling::AgentError;
use crate::logging::LogCategory;
use crate::safety::SafetyGuard;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub struct Workspace {
    root: PathBuf,
    output_root: PathBuf,
    guard: SafetyGuard,
}

impl Workspace {
    /// `root` is the working directory, `output_root` the default directory
    /// for generated files (relative to `root` unless absolute)
    pub fn new(root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let guard = SafetyGuard::new(&root);
        Self {
            root,
            output_root: output_root.into(),
            guard,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn guard(&self) -> &SafetyGuard {
        &self.guard
    }

    /// Where a typed path lives on disk
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Bare file names go under the output root; anything with a directory
    /// component is kept as typed
    pub fn with_default_root(&self, path: &str) -> String {
        if has_directory_component(path) {
            path.to_string()
        } else {
            display_path(&self.output_root.join(path))
        }
    }

    pub fn ensure_output_root(&self) -> Result<(), AgentError> {
        let dir = self.resolve(&self.output_root);
        fs::create_dir_all(&dir)
            .map_err(|e| AgentError::io(format!("Couldn't create {} directory", self.output_root.display()), &e))
    }

    /// Guard the path as the operator typed it. The configured output root
    /// that bare names are placed under is not subject to the guard.
    fn check_path(&self, path: &str) -> Result<(), AgentError> {
        self.guard
            .check_path(path)
            .map_err(|reason| AgentError::traversal(format!("Invalid file path: {}", path)).with_technical_details(reason.to_string()))
    }

    pub fn delete_file(&self, path: &str) -> Result<String, AgentError> {
        self.check_path(path)?;
        let path = self.with_default_root(path);

        let target = self.resolve(&path);
        match fs::remove_file(&target) {
            Ok(()) => {
                log_fs_event(format!("Deleted file {}", path));
                Ok(format!("✅ Deleted: {}", path))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(AgentError::not_found(format!("File not found: {}", path))),
            Err(e) => Err(AgentError::io(format!("Error deleting {}", path), &e)),
        }
    }

    /// Remove the regular files directly inside the output root. Directories
    /// and their contents are left alone.
    pub fn delete_all(&self) -> Result<String, AgentError> {
        let dir = self.resolve(&self.output_root);
        if !dir.exists() {
            return Ok("No generated directory found.".to_string());
        }

        let entries = sorted_entries(&dir).map_err(|e| AgentError::io("Error deleting files", &e))?;
        if entries.is_empty() {
            return Ok("No files to delete.".to_string());
        }

        let mut deleted = Vec::new();
        for (name, path) in entries {
            if path.is_file() {
                fs::remove_file(&path).map_err(|e| AgentError::io("Error deleting files", &e))?;
                deleted.push(name);
            }
        }

        if deleted.is_empty() {
            return Ok("No files were deleted.".to_string());
        }

        log_fs_event(format!("Deleted {} generated files", deleted.len()));
        Ok(format!("✅ Deleted {} files: {}", deleted.len(), deleted.join(", ")))
    }

    /// Names in the output root, one per line
    pub fn list_output(&self) -> Result<String, AgentError> {
        let dir = self.resolve(&self.output_root);
        if !dir.exists() {
            return Ok("No generated files found.".to_string());
        }

        let entries = sorted_entries(&dir).map_err(|e| AgentError::io("Error listing generated files", &e))?;
        if entries.is_empty() {
            return Ok("No generated files found.".to_string());
        }

        Ok(entries
            .iter()
            .enumerate()
            .map(|(i, (name, _))| format!("{}. {}", i + 1, name))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Entries of any directory, with sizes for files
    pub fn list_dir(&self, path: &str) -> Result<String, AgentError> {
        let path = if path.trim().is_empty() { "." } else { path.trim() };
        let dir = self.resolve(path);

        let entries = sorted_entries(&dir).map_err(|e| AgentError::io("Error listing directory", &e))?;
        if entries.is_empty() {
            return Ok(format!("Directory '{}' is empty.", path));
        }

        let mut lines = Vec::with_capacity(entries.len());
        for (name, full_path) in entries {
            if full_path.is_dir() {
                lines.push(format!("📁 {}/", name));
            } else {
                let size = fs::metadata(&full_path).map(|m| m.len()).unwrap_or(0);
                lines.push(format!("📄 {} ({})", name, human_size(size)));
            }
        }

        Ok(lines.join("\n"))
    }

    pub fn read_file(&self, path: &str) -> Result<String, AgentError> {
        self.check_path(path)?;
        let path = self.with_default_root(path);

        match fs::read_to_string(self.resolve(&path)) {
            Ok(content) => Ok(format!("📄 Contents of {}:\n\n{}", path, content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(AgentError::not_found(format!("Could not read: {} (file not found)", path))),
            Err(e) => Err(AgentError::io(format!("Could not read: {}", path), &e)),
        }
    }

    pub fn create_file(&self, path: &str, content: &str) -> Result<String, AgentError> {
        self.check_path(path)?;
        let path = self.with_default_root(path);

        self.write_file(&path, content)
            .map_err(|e| AgentError::io(format!("Failed to create: {}", path), &e))?;
        log_fs_event(format!("Created file {}", path));
        Ok(format!("✅ Created: {}", path))
    }

    /// Write `content`, creating parent directories first
    pub fn write_file(&self, path: impl AsRef<Path>, content: &str) -> io::Result<()> {
        let target = self.resolve(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(target, content)
    }

    /// True when `path` exists and has at least one entry
    pub fn is_non_empty_dir(&self, path: impl AsRef<Path>) -> bool {
        fs::read_dir(self.resolve(path))
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false)
    }
}

fn has_directory_component(path: &str) -> bool {
    Path::new(path)
        .parent()
        .map(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(false)
}

/// Render with forward slashes so output reads the same on every platform
pub fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn sorted_entries(dir: &Path) -> io::Result<Vec<(String, PathBuf)>> {
    let mut entries = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| (entry.file_name().to_string_lossy().into_owned(), entry.path()))
        .collect::<Vec<_>>();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

/// `512 B`, `1.5 KB`, `2.0 MB`
pub fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    if bytes > MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes > KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

fn log_fs_event(message: String) {
    crate::log_info!(LogCategory::Filesystem, message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::ErrorKind;
    use tempfile::TempDir;

    fn workspace() -> (Workspace, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        (Workspace::new(temp_dir.path(), "generated"), temp_dir)
    }

    #[test]
    fn test_human_size_thresholds() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(1024), "1024 B");
        assert_eq!(human_size(1536), "1.5 KB");
        assert_eq!(human_size(1024 * 1024), "1024.0 KB");
        assert_eq!(human_size(2 * 1024 * 1024), "2.0 MB");
    }

    #[test]
    fn test_default_root_prefixing() {
        let (ws, _dir) = workspace();
        assert_eq!(ws.with_default_root("a.txt"), "generated/a.txt");
        assert_eq!(ws.with_default_root("docs/a.txt"), "docs/a.txt");
    }

    #[test]
    fn test_create_then_read() {
        let (ws, dir) = workspace();
        assert_eq!(ws.create_file("a/b.txt", "hello").unwrap(), "✅ Created: a/b.txt");
        assert_eq!(fs::read_to_string(dir.path().join("a/b.txt")).unwrap(), "hello");
        assert_eq!(ws.read_file("a/b.txt").unwrap(), "📄 Contents of a/b.txt:\n\nhello");

        ws.create_file("bare.txt", "x").unwrap();
        assert!(dir.path().join("generated/bare.txt").exists());
    }

    #[test]
    fn test_create_rejects_traversal() {
        let (ws, _dir) = workspace();
        let err = ws.create_file("../escape.txt", "x").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Traversal);
        assert_eq!(err.render(), "❌ Security error: Invalid file path: ../escape.txt");
    }

    #[test]
    fn test_delete_file() {
        let (ws, dir) = workspace();
        ws.create_file("gone.txt", "x").unwrap();
        assert_eq!(ws.delete_file("gone.txt").unwrap(), "✅ Deleted: generated/gone.txt");
        assert!(!dir.path().join("generated/gone.txt").exists());

        let err = ws.delete_file("gone.txt").unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.render(), "❌ File not found: generated/gone.txt");

        assert_eq!(ws.delete_file("~/x").unwrap_err().kind, ErrorKind::Traversal);
    }

    #[test]
    fn test_delete_all_skips_directories() {
        let (ws, dir) = workspace();
        for name in ["a.txt", "b.py", "c.js"] {
            ws.create_file(name, "x").unwrap();
        }
        ws.create_file("generated/sub/keep.txt", "keep").unwrap();

        let report = ws.delete_all().unwrap();
        assert_eq!(report, "✅ Deleted 3 files: a.txt, b.py, c.js");
        assert!(dir.path().join("generated/sub/keep.txt").exists());

        assert_eq!(ws.delete_all().unwrap(), "No files were deleted.");
    }

    #[test]
    fn test_delete_all_missing_or_empty_root() {
        let (ws, _dir) = workspace();
        assert_eq!(ws.delete_all().unwrap(), "No generated directory found.");
        ws.ensure_output_root().unwrap();
        assert_eq!(ws.delete_all().unwrap(), "No files to delete.");
    }

    #[test]
    fn test_list_output_is_stable() {
        let (ws, _dir) = workspace();
        assert_eq!(ws.list_output().unwrap(), "No generated files found.");

        ws.create_file("b.txt", "x").unwrap();
        ws.create_file("a.txt", "x").unwrap();

        let first = ws.list_output().unwrap();
        assert_eq!(first, "1. a.txt\n2. b.txt");
        assert_eq!(ws.list_output().unwrap(), first);
    }

    #[test]
    fn test_list_dir_marks_directories_and_sizes() {
        let (ws, _dir) = workspace();
        ws.create_file("proj/src/main.rs", "fn main() {}").unwrap();
        ws.write_file("proj/big.bin", &"x".repeat(2048)).unwrap();

        let listing = ws.list_dir("proj").unwrap();
        assert_eq!(listing, "📄 big.bin (2.0 KB)\n📁 src/");

        assert_eq!(ws.list_dir("proj/src").unwrap(), "📄 main.rs (12 B)");
        assert!(ws.list_dir("").unwrap().contains("📁 proj/"));
        assert_eq!(ws.list_dir("missing").unwrap_err().kind, ErrorKind::NotFound);
    }

    #[test]
    fn test_absolute_output_root_round_trip() {
        let work = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let ws = Workspace::new(work.path(), out.path());
        let expected = display_path(&out.path().join("x.txt"));

        assert_eq!(ws.create_file("x.txt", "hi").unwrap(), format!("✅ Created: {}", expected));
        assert_eq!(ws.read_file("x.txt").unwrap(), format!("📄 Contents of {}:\n\nhi", expected));
        assert_eq!(ws.list_output().unwrap(), "1. x.txt");
        assert_eq!(ws.delete_file("x.txt").unwrap(), format!("✅ Deleted: {}", expected));
        assert!(!out.path().join("x.txt").exists());

        // Typed paths are still guarded
        assert_eq!(ws.read_file("../x.txt").unwrap_err().kind, ErrorKind::Traversal);
        assert_eq!(ws.delete_file("..").unwrap_err().kind, ErrorKind::Traversal);
    }

    #[test]
    fn test_read_missing_file() {
        let (ws, _dir) = workspace();
        let err = ws.read_file("nope.txt").unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(err.message.contains("generated/nope.txt"));
    }
}
