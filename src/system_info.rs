use serde::Serialize;
use std::fs;
use std::path::Path;
use std::process::Command;

/// Snapshot returned by `!info`
#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    pub system: String,
    pub release: String,
    pub version: String,
    pub architecture: String,
    /// Compiler the binary was built with
    pub runtime: String,
    pub path: String,
}

impl SystemInfo {
    pub fn collect(working_dir: &Path) -> Self {
        Self {
            system: system_name(),
            release: kernel_field("osrelease", "-r"),
            version: kernel_field("version", "-v"),
            architecture: std::env::consts::ARCH.to_string(),
            runtime: option_env!("GENAGENT_RUSTC_VERSION").unwrap_or("rustc (unknown)").to_string(),
            path: working_dir.display().to_string(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("Error collecting system info: {}", e))
    }
}

fn system_name() -> String {
    match std::env::consts::OS {
        "linux" => "Linux",
        "macos" => "Darwin",
        "windows" => "Windows",
        "freebsd" => "FreeBSD",
        other => other,
    }
    .to_string()
}

/// `/proc/sys/kernel/<name>` where it exists, `uname <flag>` elsewhere
fn kernel_field(proc_name: &str, uname_flag: &str) -> String {
    if let Ok(value) = fs::read_to_string(Path::new("/proc/sys/kernel").join(proc_name)) {
        return value.trim().to_string();
    }

    if let Ok(output) = Command::new("uname").arg(uname_flag).output() {
        if let Ok(value) = String::from_utf8(output.stdout) {
            if !value.trim().is_empty() {
                return value.trim().to_string();
            }
        }
    }

    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_fields() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let info = SystemInfo::collect(temp_dir.path());
        assert_eq!(info.architecture, std::env::consts::ARCH);
        assert!(info.runtime.starts_with("rustc "));

        let json: serde_json::Value = serde_json::from_str(&info.to_json()).unwrap();
        for key in ["system", "release", "version", "architecture", "runtime", "path"] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(json["path"], temp_dir.path().display().to_string());
    }
}
