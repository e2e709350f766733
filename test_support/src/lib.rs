//! Test utilities for process and environment management.
//!
//! This crate provides helpers for creating fake engine executables along
//! with guards that serialise mutations of process-global state across
//! concurrently running tests.

pub mod env_lock;
pub mod env_var_guard;

pub use env_lock::EnvLock;
pub use env_var_guard::EnvVarGuard;

use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a fake engine executable that exits with `exit_code`.
///
/// Returns the temporary directory and the path to the executable.
pub fn fake_engine(exit_code: i32) -> (TempDir, PathBuf) {
    fake_engine_script(&format!("#!/bin/sh\nexit {exit_code}"))
}

/// Create a fake engine executable that writes `report` to the path given by
/// its `--report` argument and exits successfully.
///
/// The stub mirrors the contract of the real engine: it is invoked as
/// `engine apply --plan <file> --report <file>`.
pub fn fake_engine_with_report(report: &str) -> (TempDir, PathBuf) {
    let script = format!(
        "#!/bin/sh\n\
         report=\"\"\n\
         while [ $# -gt 0 ]; do\n\
           if [ \"$1\" = \"--report\" ]; then report=\"$2\"; shift; fi\n\
           shift\n\
         done\n\
         cat > \"$report\" <<'EOF'\n{report}\nEOF\n\
         exit 0"
    );
    fake_engine_script(&script)
}

fn fake_engine_script(script: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("kumo-engine");
    let mut file = File::create(&path).expect("script");
    writeln!(file, "{script}").expect("write script");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&path).expect("meta").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("perms");
    }
    (dir, path)
}
