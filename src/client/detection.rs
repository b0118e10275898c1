// ABOUTME: Locate the LXD Unix socket on the local system.
// ABOUTME: Explicit path, then environment, then the snap and package install locations.

use std::path::{Path, PathBuf};

/// Socket used by the snap package.
pub const SNAP_SOCKET: &str = "/var/snap/lxd/common/lxd/unix.socket";

/// Socket used by distribution packages.
pub const DEFAULT_SOCKET: &str = "/var/lib/lxd/unix.socket";

/// Environment variable naming the socket explicitly.
pub const SOCKET_ENV: &str = "LXD_SOCKET";

/// Environment variable naming the LXD state directory.
const DIR_ENV: &str = "LXD_DIR";

#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("no LXD socket found (checked {checked})")]
    NoSocketFound { checked: String },
}

/// Resolve the socket to talk to.
///
/// Detection order:
/// 1. `explicit` (from configuration or the command line), used as-is
/// 2. `$LXD_SOCKET`, used as-is
/// 3. `$LXD_DIR/unix.socket`, if it exists
/// 4. The snap socket, if it exists
/// 5. The package socket, if it exists
pub fn detect_socket(explicit: Option<&Path>) -> Result<PathBuf, DetectionError> {
    detect_from(explicit, &[PathBuf::from(SNAP_SOCKET), PathBuf::from(DEFAULT_SOCKET)])
}

fn detect_from(explicit: Option<&Path>, defaults: &[PathBuf]) -> Result<PathBuf, DetectionError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    if let Ok(socket) = std::env::var(SOCKET_ENV)
        && !socket.is_empty()
    {
        return Ok(PathBuf::from(socket));
    }

    let mut candidates = Vec::new();
    if let Ok(dir) = std::env::var(DIR_ENV)
        && !dir.is_empty()
    {
        candidates.push(Path::new(&dir).join("unix.socket"));
    }
    candidates.extend(defaults.iter().cloned());

    if let Some(found) = candidates.iter().find(|p| p.exists()) {
        tracing::debug!(socket = %found.display(), "detected lxd socket");
        return Ok(found.clone());
    }

    Err(DetectionError::NoSocketFound {
        checked: candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
    })
}
