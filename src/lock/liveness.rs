// src/lock/liveness.rs

use std::fmt::Debug;

/// Answers "is process `pid` still running?".
pub trait LivenessProbe: Send + Sync + Debug {
    fn is_alive(&self, pid: u32) -> bool;
}

/// Probe backed by the operating system.
///
/// On Unix this sends signal 0; a permission error still means the process
/// exists. Elsewhere every holder is assumed alive, so only the staleness
/// bound can reclaim a lock.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessLiveness;

#[cfg(unix)]
impl LivenessProbe for ProcessLiveness {
    fn is_alive(&self, pid: u32) -> bool {
        let Ok(pid) = libc::pid_t::try_from(pid) else {
            return false;
        };
        if pid <= 0 {
            return false;
        }
        // SAFETY: signal 0 performs only the existence/permission check.
        let rc = unsafe { libc::kill(pid, 0) };
        if rc == 0 {
            return true;
        }
        std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
    }
}

#[cfg(not(unix))]
impl LivenessProbe for ProcessLiveness {
    fn is_alive(&self, _pid: u32) -> bool {
        true
    }
}
