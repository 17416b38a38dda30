use std::fs;
use std::sync::Arc;

use parking_lot::Mutex;
use sysinfo::{Pid, System};

/// Source of resident-memory readings, in kilobytes.
///
/// Implementations never fail: a reading that cannot be taken is 0.
pub trait MemoryProbe: Send + Sync {
    /// One sample for the peak tracker.
    fn sample_kb(&self) -> u64;

    /// Resident size of the monitored service process.
    fn target_rss_kb(&self) -> u64;
}

/// Probe backed by the operating system.
///
/// A sample is the maximum of the calling process's peak RSS
/// (`getrusage`), its current `VmRSS`, and the summed `Rss:` lines of the
/// target process's `smaps`.
#[derive(Debug, Clone)]
pub struct SystemProbe {
    target: Option<String>,
    state: Arc<Mutex<ProbeState>>,
}

#[derive(Debug)]
struct ProbeState {
    system: System,
    /// Target PID from the last lookup, re-checked on every use
    pid: Option<Pid>,
}

impl ProbeState {
    /// Finds the target process, refreshing only the cached PID while it is
    /// still alive and still carries the target name.
    fn locate(&mut self, name: &str) -> Option<Pid> {
        if let Some(pid) = self.pid {
            let alive = self.system.refresh_process(pid)
                && self
                    .system
                    .process(pid)
                    .is_some_and(|process| process.name().contains(name));
            if alive {
                return Some(pid);
            }
            log::debug!("process {name} (pid {pid}) is gone, searching again");
            self.pid = None;
        }

        self.system.refresh_processes();
        self.pid = self
            .system
            .processes_by_name(name)
            .next()
            .map(|process| process.pid());
        self.pid
    }
}

impl SystemProbe {
    pub fn new(target: Option<String>) -> Self {
        Self {
            target,
            state: Arc::new(Mutex::new(ProbeState {
                system: System::new(),
                pid: None,
            })),
        }
    }

    /// Probe that also tracks the process named `name` (for example `ollama`).
    pub fn for_process(name: impl Into<String>) -> Self {
        Self::new(Some(name.into()))
    }

    /// Probe that only looks at the calling process.
    pub fn for_self() -> Self {
        Self::new(None)
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    fn find_target_pid(&self, name: &str) -> Option<u32> {
        self.state.lock().locate(name).map(|pid| pid.as_u32())
    }

    #[cfg(test)]
    fn cached_pid(&self) -> Option<u32> {
        self.state.lock().pid.map(|pid| pid.as_u32())
    }
}

impl MemoryProbe for SystemProbe {
    fn sample_kb(&self) -> u64 {
        let target = self
            .target
            .as_deref()
            .and_then(|name| self.find_target_pid(name))
            .map(smaps_rss_kb)
            .unwrap_or(0);
        own_peak_rss_kb().max(own_current_rss_kb()).max(target)
    }

    fn target_rss_kb(&self) -> u64 {
        let Some(name) = self.target.as_deref() else {
            return 0;
        };
        let mut state = self.state.lock();
        let Some(pid) = state.locate(name) else {
            return 0;
        };
        state
            .system
            .process(pid)
            .map(|process| process.memory() / 1024)
            .unwrap_or(0)
    }
}

#[cfg(unix)]
fn own_peak_rss_kb() -> u64 {
    // SAFETY: rusage is a plain-old-data struct; zeroing all bytes is a valid initial state.
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    // SAFETY: getrusage writes into a stack-allocated struct we own.
    let ret = unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) };
    if ret != 0 {
        return 0;
    }
    let max_rss = usage.ru_maxrss.max(0) as u64;
    if cfg!(target_os = "macos") {
        // macOS reports bytes, Linux kilobytes.
        max_rss / 1024
    } else {
        max_rss
    }
}

#[cfg(not(unix))]
fn own_peak_rss_kb() -> u64 {
    0
}

fn own_current_rss_kb() -> u64 {
    fs::read_to_string("/proc/self/status")
        .map(|status| status_field_kb(&status, "VmRSS:"))
        .unwrap_or(0)
}

fn smaps_rss_kb(pid: u32) -> u64 {
    match fs::read_to_string(format!("/proc/{pid}/smaps")) {
        Ok(smaps) => sum_smaps_rss_kb(&smaps),
        Err(err) => {
            log::debug!("smaps unavailable for pid {pid}: {err}");
            0
        }
    }
}

/// Value of a `Key:   1234 kB` line in a `/proc/*/status` dump.
fn status_field_kb(status: &str, key: &str) -> u64 {
    status
        .lines()
        .find_map(|line| line.strip_prefix(key))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|value| value.parse().ok())
        .unwrap_or(0)
}

fn sum_smaps_rss_kb(smaps: &str) -> u64 {
    smaps
        .lines()
        .filter_map(|line| line.strip_prefix("Rss:"))
        .filter_map(|rest| rest.split_whitespace().next())
        .filter_map(|value| value.parse::<u64>().ok())
        .sum()
}

/// Total and available system memory in megabytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemMemory {
    pub total_mb: u64,
    pub available_mb: u64,
}

impl SystemMemory {
    pub fn read() -> Self {
        let mut system = System::new();
        system.refresh_memory();
        Self {
            total_mb: system.total_memory() / (1024 * 1024),
            available_mb: system.available_memory() / (1024 * 1024),
        }
    }
}
