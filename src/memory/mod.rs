//! Resident-memory measurement for benchmark runs.
//!
//! [`SystemProbe`] reads the numbers, [`MemorySampler`] polls a probe in the
//! background and keeps the peak between `start` and `stop`.

mod probe;
mod sampler;

pub use probe::{MemoryProbe, SystemMemory, SystemProbe};
pub use sampler::{MemorySampler, DEFAULT_SAMPLE_INTERVAL};

const KB_PER_MB: u64 = 1024;
const KB_PER_GB: u64 = 1024 * 1024;

/// Formats a kilobyte count as `"N GB"`, `"N MB"` or `"N KB"` (integer division).
pub fn format_memory(memory_kb: u64) -> String {
    if memory_kb > KB_PER_GB {
        format!("{} GB", memory_kb / KB_PER_GB)
    } else if memory_kb > KB_PER_MB {
        format!("{} MB", memory_kb / KB_PER_MB)
    } else {
        format!("{memory_kb} KB")
    }
}

#[cfg(test)]
mod tests {
    use super::format_memory;
    use rstest::rstest;

    #[rstest]
    #[case(0, "0 KB")]
    #[case(1024, "1024 KB")]
    #[case(2048, "2 MB")]
    #[case(1024 * 1024, "1024 MB")]
    #[case(3 * 1024 * 1024 + 10, "3 GB")]
    fn formats_memory_units(#[case] kb: u64, #[case] expected: &str) {
        assert_eq!(format_memory(kb), expected);
    }
}
