use sysinfo::System;
use tracing::info;

/// Hardware threads are divided by this to leave room for the rest of the process.
pub const DEFAULT_DIVISOR: usize = 4;

/// Default degree of parallelism for fill requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParallelismConfig {
    pub max_parallelism: usize,
    pub hardware_threads: usize,
    pub divisor: usize,
}

impl ParallelismConfig {
    /// Derive the default from the machine's logical CPU count.
    ///
    /// `max_parallelism = max(1, hardware_threads / divisor)`. A zero divisor is
    /// treated as 1.
    pub fn calculate(divisor: usize) -> Self {
        let hardware_threads = detect_hardware_threads();
        let config = Self::from_hardware(hardware_threads, divisor);

        info!(
            hardware_threads = config.hardware_threads,
            divisor = config.divisor,
            max_parallelism = config.max_parallelism,
            "Parallelism configured"
        );

        config
    }

    pub fn from_hardware(hardware_threads: usize, divisor: usize) -> Self {
        let divisor = divisor.max(1);
        Self {
            max_parallelism: (hardware_threads / divisor).max(1),
            hardware_threads,
            divisor,
        }
    }

    /// Explicit value, for tests or callers that know their budget.
    pub fn fixed(max_parallelism: usize) -> Self {
        let max_parallelism = max_parallelism.max(1);
        Self {
            max_parallelism,
            hardware_threads: max_parallelism,
            divisor: 1,
        }
    }
}

impl Default for ParallelismConfig {
    fn default() -> Self {
        Self::calculate(DEFAULT_DIVISOR)
    }
}

fn detect_hardware_threads() -> usize {
    let mut sys = System::new();
    sys.refresh_cpu_all();
    let cpus = sys.cpus().len();
    if cpus > 0 {
        return cpus;
    }
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divisor_scales_down() {
        let config = ParallelismConfig::from_hardware(16, 4);
        assert_eq!(config.max_parallelism, 4);
        assert_eq!(config.hardware_threads, 16);
    }

    #[test]
    fn test_small_machine_still_gets_one_worker() {
        assert_eq!(ParallelismConfig::from_hardware(2, 4).max_parallelism, 1);
        assert_eq!(ParallelismConfig::from_hardware(0, 4).max_parallelism, 1);
    }

    #[test]
    fn test_zero_divisor_is_clamped() {
        let config = ParallelismConfig::from_hardware(8, 0);
        assert_eq!(config.divisor, 1);
        assert_eq!(config.max_parallelism, 8);
    }

    #[test]
    fn test_calculate_detects_hardware() {
        let config = ParallelismConfig::calculate(DEFAULT_DIVISOR);
        assert!(config.hardware_threads >= 1);
        assert!(config.max_parallelism >= 1);
        assert!(config.max_parallelism <= config.hardware_threads.max(1));
    }

    #[test]
    fn test_fixed() {
        assert_eq!(ParallelismConfig::fixed(3).max_parallelism, 3);
        assert_eq!(ParallelismConfig::fixed(0).max_parallelism, 1);
    }
}
