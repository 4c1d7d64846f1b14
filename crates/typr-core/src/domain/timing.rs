use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Pause inserted between the press and release of a tap, in microseconds.
///
/// Zero disables the pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyDelay(u32);

impl KeyDelay {
    pub const DEFAULT_MICROS: u32 = 1000;
    pub const ZERO: KeyDelay = KeyDelay(0);

    pub const fn from_micros(micros: u32) -> Self {
        KeyDelay(micros)
    }

    pub const fn as_micros(self) -> u32 {
        self.0
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_micros(u64::from(self.0))
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Blocks the calling thread for the delay.  Returns immediately when
    /// the delay is zero.
    pub fn pause(self) {
        if !self.is_zero() {
            thread::sleep(self.as_duration());
        }
    }
}

impl Default for KeyDelay {
    fn default() -> Self {
        KeyDelay(Self::DEFAULT_MICROS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_one_millisecond() {
        assert_eq!(KeyDelay::default().as_micros(), 1000);
        assert_eq!(KeyDelay::default().as_duration(), Duration::from_millis(1));
    }

    #[test]
    fn test_zero_delay_does_not_sleep() {
        let start = std::time::Instant::now();
        KeyDelay::ZERO.pause();
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
