//! # Logging Utilities
//!
//! Rate limiting for repeated decode failures and hex dumps of received
//! packets, on top of the `log` facade.
//!
//! ## Usage
//!
//! ```rust
//! use astra_rs::util::logging::{log_packet_hex, LogThrottle};
//!
//! let mut throttle = LogThrottle::new(1000, 5); // 5 messages per second
//! if throttle.allow() {
//!     log::warn!("Checksum mismatch");
//! }
//!
//! log_packet_hex("Recv", &[0x4B, 0x00, 0x0C]);
//! ```

use std::time::Instant;

/// Throttling structure for rate-limiting log messages
///
/// A device replaying a corrupted buffer can produce a failure per packet;
/// the throttle caps how many of those reach the log per window.
#[derive(Debug)]
pub struct LogThrottle {
    /// Time window for throttling (in milliseconds)
    window_ms: u64,
    /// Maximum messages allowed per window
    cap: u32,
    /// Current message count in window
    count: u32,
    /// Start time of current window
    t0: Instant,
}

impl LogThrottle {
    /// Create new throttle with time window and message cap
    pub fn new(window_ms: u64, cap: u32) -> Self {
        Self {
            window_ms,
            cap,
            count: 0,
            t0: Instant::now(),
        }
    }

    /// Check if logging is allowed (resets counter after window expires)
    pub fn allow(&mut self) -> bool {
        let now = Instant::now();
        let elapsed_ms = now.duration_since(self.t0).as_millis() as u64;

        if elapsed_ms > self.window_ms {
            self.t0 = now;
            self.count = 0;
        }

        self.count = self.count.saturating_add(1);
        self.count <= self.cap
    }

    /// Messages counted in the current window
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Reset the throttle (start new window immediately)
    pub fn reset(&mut self) {
        self.t0 = Instant::now();
        self.count = 0;
    }
}

/// Log packet data in hex format at debug level
///
/// Output is capped so a maximum-size packet does not flood the log.
pub fn log_packet_hex(prefix: &str, data: &[u8]) {
    const MAX_LOG_BYTES: usize = 128;

    let display_data = &data[..data.len().min(MAX_LOG_BYTES)];
    let hex_str = crate::util::hex::format_hex_compact(display_data);
    let suffix = if data.len() > MAX_LOG_BYTES {
        format!(" ... ({} bytes total)", data.len())
    } else {
        String::new()
    };

    log::debug!(target: "astra::packet", "{prefix}[HEX]: {hex_str}{suffix}");
}

/// Log a warning through a throttle
#[macro_export]
macro_rules! log_warn_throttled {
    ($throttle:expr, $($arg:tt)*) => {
        if $throttle.allow() {
            log::warn!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_throttle_basic() {
        let mut throttle = LogThrottle::new(1000, 3);

        assert!(throttle.allow());
        assert!(throttle.allow());
        assert!(throttle.allow());

        assert!(!throttle.allow());
        assert_eq!(throttle.count(), 4);
    }

    #[test]
    fn test_log_throttle_reset() {
        let mut throttle = LogThrottle::new(1000, 2);

        assert!(throttle.allow());
        assert!(throttle.allow());
        assert!(!throttle.allow());

        throttle.reset();
        assert!(throttle.allow());
        assert!(throttle.allow());
        assert!(!throttle.allow());
    }

    #[test]
    fn test_log_packet_hex_long_input() {
        let data = vec![0xAAu8; 300];
        log_packet_hex("Recv", &data);
    }
}
