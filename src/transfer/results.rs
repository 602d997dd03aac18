//! Transfer result types
//!
//! Defines the summary reported when a transfer finishes.

use std::time::Duration;

/// Bytes moved and time taken by one RETR/STOR
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferSummary {
    pub bytes: u64,
    pub elapsed: Duration,
}

impl TransferSummary {
    /// Throughput in kilobytes per second, absent when nothing was timed.
    pub fn rate_kbps(&self) -> Option<f64> {
        let ms = self.elapsed.as_millis();
        if ms == 0 || self.bytes == 0 {
            return None;
        }
        Some(self.bytes as f64 / ms as f64)
    }

    /// Completion reply sent on the control channel.
    pub fn reply(&self) -> String {
        match self.rate_kbps() {
            Some(rate) => format!(
                "226-File successfully transferred\r\n226 {} bytes in {} ms, {:.2} kbytes/s",
                self.bytes,
                self.elapsed.as_millis(),
                rate
            ),
            None => "226 File successfully transferred".to_string(),
        }
    }
}
