use std::time::SystemTime;

pub trait SystemTimeExt {
    /// Milliseconds since the Unix epoch, saturating at zero for clocks
    /// that report a pre-epoch time.
    fn to_unix_millis(&self) -> u64;
}

impl SystemTimeExt for SystemTime {
    fn to_unix_millis(&self) -> u64 {
        self.duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}
