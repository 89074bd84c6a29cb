use dashmap::DashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};

/// Per-IP cap on login attempts over a sliding one-minute window.
/// Only failed or pending attempts count toward abuse here; every
/// attempt increments since the check runs before credentials are
/// looked at.
pub struct LoginLimiter {
    attempts: DashMap<IpAddr, (AtomicU32, AtomicI64)>,
    max_attempts_per_minute: u32,
}

impl LoginLimiter {
    pub fn new(max_attempts_per_minute: u32) -> Self {
        Self {
            attempts: DashMap::new(),
            max_attempts_per_minute,
        }
    }

    /// Record one attempt and report whether it is still within the
    /// allowance.
    pub fn check_and_increment(&self, ip: IpAddr, current_time: i64) -> bool {
        let entry = self
            .attempts
            .entry(ip)
            .or_insert_with(|| (AtomicU32::new(0), AtomicI64::new(current_time)));

        let (count, window_start) = entry.value();
        if current_time - window_start.load(Ordering::Relaxed) >= 60 {
            window_start.store(current_time, Ordering::Relaxed);
            count.store(1, Ordering::Relaxed);
            return true;
        }

        let attempts = count.fetch_add(1, Ordering::Relaxed) + 1;
        attempts <= self.max_attempts_per_minute
    }

    /// Drop windows that have fully expired, called periodically from a
    /// background task.
    pub fn cleanup_expired(&self, current_time: i64) {
        self.attempts
            .retain(|_, (_, window_start)| current_time - window_start.load(Ordering::Relaxed) < 60);
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }
}
