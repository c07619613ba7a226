use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::registry::lock;

pub const LOG_CAPACITY: usize = 10_000;

/// Per-session log retained for the client.
///
/// Every entry is forwarded to `tracing`; entries at or below the session
/// level are also kept in a ring buffer of [`LOG_CAPACITY`] lines that the
/// client drains with `getLog`. Lower levels are more important.
#[derive(Debug)]
pub struct Logger {
    level: AtomicI32,
    lines: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl Logger {
    pub fn new(level: i32) -> Self {
        Self::with_capacity(level, LOG_CAPACITY)
    }

    pub fn with_capacity(level: i32, capacity: usize) -> Self {
        Self {
            level: AtomicI32::new(level),
            lines: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn level(&self) -> i32 {
        self.level.load(Ordering::Relaxed)
    }

    pub fn set_level(&self, level: i32) {
        self.level.store(level, Ordering::Relaxed);
    }

    pub fn log(&self, level: i32, tag: &str, message: impl AsRef<str>) {
        let message = message.as_ref();

        match level {
            i32::MIN..=0 => tracing::error!(tag, "{message}"),
            1 => tracing::warn!(tag, "{message}"),
            2 => tracing::info!(tag, "{message}"),
            3 => tracing::debug!(tag, "{message}"),
            _ => tracing::trace!(tag, "{message}"),
        }

        if level > self.level() {
            return;
        }

        let mut lines = lock(&self.lines);
        if lines.len() >= self.capacity {
            lines.pop_front();
        }
        lines.push_back(format!("{tag}: {message}"));
    }

    /// Retained lines joined by newlines, oldest first.
    pub fn get_log(&self, clear: bool) -> String {
        let mut lines = lock(&self.lines);
        let text = lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n");
        if clear {
            lines.clear();
        }
        text
    }

    pub fn len(&self) -> usize {
        lock(&self.lines).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_above_level_are_not_retained() {
        let logger = Logger::new(1);
        logger.log(0, "proto", "kept");
        logger.log(1, "proto", "kept too");
        logger.log(2, "proto", "dropped");

        assert_eq!(logger.get_log(false), "proto: kept\nproto: kept too");
    }

    #[test]
    fn level_change_applies_to_later_entries() {
        let logger = Logger::new(0);
        logger.log(3, "view", "before");
        logger.set_level(3);
        logger.log(3, "view", "after");

        assert_eq!(logger.level(), 3);
        assert_eq!(logger.get_log(false), "view: after");
    }

    #[test]
    fn clear_drains_the_buffer() {
        let logger = Logger::new(5);
        logger.log(0, "a", "one");
        assert_eq!(logger.get_log(true), "a: one");
        assert!(logger.is_empty());
        assert_eq!(logger.get_log(false), "");
    }

    #[test]
    fn ring_buffer_keeps_newest_entries() {
        let logger = Logger::with_capacity(0, 3);
        for i in 0..5 {
            logger.log(0, "t", format!("{i}"));
        }
        assert_eq!(logger.len(), 3);
        assert_eq!(logger.get_log(false), "t: 2\nt: 3\nt: 4");
    }

    #[test]
    fn default_capacity_is_bounded() {
        let logger = Logger::new(0);
        for i in 0..(LOG_CAPACITY + 5) {
            logger.log(0, "t", format!("{i}"));
        }
        assert_eq!(logger.len(), LOG_CAPACITY);
    }
}
