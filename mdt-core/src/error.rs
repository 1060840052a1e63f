//! Error taxonomy for the tracking core.
//!
//! None of these are fatal. [`crate::Console::handle`] logs every error at
//! the level given by [`ConsoleError::level`] and leaves its state untouched,
//! so the console stays usable after any single bad event.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    /// Required field missing or malformed (e.g. empty plate text)
    #[error("invalid event: {0}")]
    InvalidEvent(String),

    /// Unrecognised event discriminator
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// Operation on a plate or lane that is not tracked
    #[error("lookup miss: {0}")]
    LookupMiss(String),
}

impl ConsoleError {
    /// Log level used when the console absorbs this error
    pub fn level(&self) -> log::Level {
        match self {
            ConsoleError::InvalidEvent(_) => log::Level::Warn,
            ConsoleError::UnknownAction(_) => log::Level::Debug,
            ConsoleError::LookupMiss(_) => log::Level::Debug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let e = ConsoleError::InvalidEvent("scan without plate".into());
        assert_eq!(e.to_string(), "invalid event: scan without plate");

        let e = ConsoleError::UnknownAction("HONK".into());
        assert_eq!(e.to_string(), "unknown action: HONK");
    }

    #[test]
    fn test_levels() {
        assert_eq!(
            ConsoleError::InvalidEvent(String::new()).level(),
            log::Level::Warn
        );
        assert_eq!(
            ConsoleError::LookupMiss(String::new()).level(),
            log::Level::Debug
        );
    }
}
