use log::{debug, info, warn};

/// Thin wrapper over the `log` facade that pins every record to one target.
pub struct LogManager {
    target: &'static str,
}

impl LogManager {
    pub fn new() -> Self {
        Self::with_target("tracker")
    }

    pub fn with_target(target: &'static str) -> Self {
        Self { target }
    }

    pub fn record(&self, message: &str) {
        info!(target: self.target, "{}", message);
    }

    pub fn detail(&self, message: &str) {
        debug!(target: self.target, "{}", message);
    }

    pub fn warn(&self, message: &str) {
        warn!(target: self.target, "{}", message);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}
