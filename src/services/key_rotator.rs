use crate::error::{Error, Result};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Round-robin pool of Gemini API keys.
///
/// The cursor advances on every `next_key` call, whether or not the request
/// it serves ends up succeeding, so consecutive requests spread across the
/// pool. The rotator is shared process-wide behind an `Arc`; concurrent
/// callers interleave and must not assume which key a given call receives.
#[derive(Debug)]
pub struct KeyRotator {
    keys: Vec<String>,
    cursor: AtomicUsize,
}

impl KeyRotator {
    pub fn new(keys: Vec<String>) -> Result<Self> {
        if keys.is_empty() {
            return Err(Error::Config(
                "Gemini API key pool must not be empty".to_string(),
            ));
        }
        Ok(Self {
            keys,
            cursor: AtomicUsize::new(0),
        })
    }

    pub fn next_key(&self) -> &str {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.keys.len();
        &self.keys[index]
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
