use std::sync::{Mutex, PoisonError};

/// Round-robin assignment of proxy slots to requests
///
/// Slots index into the executor's per-proxy HTTP clients. The cursor sits
/// behind a mutex so concurrent retries never race on the same slot update.
#[derive(Debug)]
pub struct ProxyPool {
    endpoints: Vec<String>,
    rotate: bool,
    cursor: Mutex<usize>,
}

impl ProxyPool {
    pub fn new(endpoints: Vec<String>, rotate: bool) -> Self {
        Self {
            endpoints,
            rotate,
            cursor: Mutex::new(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Endpoint URL of a slot, for logging
    pub fn endpoint(&self, slot: usize) -> Option<&str> {
        self.endpoints.get(slot).map(String::as_str)
    }

    /// Picks the slot for the next attempt of a request
    ///
    /// `previous` is the slot the request's last attempt used. A retry always
    /// moves to a different slot when more than one exists. First attempts
    /// round-robin when rotation is enabled and stay on slot 0 otherwise.
    /// Returns `None` for direct connections.
    pub fn assign(&self, previous: Option<usize>) -> Option<usize> {
        let len = self.endpoints.len();
        if len == 0 {
            return None;
        }
        if previous.is_none() && !self.rotate {
            return Some(0);
        }

        let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        let mut slot = *cursor % len;
        if previous == Some(slot) && len > 1 {
            slot = (slot + 1) % len;
        }
        *cursor = slot + 1;
        Some(slot)
    }
}
