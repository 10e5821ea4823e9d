use std::collections::HashMap;

/// Fetch targets whose responses may arrive out of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestSlot {
    VmsTypes,
    VmsConfigs,
    Rules,
    FieldAnalysis,
    UnifiedAnalysis,
    Cameras,
}

/// Identifies one issued fetch. Later tokens compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

/// Per-slot request tokens. A response is applied only if its token is still the latest
/// issued for its slot.
#[derive(Debug, Default)]
pub struct RequestTokens {
    next: u64,
    latest: HashMap<RequestSlot, RequestToken>,
}

impl RequestTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, slot: RequestSlot) -> RequestToken {
        self.next += 1;
        let token = RequestToken(self.next);
        self.latest.insert(slot, token);
        tracing::debug!("Issued request token {} for {:?}", self.next, slot);
        token
    }

    pub fn is_current(&self, slot: RequestSlot, token: RequestToken) -> bool {
        self.latest.get(&slot) == Some(&token)
    }

    /// Returns `Some(value)` when `token` is current, logging and dropping it otherwise.
    pub fn accept<T>(&self, slot: RequestSlot, token: RequestToken, value: T) -> Option<T> {
        if self.is_current(slot, token) {
            Some(value)
        } else {
            tracing::warn!("Discarding stale {:?} response (token {})", slot, token.0);
            None
        }
    }
}
