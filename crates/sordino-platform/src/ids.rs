//! Identifier newtypes

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Platform-assigned tab identifier. Opaque to the core; the unique key
/// into the session store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TabId(pub u32);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a captured audio stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamId(Uuid);

impl StreamId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StreamId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_id_serde() {
        let tab = TabId(42);
        let json = serde_json::to_string(&tab).unwrap();
        assert_eq!(json, "42");
        let back: TabId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tab);
    }

    #[test]
    fn test_stream_ids_unique() {
        assert_ne!(StreamId::new(), StreamId::new());
    }
}
