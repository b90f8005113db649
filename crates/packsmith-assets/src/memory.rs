//! Byte-bounded in-memory tier with oldest-first eviction.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::key::AssetKey;

pub(crate) struct MemoryTier {
    entries: HashMap<AssetKey, Arc<[u8]>>,
    order: VecDeque<AssetKey>,
    bytes: usize,
    max_bytes: usize,
}

impl MemoryTier {
    pub(crate) fn new(max_bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            bytes: 0,
            max_bytes,
        }
    }

    pub(crate) fn get(&self, key: &AssetKey) -> Option<Arc<[u8]>> {
        self.entries.get(key).cloned()
    }

    /// Insert or replace `key`. Payloads larger than the whole tier are
    /// not kept.
    pub(crate) fn insert(&mut self, key: AssetKey, data: Arc<[u8]>) {
        self.remove(&key);
        if data.len() > self.max_bytes {
            return;
        }
        while self.bytes + data.len() > self.max_bytes {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if let Some(evicted) = self.entries.remove(&oldest) {
                self.bytes -= evicted.len();
            }
        }
        self.bytes += data.len();
        self.order.push_back(key.clone());
        self.entries.insert(key, data);
    }

    pub(crate) fn remove(&mut self, key: &AssetKey) {
        if let Some(old) = self.entries.remove(key) {
            self.bytes -= old.len();
            self.order.retain(|k| k != key);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.bytes = 0;
    }

    pub(crate) const fn bytes(&self) -> usize {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(n: usize) -> Arc<[u8]> {
        vec![0u8; n].into()
    }

    #[test]
    fn evicts_oldest_first() {
        let mut tier = MemoryTier::new(10);
        tier.insert(AssetKey::model("a"), blob(4));
        tier.insert(AssetKey::model("b"), blob(4));
        tier.insert(AssetKey::model("c"), blob(4));
        assert!(tier.get(&AssetKey::model("a")).is_none());
        assert!(tier.get(&AssetKey::model("b")).is_some());
        assert_eq!(tier.bytes(), 8);
    }

    #[test]
    fn replacing_moves_entry_to_back() {
        let mut tier = MemoryTier::new(10);
        tier.insert(AssetKey::model("a"), blob(4));
        tier.insert(AssetKey::model("b"), blob(4));
        tier.insert(AssetKey::model("a"), blob(2));
        tier.insert(AssetKey::model("c"), blob(4));
        assert!(tier.get(&AssetKey::model("b")).is_none());
        assert_eq!(tier.get(&AssetKey::model("a")).unwrap().len(), 2);
        assert_eq!(tier.bytes(), 6);
    }

    #[test]
    fn oversized_payload_is_not_kept() {
        let mut tier = MemoryTier::new(4);
        tier.insert(AssetKey::texture("front"), blob(2));
        tier.insert(AssetKey::texture("back"), blob(5));
        assert_eq!(tier.bytes(), 2);
        assert!(tier.get(&AssetKey::texture("front")).is_some());
        assert!(tier.get(&AssetKey::texture("back")).is_none());
    }
}
