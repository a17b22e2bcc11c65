// src/variant_cache.rs
//! Memoized static variant selection.
//! - Keyed by `VariantKey`; filled lazily on first encounter
//! - LRU bound so rarely used keys fall out
//! - Shared between materials behind one `Arc`
//! - Misses against the registry are never cached: a fatal lookup stays fatal

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use crate::error::Result;
use crate::variant::{select_variant, PermutationRegistry, SelectedVariant, VariantKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VariantCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

pub struct VariantCache {
    registry: Arc<dyn PermutationRegistry>,
    entries: Mutex<LruCache<VariantKey, SelectedVariant>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl VariantCache {
    pub fn new(registry: Arc<dyn PermutationRegistry>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            registry,
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn select(&self, key: &VariantKey) -> Result<SelectedVariant> {
        if let Some(hit) = self.entries.lock().get(key).copied() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(hit);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let selected = select_variant(key, self.registry.as_ref())?;
        log::debug!(
            "compiled variant [{}] -> combo {} ({:016x})",
            key,
            selected.permutation.combo,
            selected.permutation.fingerprint
        );
        self.entries.lock().put(*key, selected);
        Ok(selected)
    }

    /// Drop every cached selection, e.g. after a shader reload.
    pub fn invalidate(&self) {
        self.entries.lock().clear();
    }

    pub fn stats(&self) -> VariantCacheStats {
        VariantCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.lock().len(),
        }
    }
}
