//! Pack cache for memoizing full layout passes.
//!
//! A host typically asks for the same layout twice per frame: once while
//! measuring (to report the panel size) and once while arranging (to position
//! children). [`PackCache`] keys each pass by a fingerprint of everything that
//! influences it, so the second request is a clone instead of a re-pack.
//!
//! # Usage
//!
//! ```
//! use fluidwrap_layout::{FluidItem, PackCache, PanelConfig, Size, pack};
//!
//! let mut cache = PackCache::new(16);
//! let items = [FluidItem::new(1, 10.0, 10.0)];
//! let config = PanelConfig::default();
//! let available = Size::new(100.0, 100.0);
//!
//! let compute = || pack(&items, &config, available);
//! let first = cache.get_or_try_compute(&items, &config, available, compute).unwrap();
//! let second = cache.get_or_try_compute(&items, &config, available, compute).unwrap();
//! assert_eq!(first, second);
//! assert_eq!(cache.stats().hits, 1);
//! ```
//!
//! # Invalidation
//!
//! Item order, item sizes, config and available size are all part of the key,
//! so drags and resizes never need explicit invalidation. Call
//! [`PackCache::invalidate_all()`] when something outside the key changes.
//!
//! The key is a fingerprint, so two different inputs can share one. Each entry
//! keeps the inputs it was computed from and a hit is only served when they
//! match bit for bit; a colliding lookup re-packs and replaces the entry.
//!
//! # Cache Eviction
//!
//! The cache uses LRU (Least Recently Used) eviction when at capacity.

use std::hash::{Hash, Hasher};

use fluidwrap_core::geometry::Size;
use rustc_hash::{FxHashMap, FxHasher};

use crate::item::FluidItem;
use crate::packer::PackResult;
use crate::{LayoutError, PanelConfig};

/// Key for pack cache lookups.
///
/// Floats are fingerprinted by their bit patterns, so `0.0` and `-0.0`
/// produce different keys.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct PackCacheKey {
    /// Number of items.
    pub item_count: usize,
    /// Hash fingerprint of item ids and desired sizes, in order.
    pub items_hash: u64,
    /// Hash fingerprint of the panel config.
    pub config_hash: u64,
    /// Available width bits.
    pub available_width: u64,
    /// Available height bits.
    pub available_height: u64,
}

impl PackCacheKey {
    /// Create a new cache key from pass parameters.
    pub fn new(items: &[FluidItem], config: &PanelConfig, available: Size) -> Self {
        Self {
            item_count: items.len(),
            items_hash: Self::hash_items(items),
            config_hash: Self::hash_config(config),
            available_width: available.width.to_bits(),
            available_height: available.height.to_bits(),
        }
    }

    fn hash_items(items: &[FluidItem]) -> u64 {
        let mut hasher = FxHasher::default();
        for item in items {
            item.id.hash(&mut hasher);
            item.desired.width.to_bits().hash(&mut hasher);
            item.desired.height.to_bits().hash(&mut hasher);
        }
        hasher.finish()
    }

    fn hash_config(config: &PanelConfig) -> u64 {
        let mut hasher = FxHasher::default();
        config.cell_width.to_bits().hash(&mut hasher);
        config.cell_height.to_bits().hash(&mut hasher);
        config.orientation.hash(&mut hasher);
        config.optimize_child_placement.hash(&mut hasher);
        // drag_scale does not affect packing.
        hasher.finish()
    }
}

#[derive(Clone, Debug)]
struct CachedPackEntry {
    result: PackResult,
    inputs: PackInputs,
    generation: u64,
    access_count: u32,
}

/// Everything a pass was computed from, compared bitwise on lookup.
#[derive(Clone, Debug)]
struct PackInputs {
    items: Vec<FluidItem>,
    config: PanelConfig,
    available: Size,
}

impl PackInputs {
    fn new(items: &[FluidItem], config: &PanelConfig, available: Size) -> Self {
        Self {
            items: items.to_vec(),
            config: *config,
            available,
        }
    }

    fn matches(&self, items: &[FluidItem], config: &PanelConfig, available: Size) -> bool {
        same_size(self.available, available)
            && self.config.cell_width.to_bits() == config.cell_width.to_bits()
            && self.config.cell_height.to_bits() == config.cell_height.to_bits()
            && self.config.orientation == config.orientation
            && self.config.optimize_child_placement == config.optimize_child_placement
            && self.items.len() == items.len()
            && self
                .items
                .iter()
                .zip(items)
                .all(|(a, b)| a.id == b.id && same_size(a.desired, b.desired))
    }
}

fn same_size(a: Size, b: Size) -> bool {
    a.width.to_bits() == b.width.to_bits() && a.height.to_bits() == b.height.to_bits()
}

/// Statistics about pack cache performance.
#[derive(Debug, Clone, Default)]
pub struct PackCacheStats {
    /// Number of entries currently in the cache.
    pub entries: usize,
    /// Total cache hits since creation or last reset.
    pub hits: u64,
    /// Total cache misses since creation or last reset.
    pub misses: u64,
    /// Hit rate as a fraction (0.0 to 1.0).
    pub hit_rate: f64,
}

/// Cache for full layout passes.
///
/// # Generation-Based Invalidation
///
/// Each entry is tagged with a generation number. Calling [`invalidate_all()`]
/// bumps the generation, making all existing entries stale.
///
/// [`invalidate_all()`]: PackCache::invalidate_all
#[derive(Debug)]
pub struct PackCache {
    entries: FxHashMap<PackCacheKey, CachedPackEntry>,
    generation: u64,
    max_entries: usize,
    hits: u64,
    misses: u64,
}

impl PackCache {
    /// Create a new cache with the specified maximum capacity.
    #[inline]
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: FxHashMap::with_capacity_and_hasher(max_entries, Default::default()),
            generation: 0,
            max_entries: max_entries.max(1),
            hits: 0,
            misses: 0,
        }
    }

    /// Get the cached pass for these inputs or run `compute` and cache its
    /// result.
    ///
    /// `compute` must pack exactly `items`, `config` and `available`. Errors
    /// are returned as-is and never cached.
    pub fn get_or_try_compute<F>(
        &mut self,
        items: &[FluidItem],
        config: &PanelConfig,
        available: Size,
        compute: F,
    ) -> Result<PackResult, LayoutError>
    where
        F: FnOnce() -> Result<PackResult, LayoutError>,
    {
        let key = PackCacheKey::new(items, config, available);
        self.lookup_or_compute(key, items, config, available, compute)
    }

    fn lookup_or_compute<F>(
        &mut self,
        key: PackCacheKey,
        items: &[FluidItem],
        config: &PanelConfig,
        available: Size,
        compute: F,
    ) -> Result<PackResult, LayoutError>
    where
        F: FnOnce() -> Result<PackResult, LayoutError>,
    {
        if let Some(entry) = self.entries.get_mut(&key)
            && entry.generation == self.generation
            && entry.inputs.matches(items, config, available)
        {
            self.hits += 1;
            entry.access_count = entry.access_count.saturating_add(1);
            return Ok(entry.result.clone());
        }

        self.misses += 1;
        let result = compute()?;

        if self.entries.len() >= self.max_entries && !self.entries.contains_key(&key) {
            self.evict_lru();
        }
        self.entries.insert(
            key,
            CachedPackEntry {
                result: result.clone(),
                inputs: PackInputs::new(items, config, available),
                generation: self.generation,
                access_count: 1,
            },
        );

        Ok(result)
    }

    /// Invalidate all entries by bumping the generation.
    ///
    /// This is an O(1) operation - entries are not immediately removed.
    #[inline]
    pub fn invalidate_all(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Get current cache statistics.
    pub fn stats(&self) -> PackCacheStats {
        let total = self.hits + self.misses;
        PackCacheStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
            hit_rate: if total > 0 {
                self.hits as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    /// Reset statistics counters to zero.
    #[inline]
    pub fn reset_stats(&mut self) {
        self.hits = 0;
        self.misses = 0;
    }

    /// Clear all entries from the cache.
    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    /// Returns the current number of entries in the cache.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the maximum capacity of the cache.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    fn evict_lru(&mut self) {
        let generation = self.generation;
        // Stale generations go first, then the least used entry.
        if let Some(key) = self
            .entries
            .iter()
            .min_by_key(|(_, e)| (e.generation == generation, e.access_count))
            .map(|(k, _)| *k)
        {
            self.entries.remove(&key);
        }
    }
}

impl Default for PackCache {
    /// Creates a cache with default capacity of 16 entries.
    fn default() -> Self {
        Self::new(16)
    }
}
