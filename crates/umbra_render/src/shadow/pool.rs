//! Shadow Map Pool
//!
//! Backend-agnostic shadow map allocation tracking. This module manages
//! which lights have depth layers allocated and where, but does not
//! create GPU resources directly.
//!
//! # Pool Organization
//!
//! The shadow pool is a 2D depth texture array where each layer holds one
//! shadow view. A spot light uses one layer, a point light six, and a
//! directional light one per cascade. Layers are allocated at light
//! creation and stay fixed for the allocation's lifetime, so per-frame
//! matrix updates never move depth data.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use super::transform::CUBE_FACE_COUNT;

/// Unique identifier for a light (entity ID or similar)
pub type LightId = u64;

/// Shadow map pool allocation manager
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShadowMapPool {
    /// Layer size (width = height = size)
    pub size: u32,

    /// Number of layers in the pool
    pub layer_count: u32,

    /// Active allocations (light ID -> allocation)
    allocations: BTreeMap<LightId, ShadowAllocation>,

    /// Free layer indices (stack, pop from end)
    free_layers: Vec<u32>,

    /// Statistics
    stats: PoolStats,
}

impl ShadowMapPool {
    /// Create a new shadow map pool manager
    pub fn new(size: u32, layer_count: u32) -> Self {
        // Stack: push 0, 1, 2, 3 -> pop returns 3, 2, 1, 0
        let free_layers = (0..layer_count).collect();

        Self {
            size,
            layer_count,
            allocations: BTreeMap::new(),
            free_layers,
            stats: PoolStats::default(),
        }
    }

    /// Allocate shadow layers for a light
    ///
    /// `view_count` is 1 for spot lights, 6 for point lights, and the
    /// cascade count for directional lights. Returns None if the pool
    /// does not have enough free layers. An existing allocation with at
    /// least `view_count` views is reused.
    pub fn allocate(
        &mut self,
        light_id: LightId,
        view_count: u32,
        resolution: u32,
    ) -> Option<ShadowAllocation> {
        let view_count = view_count.clamp(1, CUBE_FACE_COUNT as u32);

        if let Some(alloc) = self.allocations.get(&light_id) {
            if alloc.view_count >= view_count {
                return Some(alloc.clone());
            }
            // Needs more views: release and reallocate.
            self.deallocate(light_id);
        }

        if self.free_layers.len() < view_count as usize {
            log::warn!(
                "shadow pool exhausted: light {} requested {} layers, {} free",
                light_id,
                view_count,
                self.free_layers.len()
            );
            return None;
        }

        let mut layers = [0u32; CUBE_FACE_COUNT];
        for slot in layers.iter_mut().take(view_count as usize) {
            *slot = self.free_layers.pop()?;
        }

        let alloc = ShadowAllocation {
            light_id,
            resolution: resolution.min(self.size),
            view_count,
            layers,
        };

        self.allocations.insert(light_id, alloc.clone());
        self.stats.total_allocations += 1;
        self.stats.peak_layers_in_use = self
            .stats
            .peak_layers_in_use
            .max(self.layer_count - self.free_layers.len() as u32);

        Some(alloc)
    }

    /// Deallocate a light's shadow layers
    pub fn deallocate(&mut self, light_id: LightId) -> bool {
        if let Some(alloc) = self.allocations.remove(&light_id) {
            for i in 0..alloc.view_count as usize {
                self.free_layers.push(alloc.layers[i]);
            }
            true
        } else {
            false
        }
    }

    /// Get allocation for a light
    pub fn get(&self, light_id: LightId) -> Option<&ShadowAllocation> {
        self.allocations.get(&light_id)
    }

    /// Check if a light has an allocation
    pub fn contains(&self, light_id: LightId) -> bool {
        self.allocations.contains_key(&light_id)
    }

    /// Get number of allocated lights
    pub fn allocated_count(&self) -> usize {
        self.allocations.len()
    }

    /// Get number of free layers
    pub fn free_count(&self) -> usize {
        self.free_layers.len()
    }

    /// Check if the pool is full
    pub fn is_full(&self) -> bool {
        self.free_layers.is_empty()
    }

    /// Get utilization ratio (0-1)
    pub fn utilization(&self) -> f32 {
        if self.layer_count == 0 {
            return 0.0;
        }
        1.0 - (self.free_layers.len() as f32 / self.layer_count as f32)
    }

    /// Get pool statistics
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    /// Get all allocations (for GPU buffer updates)
    pub fn allocations(&self) -> impl Iterator<Item = &ShadowAllocation> {
        self.allocations.values()
    }

    /// Reset the pool (clears all allocations)
    pub fn reset(&mut self) {
        self.allocations.clear();
        self.free_layers = (0..self.layer_count).collect();
        self.stats = PoolStats::default();
    }

    /// Resize the pool (clears all allocations)
    pub fn resize(&mut self, new_size: u32, new_layer_count: u32) {
        self.size = new_size;
        self.layer_count = new_layer_count;
        self.reset();
    }
}

impl Default for ShadowMapPool {
    fn default() -> Self {
        Self::new(2048, 16)
    }
}

/// Shadow layer allocation for one light
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShadowAllocation {
    /// Light entity that owns this allocation
    pub light_id: LightId,

    /// Resolution for this light's shadow views
    pub resolution: u32,

    /// Number of views (1 spot, 6 point, 1-4 cascades)
    pub view_count: u32,

    /// Layer index for each view (only the first `view_count` are valid)
    pub layers: [u32; CUBE_FACE_COUNT],
}

/// Pool statistics
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PoolStats {
    /// Total allocations ever made
    pub total_allocations: u64,

    /// Highest number of layers in use at once
    pub peak_layers_in_use: u32,
}

/// Shadow pool state for hot-reload
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShadowMapPoolState {
    /// Layer size
    pub size: u32,

    /// Layer count
    pub layer_count: u32,

    /// Current allocations
    pub allocations: BTreeMap<LightId, ShadowAllocation>,
}

impl ShadowMapPool {
    /// Serialize state for hot-reload
    pub fn save_state(&self) -> ShadowMapPoolState {
        ShadowMapPoolState {
            size: self.size,
            layer_count: self.layer_count,
            allocations: self.allocations.clone(),
        }
    }

    /// Restore state from hot-reload
    pub fn restore_state(&mut self, state: ShadowMapPoolState) {
        self.size = state.size;
        self.layer_count = state.layer_count;
        self.allocations = state.allocations;

        // Rebuild free list from the restored allocations.
        self.free_layers = (0..self.layer_count)
            .filter(|layer| {
                !self.allocations.values().any(|a| {
                    (0..a.view_count as usize).any(|i| a.layers[i] == *layer)
                })
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_allocation() {
        let mut pool = ShadowMapPool::new(2048, 4);

        let alloc = pool.allocate(1, 1, 2048).unwrap();
        assert_eq!(alloc.layers[0], 3); // Stack pops from end
        assert_eq!(alloc.resolution, 2048);

        let alloc = pool.allocate(2, 1, 2048).unwrap();
        assert_eq!(alloc.layers[0], 2);

        assert_eq!(pool.allocated_count(), 2);
        assert_eq!(pool.free_count(), 2);
    }

    #[test]
    fn test_pool_reuse() {
        let mut pool = ShadowMapPool::new(2048, 4);

        let alloc1 = pool.allocate(1, 1, 2048).unwrap();
        let layer = alloc1.layers[0];

        // Allocating the same light reuses its layers.
        let alloc2 = pool.allocate(1, 1, 2048).unwrap();
        assert_eq!(alloc2.layers[0], layer);
        assert_eq!(pool.allocated_count(), 1);
    }

    #[test]
    fn test_pool_full() {
        let mut pool = ShadowMapPool::new(2048, 2);

        pool.allocate(1, 1, 2048).unwrap();
        pool.allocate(2, 1, 2048).unwrap();
        assert!(pool.allocate(3, 1, 2048).is_none());
        assert!(pool.is_full());
    }

    #[test]
    fn test_pool_deallocate() {
        let mut pool = ShadowMapPool::new(2048, 2);

        pool.allocate(1, 1, 2048);
        pool.allocate(2, 1, 2048);
        assert!(pool.is_full());

        pool.deallocate(1);
        assert!(!pool.is_full());
        assert_eq!(pool.allocated_count(), 1);

        // Can allocate again
        pool.allocate(3, 1, 2048).unwrap();
    }

    #[test]
    fn test_point_light_allocation() {
        let mut pool = ShadowMapPool::new(2048, 8);

        let alloc = pool.allocate(1, 6, 1024).unwrap();
        assert_eq!(alloc.view_count, 6);
        assert_eq!(pool.free_count(), 2);

        // All six layers are distinct.
        for i in 0..6 {
            for j in (i + 1)..6 {
                assert_ne!(alloc.layers[i], alloc.layers[j]);
            }
        }
    }

    #[test]
    fn test_point_light_partial_pool() {
        let mut pool = ShadowMapPool::new(2048, 4);

        // Six views do not fit in four layers; nothing is consumed.
        assert!(pool.allocate(1, 6, 1024).is_none());
        assert_eq!(pool.free_count(), 4);
    }

    #[test]
    fn test_grow_allocation() {
        let mut pool = ShadowMapPool::new(2048, 8);

        pool.allocate(1, 2, 2048).unwrap();
        assert_eq!(pool.free_count(), 6);

        // Same light asks for more views: old layers are released first.
        let alloc = pool.allocate(1, 4, 2048).unwrap();
        assert_eq!(alloc.view_count, 4);
        assert_eq!(pool.free_count(), 4);
    }

    #[test]
    fn test_utilization() {
        let mut pool = ShadowMapPool::new(2048, 4);

        assert_eq!(pool.utilization(), 0.0);

        pool.allocate(1, 1, 2048);
        assert!((pool.utilization() - 0.25).abs() < 0.01);

        pool.allocate(2, 1, 2048);
        assert!((pool.utilization() - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_resolution_clamping() {
        let mut pool = ShadowMapPool::new(2048, 4);

        // Request higher resolution than the pool layer size
        let alloc = pool.allocate(1, 1, 4096).unwrap();
        assert_eq!(alloc.resolution, 2048);
    }

    #[test]
    fn test_state_save_restore() {
        let mut pool = ShadowMapPool::new(2048, 8);
        pool.allocate(1, 4, 2048);
        pool.allocate(2, 1, 1024);

        let state = pool.save_state();

        // Create a new pool with different config and restore
        let mut restored = ShadowMapPool::new(1024, 4);
        restored.restore_state(state);

        assert_eq!(restored.size, 2048);
        assert_eq!(restored.layer_count, 8);
        assert!(restored.contains(1));
        assert!(restored.contains(2));
        assert_eq!(restored.get(1).unwrap().view_count, 4);
        assert_eq!(restored.free_count(), 3);
    }

    #[test]
    fn test_stats() {
        let mut pool = ShadowMapPool::new(2048, 8);

        pool.allocate(1, 6, 1024);
        pool.allocate(2, 1, 2048);
        pool.deallocate(1);

        assert_eq!(pool.stats().total_allocations, 2);
        assert_eq!(pool.stats().peak_layers_in_use, 7);
    }
}
