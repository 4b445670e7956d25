// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Deferred pass maintenance.
//!
//! Structural changes to a pass (its index or its first texture units)
//! change the sort key used by render queues. Recomputing that key eagerly
//! would race with queues that are currently sorted by the old key, so
//! changed passes are only *marked* here and their hashes are recomputed in
//! one sweep per frame. Deleted passes follow the same rhythm: they are
//! parked in a graveyard and dropped by the next sweep.

use crate::pass::Pass;
use ahash::AHashSet;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Identifies a pass for the lifetime of its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PassId(u32);

impl PassId {
    /// Returns the raw id.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Default)]
struct RegistryState {
    next_id: u32,
    dirty: AHashSet<PassId>,
    graveyard: Vec<Pass>,
}

/// Dirty-hash and graveyard bookkeeping for every pass of one manager.
///
/// All state sits behind a single lock so that marking, queueing and the
/// per-frame sweep are mutually exclusive.
#[derive(Default)]
pub struct PassRegistry {
    state: Mutex<RegistryState>,
}

impl PassRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn allocate_id(&self) -> PassId {
        let mut state = self.lock();
        let id = PassId(state.next_id);
        state.next_id += 1;
        id
    }

    /// Marks the pass as needing a hash recomputation.
    pub fn mark_dirty(&self, id: PassId) {
        self.lock().dirty.insert(id);
    }

    /// Returns `true` if the pass is waiting for a hash recomputation.
    pub fn is_dirty(&self, id: PassId) -> bool {
        self.lock().dirty.contains(&id)
    }

    /// Number of passes waiting for a hash recomputation.
    pub fn dirty_count(&self) -> usize {
        self.lock().dirty.len()
    }

    /// Number of passes waiting to be dropped.
    pub fn graveyard_len(&self) -> usize {
        self.lock().graveyard.len()
    }

    /// Retires a pass.
    ///
    /// Its texture units are released immediately; the pass itself is
    /// dropped by the next [`PassRegistry::process_pending_updates`].
    pub fn queue_for_deletion(&self, mut pass: Pass) {
        pass.remove_all_texture_unit_states();
        let mut state = self.lock();
        state.dirty.remove(&pass.id());
        state.graveyard.push(pass);
    }

    /// Drops every retired pass without touching the dirty set.
    ///
    /// Retired passes hold the context that owns this registry, so the
    /// graveyard must be emptied before the context's last owner goes away.
    pub fn clear_graveyard(&self) {
        let retired = std::mem::take(&mut self.lock().graveyard);
        if !retired.is_empty() {
            log::trace!("Dropped {} retired passes", retired.len());
        }
        drop(retired);
    }

    /// Runs the per-frame sweep.
    ///
    /// Drops every retired pass, recomputes the hash of each pass in
    /// `live_passes` that is still marked dirty and clears the dirty set.
    /// Must run after all pass mutations of the frame and before anything
    /// sorts by pass hash.
    pub fn process_pending_updates<'p>(&self, live_passes: impl IntoIterator<Item = &'p mut Pass>) {
        let retired = {
            let mut state = self.lock();
            let retired = std::mem::take(&mut state.graveyard);
            let mut recalculated = 0usize;
            if !state.dirty.is_empty() {
                for pass in live_passes {
                    if state.dirty.contains(&pass.id()) {
                        pass.recalculate_hash();
                        recalculated += 1;
                    }
                }
            }
            log::trace!(
                "Pass sweep: {} dirty ({} live recalculated), {} retired",
                state.dirty.len(),
                recalculated,
                retired.len()
            );
            state.dirty.clear();
            retired
        };
        drop(retired);
    }
}

impl fmt::Debug for PassRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("PassRegistry")
            .field("next_id", &state.next_id)
            .field("dirty", &state.dirty.len())
            .field("graveyard", &state.graveyard.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::context::MaterialContext;
    use crate::pass::Pass;
    use std::sync::Arc;

    #[test]
    fn test_ids_are_unique() {
        let context = Arc::new(MaterialContext::default());
        let a = Pass::new(context.clone(), 0);
        let b = Pass::new(context.clone(), 0);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_sweep_recalculates_dirty_hashes() {
        let context = Arc::new(MaterialContext::default());
        let mut pass = Pass::new(context.clone(), 0);
        pass.create_texture_unit_state("rock.png");
        let before = pass.hash();
        assert!(context.passes.is_dirty(pass.id()));

        context.passes.process_pending_updates([&mut pass]);
        assert!(!context.passes.is_dirty(pass.id()));
        assert_ne!(pass.hash(), before);
        assert_eq!(context.passes.dirty_count(), 0);
    }

    #[test]
    fn test_queue_for_deletion_strips_units_and_clears_dirty() {
        let context = Arc::new(MaterialContext::default());
        let mut pass = Pass::new(context.clone(), 0);
        pass.create_texture_unit_state("a.png");
        let id = pass.id();
        context.passes.queue_for_deletion(pass);

        assert!(!context.passes.is_dirty(id));
        assert_eq!(context.passes.graveyard_len(), 1);

        context.passes.process_pending_updates(std::iter::empty());
        assert_eq!(context.passes.graveyard_len(), 0);
    }

    #[test]
    fn test_frame_advance_marks_pass_dirty() {
        let context = Arc::new(MaterialContext::default());
        let mut pass = Pass::new(context.clone(), 0);
        pass.create_texture_unit_state("")
            .set_animated_texture_name("fire.png", 4, 1.0)
            .unwrap();
        context.passes.process_pending_updates([&mut pass]);
        let before = pass.hash();

        pass.update_effects(0.6);
        assert_eq!(pass.texture_unit_state(0).unwrap().texture_name(), "fire_2.png");
        assert!(context.passes.is_dirty(pass.id()));

        context.passes.process_pending_updates([&mut pass]);
        assert_ne!(pass.hash(), before);
    }

    #[test]
    fn test_same_frame_leaves_pass_clean() {
        let context = Arc::new(MaterialContext::default());
        let mut pass = Pass::new(context.clone(), 0);
        pass.create_texture_unit_state("")
            .set_animated_texture_name("fire.png", 4, 1.0)
            .unwrap();
        context.passes.process_pending_updates([&mut pass]);

        pass.update_effects(0.1);
        assert!(!context.passes.is_dirty(pass.id()));
    }

    #[test]
    fn test_clear_graveyard_releases_context() {
        let context = Arc::new(MaterialContext::default());
        let pass = Pass::new(context.clone(), 0);
        context.passes.queue_for_deletion(pass);
        assert_eq!(Arc::strong_count(&context), 2);

        context.passes.clear_graveyard();
        assert_eq!(context.passes.graveyard_len(), 0);
        assert_eq!(Arc::strong_count(&context), 1);
    }
}
