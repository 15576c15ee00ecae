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

//! Internal entity slot allocation.

use arbor_core::ecs::entity::EntityId;

/// Internal manager for entity slots.
///
/// Every slot that has ever been handed out stays in `slots`, tagged with its
/// current generation and liveness. Despawned indices go to a free list and are
/// recycled with a bumped generation, so stale `EntityId`s stop resolving.
#[derive(Debug, Clone, Default)]
pub(crate) struct EntityStore {
    /// The current id (including generation) of every slot, and whether it is alive.
    slots: Vec<(EntityId, bool)>,
    /// Slot indices available for reuse.
    freed: Vec<u32>,
    /// Number of live entities.
    alive: usize,
}

impl EntityStore {
    /// Allocates a new or recycled `EntityId`.
    pub fn create_entity(&mut self) -> EntityId {
        self.alive += 1;
        if let Some(index) = self.freed.pop() {
            let (id, alive) = &mut self.slots[index as usize];
            id.generation += 1;
            *alive = true;
            *id
        } else {
            let id = EntityId::new(self.slots.len() as u32, 0);
            self.slots.push((id, true));
            id
        }
    }

    /// Marks `id` dead and recycles its slot. Returns `false` for stale or unknown ids.
    pub fn destroy_entity(&mut self, id: EntityId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        self.slots[id.index as usize].1 = false;
        self.freed.push(id.index);
        self.alive -= 1;
        true
    }

    /// Returns `true` if `id` names a live entity of the current generation.
    pub fn is_alive(&self, id: EntityId) -> bool {
        matches!(
            self.slots.get(id.index as usize),
            Some((slot, true)) if slot.generation == id.generation
        )
    }

    /// Returns the number of live entities.
    pub fn len(&self) -> usize {
        self.alive
    }
}
