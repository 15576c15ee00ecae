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

//! Dense, swap-remove storage for transform instances.

use std::collections::HashMap;
use std::ops::Range;

use arbor_core::math::Mat4;

use crate::ecs::{EntityId, InstanceId, InstanceMoved};

/// The hierarchy links of one instance. Every field may be [`InstanceId::INVALID`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Links {
    /// The instance this one is relative to.
    pub parent: InstanceId,
    /// Head of this instance's child list.
    pub first_child: InstanceId,
    /// Next entry in the parent's child list.
    pub next_sibling: InstanceId,
    /// Previous entry in the parent's child list.
    pub previous_sibling: InstanceId,
}

impl Links {
    /// Links of an instance that is not part of any hierarchy.
    pub const DETACHED: Self = Self {
        parent: InstanceId::INVALID,
        first_child: InstanceId::INVALID,
        next_sibling: InstanceId::INVALID,
        previous_sibling: InstanceId::INVALID,
    };
}

impl Default for Links {
    fn default() -> Self {
        Self::DETACHED
    }
}

/// A structure-of-arrays table with one row per transform instance.
///
/// Rows are kept dense: [`InstanceStore::free`] moves the last row into the
/// freed slot and reports the relocation as an [`InstanceMoved`]. The store
/// keeps its own owner lookup current across that move, but it knows nothing
/// about what the link columns mean; repairing references to the moved row is
/// the caller's job.
///
/// Indexing with an out-of-range [`InstanceId`] panics.
#[derive(Debug, Default)]
pub struct InstanceStore {
    owners: Vec<Option<EntityId>>,
    local: Vec<Mat4>,
    world: Vec<Mat4>,
    links: Vec<Links>,
    lookup: HashMap<EntityId, InstanceId>,
}

impl InstanceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with room for `capacity` rows.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            owners: Vec::with_capacity(capacity),
            local: Vec::with_capacity(capacity),
            world: Vec::with_capacity(capacity),
            links: Vec::with_capacity(capacity),
            lookup: HashMap::with_capacity(capacity),
        }
    }

    /// Number of live rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Returns `true` if the store has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Appends `count` rows with identity transforms, no owner and no links.
    ///
    /// Returns the half-open range of the new rows. Growing may reallocate every
    /// column; nothing outside the store holds references into them.
    pub fn allocate(&mut self, count: usize) -> Range<u32> {
        let start = self.len();
        let end = start + count;
        assert!(
            end < InstanceId::INVALID.index(),
            "InstanceStore cannot hold {end} rows"
        );
        self.owners.resize(end, None);
        self.local.resize(end, Mat4::IDENTITY);
        self.world.resize(end, Mat4::IDENTITY);
        self.links.resize(end, Links::DETACHED);
        start as u32..end as u32
    }

    /// Removes a row by swapping the last row into its slot.
    ///
    /// # Panics
    ///
    /// Panics if `instance` is out of range.
    pub fn free(&mut self, instance: InstanceId) -> Option<InstanceMoved> {
        let index = instance.index();
        let len = self.len();
        assert!(
            index < len,
            "Cannot free instance {instance}: only {len} instances are registered"
        );

        if let Some(owner) = self.owners[index] {
            self.lookup.remove(&owner);
        }

        self.owners.swap_remove(index);
        self.local.swap_remove(index);
        self.world.swap_remove(index);
        self.links.swap_remove(index);

        let last = len - 1;
        if index == last {
            return None;
        }
        if let Some(owner) = self.owners[index] {
            self.lookup.insert(owner, instance);
        }
        Some(InstanceMoved {
            from: InstanceId(last as u32),
            to: instance,
        })
    }

    /// Removes every row.
    pub fn clear(&mut self) {
        self.owners.clear();
        self.local.clear();
        self.world.clear();
        self.links.clear();
        self.lookup.clear();
    }

    /// Records `entity` as the owner of `instance`.
    ///
    /// # Panics
    ///
    /// Panics if `entity` already owns an instance in this store.
    pub fn set_owner(&mut self, instance: InstanceId, entity: EntityId) {
        let previous = self.lookup.insert(entity, instance);
        assert!(
            previous.is_none() || previous == Some(instance),
            "Entity {entity} already owns transform instance {}",
            InstanceId::from(previous)
        );
        if let Some(old) = self.owners[instance.index()].replace(entity) {
            if old != entity {
                self.lookup.remove(&old);
            }
        }
    }

    /// The entity owning `instance`, if one was recorded.
    #[inline]
    pub fn owner(&self, instance: InstanceId) -> Option<EntityId> {
        self.owners[instance.index()]
    }

    /// Resolves the instance owned by `entity`.
    #[inline]
    pub fn instance_of(&self, entity: EntityId) -> Option<InstanceId> {
        self.lookup.get(&entity).copied()
    }

    /// The local transform of `instance`.
    #[inline]
    pub fn local(&self, instance: InstanceId) -> &Mat4 {
        &self.local[instance.index()]
    }

    #[inline]
    pub(crate) fn local_mut(&mut self, instance: InstanceId) -> &mut Mat4 {
        &mut self.local[instance.index()]
    }

    /// The cached world transform of `instance`.
    ///
    /// Only guaranteed current for instances that have a parent or children.
    #[inline]
    pub fn world(&self, instance: InstanceId) -> &Mat4 {
        &self.world[instance.index()]
    }

    #[inline]
    pub(crate) fn world_mut(&mut self, instance: InstanceId) -> &mut Mat4 {
        &mut self.world[instance.index()]
    }

    /// The hierarchy links of `instance`.
    #[inline]
    pub fn links(&self, instance: InstanceId) -> &Links {
        &self.links[instance.index()]
    }

    #[inline]
    pub(crate) fn links_mut(&mut self, instance: InstanceId) -> &mut Links {
        &mut self.links[instance.index()]
    }

    /// The local transform column, in instance order.
    pub fn local_column(&self) -> &[Mat4] {
        &self.local
    }

    /// The world transform column, in instance order.
    pub fn world_column(&self) -> &[Mat4] {
        &self.world
    }

    pub(crate) fn columns_mut(&mut self) -> (&mut [Mat4], &mut [Mat4]) {
        (&mut self.local, &mut self.world)
    }
}
