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

//! Parent, child and sibling link maintenance.

use std::ops::Range;

use crate::ecs::{EntityId, InstanceId, InstanceMoved};
use crate::transform::{Links, TransformComponent};

impl TransformComponent {
    /// Moves `instance` under `new_parent`, or makes it a root with `None`.
    ///
    /// The instance is appended at the end of the new parent's child list, and
    /// its subtree is re-propagated. Setting the parent an instance already has
    /// changes nothing.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if `new_parent` is a descendant of `instance`.
    pub fn set_parent(&mut self, instance: InstanceId, new_parent: Option<InstanceId>) {
        let new_parent = InstanceId::from(new_parent);
        if !instance.is_valid() || instance == new_parent {
            return;
        }
        if self.store.links(instance).parent == new_parent {
            return;
        }
        debug_assert!(
            !self.is_ancestor_of(instance, new_parent),
            "Reparenting transform instance {instance} under {new_parent} would create a cycle"
        );

        self.detach(instance);
        if new_parent.is_valid() {
            self.attach(instance, new_parent);
        }
        log::trace!("Reparented transform instance {instance} under {new_parent}.");

        self.propagate(instance);
        self.flush_batch();
    }

    /// Unlinks `instance` from the hierarchy ahead of its removal.
    ///
    /// Its children move to its former parent, taking its place in the sibling
    /// chain, and are re-propagated. Removing a root turns its children into
    /// roots that stay linked to each other as siblings.
    pub fn on_instance_removed(&mut self, instance: InstanceId) {
        self.remove_from_hierarchy(instance);
        self.flush_batch();
    }

    /// Rewrites every link that referenced `moved.from` to reference `moved.to`.
    ///
    /// Must be called after every [`InstanceStore::free`](crate::transform::InstanceStore::free)
    /// that relocated a row. The relocated row's own links are already correct;
    /// only the rows pointing at it need fixing.
    pub fn on_instance_moved(&mut self, moved: InstanceMoved) {
        let InstanceMoved { from, to } = moved;
        let links = *self.store.links(to);

        if links.previous_sibling.is_valid() {
            self.store.links_mut(links.previous_sibling).next_sibling = to;
        } else if links.parent.is_valid() {
            let parent = self.store.links_mut(links.parent);
            if parent.first_child == from {
                parent.first_child = to;
            }
        }
        if links.next_sibling.is_valid() {
            self.store.links_mut(links.next_sibling).previous_sibling = to;
        }

        let mut child = links.first_child;
        while child.is_valid() {
            let child_links = self.store.links_mut(child);
            child_links.parent = to;
            child = child_links.next_sibling;
        }
    }

    /// Links a freshly loaded block of instances in one pass.
    ///
    /// `parent_indices[k]` is the parent of the instance at `range.start + k`:
    /// an index into `entities`, resolved through the owner lookup, or
    /// `u32::MAX` for no parent. Propagation runs once per subtree top after
    /// every link is in place.
    ///
    /// # Panics
    ///
    /// Panics if `range` and `parent_indices` have different lengths.
    pub fn set_parents(&mut self, range: Range<u32>, entities: &[EntityId], parent_indices: &[u32]) {
        assert_eq!(
            range.len(),
            parent_indices.len(),
            "set_parents needs one parent index per instance"
        );

        for (row, &parent_index) in range.clone().zip(parent_indices) {
            let instance = InstanceId(row);
            let parent = self.resolve_parent_index(instance, entities, parent_index);
            if !parent.is_valid() || parent == instance || self.store.links(instance).parent == parent {
                continue;
            }
            debug_assert!(
                !self.is_ancestor_of(instance, parent),
                "Loading transform instance {instance} under {parent} would create a cycle"
            );
            self.detach(instance);
            self.attach(instance, parent);
        }

        for row in range.clone() {
            let instance = InstanceId(row);
            let parent = self.store.links(instance).parent;
            if !parent.is_valid() || !range.contains(&parent.0) {
                self.propagate(instance);
            }
        }
        self.flush_batch();
        log::debug!("Linked {} loaded transform instances.", range.len());
    }

    fn resolve_parent_index(
        &self,
        instance: InstanceId,
        entities: &[EntityId],
        parent_index: u32,
    ) -> InstanceId {
        if parent_index == u32::MAX {
            return InstanceId::INVALID;
        }
        let resolved = entities
            .get(parent_index as usize)
            .and_then(|&entity| self.store.instance_of(entity));
        if resolved.is_none() {
            log::warn!(
                "Parent index {parent_index} of transform instance {instance} does not resolve; leaving it a root."
            );
        }
        InstanceId::from(resolved)
    }

    /// Returns `true` if `ancestor` lies on the parent chain of `node`, or is `node`.
    pub(super) fn is_ancestor_of(&self, ancestor: InstanceId, node: InstanceId) -> bool {
        if !self.store.links(ancestor).first_child.is_valid() {
            return ancestor == node;
        }
        let mut current = node;
        let mut steps = 0;
        while current.is_valid() && steps <= self.store.len() {
            if current == ancestor {
                return true;
            }
            current = self.store.links(current).parent;
            steps += 1;
        }
        false
    }

    pub(super) fn remove_from_hierarchy(&mut self, instance: InstanceId) {
        let links = *self.store.links(instance);
        if links == Links::DETACHED {
            return;
        }

        let first = links.first_child;
        if !first.is_valid() {
            self.detach(instance);
            return;
        }

        let mut last = first;
        loop {
            let child = self.store.links_mut(last);
            child.parent = links.parent;
            if !child.next_sibling.is_valid() {
                break;
            }
            last = child.next_sibling;
        }

        self.store.links_mut(first).previous_sibling = links.previous_sibling;
        self.store.links_mut(last).next_sibling = links.next_sibling;
        if links.previous_sibling.is_valid() {
            self.store.links_mut(links.previous_sibling).next_sibling = first;
        } else if links.parent.is_valid() {
            self.store.links_mut(links.parent).first_child = first;
        }
        if links.next_sibling.is_valid() {
            self.store.links_mut(links.next_sibling).previous_sibling = last;
        }
        *self.store.links_mut(instance) = Links::DETACHED;
        log::trace!("Handed the children of transform instance {instance} to {}.", links.parent);

        let mut child = first;
        loop {
            self.propagate(child);
            if child == last {
                break;
            }
            child = self.store.links(child).next_sibling;
        }
    }

    /// Unlinks `instance` from its parent and siblings. Its own children stay attached.
    fn detach(&mut self, instance: InstanceId) {
        let links = *self.store.links(instance);
        if links.previous_sibling.is_valid() {
            self.store.links_mut(links.previous_sibling).next_sibling = links.next_sibling;
        } else if links.parent.is_valid() {
            let parent = self.store.links_mut(links.parent);
            if parent.first_child == instance {
                parent.first_child = links.next_sibling;
            }
        }
        if links.next_sibling.is_valid() {
            self.store.links_mut(links.next_sibling).previous_sibling = links.previous_sibling;
        }

        let own = self.store.links_mut(instance);
        own.parent = InstanceId::INVALID;
        own.next_sibling = InstanceId::INVALID;
        own.previous_sibling = InstanceId::INVALID;
    }

    /// Appends a detached `instance` to the end of the child list of `parent`.
    fn attach(&mut self, instance: InstanceId, parent: InstanceId) {
        self.store.links_mut(instance).parent = parent;

        let first = self.store.links(parent).first_child;
        if !first.is_valid() {
            self.store.links_mut(parent).first_child = instance;
            return;
        }
        let mut last = first;
        while self.store.links(last).next_sibling.is_valid() {
            last = self.store.links(last).next_sibling;
        }
        self.store.links_mut(last).next_sibling = instance;
        self.store.links_mut(instance).previous_sibling = last;
    }
}
