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

//! Local-to-world propagation.
//!
//! A change at one instance is pushed through its subtree with an iterative
//! pre-order sweep that only follows the `first_child` and `next_sibling`
//! links, so the depth of a hierarchy is not bounded by the call stack.

use arbor_core::math::Mat4;

use crate::ecs::InstanceId;
use crate::transform::{TransformComponent, TransformError};

impl TransformComponent {
    /// Replaces the local transform of `instance` and refreshes its subtree.
    pub fn set_local_transform(&mut self, instance: InstanceId, local: Mat4) {
        *self.store.local_mut(instance) = local;
        self.propagate(instance);
        self.flush_batch();
    }

    /// Sets the world transform of `instance` by deriving the matching local transform.
    ///
    /// Fails without touching anything if the parent's world transform cannot
    /// be inverted.
    pub fn set_world_transform(&mut self, instance: InstanceId, world: Mat4) -> Result<(), TransformError> {
        let parent = self.store.links(instance).parent;
        let local = if parent.is_valid() {
            let inverse = self
                .world_transform(parent)
                .inverse()
                .ok_or(TransformError::DegenerateTransform { instance, parent })?;
            inverse * world
        } else {
            world
        };
        self.set_local_transform(instance, local);
        Ok(())
    }

    /// The effective world transform of `instance`.
    ///
    /// Roots are their own world transform, so this is the local transform
    /// when `instance` has no parent and the cached one otherwise.
    #[inline]
    pub fn world_transform(&self, instance: InstanceId) -> Mat4 {
        if self.store.links(instance).parent.is_valid() {
            *self.store.world(instance)
        } else {
            *self.store.local(instance)
        }
    }

    /// The local transform of `instance`.
    #[inline]
    pub fn local_transform(&self, instance: InstanceId) -> Mat4 {
        *self.store.local(instance)
    }

    /// Recomputes the world transform of `root` and every descendant, queueing
    /// one notification per owned instance into the current batch.
    pub(super) fn propagate(&mut self, root: InstanceId) {
        let links = *self.store.links(root);
        let world = if links.parent.is_valid() {
            self.world_transform(links.parent) * *self.store.local(root)
        } else {
            *self.store.local(root)
        };

        if !links.parent.is_valid() && !links.first_child.is_valid() {
            self.notify(root, world);
            return;
        }
        *self.store.world_mut(root) = world;
        self.notify(root, world);
        self.sweep_descendants(root);
    }

    fn sweep_descendants(&mut self, root: InstanceId) {
        let mut parent = root;
        let mut child = self.store.links(root).first_child;

        while child.is_valid() {
            let world = *self.store.world(parent) * *self.store.local(child);
            *self.store.world_mut(child) = world;
            self.notify(child, world);

            let first_child = self.store.links(child).first_child;
            if first_child.is_valid() {
                parent = child;
                child = first_child;
                continue;
            }

            loop {
                let next = self.store.links(child).next_sibling;
                if next.is_valid() {
                    child = next;
                    break;
                }
                child = parent;
                if child == root {
                    child = InstanceId::INVALID;
                    break;
                }
                parent = self.store.links(child).parent;
            }
        }
        log::trace!("Propagated world transforms below instance {root}.");
    }
}
