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

use std::any::Any;
use std::collections::VecDeque;
use std::io::{Read, Write};
use std::ops::Range;

use arbor_core::math::Mat4;

use crate::ecs::{Component, ComponentError, EntityId, InstanceId};
use crate::transform::messages::Outbox;
use crate::transform::{DeliveryMode, InstanceStore, TransformChanged, TransformEvent, TransformMessage};

/// The transform hierarchy component.
///
/// Owns an [`InstanceStore`] holding one row per attached entity, keeps the
/// parent/child links of those rows a forest, and recomputes cached world
/// transforms eagerly whenever a local transform or a parent changes.
///
/// Every mutating call collects the world transforms it touched and hands
/// them to the outbox as a single batch when it returns.
#[derive(Debug, Default)]
pub struct TransformComponent {
    pub(super) store: InstanceStore,
    pub(super) outbox: Outbox,
    pub(super) inbox: VecDeque<TransformMessage>,
    pub(super) batch: Vec<TransformChanged>,
}

impl TransformComponent {
    /// Creates an empty component with immediate delivery and no listener.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty component with room for `capacity` instances.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            store: InstanceStore::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Sets how notifications are delivered.
    pub fn with_delivery_mode(mut self, mode: DeliveryMode) -> Self {
        self.outbox.mode = mode;
        self
    }

    /// Publishes notifications on `sender`, typically an
    /// [`EventBus`](arbor_core::event::EventBus) sender.
    pub fn with_event_sender(mut self, sender: flume::Sender<TransformEvent>) -> Self {
        self.outbox.sender = Some(sender);
        self
    }

    /// Replaces the notification sender.
    pub fn set_event_sender(&mut self, sender: Option<flume::Sender<TransformEvent>>) {
        self.outbox.sender = sender;
    }

    /// The current delivery mode.
    pub fn delivery_mode(&self) -> DeliveryMode {
        self.outbox.mode
    }

    /// Read access to the underlying rows.
    pub fn store(&self) -> &InstanceStore {
        &self.store
    }

    /// Resolves the instance owned by `entity`.
    #[inline]
    pub fn instance_of(&self, entity: EntityId) -> Option<InstanceId> {
        self.store.instance_of(entity)
    }

    /// The entity owning `instance`.
    #[inline]
    pub fn owner(&self, instance: InstanceId) -> Option<EntityId> {
        self.store.owner(instance)
    }

    /// Number of live instances.
    #[inline]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if no instance is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// The parent of `instance`.
    pub fn parent(&self, instance: InstanceId) -> Option<InstanceId> {
        self.store.links(instance).parent.valid()
    }

    /// The head of the child list of `instance`.
    pub fn first_child(&self, instance: InstanceId) -> Option<InstanceId> {
        self.store.links(instance).first_child.valid()
    }

    /// The sibling after `instance`.
    pub fn next_sibling(&self, instance: InstanceId) -> Option<InstanceId> {
        self.store.links(instance).next_sibling.valid()
    }

    /// The sibling before `instance`.
    pub fn previous_sibling(&self, instance: InstanceId) -> Option<InstanceId> {
        self.store.links(instance).previous_sibling.valid()
    }

    /// Iterates over the direct children of `instance`, in sibling order.
    pub fn children(&self, instance: InstanceId) -> impl Iterator<Item = InstanceId> + '_ {
        std::iter::successors(self.first_child(instance), move |&child| {
            self.next_sibling(child)
        })
    }

    /// Records the effective world transform of `instance` for the current batch.
    #[inline]
    pub(super) fn notify(&mut self, instance: InstanceId, world: Mat4) {
        if let Some(entity) = self.store.owner(instance) {
            self.batch.push(TransformChanged { entity, world });
        }
    }

    /// Hands the current batch to the outbox.
    #[inline]
    pub(super) fn flush_batch(&mut self) {
        self.outbox.submit(&mut self.batch);
    }
}

impl Component for TransformComponent {
    fn name(&self) -> &'static str {
        "TransformComponent"
    }

    fn create(&mut self, entity: EntityId) -> InstanceId {
        let instance = InstanceId(self.store.allocate(1).start);
        self.store.set_owner(instance, entity);
        log::debug!("Registered entity {entity} as transform instance {instance}.");
        instance
    }

    fn create_many(&mut self, entities: &[EntityId]) -> Range<u32> {
        let range = self.store.allocate(entities.len());
        for (row, &entity) in range.clone().zip(entities) {
            self.store.set_owner(InstanceId(row), entity);
        }
        log::debug!(
            "Registered {} entities as transform instances {}..{}.",
            entities.len(),
            range.start,
            range.end
        );
        range
    }

    fn discard(&mut self, entity: EntityId) -> bool {
        let Some(instance) = self.store.instance_of(entity) else {
            return false;
        };
        self.remove_from_hierarchy(instance);
        self.flush_batch();
        self.outbox.forget(entity);
        if let Some(moved) = self.store.free(instance) {
            self.on_instance_moved(moved);
        }
        log::debug!("Discarded transform instance {instance} of entity {entity}.");
        true
    }

    fn instance_of(&self, entity: EntityId) -> Option<InstanceId> {
        self.store.instance_of(entity)
    }

    fn num_registered(&self) -> usize {
        self.store.len()
    }

    fn on_activate(&mut self, instance: InstanceId) {
        let world = self.world_transform(instance);
        self.notify(instance, world);
        self.flush_batch();
    }

    fn on_activate_many(&mut self, rows: Range<u32>) {
        for row in rows {
            let instance = InstanceId(row);
            let world = self.world_transform(instance);
            self.notify(instance, world);
        }
        self.flush_batch();
    }

    fn on_deactivate(&mut self, instance: InstanceId) {
        self.on_instance_removed(instance);
    }

    fn serialize(&self, writer: &mut dyn Write) -> Result<(), ComponentError> {
        writer.write_all(bytemuck::cast_slice(self.store.local_column()))?;
        writer.write_all(bytemuck::cast_slice(self.store.world_column()))?;
        Ok(())
    }

    fn deserialize(
        &mut self,
        reader: &mut dyn Read,
        offset: InstanceId,
        count: usize,
    ) -> Result<(), ComponentError> {
        let registered = self.store.len();
        let start = offset.index();
        let rows = match start.checked_add(count) {
            Some(end) if end <= registered => start..end,
            _ => {
                return Err(ComponentError::OutOfRange {
                    offset: offset.0,
                    count,
                    registered,
                })
            }
        };
        let (local, world) = self.store.columns_mut();
        reader.read_exact(bytemuck::cast_slice_mut(&mut local[rows.clone()]))?;
        reader.read_exact(bytemuck::cast_slice_mut(&mut world[rows]))?;
        log::debug!("Loaded {count} transform instances at offset {offset}.");
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
