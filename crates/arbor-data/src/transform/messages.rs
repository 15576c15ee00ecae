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

//! The message boundary of the transform component.
//!
//! Incoming [`TransformMessage`]s are either executed on the spot
//! ([`TransformComponent::send`]) or queued ([`TransformComponent::post`]) until
//! the next [`TransformComponent::dispatch_message_queue`]. Outgoing
//! [`TransformEvent`]s are published on a flume channel, one batch per mutating
//! call, or coalesced until the next dispatch in [`DeliveryMode::Deferred`].

use std::collections::HashMap;

use arbor_core::math::Mat4;
use serde::{Deserialize, Serialize};

use crate::ecs::{EntityId, InstanceId};
use crate::transform::{TransformComponent, TransformError};

/// How a message names the instance it applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// Resolved through the owner lookup when the message is handled.
    Entity(EntityId),
    /// A raw instance index; only meaningful within the current tick.
    Instance(InstanceId),
}

/// A request routed into the transform component.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformMessage {
    /// Replace the local transform and propagate.
    SetLocalTransform {
        /// The instance to update.
        target: Target,
        /// The new transform relative to the parent.
        local: Mat4,
    },
    /// Replace the world transform, deriving the local one from the parent.
    SetWorldTransform {
        /// The instance to update.
        target: Target,
        /// The new absolute transform.
        world: Mat4,
    },
    /// Move the instance under another parent, or make it a root with `None`.
    SetParent {
        /// The instance to move.
        target: Target,
        /// The new parent.
        parent: Option<Target>,
    },
}

/// One entity's new effective world transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformChanged {
    /// The entity whose transform changed.
    pub entity: EntityId,
    /// Its new world transform.
    pub world: Mat4,
}

/// Notifications published by the transform component.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformEvent {
    /// A batch of world transform updates, at most one entry per entity.
    WorldTransformsChanged(Vec<TransformChanged>),
}

/// When outgoing notifications leave the component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// Publish one event at the end of every mutating call.
    #[default]
    Immediate,
    /// Coalesce per entity and publish once per dispatch.
    Deferred,
}

/// Staging area for outgoing notifications.
#[derive(Debug, Default)]
pub(crate) struct Outbox {
    pub(crate) mode: DeliveryMode,
    pub(crate) sender: Option<flume::Sender<TransformEvent>>,
    pending: Vec<TransformChanged>,
    pending_index: HashMap<EntityId, usize>,
    published: u64,
}

impl Outbox {
    /// Hands over one call's batch, leaving `batch` empty with its capacity intact.
    pub(crate) fn submit(&mut self, batch: &mut Vec<TransformChanged>) {
        if batch.is_empty() {
            return;
        }
        match self.mode {
            DeliveryMode::Immediate => {
                let changes: Vec<TransformChanged> = batch.drain(..).collect();
                self.publish(changes);
            }
            DeliveryMode::Deferred => {
                for change in batch.drain(..) {
                    match self.pending_index.get(&change.entity) {
                        Some(&slot) => self.pending[slot].world = change.world,
                        None => {
                            self.pending_index.insert(change.entity, self.pending.len());
                            self.pending.push(change);
                        }
                    }
                }
            }
        }
    }

    /// Publishes everything coalesced so far as a single event.
    pub(crate) fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        self.pending_index.clear();
        let changes = std::mem::take(&mut self.pending);
        self.publish(changes);
    }

    /// Drops the coalesced notification of `entity`, if any.
    pub(crate) fn forget(&mut self, entity: EntityId) {
        let Some(slot) = self.pending_index.remove(&entity) else {
            return;
        };
        self.pending.swap_remove(slot);
        if let Some(moved) = self.pending.get(slot) {
            self.pending_index.insert(moved.entity, slot);
        }
    }

    pub(crate) fn pending(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn published(&self) -> u64 {
        self.published
    }

    fn publish(&mut self, changes: Vec<TransformChanged>) {
        self.published += 1;
        let count = changes.len();
        match &self.sender {
            Some(sender) => {
                log::trace!("Publishing {count} world transform changes.");
                if let Err(e) = sender.send(TransformEvent::WorldTransformsChanged(changes)) {
                    log::error!("Failed to publish transform changes: {e}. Receiver likely disconnected.");
                }
            }
            None => log::trace!("No listener; dropped {count} world transform changes."),
        }
    }
}

impl TransformComponent {
    /// Executes a message immediately.
    pub fn send(&mut self, message: TransformMessage) -> Result<(), TransformError> {
        match message {
            TransformMessage::SetLocalTransform { target, local } => {
                let instance = self.resolve(target)?;
                self.set_local_transform(instance, local);
            }
            TransformMessage::SetWorldTransform { target, world } => {
                let instance = self.resolve(target)?;
                self.set_world_transform(instance, world)?;
            }
            TransformMessage::SetParent { target, parent } => {
                let instance = self.resolve(target)?;
                let parent = parent.map(|p| self.resolve(p)).transpose()?;
                self.set_parent(instance, parent);
            }
        }
        Ok(())
    }

    /// Queues a message until the next [`TransformComponent::dispatch_message_queue`].
    pub fn post(&mut self, message: TransformMessage) {
        self.inbox.push_back(message);
    }

    /// Number of messages waiting in the queue.
    pub fn queued_messages(&self) -> usize {
        self.inbox.len()
    }

    /// Executes every queued message in FIFO order, then flushes deferred notifications.
    ///
    /// Messages that fail are logged and skipped. Returns the number of messages
    /// that were applied.
    pub fn dispatch_message_queue(&mut self) -> usize {
        let mut applied = 0;
        while let Some(message) = self.inbox.pop_front() {
            match self.send(message) {
                Ok(()) => applied += 1,
                Err(e) => log::warn!("Dropped queued transform message: {e}"),
            }
        }
        self.outbox.flush();
        applied
    }

    /// Publishes notifications coalesced in [`DeliveryMode::Deferred`].
    pub fn flush(&mut self) {
        self.outbox.flush();
    }

    /// Number of coalesced notifications waiting for the next flush.
    pub fn pending_notifications(&self) -> usize {
        self.outbox.pending()
    }

    /// Number of notification events published so far, connected listener or not.
    pub fn published_batches(&self) -> u64 {
        self.outbox.published()
    }

    fn resolve(&self, target: Target) -> Result<InstanceId, TransformError> {
        match target {
            Target::Entity(entity) => self
                .store
                .instance_of(entity)
                .ok_or(TransformError::UnknownEntity(entity)),
            Target::Instance(instance) if instance.index() < self.store.len() => Ok(instance),
            Target::Instance(instance) => Err(TransformError::UnknownInstance {
                instance,
                registered: self.store.len(),
            }),
        }
    }
}
