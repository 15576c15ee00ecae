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

use std::ops::Range;

use crate::ecs::{entity_store::EntityStore, Component, ComponentRegistry, EntityId, InstanceId};

/// The central container for entities and the component stores attached to them.
///
/// The `World` owns all of its state; nothing is process-global, so several
/// independent worlds (one per test, one per sub-scene) can coexist.
#[derive(Default)]
pub struct World {
    /// Generational entity slots.
    pub(crate) entities: EntityStore,
    /// Every registered component store.
    pub(crate) components: ComponentRegistry,
}

impl World {
    /// Creates an empty world with no component stores.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a component store with this world.
    pub fn register_component<C: Component>(&mut self, component: C) {
        self.components.register(component);
    }

    /// Returns the component store of type `C`.
    pub fn component<C: Component>(&self) -> Option<&C> {
        self.components.get::<C>()
    }

    /// Returns the component store of type `C` mutably.
    pub fn component_mut<C: Component>(&mut self) -> Option<&mut C> {
        self.components.get_mut::<C>()
    }

    /// Returns the table of every registered component store.
    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    /// Creates a new entity with no components attached.
    pub fn spawn(&mut self) -> EntityId {
        self.entities.create_entity()
    }

    /// Creates `count` entities.
    pub fn spawn_many(&mut self, count: usize) -> Vec<EntityId> {
        (0..count).map(|_| self.entities.create_entity()).collect()
    }

    /// Returns `true` if `entity` is alive.
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.entities.is_alive(entity)
    }

    /// Returns the number of live entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Attaches a `C` instance to `entity` and activates it.
    ///
    /// Returns `None` if the entity is dead or `C` is not registered.
    pub fn attach<C: Component>(&mut self, entity: EntityId) -> Option<InstanceId> {
        if !self.entities.is_alive(entity) {
            log::warn!("Cannot attach a component to dead entity {entity}.");
            return None;
        }
        let store = self.components.get_mut::<C>()?;
        let instance = store.create(entity);
        store.on_activate(instance);
        Some(instance)
    }

    /// Attaches a `C` instance to every entity, in order, and activates them.
    ///
    /// The new instances occupy a contiguous range of rows, matching the order of
    /// `entities`. Returns `None` if any entity is dead or `C` is not registered.
    pub fn attach_many<C: Component>(&mut self, entities: &[EntityId]) -> Option<Range<u32>> {
        if let Some(dead) = entities.iter().find(|e| !self.entities.is_alive(**e)) {
            log::warn!("Cannot attach components: entity {dead} is dead.");
            return None;
        }
        let store = self.components.get_mut::<C>()?;
        let range = store.create_many(entities);
        store.on_activate_many(range.clone());
        Some(range)
    }

    /// Deactivates and discards the `C` instance owned by `entity`.
    pub fn detach<C: Component>(&mut self, entity: EntityId) -> bool {
        match self.components.get_mut::<C>() {
            Some(store) => Self::teardown(store, entity),
            None => false,
        }
    }

    /// Destroys `entity`, tearing down every component instance it owns.
    ///
    /// Returns `false` if the entity was already dead.
    pub fn despawn(&mut self, entity: EntityId) -> bool {
        if !self.entities.is_alive(entity) {
            return false;
        }
        for store in self.components.iter_mut() {
            Self::teardown(store, entity);
        }
        self.entities.destroy_entity(entity)
    }

    fn teardown(store: &mut dyn Component, entity: EntityId) -> bool {
        match store.instance_of(entity) {
            Some(instance) => {
                store.on_deactivate(instance);
                store.discard(entity)
            }
            None => false,
        }
    }
}
