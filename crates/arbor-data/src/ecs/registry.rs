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

use std::{any::TypeId, collections::HashMap};

use crate::ecs::Component;

/// A typed table of component stores.
///
/// Each concrete component type is registered once and looked up by its
/// `TypeId`. Typed access downcasts through [`Component::as_any`]; lifecycle
/// fan-out (e.g. on despawn) goes through the trait object.
#[derive(Default)]
pub struct ComponentRegistry {
    /// The component stores, in registration order.
    components: Vec<Box<dyn Component>>,
    /// Maps a component type to its slot in `components`.
    index: HashMap<TypeId, usize>,
}

impl ComponentRegistry {
    /// Registers a component store. A store of the same type already present is replaced.
    pub fn register<C: Component>(&mut self, component: C) {
        let type_id = TypeId::of::<C>();
        match self.index.get(&type_id) {
            Some(&slot) => {
                log::warn!(
                    "Component '{}' registered twice; replacing the existing store.",
                    component.name()
                );
                self.components[slot] = Box::new(component);
            }
            None => {
                log::debug!("Registered component '{}'.", component.name());
                self.index.insert(type_id, self.components.len());
                self.components.push(Box::new(component));
            }
        }
    }

    /// Returns the store of type `C`, if registered.
    pub fn get<C: Component>(&self) -> Option<&C> {
        let slot = *self.index.get(&TypeId::of::<C>())?;
        self.components[slot].as_any().downcast_ref::<C>()
    }

    /// Returns the store of type `C` mutably, if registered.
    pub fn get_mut<C: Component>(&mut self) -> Option<&mut C> {
        let slot = *self.index.get(&TypeId::of::<C>())?;
        self.components[slot].as_any_mut().downcast_mut::<C>()
    }

    /// Returns `true` if a store of type `C` is registered.
    pub fn contains<C: Component>(&self) -> bool {
        self.index.contains_key(&TypeId::of::<C>())
    }

    /// Iterates over every registered store.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Component> {
        self.components.iter().map(|c| c.as_ref())
    }

    /// Iterates mutably over every registered store.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut (dyn Component + 'static)> {
        self.components.iter_mut().map(|c| c.as_mut())
    }

    /// Returns the number of registered stores.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
