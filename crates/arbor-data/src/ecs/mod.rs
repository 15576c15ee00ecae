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

//! The entity/component manager.
//!
//! Entities are plain generational ids handed out by an internal entity store.
//! Component stores own their rows and are registered in a typed table, the
//! [`ComponentRegistry`]. The [`World`] ties both together: spawning,
//! attaching a component to an entity, and tearing every attachment down when
//! the entity is despawned.

mod component;
mod entity_store;
mod instance;
mod registry;
mod world;

pub use arbor_core::ecs::entity::EntityId;
pub use component::{Component, ComponentError};
pub use instance::{InstanceId, InstanceMoved};
pub use registry::ComponentRegistry;
pub use world::World;
