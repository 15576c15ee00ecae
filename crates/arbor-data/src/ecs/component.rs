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
use std::io::{Read, Write};
use std::ops::Range;

use arbor_core::ecs::entity::EntityId;
use thiserror::Error;

use crate::ecs::InstanceId;

/// Errors surfaced by a component's serialization entry points.
#[derive(Debug, Error)]
pub enum ComponentError {
    /// The underlying stream failed.
    #[error("component stream I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The requested rows are not allocated.
    #[error("rows {offset}..{offset}+{count} exceed the {registered} registered instances")]
    OutOfRange {
        /// First row requested.
        offset: u32,
        /// Number of rows requested.
        count: usize,
        /// Number of rows actually allocated.
        registered: usize,
    },
}

/// The capability every component store implements to be managed by a [`World`](crate::ecs::World).
///
/// A component owns a dense table of instances, one per attached entity. The
/// manager drives the lifecycle (`create`, `on_activate`, `on_deactivate`,
/// `discard`) and persistence (`serialize`, `deserialize`); the component
/// maps entities to instances itself.
pub trait Component: Any + Send + Sync {
    /// A short, human-readable name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Allocates one instance owned by `entity` and returns its id.
    fn create(&mut self, entity: EntityId) -> InstanceId;

    /// Allocates one instance per entity, in order, and returns the range of new rows.
    fn create_many(&mut self, entities: &[EntityId]) -> Range<u32>;

    /// Frees the instance owned by `entity`. Returns `false` if it had none.
    fn discard(&mut self, entity: EntityId) -> bool;

    /// Resolves the instance currently owned by `entity`.
    fn instance_of(&self, entity: EntityId) -> Option<InstanceId>;

    /// Number of live instances.
    fn num_registered(&self) -> usize;

    /// Called once an instance is created and its owner is set.
    fn on_activate(&mut self, _instance: InstanceId) {}

    /// Called once a contiguous block of instances is created by
    /// [`Component::create_many`].
    fn on_activate_many(&mut self, rows: Range<u32>) {
        for row in rows {
            self.on_activate(InstanceId(row));
        }
    }

    /// Called before the instance is discarded.
    fn on_deactivate(&mut self, _instance: InstanceId) {}

    /// Writes the persisted columns of every instance, in instance order.
    fn serialize(&self, writer: &mut dyn Write) -> Result<(), ComponentError>;

    /// Reads `count` instances' persisted columns into rows starting at `offset`.
    ///
    /// The rows must already be allocated (see [`Component::create_many`]).
    fn deserialize(
        &mut self,
        reader: &mut dyn Read,
        offset: InstanceId,
        count: usize,
    ) -> Result<(), ComponentError>;

    /// Casts the trait object to `&dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// Casts the trait object to `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
