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

use thiserror::Error;

use crate::ecs::{EntityId, InstanceId};

/// Recoverable failures of the transform component.
///
/// Broken hierarchy invariants are not represented here: they panic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// A message addressed an entity that owns no transform instance.
    #[error("entity {0} has no transform instance")]
    UnknownEntity(EntityId),
    /// A message addressed an instance index that is not allocated.
    #[error("transform instance {instance} is out of range ({registered} registered)")]
    UnknownInstance {
        /// The offending index.
        instance: InstanceId,
        /// Number of registered instances when the message was handled.
        registered: usize,
    },
    /// A world transform could not be converted to a local one because the
    /// parent's world transform is not invertible.
    #[error("parent {parent} of transform instance {instance} has a singular world transform")]
    DegenerateTransform {
        /// The instance whose world transform was being set.
        instance: InstanceId,
        /// Its parent.
        parent: InstanceId,
    },
}
