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

//! The transform hierarchy component.
//!
//! Instances live in a dense [`InstanceStore`] and form a forest through four
//! index links per row. [`TransformComponent`] maintains those links under
//! reparenting, removal and compaction, and keeps cached world transforms in
//! sync with local ones.
//!
//! Composition follows the column-vector convention of [`arbor_core::math`]:
//! `world = parent_world * local`.

mod component;
mod error;
mod hierarchy;
mod messages;
mod propagation;
mod store;

pub use self::component::TransformComponent;
pub use self::error::TransformError;
pub use self::messages::{DeliveryMode, Target, TransformChanged, TransformEvent, TransformMessage};
pub use self::store::{InstanceStore, Links};

#[cfg(test)]
mod tests;
