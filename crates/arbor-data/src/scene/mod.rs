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

//! Persisting transform hierarchies.
//!
//! A [`HierarchySnapshot`] is the payload of an
//! [`arbor_core::scene::SceneFile`] tagged with [`HIERARCHY_STRATEGY_ID`].

mod snapshot;

pub use self::snapshot::{load_scene, save_scene, HierarchySnapshot, SceneError, HIERARCHY_STRATEGY_ID};
