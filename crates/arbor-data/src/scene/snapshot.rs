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

use arbor_core::math::Mat4;
use arbor_core::scene::SceneFile;
use bincode::{config, Decode, Encode};
use thiserror::Error;

use crate::ecs::{Component, ComponentError, EntityId, InstanceId, World};
use crate::transform::TransformComponent;

/// The strategy id written into the header of hierarchy scene files.
pub const HIERARCHY_STRATEGY_ID: &str = "ARBOR_HIERARCHY_V1";

/// Errors raised while saving or loading a hierarchy.
#[derive(Debug, Error)]
pub enum SceneError {
    /// The world has no [`TransformComponent`] registered.
    #[error("the world has no TransformComponent registered")]
    MissingComponent,
    /// The scene header could not be built or parsed.
    #[error("invalid scene header: {0}")]
    Header(&'static str),
    /// The file was produced by another strategy.
    #[error("scene strategy '{found}' is not '{expected}'")]
    WrongStrategy {
        /// The strategy named in the header.
        found: String,
        /// The strategy this loader understands.
        expected: &'static str,
    },
    /// The snapshot could not be encoded.
    #[error("failed to encode the snapshot: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    /// The payload could not be decoded.
    #[error("failed to decode the snapshot: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    /// The transform columns could not be written or read.
    #[error(transparent)]
    Component(#[from] ComponentError),
    /// A parent index points outside the snapshot.
    #[error("instance {index} names parent {parent}, outside the snapshot")]
    InvalidParentIndex {
        /// Row of the offending instance.
        index: usize,
        /// The parent index it names.
        parent: u32,
    },
    /// Following parent rows from an instance leads back to it.
    #[error("instance {index} is its own ancestor")]
    CyclicParents {
        /// Row of an instance on the cycle.
        index: usize,
    },
    /// The column blob does not hold two matrices per instance.
    #[error("transform blob holds {found} bytes, expected {expected}")]
    TransformsLength {
        /// Blob size implied by the parent rows.
        expected: usize,
        /// Actual blob size.
        found: usize,
    },
}

/// The persisted form of every transform instance of a [`World`].
///
/// Rows are stored in instance order. `parents[k]` is the row of the parent of
/// row `k`, or `u32::MAX` for a root; `transforms` is the serialized local and
/// world columns.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct HierarchySnapshot {
    /// Parent row of each instance.
    pub parents: Vec<u32>,
    /// The component's column blob.
    pub transforms: Vec<u8>,
}

impl HierarchySnapshot {
    /// Captures every transform instance of `world`.
    pub fn capture(world: &World) -> Result<Self, SceneError> {
        let transforms = world
            .component::<TransformComponent>()
            .ok_or(SceneError::MissingComponent)?;

        let parents = (0..transforms.num_registered() as u32)
            .map(|row| transforms.parent(InstanceId(row)).map_or(u32::MAX, |p| p.0))
            .collect();
        let mut blob = Vec::new();
        transforms.serialize(&mut blob)?;

        Ok(Self {
            parents,
            transforms: blob,
        })
    }

    /// Number of instances in the snapshot.
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// Returns `true` if the snapshot holds no instance.
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Recreates the snapshot in `world` under freshly spawned entities.
    ///
    /// Returns the new entities in snapshot row order.
    pub fn restore(&self, world: &mut World) -> Result<Vec<EntityId>, SceneError> {
        if !world.components().contains::<TransformComponent>() {
            return Err(SceneError::MissingComponent);
        }
        let count = self.len();
        if let Some(index) = self
            .parents
            .iter()
            .position(|&parent| parent != u32::MAX && parent as usize >= count)
        {
            return Err(SceneError::InvalidParentIndex {
                index,
                parent: self.parents[index],
            });
        }

        if let Some(index) = first_cyclic_row(&self.parents) {
            return Err(SceneError::CyclicParents { index });
        }
        let expected = 2 * count * std::mem::size_of::<Mat4>();
        if self.transforms.len() != expected {
            return Err(SceneError::TransformsLength {
                expected,
                found: self.transforms.len(),
            });
        }

        let entities = world.spawn_many(count);
        let transforms = world
            .component_mut::<TransformComponent>()
            .ok_or(SceneError::MissingComponent)?;
        // No activation pass: set_parents announces every restored row once.
        let range = transforms.create_many(&entities);
        transforms.deserialize(&mut self.transforms.as_slice(), InstanceId(range.start), count)?;
        transforms.set_parents(range, &entities, &self.parents);

        log::debug!("Restored a hierarchy of {count} transform instances.");
        Ok(entities)
    }

    /// Wraps the snapshot into a scene file.
    pub fn to_scene_file(&self) -> Result<SceneFile, SceneError> {
        let payload = bincode::encode_to_vec(self, config::standard())?;
        SceneFile::new(HIERARCHY_STRATEGY_ID, payload).map_err(SceneError::Header)
    }

    /// Extracts a snapshot from a scene file written by [`HierarchySnapshot::to_scene_file`].
    pub fn from_scene_file(file: &SceneFile) -> Result<Self, SceneError> {
        let found = file.header.strategy();
        if found != HIERARCHY_STRATEGY_ID {
            return Err(SceneError::WrongStrategy {
                found: found.to_owned(),
                expected: HIERARCHY_STRATEGY_ID,
            });
        }
        let (snapshot, _) = bincode::decode_from_slice(&file.payload, config::standard())?;
        Ok(snapshot)
    }
}

/// Returns a row whose parent chain loops, or `None` if `parents` is a forest.
///
/// Every row is visited once: a walk stops at a root or at a row already known
/// to reach one.
fn first_cyclic_row(parents: &[u32]) -> Option<usize> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        OnPath,
        Rooted,
    }

    let mut marks = vec![Mark::Unvisited; parents.len()];
    let mut path = Vec::new();
    for start in 0..parents.len() {
        let mut row = start;
        while marks[row] == Mark::Unvisited {
            marks[row] = Mark::OnPath;
            path.push(row);
            match parents[row] {
                u32::MAX => break,
                parent => row = parent as usize,
            }
        }
        if marks[row] == Mark::OnPath && parents[row] != u32::MAX {
            return Some(row);
        }
        for visited in path.drain(..) {
            marks[visited] = Mark::Rooted;
        }
    }
    None
}

/// Saves the transform hierarchy of `world` as scene file bytes.
pub fn save_scene(world: &World) -> Result<Vec<u8>, SceneError> {
    let file = HierarchySnapshot::capture(world)?.to_scene_file()?;
    Ok(file.to_bytes())
}

/// Loads scene file bytes produced by [`save_scene`] into `world`.
pub fn load_scene(bytes: &[u8], world: &mut World) -> Result<Vec<EntityId>, SceneError> {
    let file = SceneFile::from_bytes(bytes).map_err(SceneError::Header)?;
    HierarchySnapshot::from_scene_file(&file)?.restore(world)
}
