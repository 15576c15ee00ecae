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

use std::fmt;

/// An index into a component's dense instance table.
///
/// Instance ids are **not** stable: deleting any instance moves the last row of
/// the table into the freed slot (see [`InstanceMoved`]). Code outside the owning
/// component must not keep an `InstanceId` across a structural mutation; keep the
/// owning [`EntityId`](arbor_core::ecs::entity::EntityId) instead and resolve it
/// again.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, bytemuck::Pod, bytemuck::Zeroable,
)]
#[repr(transparent)]
pub struct InstanceId(pub u32);

impl InstanceId {
    /// Sentinel meaning "no relation".
    pub const INVALID: Self = Self(u32::MAX);

    /// Returns the row index this id addresses.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns `false` for the [`InstanceId::INVALID`] sentinel.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }

    /// Converts the sentinel into `None`.
    #[inline]
    pub const fn valid(self) -> Option<Self> {
        if self.is_valid() {
            Some(self)
        } else {
            None
        }
    }
}

impl From<Option<InstanceId>> for InstanceId {
    #[inline]
    fn from(value: Option<InstanceId>) -> Self {
        value.unwrap_or(Self::INVALID)
    }
}

impl From<u32> for InstanceId {
    #[inline]
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "#{}", self.0)
        } else {
            f.write_str("#invalid")
        }
    }
}

/// Emitted when compaction relocates a live row.
///
/// After a swap-remove the row that used to live at `from` (always the last
/// row) now lives at `to` (the freed slot). Whoever stores references to
/// instances must rewrite `from` into `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceMoved {
    /// The old index of the moved row.
    pub from: InstanceId,
    /// The new index of the moved row.
    pub to: InstanceId,
}
