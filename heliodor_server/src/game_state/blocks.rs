// Copyright 2023 drey7925
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
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::{ensure, Result};
use log::info;
use rustc_hash::FxHashMap;

use heliodor_core::block_id::{BlockError, BlockId};
use heliodor_core::bounds::Bounds;

use super::grid::PlacedBlock;
use super::tick::BlockBehavior;

/// What shape of light a block type emits. Decided once per block type;
/// behaviors branch on this tag instead of downcasting the block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightKind {
    /// Omnidirectional bulb.
    Bulb,
    /// Directed beam with a lens ("Reflector") part in front of the bulb.
    Spotlight,
}

/// Static light data of a block type. An immutable snapshot: any bounds
/// adjustments happen before registration, never afterwards.
#[derive(Clone, Debug)]
pub struct LightDefinition {
    pub kind: LightKind,
    /// Bounds of the user-adjustable intensity slider. `max` is the
    /// normalization denominator for emissive output.
    pub intensity: Bounds,
    /// Bounds of the user-adjustable falloff slider.
    pub falloff: Bounds,
}

/// Creates the behavior instance attached to each placed block of a type.
pub type BehaviorFactory = Box<dyn Fn(&PlacedBlock) -> Box<dyn BlockBehavior> + Send + Sync>;

pub struct BlockType {
    pub short_name: String,
    pub display_name: String,
    /// Present iff this block type emits light.
    pub light: Option<LightDefinition>,
    /// If set, every placed block of this type gets a behavior instance
    /// driven by the tick driver.
    pub behavior_factory: Option<BehaviorFactory>,
}

impl BlockType {
    pub fn new(short_name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            short_name: short_name.into(),
            display_name: display_name.into(),
            light: None,
            behavior_factory: None,
        }
    }
}

/// Registry of all block types known to this session. Mutable only while
/// the server is being built; read-only once the game state exists.
pub struct BlockTypeManager {
    block_types: Vec<BlockType>,
    by_name: FxHashMap<String, BlockId>,
}

impl BlockTypeManager {
    pub(crate) fn new() -> Self {
        Self {
            block_types: Vec::new(),
            by_name: FxHashMap::default(),
        }
    }

    pub fn register_block(&mut self, block_type: BlockType) -> Result<BlockId> {
        ensure!(
            !self.by_name.contains_key(&block_type.short_name),
            BlockError::NameAlreadyExists(block_type.short_name.clone())
        );
        let id = BlockId(self.block_types.len() as u32);
        info!("Registered block type {} as {:?}", block_type.short_name, id);
        self.by_name.insert(block_type.short_name.clone(), id);
        self.block_types.push(block_type);
        Ok(id)
    }

    pub fn get_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    pub fn get_block(&self, id: BlockId) -> Result<&BlockType> {
        self.block_types
            .get(id.index())
            .ok_or_else(|| BlockError::IdNotFound(id.0).into())
    }

    pub fn light_definition(&self, id: BlockId) -> Option<&LightDefinition> {
        self.block_types.get(id.index())?.light.as_ref()
    }

    /// The normalization bound for a light block's user intensity — the
    /// definition-provider lookup behaviors perform at bootstrap.
    pub fn max_intensity(&self, id: BlockId) -> Option<f32> {
        self.light_definition(id).map(|def| def.intensity.max)
    }

    pub fn block_count(&self) -> usize {
        self.block_types.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_names_rejected() {
        let mut manager = BlockTypeManager::new();
        manager
            .register_block(BlockType::new("test:one", "One"))
            .unwrap();
        assert!(manager
            .register_block(BlockType::new("test:one", "One again"))
            .is_err());
    }

    #[test]
    fn max_intensity_requires_light_definition() {
        let mut manager = BlockTypeManager::new();
        let plain = manager
            .register_block(BlockType::new("test:slab", "Slab"))
            .unwrap();
        let mut lamp_type = BlockType::new("test:lamp", "Lamp");
        lamp_type.light = Some(LightDefinition {
            kind: LightKind::Bulb,
            intensity: Bounds::new(0.5, 10.0, 1.0),
            falloff: Bounds::new(0.5, 3.0, 1.0),
        });
        let lamp = manager.register_block(lamp_type).unwrap();

        assert_eq!(manager.block_count(), 2);
        assert_eq!(manager.max_intensity(plain), None);
        assert_eq!(manager.max_intensity(lamp), Some(10.0));
        assert_eq!(
            manager.get_by_name("test:lamp"),
            Some(lamp)
        );
    }
}
