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

//! Light blocks and their simulation behavior.
//!
//! Registering a light block attaches a [`LightingBlock`] behavior to
//! every placed instance. The behavior fades the light's power toward
//! its working state, reproduces the blink duty cycle against the
//! session clock, and publishes emissive values for the model's parts —
//! escalating to per-frame updates only while the light is actually
//! changing and within view distance.

mod block;
pub mod migration;


pub use block::LightingBlock;

use anyhow::Result;

use heliodor_core::block_id::BlockId;
use heliodor_core::bounds::Bounds;
use heliodor_core::constants::blocks;
use heliodor_server::game_state::blocks::{BlockType, LightDefinition, LightKind};

use crate::game_builder::{GameBuilder, StaticBlockName};

/// Description of one light block type to register.
pub struct LightBlockConfig {
    pub name: StaticBlockName,
    pub display_name: &'static str,
    pub kind: LightKind,
    pub intensity: Bounds,
    pub falloff: Bounds,
}

impl LightBlockConfig {
    /// An omnidirectional interior light. The intensity and falloff
    /// minimums are kept well above zero so a light can't be dialed
    /// down to an invisible sliver.
    pub fn interior(name: StaticBlockName, display_name: &'static str) -> Self {
        Self {
            name,
            display_name,
            kind: LightKind::Bulb,
            intensity: Bounds::new(0.5, 10.0, 1.0),
            falloff: Bounds::new(0.5, 3.0, 1.0),
        }
    }

    /// A directed spotlight with a lens part in front of the bulb.
    pub fn spotlight(name: StaticBlockName, display_name: &'static str) -> Self {
        Self {
            name,
            display_name,
            kind: LightKind::Spotlight,
            intensity: Bounds::new(0.5, 5.0, 1.0),
            falloff: Bounds::new(0.1, 3.0, 1.0),
        }
    }
}

pub trait LightingGameBuilder {
    /// Initialize the lighting content:
    /// - registers the stock light block types with their behavior
    /// - registers the grid migration that retires the deprecated
    ///   subtype
    fn initialize_lighting(&mut self) -> Result<()>;

    /// Registers one light block type with the fade/blink behavior
    /// attached to every placed instance.
    fn add_light_block(&mut self, config: LightBlockConfig) -> Result<BlockId>;
}

impl LightingGameBuilder for GameBuilder {
    fn initialize_lighting(&mut self) -> Result<()> {
        if self.lighting_initialized {
            return Ok(());
        }
        self.lighting_initialized = true;

        self.add_light_block(LightBlockConfig::interior(
            StaticBlockName(blocks::INTERIOR_SMALL),
            "Interior light (small)",
        ))?;
        self.add_light_block(LightBlockConfig::interior(
            StaticBlockName(blocks::INTERIOR_LARGE),
            "Interior light (large)",
        ))?;
        self.add_light_block(LightBlockConfig::interior(
            StaticBlockName(blocks::CORNER_SMALL),
            "Corner light (small)",
        ))?;
        self.add_light_block(LightBlockConfig::interior(
            StaticBlockName(blocks::CORNER_LARGE),
            "Corner light (large)",
        ))?;
        self.add_light_block(LightBlockConfig::spotlight(
            StaticBlockName(blocks::SPOTLIGHT_SMALL),
            "Spotlight (small)",
        ))?;
        self.add_light_block(LightBlockConfig::spotlight(
            StaticBlockName(blocks::SPOTLIGHT_LARGE),
            "Spotlight (large)",
        ))?;
        // The deprecated subtype still has to light up correctly on
        // grids that spawn with it; migration replaces it afterwards.
        self.add_light_block(LightBlockConfig::interior(
            StaticBlockName(blocks::INTERIOR_SMALL_MK1),
            "Interior light (small, deprecated)",
        ))?;

        self.inner
            .add_startup_action(Box::new(migration::register_grid_migration));
        Ok(())
    }

    fn add_light_block(&mut self, config: LightBlockConfig) -> Result<BlockId> {
        let mut block_type = BlockType::new(config.name.0, config.display_name);
        block_type.light = Some(LightDefinition {
            kind: config.kind,
            intensity: config.intensity,
            falloff: config.falloff,
        });
        block_type.behavior_factory =
            Some(Box::new(|placed| Box::new(LightingBlock::new(placed))));
        self.inner.blocks_mut().register_block(block_type)
    }
}
