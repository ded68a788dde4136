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

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use cgmath::Vector3;
use heliodor_core::block_id::{BlockError, BlockId};
use heliodor_core::coordinates::BlockCoordinate;
use heliodor_core::orientation::BlockOrientation;
use log::error;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::event::{HandlerContext, ObserverRegistry, SubscriptionToken};
use super::light_source::{LightProperties, LightSourceHandle};

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridId(pub u64);
impl Debug for GridId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("grid:{}", self.0))
    }
}

/// Identity of one placed block within its grid. Ids are never reused,
/// so a stale id simply fails to resolve.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlacedBlockId(pub u64);
impl Debug for PlacedBlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("placed:{}", self.0))
    }
}

/// Instructions for placing one block on a grid.
#[derive(Clone, Debug)]
pub struct BlockPlacement {
    pub block_name: String,
    pub cell: BlockCoordinate,
    pub orientation: BlockOrientation,
    /// Initial functional state; only meaningful for light blocks.
    pub working: bool,
    /// Initial user settings; defaults from the block definition when
    /// None.
    pub light_properties: Option<LightProperties>,
}

impl BlockPlacement {
    pub fn new(block_name: impl Into<String>, cell: BlockCoordinate) -> Self {
        Self {
            block_name: block_name.into(),
            cell,
            orientation: BlockOrientation::default(),
            working: true,
            light_properties: None,
        }
    }
}

/// A block as it sits on a grid.
#[derive(Clone)]
pub struct PlacedBlock {
    pub id: PlacedBlockId,
    pub block_id: BlockId,
    pub cell: BlockCoordinate,
    pub orientation: BlockOrientation,
    /// Present iff the block type emits light.
    pub light: Option<Arc<LightSourceHandle>>,
}

/// The serialized form of a placed block, detached from the grid. Used
/// by migration passes that rewrite a block before re-inserting it.
/// Never persisted.
#[derive(Clone, Debug)]
pub struct BlockSnapshot {
    pub block_name: String,
    pub cell: BlockCoordinate,
    pub orientation: BlockOrientation,
    pub working: bool,
    pub light_properties: Option<LightProperties>,
}

impl BlockSnapshot {
    pub fn into_placement(self) -> BlockPlacement {
        BlockPlacement {
            block_name: self.block_name,
            cell: self.cell,
            orientation: self.orientation,
            working: self.working,
            light_properties: self.light_properties,
        }
    }
}

/// Description of a grid to spawn: its world placement and initial
/// blocks.
#[derive(Clone, Debug)]
pub struct GridSpawn {
    pub origin: Vector3<f64>,
    pub cell_size: f64,
    pub blocks: Vec<BlockPlacement>,
}

impl Default for GridSpawn {
    fn default() -> Self {
        Self {
            origin: Vector3::new(0.0, 0.0, 0.0),
            cell_size: 2.5,
            blocks: Vec::new(),
        }
    }
}

/// A free-floating structure of placed blocks.
///
/// The block list must not be mutated while it is being enumerated;
/// passes that rewrite blocks snapshot the ids first and then mutate.
pub struct Grid {
    id: GridId,
    origin: Vector3<f64>,
    cell_size: f64,
    next_block_id: AtomicU64,
    blocks: Mutex<FxHashMap<PlacedBlockId, PlacedBlock>>,
}

impl Grid {
    pub fn id(&self) -> GridId {
        self.id
    }

    pub fn origin(&self) -> Vector3<f64> {
        self.origin
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn world_position_of(&self, cell: BlockCoordinate) -> Vector3<f64> {
        self.origin
            + Vector3::new(cell.x as f64, cell.y as f64, cell.z as f64) * self.cell_size
    }

    pub fn add_block(
        &self,
        ctx: &HandlerContext,
        placement: BlockPlacement,
    ) -> Result<PlacedBlockId> {
        let block_id = ctx
            .block_types()
            .get_by_name(&placement.block_name)
            .ok_or_else(|| BlockError::NameNotFound(placement.block_name.clone()))?;
        let block_type = ctx.block_types().get_block(block_id)?;

        let id = PlacedBlockId(self.next_block_id.fetch_add(1, Ordering::Relaxed));
        let light = block_type.light.as_ref().map(|definition| {
            let mut properties = placement
                .light_properties
                .unwrap_or_else(|| LightProperties::from_definition(definition));
            properties.intensity = definition.intensity.clamp(properties.intensity);
            LightSourceHandle::new(
                block_id,
                self.world_position_of(placement.cell),
                placement.working,
                properties,
            )
        });
        let placed = PlacedBlock {
            id,
            block_id,
            cell: placement.cell,
            orientation: placement.orientation,
            light,
        };
        if let Some(factory) = &block_type.behavior_factory {
            let behavior = factory(&placed);
            ctx.tick_driver().attach(id, behavior);
        }
        self.blocks.lock().insert(id, placed);
        Ok(id)
    }

    /// Removes a block. Its behavior (if any) is torn down synchronously
    /// before the block disappears from the grid.
    pub fn remove_block(&self, ctx: &HandlerContext, id: PlacedBlockId) -> Result<()> {
        ctx.tick_driver().detach(ctx, id);
        self.blocks
            .lock()
            .remove(&id)
            .with_context(|| format!("No block {:?} on {:?}", id, self.id))?;
        Ok(())
    }

    /// Snapshot of the current block ids, in a stable order. Safe to
    /// mutate the grid while iterating the returned list.
    pub fn block_ids(&self) -> Vec<PlacedBlockId> {
        let mut ids: Vec<_> = self.blocks.lock().keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn get_block(&self, id: PlacedBlockId) -> Option<PlacedBlock> {
        self.blocks.lock().get(&id).cloned()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.lock().len()
    }

    pub fn extract_snapshot(
        &self,
        ctx: &HandlerContext,
        id: PlacedBlockId,
    ) -> Result<BlockSnapshot> {
        let placed = self
            .get_block(id)
            .with_context(|| format!("No block {:?} on {:?}", id, self.id))?;
        let block_type = ctx.block_types().get_block(placed.block_id)?;
        let (working, light_properties) = match &placed.light {
            Some(handle) => (handle.working(), Some(handle.properties())),
            None => (true, None),
        };
        Ok(BlockSnapshot {
            block_name: block_type.short_name.clone(),
            cell: placed.cell,
            orientation: placed.orientation,
            working,
            light_properties,
        })
    }
}

/// Observer invoked after a grid has spawned with all of its initial
/// blocks in place.
pub type GridObserver = dyn Fn(&HandlerContext, &Arc<Grid>) -> Result<()> + Send + Sync;

pub struct GridManager {
    grids: Mutex<FxHashMap<GridId, Arc<Grid>>>,
    next_grid_id: AtomicU64,
    grid_added: Mutex<ObserverRegistry<GridObserver>>,
}

impl GridManager {
    pub(crate) fn new() -> Self {
        Self {
            grids: Mutex::new(FxHashMap::default()),
            next_grid_id: AtomicU64::new(1),
            grid_added: Mutex::new(ObserverRegistry::new()),
        }
    }

    /// Creates a grid with its initial blocks, then fires grid-added
    /// observers synchronously. Observer failures are logged and do not
    /// unwind into the caller.
    pub fn spawn_grid(&self, ctx: &HandlerContext, spawn: GridSpawn) -> Result<Arc<Grid>> {
        let grid = Arc::new(Grid {
            id: GridId(self.next_grid_id.fetch_add(1, Ordering::Relaxed)),
            origin: spawn.origin,
            cell_size: spawn.cell_size,
            next_block_id: AtomicU64::new(1),
            blocks: Mutex::new(FxHashMap::default()),
        });
        for placement in spawn.blocks {
            grid.add_block(ctx, placement)?;
        }
        self.grids.lock().insert(grid.id, grid.clone());

        let observers = self.grid_added.lock().snapshot();
        for observer in observers {
            if let Err(e) = observer(ctx, &grid) {
                error!("A grid-added observer failed for {:?}: {:#}", grid.id(), e);
            }
        }
        Ok(grid)
    }

    pub fn get_grid(&self, id: GridId) -> Option<Arc<Grid>> {
        self.grids.lock().get(&id).cloned()
    }

    pub fn grid_count(&self) -> usize {
        self.grids.lock().len()
    }

    pub fn subscribe_grid_added(&self, observer: Arc<GridObserver>) -> SubscriptionToken {
        self.grid_added.lock().subscribe(observer)
    }

    pub fn unsubscribe_grid_added(&self, token: SubscriptionToken) -> bool {
        self.grid_added.lock().unsubscribe(token)
    }

    pub fn grid_added_observer_count(&self) -> usize {
        self.grid_added.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_state::blocks::BlockType;
    use crate::game_state::SessionRole;
    use crate::server::ServerBuilder;
    use heliodor_core::orientation::Direction;

    fn test_ctx() -> HandlerContext {
        let mut builder = ServerBuilder::for_test(SessionRole::Server);
        builder
            .blocks_mut()
            .register_block(BlockType::new("test:slab", "Slab"))
            .unwrap();
        let server = builder.build().unwrap();
        server.game_state().handler_context()
    }

    #[test]
    fn add_remove_round_trip() {
        let ctx = test_ctx();
        let grid = ctx
            .grids()
            .spawn_grid(&ctx, GridSpawn::default())
            .unwrap();
        let id = grid
            .add_block(&ctx, BlockPlacement::new("test:slab", BlockCoordinate::new(1, 2, 3)))
            .unwrap();
        assert_eq!(grid.block_count(), 1);
        let placed = grid.get_block(id).unwrap();
        assert_eq!(placed.cell, BlockCoordinate::new(1, 2, 3));
        assert!(placed.light.is_none());

        grid.remove_block(&ctx, id).unwrap();
        assert_eq!(grid.block_count(), 0);
        assert!(grid.remove_block(&ctx, id).is_err());
    }

    #[test]
    fn unknown_block_type_rejected() {
        let ctx = test_ctx();
        let grid = ctx
            .grids()
            .spawn_grid(&ctx, GridSpawn::default())
            .unwrap();
        assert!(grid
            .add_block(&ctx, BlockPlacement::new("test:missing", BlockCoordinate::new(0, 0, 0)))
            .is_err());
    }

    #[test]
    fn snapshot_carries_placement_data() {
        let ctx = test_ctx();
        let grid = ctx
            .grids()
            .spawn_grid(&ctx, GridSpawn::default())
            .unwrap();
        let mut placement = BlockPlacement::new("test:slab", BlockCoordinate::new(4, 0, -2));
        placement.orientation =
            BlockOrientation::new(Direction::NegX, Direction::PosY).unwrap();
        let id = grid.add_block(&ctx, placement).unwrap();

        let snapshot = grid.extract_snapshot(&ctx, id).unwrap();
        assert_eq!(snapshot.block_name, "test:slab");
        assert_eq!(snapshot.cell, BlockCoordinate::new(4, 0, -2));
        assert_eq!(snapshot.orientation.forward, Direction::NegX);
        assert!(snapshot.light_properties.is_none());
    }

    #[test]
    fn world_position_scales_by_cell_size() {
        let ctx = test_ctx();
        let grid = ctx
            .grids()
            .spawn_grid(
                &ctx,
                GridSpawn {
                    origin: Vector3::new(10.0, 0.0, 0.0),
                    cell_size: 2.5,
                    blocks: vec![],
                },
            )
            .unwrap();
        assert_eq!(
            grid.world_position_of(BlockCoordinate::new(2, 0, -1)),
            Vector3::new(15.0, 0.0, -2.5)
        );
    }

    #[test]
    fn grid_added_observers_fire_after_blocks_exist() {
        let ctx = test_ctx();
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = seen.clone();
        let token = ctx.grids().subscribe_grid_added(Arc::new(move |_, grid| {
            *seen_clone.lock() = Some(grid.block_count());
            Ok(())
        }));

        let spawn = GridSpawn {
            blocks: vec![BlockPlacement::new(
                "test:slab",
                BlockCoordinate::new(0, 0, 0),
            )],
            ..Default::default()
        };
        let grid = ctx.grids().spawn_grid(&ctx, spawn).unwrap();
        assert_eq!(*seen.lock(), Some(1));
        assert_eq!(ctx.grids().grid_count(), 1);
        assert!(ctx.grids().get_grid(grid.id()).is_some());

        assert!(ctx.grids().unsubscribe_grid_added(token));
        assert_eq!(ctx.grids().grid_added_observer_count(), 0);
    }
}
