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

//! One-shot replacement of the deprecated small interior light on every
//! grid that spawns. Server-authoritative: a client session disarms its
//! handler permanently the first time it fires, so replicas never
//! diverge from the authority.

use std::sync::Arc;

use anyhow::Result;
use log::error;
use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use heliodor_core::constants::blocks;
use heliodor_server::game_state::event::{HandlerContext, SubscriptionToken};
use heliodor_server::game_state::grid::{Grid, PlacedBlockId};
use heliodor_server::game_state::GameState;

pub const LEGACY_LIGHT: &str = blocks::INTERIOR_SMALL_MK1;
pub const REPLACEMENT_LIGHT: &str = blocks::INTERIOR_SMALL;

pub(crate) fn register_grid_migration(game_state: &Arc<GameState>) -> Result<()> {
    // The handler holds its own subscription token so the client role
    // can deregister itself on first invocation.
    let token_slot: Arc<Mutex<Option<SubscriptionToken>>> = Arc::new(Mutex::new(None));
    let slot = token_slot.clone();
    let token = game_state
        .grids()
        .subscribe_grid_added(Arc::new(move |ctx, grid| migrate_grid(ctx, grid, &slot)));
    *token_slot.lock() = Some(token);
    Ok(())
}

fn migrate_grid(
    ctx: &HandlerContext,
    grid: &Arc<Grid>,
    token_slot: &Mutex<Option<SubscriptionToken>>,
) -> Result<()> {
    if !ctx.is_server() {
        if let Some(token) = token_slot.lock().take() {
            ctx.grids().unsubscribe_grid_added(token);
        }
        return Ok(());
    }
    let Some(legacy_id) = ctx.block_types().get_by_name(LEGACY_LIGHT) else {
        return Ok(());
    };

    // Snapshot the matching blocks first; the block list must not be
    // mutated while it is being enumerated.
    let mut pending: FxHashSet<PlacedBlockId> = FxHashSet::default();
    for id in grid.block_ids() {
        if grid.get_block(id).map(|b| b.block_id) == Some(legacy_id) {
            pending.insert(id);
        }
    }
    for id in pending.drain() {
        // One stubborn block doesn't stop the rest of the pass.
        if let Err(e) = replace_block(ctx, grid, id) {
            error!(
                "Replacing legacy light {:?} on {:?} failed: {:#}",
                id,
                grid.id(),
                e
            );
        }
    }
    Ok(())
}

fn replace_block(ctx: &HandlerContext, grid: &Arc<Grid>, id: PlacedBlockId) -> Result<()> {
    let mut snapshot = grid.extract_snapshot(ctx, id)?;
    snapshot.block_name = REPLACEMENT_LIGHT.to_string();
    // The two subtypes ship with opposite default "up" rotations.
    snapshot.orientation = snapshot.orientation.flip_up();
    grid.remove_block(ctx, id)?;
    grid.add_block(ctx, snapshot.into_placement())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_builder::{GameBuilder, StaticBlockName};
    use crate::lighting::LightingGameBuilder;
    use heliodor_core::coordinates::BlockCoordinate;
    use heliodor_core::orientation::{BlockOrientation, Direction};
    use heliodor_server::game_state::grid::{BlockPlacement, GridSpawn};
    use heliodor_server::game_state::light_source::LightProperties;
    use heliodor_server::game_state::SessionRole;
    use heliodor_server::server::ServerBuilder;

    fn game_state(role: SessionRole) -> Arc<GameState> {
        let mut game = GameBuilder::from_serverbuilder(ServerBuilder::for_test(role));
        game.initialize_lighting().unwrap();
        game.add_simple_block(StaticBlockName("test:slab"), "Slab")
            .unwrap();
        let server = game.build_server().unwrap();
        server.game_state().clone()
    }

    #[test]
    fn legacy_blocks_replaced_on_spawn() {
        let gs = game_state(SessionRole::Server);
        let ctx = gs.handler_context();

        let mut legacy = BlockPlacement::new(LEGACY_LIGHT, BlockCoordinate::new(0, 0, 0));
        legacy.orientation = BlockOrientation::new(Direction::PosX, Direction::NegY).unwrap();
        let spawn = GridSpawn {
            blocks: vec![
                legacy,
                BlockPlacement::new("test:slab", BlockCoordinate::new(1, 0, 0)),
            ],
            ..Default::default()
        };
        let grid = gs.grids().spawn_grid(&ctx, spawn).unwrap();

        let legacy_id = gs.block_types().get_by_name(LEGACY_LIGHT).unwrap();
        let replacement_id = gs.block_types().get_by_name(REPLACEMENT_LIGHT).unwrap();
        let blocks: Vec<_> = grid
            .block_ids()
            .iter()
            .map(|&id| grid.get_block(id).unwrap())
            .collect();

        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|b| b.block_id != legacy_id));

        let replaced = blocks
            .iter()
            .find(|b| b.block_id == replacement_id)
            .expect("replacement block missing");
        // Up inverted, forward preserved, cell unchanged.
        assert_eq!(replaced.orientation.forward, Direction::PosX);
        assert_eq!(replaced.orientation.up, Direction::PosY);
        assert_eq!(replaced.cell, BlockCoordinate::new(0, 0, 0));

        let slab_id = gs.block_types().get_by_name("test:slab").unwrap();
        let slab = blocks
            .iter()
            .find(|b| b.block_id == slab_id)
            .expect("unrelated block disturbed");
        assert_eq!(slab.cell, BlockCoordinate::new(1, 0, 0));
        assert_eq!(slab.orientation, BlockOrientation::default());
    }

    #[test]
    fn replacement_preserves_user_settings() {
        let gs = game_state(SessionRole::Server);
        let ctx = gs.handler_context();

        let properties = LightProperties {
            intensity: 7.5,
            color: heliodor_core::color::LightColor::new(0.2, 0.4, 0.9),
            blink_interval_seconds: 1.5,
            blink_offset_percent: 10.0,
            blink_length_percent: 30.0,
        };
        let mut legacy = BlockPlacement::new(LEGACY_LIGHT, BlockCoordinate::new(0, 0, 0));
        legacy.working = false;
        legacy.light_properties = Some(properties);
        let grid = gs
            .grids()
            .spawn_grid(
                &ctx,
                GridSpawn {
                    blocks: vec![legacy],
                    ..Default::default()
                },
            )
            .unwrap();

        let replaced = grid.get_block(grid.block_ids()[0]).unwrap();
        let handle = replaced.light.expect("replacement lost its light");
        assert!(!handle.working());
        assert_eq!(handle.properties(), properties);
    }

    #[test]
    fn client_role_disarms_permanently() {
        let gs = game_state(SessionRole::Client);
        let ctx = gs.handler_context();
        assert_eq!(gs.grids().grid_added_observer_count(), 1);

        let spawn = GridSpawn {
            blocks: vec![BlockPlacement::new(
                LEGACY_LIGHT,
                BlockCoordinate::new(0, 0, 0),
            )],
            ..Default::default()
        };
        let grid = gs.grids().spawn_grid(&ctx, spawn).unwrap();

        // No rewrite on a replica, and the handler is gone for good.
        let legacy_id = gs.block_types().get_by_name(LEGACY_LIGHT).unwrap();
        let block = grid.get_block(grid.block_ids()[0]).unwrap();
        assert_eq!(block.block_id, legacy_id);
        assert_eq!(gs.grids().grid_added_observer_count(), 0);
    }

    #[test]
    fn grid_without_legacy_blocks_untouched() {
        let gs = game_state(SessionRole::Server);
        let ctx = gs.handler_context();
        let spawn = GridSpawn {
            blocks: vec![
                BlockPlacement::new(REPLACEMENT_LIGHT, BlockCoordinate::new(0, 0, 0)),
                BlockPlacement::new("test:slab", BlockCoordinate::new(1, 0, 0)),
            ],
            ..Default::default()
        };
        let grid = gs.grids().spawn_grid(&ctx, spawn).unwrap();
        assert_eq!(grid.block_count(), 2);
        let ids = grid.block_ids();
        // Untouched blocks keep their original placement ids.
        assert_eq!(ids, vec![PlacedBlockId(1), PlacedBlockId(2)]);
    }
}
