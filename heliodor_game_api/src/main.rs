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

use cgmath::Vector3;
use heliodor_core::color::LightColor;
use heliodor_core::constants::blocks;
use heliodor_core::coordinates::BlockCoordinate;
use heliodor_game_api::game_builder::{GameBuilder, StaticBlockName};
use heliodor_game_api::lighting::LightingGameBuilder;
use heliodor_server::game_state::grid::{BlockPlacement, GridSpawn};
use heliodor_server::game_state::light_source::LightProperties;
use tracing::metadata::LevelFilter;
use tracing_subscriber::prelude::*;

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer().with_filter(
                tracing_subscriber::EnvFilter::builder()
                    .with_default_directive(LevelFilter::INFO.into())
                    .from_env_lossy(),
            ),
        )
        .init();

    let mut game = GameBuilder::from_cmdline().unwrap();
    game.initialize_lighting().unwrap();
    game.add_simple_block(StaticBlockName("demo:frame"), "Frame")
        .unwrap();

    let server = game.build_server().unwrap();
    let game_state = server.game_state();
    let ctx = game_state.handler_context();
    game_state
        .grids()
        .spawn_grid(&ctx, demo_grid())
        .unwrap();
    game_state.set_viewpoint(Vector3::new(0.0, 0.0, -10.0));

    server.serve().unwrap();
}

/// A small demo structure: a frame row carrying a steady light, a
/// blinking beacon, a spotlight, and one deprecated light that the
/// migration replaces on spawn.
fn demo_grid() -> GridSpawn {
    let mut beacon = BlockPlacement::new(blocks::INTERIOR_LARGE, BlockCoordinate::new(1, 1, 0));
    beacon.light_properties = Some(LightProperties {
        intensity: 10.0,
        color: LightColor::new(1.0, 0.2, 0.2),
        blink_interval_seconds: 2.0,
        blink_offset_percent: 0.0,
        blink_length_percent: 50.0,
    });
    GridSpawn {
        blocks: vec![
            BlockPlacement::new("demo:frame", BlockCoordinate::new(0, 0, 0)),
            BlockPlacement::new("demo:frame", BlockCoordinate::new(1, 0, 0)),
            BlockPlacement::new("demo:frame", BlockCoordinate::new(2, 0, 0)),
            BlockPlacement::new(blocks::INTERIOR_SMALL, BlockCoordinate::new(0, 1, 0)),
            beacon,
            BlockPlacement::new(blocks::SPOTLIGHT_SMALL, BlockCoordinate::new(2, 1, 0)),
            BlockPlacement::new(blocks::INTERIOR_SMALL_MK1, BlockCoordinate::new(3, 1, 0)),
        ],
        ..Default::default()
    }
}
