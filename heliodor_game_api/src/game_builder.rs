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

use anyhow::Result;
use heliodor_core::block_id::BlockId;
use heliodor_server::game_state::blocks::BlockType;
use heliodor_server::server::{Server, ServerBuilder};

/// Type-safe newtype wrapper for a const/static block name
#[derive(Clone, Copy)]
pub struct StaticBlockName(pub &'static str);

/// Stable API for building and configuring a simulation session.
pub struct GameBuilder {
    pub(crate) inner: ServerBuilder,
    pub(crate) lighting_initialized: bool,
}

impl GameBuilder {
    /// Creates a new game builder using server configuration from the
    /// command line. If argument parsing fails, usage info is printed to
    /// the terminal and the process exits.
    pub fn from_cmdline() -> Result<GameBuilder> {
        Ok(Self::from_serverbuilder(ServerBuilder::from_cmdline()?))
    }

    /// Creates a new game builder wrapping an existing server builder.
    pub fn from_serverbuilder(inner: ServerBuilder) -> GameBuilder {
        GameBuilder {
            inner,
            lighting_initialized: false,
        }
    }

    /// Registers a block with no light and no behavior; it just occupies
    /// a cell.
    pub fn add_simple_block(
        &mut self,
        short_name: StaticBlockName,
        display_name: impl Into<String>,
    ) -> Result<BlockId> {
        self.inner
            .blocks_mut()
            .register_block(BlockType::new(short_name.0, display_name))
    }

    /// Returns the built server, ready to run.
    pub fn build_server(self) -> Result<Server> {
        self.inner.build()
    }

    /// Run the simulation loop until shutdown.
    pub fn run_game_server(self) -> Result<()> {
        self.build_server()?.serve()
    }
}
