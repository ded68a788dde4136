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

pub mod blocks;
pub mod event;
pub mod grid;
pub mod handlers;
pub mod light_source;
pub mod tick;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cgmath::Vector3;
use parking_lot::Mutex;

use heliodor_core::time::TimeState;

use crate::server::ServerSettings;

use self::blocks::BlockTypeManager;
use self::event::HandlerContext;
use self::grid::GridManager;
use self::tick::TickDriver;

/// Whether this session is the authoritative simulation or a client
/// replica. Grid rewrites are only performed by the server role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum SessionRole {
    Server,
    Client,
}

impl std::fmt::Display for SessionRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SessionRole::Server => "server",
            SessionRole::Client => "client",
        })
    }
}

pub struct GameState {
    block_types: Arc<BlockTypeManager>,
    grids: GridManager,
    tick_driver: TickDriver,
    time_state: Mutex<TimeState>,
    viewpoint: Mutex<Vector3<f64>>,
    settings: ServerSettings,
    role: SessionRole,
    early_shutdown: AtomicBool,
}

impl GameState {
    pub(crate) fn new(
        settings: ServerSettings,
        role: SessionRole,
        block_types: Arc<BlockTypeManager>,
    ) -> Arc<Self> {
        Arc::new(Self {
            block_types,
            grids: GridManager::new(),
            tick_driver: TickDriver::new(),
            time_state: Mutex::new(TimeState::new()),
            viewpoint: Mutex::new(Vector3::new(0.0, 0.0, 0.0)),
            settings,
            role,
            early_shutdown: AtomicBool::new(false),
        })
    }

    pub fn block_types(&self) -> &BlockTypeManager {
        &self.block_types
    }

    pub fn grids(&self) -> &GridManager {
        &self.grids
    }

    pub fn tick_driver(&self) -> &TickDriver {
        &self.tick_driver
    }

    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    pub fn role(&self) -> SessionRole {
        self.role
    }

    pub fn is_server(&self) -> bool {
        self.role == SessionRole::Server
    }

    /// Current observer position, polled by behaviors for their
    /// view-distance gating.
    pub fn viewpoint(&self) -> Vector3<f64> {
        *self.viewpoint.lock()
    }

    pub fn set_viewpoint(&self, position: Vector3<f64>) {
        *self.viewpoint.lock() = position;
    }

    /// Milliseconds on the session clock; the timebase for blink phases.
    pub fn elapsed_ms(&self) -> u64 {
        self.time_state.lock().elapsed_ms()
    }

    pub fn handler_context(self: &Arc<Self>) -> HandlerContext {
        HandlerContext::new(self.tick_driver.current_tick(), self.clone())
    }

    /// Advances the simulation by one tick, running every due behavior
    /// callback.
    pub fn run_tick(self: &Arc<Self>) {
        let tick = self.tick_driver.next_tick();
        let ctx = HandlerContext::new(tick, self.clone());
        self.tick_driver.run_tick(&ctx);
    }

    /// Start shutting down the simulation loop.
    pub fn start_shutdown(&self) {
        self.early_shutdown.store(true, Ordering::SeqCst);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.early_shutdown.load(Ordering::SeqCst)
    }
}
