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

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::game_state::blocks::BlockTypeManager;
use crate::game_state::{GameState, SessionRole};

#[derive(Parser, Debug, Clone)]
pub struct ServerArgs {
    /// The directory to use to store the session's data (settings etc.)
    #[arg(short, long, value_name = "DATA_DIR")]
    pub data_dir: PathBuf,

    /// Whether this session simulates authoritatively or replicates
    #[arg(long, value_enum, default_value_t = SessionRole::Server)]
    pub role: SessionRole,

    /// Overrides the simulation rate from settings.ron
    #[arg(long)]
    pub tick_rate_hz: Option<u32>,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct ServerSettings {
    /// Lights farther than this from the viewpoint (Chebyshev distance,
    /// world units) are not recomputed.
    pub view_distance: f64,
    /// Simulation ticks per second.
    pub tick_rate_hz: u32,
}

pub const SETTINGS_FILENAME: &str = "settings.ron";

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            view_distance: 3000.0,
            tick_rate_hz: 60,
        }
    }
}

pub(crate) fn load_settings(data_dir: &Path) -> Result<ServerSettings> {
    let config_file = data_dir.join(SETTINGS_FILENAME);
    if !config_file.exists() {
        log::info!("No settings found; using defaults");
        return Ok(Default::default());
    }
    let config = ron::from_str::<ServerSettings>(&std::fs::read_to_string(&config_file)?)?;
    log::info!("Loaded settings from {}", config_file.display());
    Ok(config)
}

/// Runs after the game state is built but before the simulation loop
/// starts. Plugins use this to subscribe to engine events that only
/// exist once the game state does.
pub type StartupAction = Box<dyn FnOnce(&Arc<GameState>) -> Result<()> + Send>;

pub struct ServerBuilder {
    settings: ServerSettings,
    role: SessionRole,
    block_types: BlockTypeManager,
    startup_actions: Vec<StartupAction>,
}

impl ServerBuilder {
    pub fn from_cmdline() -> Result<ServerBuilder> {
        Self::from_args(&ServerArgs::parse())
    }

    pub fn from_args(args: &ServerArgs) -> Result<ServerBuilder> {
        std::fs::create_dir_all(&args.data_dir)?;
        let mut settings = load_settings(&args.data_dir)?;
        if let Some(rate) = args.tick_rate_hz {
            settings.tick_rate_hz = rate;
        }
        Ok(Self {
            settings,
            role: args.role,
            block_types: BlockTypeManager::new(),
            startup_actions: Vec::new(),
        })
    }

    /// In-memory builder with default settings. For tests and
    /// embedding; touches no filesystem.
    pub fn for_test(role: SessionRole) -> ServerBuilder {
        Self {
            settings: Default::default(),
            role,
            block_types: BlockTypeManager::new(),
            startup_actions: Vec::new(),
        }
    }

    /// Borrows the block type registry for registration. Only available
    /// until [`Self::build`]; the registry is frozen afterwards.
    pub fn blocks_mut(&mut self) -> &mut BlockTypeManager {
        &mut self.block_types
    }

    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ServerSettings {
        &mut self.settings
    }

    pub fn role(&self) -> SessionRole {
        self.role
    }

    pub fn add_startup_action(&mut self, action: StartupAction) {
        self.startup_actions.push(action);
    }

    pub fn build(self) -> Result<Server> {
        let game_state = GameState::new(self.settings, self.role, Arc::new(self.block_types));
        for action in self.startup_actions {
            action(&game_state)?;
        }
        Ok(Server { game_state })
    }
}

pub struct Server {
    game_state: Arc<GameState>,
}

impl Server {
    pub fn game_state(&self) -> &Arc<GameState> {
        &self.game_state
    }

    /// Runs the simulation loop at the configured rate, blocking until
    /// `start_shutdown` is called on the game state.
    ///
    /// Single-threaded and cooperative: every behavior callback runs to
    /// completion inside its own tick.
    pub fn serve(&self) -> Result<()> {
        let rate = self.game_state.settings().tick_rate_hz.max(1);
        let period = Duration::from_secs_f64(1.0 / rate as f64);
        tracing::info!("Simulation loop starting at {} Hz", rate);
        let mut next_tick = Instant::now();
        while !self.game_state.is_shutting_down() {
            self.game_state.run_tick();
            next_tick += period;
            let now = Instant::now();
            if next_tick > now {
                std::thread::sleep(next_tick - now);
            } else {
                // Fell behind; don't try to catch up with a burst.
                next_tick = now;
            }
        }
        tracing::info!("Simulation loop stopped");
        Ok(())
    }

    /// Advances the simulation by a fixed number of ticks without
    /// pacing. Drives tests and headless tools.
    pub fn run_ticks(&self, count: u64) {
        for _ in 0..count {
            self.game_state.run_tick();
        }
    }
}
