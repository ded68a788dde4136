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

use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use log::{error, warn};
use parking_lot::Mutex;
use rand::Rng;
use rustc_hash::FxHashMap;

use super::event::HandlerContext;
use super::grid::PlacedBlockId;
use super::handlers::run_handler_impl;

/// How many ticks apart the low-frequency heartbeat checkpoints are.
pub const HEARTBEAT_INTERVAL_TICKS: u64 = 100;

/// Per-instance scheduling flags, owned by the driver and mutated by the
/// behavior itself. The driver honors whatever the behavior last
/// requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickSchedule {
    /// One-shot: run `bootstrap` on the next tick.
    pub bootstrap: bool,
    /// Run `update_each_frame` on every tick (the escalated state).
    pub each_frame: bool,
    /// Run `update_heartbeat` at this instance's checkpoint ticks.
    pub heartbeat: bool,
}

impl TickSchedule {
    /// Every new instance starts with a pending bootstrap and a
    /// heartbeat, and no per-frame ticking.
    pub const fn initial() -> Self {
        Self {
            bootstrap: true,
            each_frame: false,
            heartbeat: true,
        }
    }
}

/// Context passed to behavior callbacks while they run inside the tick
/// sweep. Gives access to the game state plus this instance's schedule
/// flags.
///
/// Behavior callbacks must not add or remove blocks, or re-enter the
/// driver through [`TickDriver::escalate`]; schedule changes from inside
/// a callback go through this context instead.
pub struct TickContext<'a> {
    inner: &'a HandlerContext,
    schedule: &'a mut TickSchedule,
}

impl<'a> TickContext<'a> {
    pub fn new(inner: &'a HandlerContext, schedule: &'a mut TickSchedule) -> Self {
        Self { inner, schedule }
    }

    /// Switches this instance to per-frame ticking.
    pub fn escalate(&mut self) {
        self.schedule.each_frame = true;
    }

    /// Parks this instance: heartbeat checkpoints only.
    pub fn park(&mut self) {
        self.schedule.each_frame = false;
    }

    pub fn is_escalated(&self) -> bool {
        self.schedule.each_frame
    }
}
impl Deref for TickContext<'_> {
    type Target = HandlerContext;
    #[inline]
    fn deref(&self) -> &Self::Target {
        self.inner
    }
}

/// A per-block simulation behavior driven by the tick driver.
///
/// All callbacks run on the simulation thread. Errors and panics are
/// caught at the driver boundary, logged, and the instance keeps its
/// last good state; a failing callback is not retried faster than its
/// normal cadence.
pub trait BlockBehavior: Send + Sync {
    /// Runs once, on the first tick after the block is placed. The
    /// instance is parked afterwards unless it escalates itself here.
    fn bootstrap(&mut self, ctx: &mut TickContext<'_>) -> Result<()>;

    /// Runs every tick while escalated.
    fn update_each_frame(&mut self, _ctx: &mut TickContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Runs at this instance's low-frequency checkpoint, in both the
    /// parked and escalated states.
    fn update_heartbeat(&mut self, _ctx: &mut TickContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Runs synchronously when the owning block is removed, before the
    /// removal completes. Must be safe to call even if `bootstrap`
    /// failed partway.
    fn teardown(&mut self, ctx: &HandlerContext);
}

struct BehaviorEntry {
    behavior: Box<dyn BlockBehavior>,
    schedule: TickSchedule,
    /// Which tick (mod the heartbeat interval) this instance's
    /// checkpoint lands on. Randomized per instance so thousands of
    /// parked lights don't all recompute on the same tick.
    heartbeat_phase: u64,
}

/// Owns every live behavior instance and drives their callbacks from
/// the simulation loop.
pub struct TickDriver {
    entries: Mutex<FxHashMap<PlacedBlockId, BehaviorEntry>>,
    tick: AtomicU64,
}

impl TickDriver {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(FxHashMap::default()),
            tick: AtomicU64::new(0),
        }
    }

    pub fn attach(&self, id: PlacedBlockId, behavior: Box<dyn BlockBehavior>) {
        let heartbeat_phase = rand::thread_rng().gen_range(0..HEARTBEAT_INTERVAL_TICKS);
        let prior = self.entries.lock().insert(
            id,
            BehaviorEntry {
                behavior,
                schedule: TickSchedule::initial(),
                heartbeat_phase,
            },
        );
        if prior.is_some() {
            warn!("Replaced a live behavior for {:?} without teardown", id);
        }
    }

    /// Removes and tears down the behavior for a block, if one exists.
    pub(crate) fn detach(&self, ctx: &HandlerContext, id: PlacedBlockId) {
        let entry = self.entries.lock().remove(&id);
        if let Some(mut entry) = entry {
            if let Err(e) = run_handler_impl(
                || {
                    entry.behavior.teardown(ctx);
                    Ok(())
                },
                "teardown",
            ) {
                error!("Teardown failed for {:?}: {:#}", id, e);
            }
        }
    }

    /// Requests per-frame ticking for an instance, from outside the tick
    /// sweep (e.g. a change-notification observer). Returns false if the
    /// instance no longer exists.
    pub fn escalate(&self, id: PlacedBlockId) -> bool {
        match self.entries.lock().get_mut(&id) {
            Some(entry) => {
                entry.schedule.each_frame = true;
                true
            }
            None => false,
        }
    }

    pub fn is_escalated(&self, id: PlacedBlockId) -> bool {
        self.entries
            .lock()
            .get(&id)
            .map(|entry| entry.schedule.each_frame)
            .unwrap_or(false)
    }

    pub fn behavior_count(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn current_tick(&self) -> u64 {
        self.tick.load(Ordering::Relaxed)
    }

    pub(crate) fn next_tick(&self) -> u64 {
        self.tick.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn run_tick(&self, ctx: &HandlerContext) {
        let tick = ctx.tick();
        let mut entries = self.entries.lock();
        for (&id, entry) in entries.iter_mut() {
            let BehaviorEntry {
                behavior,
                schedule,
                heartbeat_phase,
            } = entry;
            if schedule.bootstrap {
                schedule.bootstrap = false;
                let mut tick_ctx = TickContext::new(ctx, &mut *schedule);
                if let Err(e) =
                    run_handler_impl(|| behavior.bootstrap(&mut tick_ctx), "bootstrap")
                {
                    error!("Bootstrap failed for {:?}: {:#}", id, e);
                }
            }
            if schedule.each_frame {
                let mut tick_ctx = TickContext::new(ctx, &mut *schedule);
                if let Err(e) =
                    run_handler_impl(|| behavior.update_each_frame(&mut tick_ctx), "frame update")
                {
                    error!("Frame update failed for {:?}: {:#}", id, e);
                }
            }
            if schedule.heartbeat && tick % HEARTBEAT_INTERVAL_TICKS == *heartbeat_phase {
                let mut tick_ctx = TickContext::new(ctx, &mut *schedule);
                if let Err(e) =
                    run_handler_impl(|| behavior.update_heartbeat(&mut tick_ctx), "heartbeat")
                {
                    error!("Heartbeat failed for {:?}: {:#}", id, e);
                }
            }
        }
    }
}
