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

use std::sync::{Arc, Weak};

use anyhow::{ensure, Result};
use log::error;
use parking_lot::Mutex;

use heliodor_core::bounds::Bounds;
use heliodor_core::color::LightColor;
use heliodor_core::constants::emissive_parts;
use heliodor_core::coordinates::chebyshev_distance;
use heliodor_server::game_state::blocks::LightKind;
use heliodor_server::game_state::event::{HandlerContext, SubscriptionToken};
use heliodor_server::game_state::grid::{PlacedBlock, PlacedBlockId};
use heliodor_server::game_state::light_source::{LightObserver, LightSourceHandle};
use heliodor_server::game_state::tick::{BlockBehavior, TickContext};

/// How much light power changes per simulated tick while fading.
///
/// This must match the fade speed of the actual light cone in the host
/// renderer, so the emissive glow and the cone brighten in lockstep.
pub(crate) const LIGHT_FADE_STEP: f32 = 0.05;

/// Blink intervals at or below this are treated as blinking disabled.
const BLINK_DISABLED_THRESHOLD_SECONDS: f32 = 0.00099;

/// One clamped fade step of light power toward its target (1 when
/// working, 0 otherwise).
pub(crate) fn next_power(power: f32, working: bool) -> f32 {
    (power + if working { LIGHT_FADE_STEP } else { -LIGHT_FADE_STEP }).clamp(0.0, 1.0)
}

/// Whether the duty cycle has the light on at the given session time.
///
/// The phase is `(now - offset) mod interval` in unsigned millisecond
/// arithmetic; the offset is subtracted saturating so a young session
/// clock cannot underflow past a large offset.
pub(crate) fn blink_is_on(
    now_ms: u64,
    interval_seconds: f32,
    offset_percent: f32,
    length_percent: f32,
) -> bool {
    if interval_seconds <= BLINK_DISABLED_THRESHOLD_SECONDS {
        return true;
    }
    let interval_ms = (interval_seconds * 1000.0) as u64;
    if interval_ms == 0 {
        return true;
    }
    let offset_ms = (interval_ms as f32 * offset_percent * 0.01) as u64;
    let on_duration_ms = (interval_ms as f32 * length_percent * 0.01) as u64;
    let phase = now_ms.saturating_sub(offset_ms) % interval_ms;
    on_duration_ms > phase
}

/// The light definition data a behavior needs, snapshotted once at
/// bootstrap. Definitions are immutable after registration, so there is
/// no need to re-resolve them on every recompute.
#[derive(Clone, Copy)]
struct LightDefSnapshot {
    kind: LightKind,
    intensity: Bounds,
}

struct Subscriptions {
    working: SubscriptionToken,
    properties: SubscriptionToken,
}

/// Derived per-instance state. Never persisted: it is recomputed from
/// the block's own properties as the simulation runs.
struct LightState {
    placed_id: PlacedBlockId,
    handle: Weak<LightSourceHandle>,
    definition: Option<LightDefSnapshot>,
    subscriptions: Option<Subscriptions>,
    /// Set when bootstrap could not resolve the handle or definition.
    /// An inert instance never publishes and never escalates.
    inert: bool,
    /// Fade ramp position in [0, 1].
    power: f32,
    /// User intensity normalized against the definition's maximum.
    intensity_factor: f32,
    bulb_color: LightColor,
    blink_on: bool,
    enabled: bool,
    /// Tick the power ramp last advanced on. The ramp moves at most one
    /// step per simulated tick no matter how many recomputes run in it.
    last_power_tick: Option<u64>,
}

impl LightState {
    fn beyond_view_distance(&self, ctx: &HandlerContext, handle: &LightSourceHandle) -> bool {
        chebyshev_distance(ctx.viewpoint(), handle.world_position())
            > ctx.settings().view_distance
    }

    fn advance_power(&mut self, ctx: &HandlerContext, working: bool) {
        if self.last_power_tick == Some(ctx.tick()) {
            return;
        }
        self.last_power_tick = Some(ctx.tick());
        self.power = next_power(self.power, working);
    }

    fn update_enabled(&mut self) {
        self.enabled = self.blink_on && self.power * self.intensity_factor > 0.0;
    }

    /// Full recompute, run on working/properties changes and at every
    /// in-range heartbeat. Returns whether the caller should escalate
    /// the instance to per-frame ticking.
    fn update_settings(&mut self, ctx: &HandlerContext) -> Result<bool> {
        if self.inert {
            return Ok(false);
        }
        let Some(handle) = self.handle.upgrade() else {
            return Ok(false);
        };
        if self.beyond_view_distance(ctx, &handle) {
            // Too far away to be visible; don't pay for the recompute.
            return Ok(false);
        }
        let Some(definition) = self.definition else {
            return Ok(false);
        };

        let properties = handle.properties();
        self.intensity_factor = definition.intensity.normalize(properties.intensity);
        self.bulb_color = properties.color * (0.5 * self.intensity_factor).max(0.3);
        self.advance_power(ctx, handle.working());
        self.update_enabled();
        self.publish_emissivity(&handle, definition.kind);
        Ok(true)
    }

    /// Per-frame update while escalated: advance the fade ramp, resample
    /// the blink phase, republish.
    fn tick(&mut self, ctx: &HandlerContext) -> Result<()> {
        if self.inert {
            return Ok(());
        }
        let Some(handle) = self.handle.upgrade() else {
            return Ok(());
        };
        let Some(definition) = self.definition else {
            return Ok(());
        };

        let properties = handle.properties();
        self.advance_power(ctx, handle.working());
        self.blink_on = blink_is_on(
            ctx.elapsed_ms(),
            properties.blink_interval_seconds,
            properties.blink_offset_percent,
            properties.blink_length_percent,
        );
        self.update_enabled();
        // The ramp keeps moving off-screen, but an out-of-range light
        // never publishes.
        if !self.beyond_view_distance(ctx, &handle) {
            self.publish_emissivity(&handle, definition.kind);
        }
        Ok(())
    }

    fn publish_emissivity(&self, handle: &LightSourceHandle, kind: LightKind) {
        let intensity = if self.enabled {
            self.power * self.intensity_factor
        } else {
            0.0
        };
        handle.set_emissive_part(emissive_parts::BULB, self.bulb_color, intensity);
        if kind == LightKind::Spotlight {
            // An off spotlight keeps a neutral full-bright lens so it
            // reads as glass instead of going black.
            let lens_color = if intensity > 0.0 {
                self.bulb_color
            } else {
                LightColor::WHITE
            };
            handle.set_emissive_part(emissive_parts::REFLECTOR, lens_color, intensity);
        }
    }

    fn teardown(&mut self) {
        if let Some(subscriptions) = self.subscriptions.take() {
            if let Some(handle) = self.handle.upgrade() {
                handle.unsubscribe_working_changed(subscriptions.working);
                handle.unsubscribe_properties_changed(subscriptions.properties);
            }
        }
    }
}

/// The behavior attached to every light-emitting block: a fade ramp
/// toward the working state, a blink duty cycle synchronized to the
/// session clock, and emissive publishing for the model's light parts —
/// throttled to heartbeat cadence whenever the light is settled or out
/// of view.
pub struct LightingBlock {
    state: Arc<Mutex<LightState>>,
}

impl LightingBlock {
    pub(crate) fn new(placed: &PlacedBlock) -> Self {
        Self {
            state: Arc::new(Mutex::new(LightState {
                placed_id: placed.id,
                handle: placed
                    .light
                    .as_ref()
                    .map(Arc::downgrade)
                    .unwrap_or_default(),
                definition: None,
                subscriptions: None,
                inert: false,
                power: 0.0,
                intensity_factor: 0.0,
                bulb_color: LightColor::WHITE,
                blink_on: false,
                enabled: false,
                last_power_tick: None,
            })),
        }
    }

    /// Observer shared by both change notifications. Runs the full
    /// recompute and, outside the tick sweep, escalates through the
    /// driver.
    fn make_observer(state: Arc<Mutex<LightState>>, placed_id: PlacedBlockId) -> Arc<LightObserver> {
        Arc::new(move |ctx: &HandlerContext| {
            let wants_escalation = state.lock().update_settings(ctx)?;
            if wants_escalation {
                ctx.tick_driver().escalate(placed_id);
            }
            Ok(())
        })
    }
}

impl BlockBehavior for LightingBlock {
    fn bootstrap(&mut self, ctx: &mut TickContext<'_>) -> Result<()> {
        let mut state = self.state.lock();
        ensure!(
            state.subscriptions.is_none(),
            "Light behavior for {:?} bootstrapped twice without teardown",
            state.placed_id
        );
        let Some(handle) = state.handle.upgrade() else {
            error!(
                "Light behavior for {:?} has no light source handle; leaving it dark",
                state.placed_id
            );
            state.inert = true;
            return Ok(());
        };
        let Some(definition) = ctx.block_types().light_definition(handle.block_id()) else {
            error!(
                "No light definition for {:?} ({:?}); leaving it dark",
                handle.block_id(),
                state.placed_id
            );
            state.inert = true;
            return Ok(());
        };
        state.definition = Some(LightDefSnapshot {
            kind: definition.kind,
            intensity: definition.intensity,
        });

        let observer = Self::make_observer(self.state.clone(), state.placed_id);
        state.subscriptions = Some(Subscriptions {
            working: handle.subscribe_working_changed(observer.clone()),
            properties: handle.subscribe_properties_changed(observer),
        });

        // Synchronous initial recompute so the block doesn't spend its
        // first heartbeat interval dark.
        if state.update_settings(ctx)? {
            ctx.escalate();
        }
        Ok(())
    }

    fn update_each_frame(&mut self, ctx: &mut TickContext<'_>) -> Result<()> {
        self.state.lock().tick(ctx)
    }

    fn update_heartbeat(&mut self, ctx: &mut TickContext<'_>) -> Result<()> {
        let mut state = self.state.lock();
        if state.inert {
            return Ok(());
        }
        let Some(handle) = state.handle.upgrade() else {
            return Ok(());
        };
        if state.beyond_view_distance(ctx, &handle) {
            // Out of sight: no per-frame work and no publishing until a
            // later checkpoint brings it back into range.
            ctx.park();
            return Ok(());
        }
        // Full recompute so settings changed while parked are picked up.
        state.update_settings(ctx)?;

        let properties = handle.properties();
        let blinking = properties.blink_interval_seconds > BLINK_DISABLED_THRESHOLD_SECONDS;
        let still_fading = next_power(state.power, handle.working()) != state.power;
        if blinking || still_fading {
            ctx.escalate();
        } else {
            ctx.park();
        }
        Ok(())
    }

    fn teardown(&mut self, _ctx: &HandlerContext) {
        self.state.lock().teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fade_steps_are_fixed_and_clamped() {
        assert_eq!(next_power(0.0, true), 0.05);
        assert_eq!(next_power(0.5, true), 0.55);
        assert_eq!(next_power(0.98, true), 1.0);
        assert_eq!(next_power(1.0, true), 1.0);
        assert_eq!(next_power(1.0, false), 0.95);
        assert_eq!(next_power(0.03, false), 0.0);
        assert_eq!(next_power(0.0, false), 0.0);
    }

    #[test]
    fn fade_settles_exactly_on_the_bounds() {
        let mut power = 0.0f32;
        let mut previous = power;
        for _ in 0..21 {
            power = next_power(power, true);
            assert!(power > previous || power == 1.0);
            previous = power;
        }
        assert_eq!(power, 1.0);
        for _ in 0..21 {
            power = next_power(power, false);
        }
        assert_eq!(power, 0.0);
    }

    #[test]
    fn blink_disabled_is_always_on() {
        for now_ms in [0, 1, 999, 123_456_789, u64::MAX / 2] {
            assert!(blink_is_on(now_ms, 0.0, 0.0, 50.0));
            assert!(blink_is_on(now_ms, 0.0009, 25.0, 0.0));
        }
    }

    #[test]
    fn blink_duty_cycle_two_seconds_half_on() {
        // 2 s interval, no offset, on for the first half of each cycle.
        for now_ms in [0, 1, 500, 999] {
            assert!(blink_is_on(now_ms, 2.0, 0.0, 50.0), "at {}", now_ms);
        }
        for now_ms in [1000, 1500, 1999] {
            assert!(!blink_is_on(now_ms, 2.0, 0.0, 50.0), "at {}", now_ms);
        }
        // Cyclic
        assert!(blink_is_on(2000, 2.0, 0.0, 50.0));
        assert!(blink_is_on(2999, 2.0, 0.0, 50.0));
        assert!(!blink_is_on(3000, 2.0, 0.0, 50.0));
    }

    #[test]
    fn blink_offset_shifts_phase_without_underflow() {
        // 50% offset of a 2 s interval = 1000 ms.
        // Clock younger than the offset saturates to phase 0: on.
        assert!(blink_is_on(0, 2.0, 50.0, 50.0));
        assert!(blink_is_on(500, 2.0, 50.0, 50.0));
        assert!(blink_is_on(1500, 2.0, 50.0, 50.0));
        assert!(!blink_is_on(2500, 2.0, 50.0, 50.0));
        assert!(blink_is_on(3500, 2.0, 50.0, 50.0));
    }

    #[test]
    fn blink_full_length_is_always_on() {
        for now_ms in [0, 750, 1999, 2000, 5432] {
            assert!(blink_is_on(now_ms, 2.0, 0.0, 100.0));
        }
    }
}
