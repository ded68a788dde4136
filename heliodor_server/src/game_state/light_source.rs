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

use std::sync::Arc;

use cgmath::Vector3;
use log::warn;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use heliodor_core::block_id::BlockId;
use heliodor_core::color::LightColor;

use super::blocks::LightDefinition;
use super::event::{HandlerContext, ObserverRegistry, SubscriptionToken};

/// Observer invoked when a light's working flag or user properties
/// change. Observers run synchronously on the simulation thread, in
/// registration order.
pub type LightObserver = dyn Fn(&HandlerContext) -> anyhow::Result<()> + Send + Sync;

/// The user-adjustable settings of a light block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightProperties {
    pub intensity: f32,
    pub color: LightColor,
    /// 0 disables blinking entirely.
    pub blink_interval_seconds: f32,
    /// Phase offset within the interval, 0..100.
    pub blink_offset_percent: f32,
    /// Fraction of the interval the light is on, 0..100.
    pub blink_length_percent: f32,
}

impl LightProperties {
    pub fn from_definition(definition: &LightDefinition) -> Self {
        Self {
            intensity: definition.intensity.default,
            color: LightColor::WHITE,
            blink_interval_seconds: 0.0,
            blink_offset_percent: 0.0,
            blink_length_percent: 100.0,
        }
    }
}

struct LightSourceInner {
    working: bool,
    properties: LightProperties,
    /// Last published (color, intensity) per emissive part name. The
    /// renderer consumes this; tests observe it.
    emissive: FxHashMap<String, (LightColor, f32)>,
    publish_count: u64,
}

/// The engine-side entity a light behavior drives: a read-only view of
/// the block's user settings plus the emissive write surface, with
/// change notifications delivered through explicit observer
/// registration.
pub struct LightSourceHandle {
    block_id: BlockId,
    position: Vector3<f64>,
    inner: Mutex<LightSourceInner>,
    working_observers: Mutex<ObserverRegistry<LightObserver>>,
    properties_observers: Mutex<ObserverRegistry<LightObserver>>,
}

impl LightSourceHandle {
    pub fn new(
        block_id: BlockId,
        position: Vector3<f64>,
        working: bool,
        properties: LightProperties,
    ) -> Arc<Self> {
        Arc::new(Self {
            block_id,
            position,
            inner: Mutex::new(LightSourceInner {
                working,
                properties,
                emissive: FxHashMap::default(),
                publish_count: 0,
            }),
            working_observers: Mutex::new(ObserverRegistry::new()),
            properties_observers: Mutex::new(ObserverRegistry::new()),
        })
    }

    pub fn block_id(&self) -> BlockId {
        self.block_id
    }

    pub fn world_position(&self) -> Vector3<f64> {
        self.position
    }

    pub fn working(&self) -> bool {
        self.inner.lock().working
    }

    pub fn properties(&self) -> LightProperties {
        self.inner.lock().properties
    }

    /// Toggles the block's functional state; fires working-changed
    /// observers if the value actually changed.
    pub fn set_working(&self, ctx: &HandlerContext, working: bool) {
        {
            let mut inner = self.inner.lock();
            if inner.working == working {
                return;
            }
            inner.working = working;
        }
        self.notify(ctx, &self.working_observers, "working-changed");
    }

    /// Replaces the user settings and fires properties-changed
    /// observers, even if nothing changed (the UI republishes settings
    /// wholesale and observers must be idempotent).
    pub fn update_properties(&self, ctx: &HandlerContext, properties: LightProperties) {
        self.inner.lock().properties = properties;
        self.notify(ctx, &self.properties_observers, "properties-changed");
    }

    pub fn set_emissive_part(&self, part: &str, color: LightColor, intensity: f32) {
        let mut inner = self.inner.lock();
        inner.publish_count += 1;
        inner.emissive.insert(part.to_string(), (color, intensity));
    }

    /// Last published emissive state for a part, or None if that part
    /// has never been published.
    pub fn emissive_part(&self, part: &str) -> Option<(LightColor, f32)> {
        self.inner.lock().emissive.get(part).copied()
    }

    /// Total number of emissive publishes across all parts.
    pub fn publish_count(&self) -> u64 {
        self.inner.lock().publish_count
    }

    pub fn subscribe_working_changed(&self, observer: Arc<LightObserver>) -> SubscriptionToken {
        self.working_observers.lock().subscribe(observer)
    }

    pub fn subscribe_properties_changed(&self, observer: Arc<LightObserver>) -> SubscriptionToken {
        self.properties_observers.lock().subscribe(observer)
    }

    pub fn unsubscribe_working_changed(&self, token: SubscriptionToken) -> bool {
        self.working_observers.lock().unsubscribe(token)
    }

    pub fn unsubscribe_properties_changed(&self, token: SubscriptionToken) -> bool {
        self.properties_observers.lock().unsubscribe(token)
    }

    fn notify(
        &self,
        ctx: &HandlerContext,
        registry: &Mutex<ObserverRegistry<LightObserver>>,
        what: &str,
    ) {
        // Dispatch over a snapshot with no registry lock held, so an
        // observer can unsubscribe during its own invocation.
        let observers = registry.lock().snapshot();
        for observer in observers {
            if let Err(e) = observer(ctx) {
                warn!(
                    "A {} observer for {:?} failed: {:#}",
                    what, self.block_id, e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::game_state::SessionRole;
    use crate::server::ServerBuilder;

    fn test_ctx() -> HandlerContext {
        let server = ServerBuilder::for_test(SessionRole::Server)
            .build()
            .unwrap();
        server.game_state().handler_context()
    }

    fn test_properties() -> LightProperties {
        LightProperties {
            intensity: 1.0,
            color: LightColor::WHITE,
            blink_interval_seconds: 0.0,
            blink_offset_percent: 0.0,
            blink_length_percent: 100.0,
        }
    }

    #[test]
    fn working_changed_fires_only_on_transitions() {
        let ctx = test_ctx();
        let handle =
            LightSourceHandle::new(BlockId(0), Vector3::new(0.0, 0.0, 0.0), true, test_properties());
        let fired = Arc::new(AtomicU32::new(0));
        let fired_clone = fired.clone();
        let token = handle.subscribe_working_changed(Arc::new(move |_| {
            fired_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));

        handle.set_working(&ctx, true); // no transition
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        handle.set_working(&ctx, false);
        handle.set_working(&ctx, true);
        assert_eq!(fired.load(Ordering::SeqCst), 2);

        assert!(handle.unsubscribe_working_changed(token));
        handle.set_working(&ctx, false);
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn properties_changed_fires_even_when_unchanged() {
        let ctx = test_ctx();
        let handle =
            LightSourceHandle::new(BlockId(0), Vector3::new(0.0, 0.0, 0.0), true, test_properties());
        let fired = Arc::new(AtomicU32::new(0));
        let fired_clone = fired.clone();
        let _token = handle.subscribe_properties_changed(Arc::new(move |_| {
            fired_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));

        handle.update_properties(&ctx, test_properties());
        handle.update_properties(&ctx, test_properties());
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn emissive_parts_read_back() {
        let handle =
            LightSourceHandle::new(BlockId(0), Vector3::new(0.0, 0.0, 0.0), true, test_properties());
        assert_eq!(handle.emissive_part("Bulb"), None);
        handle.set_emissive_part("Bulb", LightColor::new(1.0, 0.0, 0.0), 0.5);
        assert_eq!(
            handle.emissive_part("Bulb"),
            Some((LightColor::new(1.0, 0.0, 0.0), 0.5))
        );
        assert_eq!(handle.publish_count(), 1);
    }
}
