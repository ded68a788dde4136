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
use std::sync::Arc;

use smallvec::SmallVec;

use super::GameState;

/// Common details for all events that are passed to event handlers and
/// block behaviors.
#[derive(Clone)]
pub struct HandlerContext {
    /// Sequence number of the simulation tick this event belongs to.
    pub(crate) tick: u64,
    /// Access to the rest of the engine.
    pub(crate) game_state: Arc<GameState>,
}

impl HandlerContext {
    pub(crate) fn new(tick: u64, game_state: Arc<GameState>) -> Self {
        Self { tick, game_state }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }
}
impl Deref for HandlerContext {
    type Target = GameState;
    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.game_state
    }
}

/// Proof of an observer registration. Required to deregister; tokens are
/// single-use and scoped to the registry that issued them.
#[derive(Debug, PartialEq, Eq, Hash)]
#[must_use = "dropping the token makes the subscription impossible to remove"]
pub struct SubscriptionToken(u64);

/// Ordered list of observers with explicit registration/deregistration.
///
/// Dispatch works on a snapshot of the list, so an observer may
/// unsubscribe itself (or others) while being invoked.
pub(crate) struct ObserverRegistry<F: ?Sized> {
    next_token: u64,
    observers: Vec<(u64, Arc<F>)>,
}

impl<F: ?Sized> ObserverRegistry<F> {
    pub(crate) fn new() -> Self {
        Self {
            next_token: 1,
            observers: Vec::new(),
        }
    }

    pub(crate) fn subscribe(&mut self, observer: Arc<F>) -> SubscriptionToken {
        let token = self.next_token;
        self.next_token += 1;
        self.observers.push((token, observer));
        SubscriptionToken(token)
    }

    /// Returns false if the token was already used or never issued here.
    pub(crate) fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(t, _)| *t != token.0);
        self.observers.len() != before
    }

    pub(crate) fn snapshot(&self) -> SmallVec<[Arc<F>; 4]> {
        self.observers.iter().map(|(_, o)| o.clone()).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }
}

impl<F: ?Sized> Default for ObserverRegistry<F> {
    fn default() -> Self {
        Self::new()
    }
}
