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

//! This crate contains the game content for heliodor: the stock light
//! block types and the fade/blink behavior that drives them, plus the
//! grid migration that retires the deprecated light subtype.

/// Provides functionality to build and start a simulation session.
pub mod game_builder;

/// The light blocks: registration, per-instance behavior, migration.
pub mod lighting;

pub use heliodor_core::constants;
