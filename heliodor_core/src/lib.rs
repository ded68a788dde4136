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

//! Vocabulary types shared between the heliodor server engine and game
//! content: block identifiers, grid-local coordinates and orientations,
//! light colors, numeric slider bounds, and the session clock.

pub mod block_id;
pub mod bounds;
pub mod color;
pub mod constants;
pub mod coordinates;
pub mod orientation;
pub mod time;
