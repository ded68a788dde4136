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

/// Named emissive sub-parts of a light block's model.
pub mod emissive_parts {
    /// The visible bulb; every light has one.
    pub const BULB: &str = "Bulb";
    /// The lens of a spotlight. Stays full-bright neutral when the light
    /// is off so it reads as glass rather than going black.
    pub const REFLECTOR: &str = "Reflector";
}

/// Short names for the stock light block types.
pub mod blocks {
    pub const INTERIOR_SMALL: &str = "lights:interior_small";
    pub const INTERIOR_LARGE: &str = "lights:interior_large";
    pub const SPOTLIGHT_SMALL: &str = "lights:spotlight_small";
    pub const SPOTLIGHT_LARGE: &str = "lights:spotlight_large";
    pub const CORNER_SMALL: &str = "lights:corner_small";
    pub const CORNER_LARGE: &str = "lights:corner_large";
    /// Deprecated first revision of the small interior light. Replaced
    /// on every newly spawned grid by [`INTERIOR_SMALL`].
    pub const INTERIOR_SMALL_MK1: &str = "lights:interior_small_mk1";
}
