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

use std::ops::Mul;

/// Linear RGB color of a light, components nominally in [0, 1].
///
/// Scaling does not clamp; emissive materials are allowed to go
/// over-bright and the renderer tone-maps as it sees fit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl LightColor {
    pub const WHITE: LightColor = LightColor::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    #[inline]
    pub fn scale(self, factor: f32) -> Self {
        Self {
            r: self.r * factor,
            g: self.g * factor,
            b: self.b * factor,
        }
    }
}

impl Mul<f32> for LightColor {
    type Output = LightColor;
    #[inline]
    fn mul(self, rhs: f32) -> Self::Output {
        self.scale(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_is_componentwise() {
        let c = LightColor::new(1.0, 0.5, 0.25) * 0.5;
        assert_eq!(c, LightColor::new(0.5, 0.25, 0.125));
    }

    #[test]
    fn scale_does_not_clamp() {
        let c = LightColor::WHITE.scale(2.0);
        assert_eq!(c.r, 2.0);
    }
}
