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

use std::fmt::Debug;

use cgmath::Vector3;

/// A grid-local cell coordinate.
///
/// Grids float freely in world space, so a cell coordinate is only
/// meaningful together with the grid that owns it; conversion to world
/// space goes through the grid's origin and cell size.
#[derive(PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub struct BlockCoordinate {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Debug for BlockCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("[{}, {}, {}]", self.x, self.y, self.z))
    }
}
impl BlockCoordinate {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// Chebyshev (rectangular) distance between two world-space positions:
/// the max of the per-axis absolute differences. Cheaper than Euclidean
/// distance and used for all view-distance tests.
#[inline]
pub fn chebyshev_distance(a: Vector3<f64>, b: Vector3<f64>) -> f64 {
    let dx = (a.x - b.x).abs();
    let dy = (a.y - b.y).abs();
    let dz = (a.z - b.z).abs();
    dx.max(dy).max(dz)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chebyshev_takes_max_axis() {
        let a = Vector3::new(0.0, 0.0, 0.0);
        let b = Vector3::new(3.0, -7.0, 2.0);
        assert_eq!(chebyshev_distance(a, b), 7.0);
        assert_eq!(chebyshev_distance(b, a), 7.0);
    }

    #[test]
    fn chebyshev_zero_for_equal_points() {
        let a = Vector3::new(12.5, -3.0, 400.0);
        assert_eq!(chebyshev_distance(a, a), 0.0);
    }
}
