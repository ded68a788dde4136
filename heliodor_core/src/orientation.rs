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

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrientationError {
    #[error("forward ({0:?}) and up ({1:?}) must lie on different axes")]
    ParallelAxes(Direction, Direction),
}

/// One of the six axis-aligned directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

pub const ALL_DIRECTIONS: [Direction; 6] = [
    Direction::PosX,
    Direction::NegX,
    Direction::PosY,
    Direction::NegY,
    Direction::PosZ,
    Direction::NegZ,
];

impl Direction {
    pub const fn opposite(self) -> Direction {
        match self {
            Direction::PosX => Direction::NegX,
            Direction::NegX => Direction::PosX,
            Direction::PosY => Direction::NegY,
            Direction::NegY => Direction::PosY,
            Direction::PosZ => Direction::NegZ,
            Direction::NegZ => Direction::PosZ,
        }
    }

    /// The axis this direction lies on, ignoring sign. Two directions on
    /// the same axis cannot form a valid orientation pair.
    pub const fn axis(self) -> u8 {
        match self {
            Direction::PosX | Direction::NegX => 0,
            Direction::PosY | Direction::NegY => 1,
            Direction::PosZ | Direction::NegZ => 2,
        }
    }
}

/// Placement rotation of a block: the direction its face points and the
/// direction its top points. The two must be perpendicular.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockOrientation {
    pub forward: Direction,
    pub up: Direction,
}

impl BlockOrientation {
    pub fn new(forward: Direction, up: Direction) -> Result<Self, OrientationError> {
        if forward.axis() == up.axis() {
            return Err(OrientationError::ParallelAxes(forward, up));
        }
        Ok(Self { forward, up })
    }

    /// Same forward direction, up inverted. Used when substituting a
    /// block subtype whose model ships with the opposite default "up".
    pub const fn flip_up(self) -> Self {
        Self {
            forward: self.forward,
            up: self.up.opposite(),
        }
    }
}

impl Default for BlockOrientation {
    fn default() -> Self {
        Self {
            forward: Direction::PosZ,
            up: Direction::PosY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_involutive() {
        for dir in ALL_DIRECTIONS {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_ne!(dir.opposite(), dir);
            assert_eq!(dir.opposite().axis(), dir.axis());
        }
    }

    #[test]
    fn flip_up_preserves_forward() {
        let orientation = BlockOrientation::new(Direction::PosX, Direction::NegZ).unwrap();
        let flipped = orientation.flip_up();
        assert_eq!(flipped.forward, Direction::PosX);
        assert_eq!(flipped.up, Direction::PosZ);
        // Flipping twice round-trips.
        assert_eq!(flipped.flip_up(), orientation);
    }

    #[test]
    fn parallel_axes_rejected() {
        assert!(BlockOrientation::new(Direction::PosY, Direction::NegY).is_err());
        assert!(BlockOrientation::new(Direction::PosY, Direction::PosY).is_err());
        assert!(BlockOrientation::new(Direction::PosY, Direction::PosX).is_ok());
    }
}
