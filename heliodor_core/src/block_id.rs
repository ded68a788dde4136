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
pub enum BlockError {
    #[error("Block type `{0}` already exists")]
    NameAlreadyExists(String),
    #[error("Block type `{0}` not found")]
    NameNotFound(String),
    #[error("Block ID 0x{0:x} not found")]
    IdNotFound(u32),
}

/// Compact handle for a registered block type. The id is an index into the
/// block type registry that issued it; ids from different registries are
/// not interchangeable.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct BlockId(pub u32);
impl BlockId {
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}
impl Debug for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("block:0x{:x}", self.0))
    }
}
