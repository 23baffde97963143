// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::collections::VecDeque;

pub const PS_MAX_QUEUE: usize = 50;

/// Frames held for a dozing station until it polls for them.
#[derive(Clone, Debug, Default)]
pub struct PsQueue {
    frames: VecDeque<Vec<u8>>,
    drops: u64,
}

impl PsQueue {
    /// Returns false, and counts a drop, if the queue is full.
    pub fn enqueue(&mut self, frame: Vec<u8>) -> bool {
        if self.frames.len() >= PS_MAX_QUEUE {
            self.drops += 1;
            return false;
        }
        self.frames.push_back(frame);
        true
    }

    pub fn dequeue(&mut self) -> Option<Vec<u8>> {
        self.frames.pop_front()
    }

    /// Drops every queued frame and returns how many there were.
    pub fn purge(&mut self) -> usize {
        let n = self.frames.len();
        self.frames.clear();
        n
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Vec<u8>> + '_ {
        self.frames.drain(..)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn drops(&self) -> u64 {
        self.drops
    }
}
