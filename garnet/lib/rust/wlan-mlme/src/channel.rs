// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

pub const CHAN_MAX: u8 = 255;

const WORDS: usize = (CHAN_MAX as usize + 1) / 64;

/// A set of channel numbers in `0..=CHAN_MAX`.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelSet([u64; WORDS]);

impl ChannelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, chan: u8) {
        self.0[chan as usize / 64] |= 1u64 << (chan % 64);
    }

    pub fn remove(&mut self, chan: u8) {
        self.0[chan as usize / 64] &= !(1u64 << (chan % 64));
    }

    pub fn contains(&self, chan: u8) -> bool {
        self.0[chan as usize / 64] & (1u64 << (chan % 64)) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|word| *word == 0)
    }

    pub fn clear(&mut self) {
        self.0 = [0; WORDS];
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=CHAN_MAX).filter(move |chan| self.contains(*chan))
    }

    pub fn highest(&self) -> Option<u8> {
        (0..=CHAN_MAX).rev().find(|chan| self.contains(*chan))
    }

    /// The next member after `chan`, wrapping around past `CHAN_MAX`. `chan` itself is only
    /// returned if it is the sole member.
    pub fn next_after(&self, chan: u8) -> Option<u8> {
        (1..=CHAN_MAX as u16 + 1)
            .map(|offset| chan.wrapping_add(offset as u8))
            .find(|candidate| self.contains(*candidate))
    }

    pub fn is_subset(&self, other: &ChannelSet) -> bool {
        self.0.iter().zip(other.0.iter()).all(|(a, b)| a & !b == 0)
    }
}

impl std::iter::FromIterator<u8> for ChannelSet {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut set = ChannelSet::new();
        for chan in iter {
            set.insert(chan);
        }
        set
    }
}

impl std::fmt::Debug for ChannelSet {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Channel bookkeeping: what the device can tune to, what the user allows, and what is
/// left to visit in the current scan pass.
#[derive(Clone, Debug, Default)]
pub struct Channels {
    pub available: ChannelSet,
    pub active: ChannelSet,
    pub scan: ChannelSet,
    /// The channel the device is tuned to.
    pub current: u8,
}

impl Channels {
    pub fn new(available: ChannelSet) -> Self {
        Self { available, active: available, scan: ChannelSet::new(), current: 0 }
    }

    /// Restricts the active set to `active`. Channels the device cannot use are ignored.
    pub fn set_active(&mut self, active: ChannelSet) {
        let mut restricted = ChannelSet::new();
        for chan in active.iter().filter(|chan| self.available.contains(*chan)) {
            restricted.insert(chan);
        }
        self.active = restricted;
        let mut scan = ChannelSet::new();
        for chan in self.scan.iter().filter(|chan| self.active.contains(*chan)) {
            scan.insert(chan);
        }
        self.scan = scan;
    }
}
