// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Static rate negotiation between the local rate set and the rates a peer advertises.

use std::ops::BitOr;

pub const RATE_BASIC: u8 = 0x80;
pub const RATE_VAL: u8 = 0x7f;
pub const RATE_SIZE: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixRateFlags(u8);

impl FixRateFlags {
    /// Sort rates in ascending order of their value.
    pub const SORT: Self = Self(1);
    /// Ignore every rate but the configured fixed rate.
    pub const FIXED_RATE: Self = Self(2);
    /// Ignore rates the local station does not support. Ignoring a basic rate fails the
    /// negotiation.
    pub const NEGOTIATE: Self = Self(4);
    /// Remove ignored rates from the set.
    pub const DELETE: Self = Self(8);
    pub const ALL: Self = Self(0x0f);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for FixRateFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Checks `rates` against `local_rates` and the fixed rate, editing `rates` in place as
/// requested by `flags`.
///
/// Returns the highest rate value that was not ignored. If no rate survived, or a basic
/// rate had to be ignored, returns the value of the last rate examined with `RATE_BASIC`
/// set as the error.
pub fn fix_rate(
    rates: &mut Vec<u8>,
    local_rates: &[u8],
    fixed_rate: Option<u8>,
    flags: FixRateFlags,
) -> Result<u8, u8> {
    if flags.contains(FixRateFlags::SORT) {
        rates.sort_by_key(|rate| rate & RATE_VAL);
    }

    let mut error = false;
    let mut best: Option<u8> = None;
    let mut last = 0;
    let mut i = 0;
    while i < rates.len() {
        let rate = rates[i] & RATE_VAL;
        last = rate;
        let mut ignore = false;
        if flags.contains(FixRateFlags::FIXED_RATE) {
            if let Some(fixed) = fixed_rate {
                if rate != fixed & RATE_VAL {
                    ignore = true;
                }
            }
        }
        if flags.contains(FixRateFlags::NEGOTIATE) {
            if !local_rates.iter().any(|local| local & RATE_VAL == rate) {
                if rates[i] & RATE_BASIC != 0 {
                    error = true;
                }
                ignore = true;
            }
        }
        if ignore && flags.contains(FixRateFlags::DELETE) {
            rates.remove(i);
            continue;
        }
        if !ignore {
            best = Some(best.map_or(rate, |best| best.max(rate)));
        }
        i += 1;
    }

    match best {
        Some(rate) if !error => Ok(rate),
        _ => Err(last | RATE_BASIC),
    }
}
