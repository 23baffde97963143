// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use zerocopy::{AsBytes, FromBytes, Unaligned};

mod fields;
mod reader;
mod write;

pub use {fields::*, reader::*, write::*};

// IEEE Std 802.11-2016, 9.4.2.2
pub const SSID_MAX_LEN: usize = 32;
// IEEE Std 802.11-2016, 9.4.2.3
pub const SUPPORTED_RATES_MAX_LEN: usize = 8;

#[repr(C)]
#[derive(AsBytes, FromBytes, Unaligned, PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct Id(pub u8);

// IEEE Std 802.11-2016, 9.4.2.1, Table 9-77
impl Id {
    pub const SSID: Self = Self(0);
    pub const SUPPORTED_RATES: Self = Self(1);
    pub const FH_PARAM_SET: Self = Self(2);
    pub const DSSS_PARAM_SET: Self = Self(3);
    pub const TIM: Self = Self(5);
    pub const IBSS_PARAM_SET: Self = Self(6);
}

#[repr(C, packed)]
#[derive(AsBytes, FromBytes, Unaligned)]
pub struct Header {
    pub id: Id,
    pub body_len: u8,
}
