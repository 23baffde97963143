// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    byteorder::{ByteOrder, LittleEndian},
    zerocopy::{AsBytes, FromBytes, Unaligned},
};

// IEEE Std 802.11-2016, 9.4.2.4
#[derive(FromBytes, AsBytes, Unaligned)]
#[repr(C)]
pub struct DsssParamSet {
    pub current_chan: u8,
}

// IEEE Std 802.11-2016, 9.4.2.7
#[derive(FromBytes, AsBytes, Unaligned)]
#[repr(C, packed)]
pub struct IbssParamSet {
    pub atim_window: [u8; 2],
}

impl IbssParamSet {
    pub fn atim_window(&self) -> u16 {
        LittleEndian::read_u16(&self.atim_window)
    }

    pub fn set_atim_window(&mut self, val: u16) {
        LittleEndian::write_u16(&mut self.atim_window, val)
    }
}

// IEEE Std 802.11-2016, 9.4.2.6
#[derive(FromBytes, AsBytes, Unaligned)]
#[repr(C, packed)]
pub struct TimHeader {
    pub dtim_count: u8,
    pub dtim_period: u8,
    pub bmp_ctrl: u8,
}

/// A decoded TIM element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tim {
    pub dtim_count: u8,
    pub dtim_period: u8,
    pub bmp_ctrl: u8,
    pub partial_virtual_bmp: Vec<u8>,
}
