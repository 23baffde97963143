// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use bitfield::bitfield;

// IEEE Std 802.11-2016, 9.2.4.1.3
// Frame types:
pub const FRAME_TYPE_MGMT: u16 = 0;
pub const FRAME_TYPE_CTRL: u16 = 1;
pub const FRAME_TYPE_DATA: u16 = 2;
// Control subtypes:
pub const CTRL_SUBTYPE_PS_POLL: u16 = 0x0A;
// Data subtypes:
pub const DATA_SUBTYPE_DATA: u16 = 0x00;

bitfield! {
    // IEEE Std 802.11-2016, 9.2.4.1.1
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    pub struct FrameControl(u16);
    impl Debug;
    pub u16, protocol_version, set_protocol_version: 1, 0;
    pub u16, frame_type, set_frame_type: 3, 2;
    pub u16, frame_subtype, set_frame_subtype: 7, 4;
    pub to_ds, set_to_ds: 8;
    pub from_ds, set_from_ds: 9;
    pub more_fragments, set_more_fragments: 10;
    pub retry, set_retry: 11;
    pub power_mgmt, set_power_mgmt: 12;
    pub more_data, set_more_data: 13;
    pub protected, set_protected: 14;
    pub order, set_order: 15;
}

/// The To-DS/From-DS bit combination of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DsDirection {
    NoDs,
    ToDs,
    FromDs,
    DsToDs,
}

impl FrameControl {
    pub fn direction(&self) -> DsDirection {
        match (self.to_ds(), self.from_ds()) {
            (false, false) => DsDirection::NoDs,
            (true, false) => DsDirection::ToDs,
            (false, true) => DsDirection::FromDs,
            (true, true) => DsDirection::DsToDs,
        }
    }

    pub fn set_direction(&mut self, direction: DsDirection) {
        let (to_ds, from_ds) = match direction {
            DsDirection::NoDs => (false, false),
            DsDirection::ToDs => (true, false),
            DsDirection::FromDs => (false, true),
            DsDirection::DsToDs => (true, true),
        };
        self.set_to_ds(to_ds);
        self.set_from_ds(from_ds);
    }
}

bitfield! {
    // IEEE Std 802.11-2016, 9.2.4.4
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    pub struct SequenceControl(u16);
    impl Debug;
    pub u16, frag_num, set_frag_num: 3, 0;
    pub u16, seq_num, set_seq_num: 15, 4;
}

bitfield! {
    // IEEE Std 802.11-2016, 9.4.1.4
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    pub struct CapabilityInfo(u16);
    impl Debug;
    pub ess, set_ess: 0;
    pub ibss, set_ibss: 1;
    pub cf_pollable, set_cf_pollable: 2;
    pub cf_poll_req, set_cf_poll_req: 3;
    pub privacy, set_privacy: 4;
    pub short_preamble, set_short_preamble: 5;
}
