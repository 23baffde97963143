// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::{
    appendable::Appendable,
    error::FrameWriteError,
    mac::{self, DataHdr, DsDirection, FrameControl, LlcHdr, MacAddr, SequenceControl},
};

/// Returns (addr1, addr2, addr3) for a frame travelling in `direction`.
pub fn data_addresses(
    direction: DsDirection,
    dst: MacAddr,
    src: MacAddr,
    bssid: MacAddr,
) -> Result<(MacAddr, MacAddr, MacAddr), FrameWriteError> {
    match direction {
        DsDirection::NoDs => Ok((dst, src, bssid)),
        DsDirection::ToDs => Ok((bssid, src, dst)),
        DsDirection::FromDs => Ok((dst, bssid, src)),
        DsDirection::DsToDs => {
            Err(FrameWriteError::new_invalid_data("four-address frames are not supported"))
        }
    }
}

pub fn write_data_hdr<B: Appendable>(
    buf: &mut B,
    direction: DsDirection,
    addrs: (MacAddr, MacAddr, MacAddr),
    seq_num: u16,
) -> Result<(), FrameWriteError> {
    let mut frame_ctrl = FrameControl(0);
    frame_ctrl.set_frame_type(mac::FRAME_TYPE_DATA);
    frame_ctrl.set_frame_subtype(mac::DATA_SUBTYPE_DATA);
    frame_ctrl.set_direction(direction);
    let mut seq_ctrl = SequenceControl(0);
    seq_ctrl.set_seq_num(seq_num & mac::MAX_SEQ_NUM);

    let mut data_hdr = buf.append_value_zeroed::<DataHdr>()?;
    data_hdr.set_frame_ctrl(frame_ctrl);
    data_hdr.addr1 = addrs.0;
    data_hdr.addr2 = addrs.1;
    data_hdr.addr3 = addrs.2;
    data_hdr.set_seq_ctrl(seq_ctrl);
    Ok(())
}

pub fn make_snap_llc_hdr(protocol_id: u16) -> LlcHdr {
    let mut llc_hdr = LlcHdr {
        dsap: mac::LLC_SNAP_EXTENSION,
        ssap: mac::LLC_SNAP_EXTENSION,
        control: mac::LLC_SNAP_UNNUMBERED_INFO,
        oui: mac::LLC_SNAP_OUI,
        protocol_id_be: [0; 2],
    };
    llc_hdr.set_protocol_id(protocol_id);
    llc_hdr
}
