// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::{
    appendable::Appendable,
    error::FrameWriteError,
    mac::{self, DsDirection, FrameControl, MacAddr, MgmtHdr, MgmtSubtype, SequenceControl},
};

/// Fixed header fields of a management frame.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct MgmtHdrFields {
    pub frame_ctrl: FrameControl,
    pub duration: u16,
    pub addr1: MacAddr,
    pub addr2: MacAddr,
    pub addr3: MacAddr,
    pub seq_ctrl: SequenceControl,
}

impl MgmtHdrFields {
    /// Management frames are always sent without DS bits.
    pub fn new(
        subtype: MgmtSubtype,
        addr1: MacAddr,
        addr2: MacAddr,
        addr3: MacAddr,
        seq_num: u16,
    ) -> Self {
        let mut frame_ctrl = FrameControl(0);
        frame_ctrl.set_frame_type(mac::FRAME_TYPE_MGMT);
        frame_ctrl.set_frame_subtype(subtype.raw());
        frame_ctrl.set_direction(DsDirection::NoDs);
        let mut seq_ctrl = SequenceControl(0);
        seq_ctrl.set_seq_num(seq_num & mac::MAX_SEQ_NUM);
        MgmtHdrFields { frame_ctrl, duration: 0, addr1, addr2, addr3, seq_ctrl }
    }

    pub fn subtype(&self) -> Option<MgmtSubtype> {
        MgmtSubtype::from_raw(self.frame_ctrl.frame_subtype())
    }
}

impl std::fmt::Debug for MgmtHdrFields {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        write!(
            f,
            "fc: {:#b}, addr1: {:02X?}, addr2: {:02X?}, addr3: {:02X?}, seq: {}",
            self.frame_ctrl.0,
            self.addr1,
            self.addr2,
            self.addr3,
            self.seq_ctrl.seq_num()
        )
    }
}

pub fn write_mgmt_hdr<B: Appendable>(
    buf: &mut B,
    fixed: &MgmtHdrFields,
) -> Result<(), FrameWriteError> {
    if fixed.frame_ctrl.frame_type() != mac::FRAME_TYPE_MGMT {
        return Err(FrameWriteError::new_invalid_data("frame type is not management"));
    }
    let mut mgmt_hdr = buf.append_value_zeroed::<MgmtHdr>()?;
    mgmt_hdr.set_frame_ctrl(fixed.frame_ctrl);
    mgmt_hdr.set_duration(fixed.duration);
    mgmt_hdr.addr1 = fixed.addr1;
    mgmt_hdr.addr2 = fixed.addr2;
    mgmt_hdr.addr3 = fixed.addr3;
    mgmt_hdr.set_seq_ctrl(fixed.seq_ctrl);
    Ok(())
}

#[cfg(test)]
mod tests {
    use {super::*, crate::buffer_writer::BufferWriter};

    #[test]
    fn fields_for_auth() {
        let fields = MgmtHdrFields::new(MgmtSubtype::Auth, [1; 6], [2; 6], [3; 6], 0x1234);
        assert_eq!(Some(MgmtSubtype::Auth), fields.subtype());
        assert_eq!(DsDirection::NoDs, fields.frame_ctrl.direction());
        // Sequence numbers wrap at 12 bits.
        assert_eq!(0x0234, fields.seq_ctrl.seq_num());
    }

    #[test]
    fn write_hdr() {
        let mut buf = vec![];
        let fields = MgmtHdrFields::new(MgmtSubtype::Deauth, [1; 6], [2; 6], [3; 6], 5);
        write_mgmt_hdr(&mut buf, &fields).expect("failed writing mgmt header");
        #[rustfmt::skip]
        let expected = [
            0xc0, 0x00, // fc
            0, 0, // duration
            1, 1, 1, 1, 1, 1, // addr1
            2, 2, 2, 2, 2, 2, // addr2
            3, 3, 3, 3, 3, 3, // addr3
            0x50, 0x00, // sequence control
        ];
        assert_eq!(&expected[..], &buf[..]);
    }

    #[test]
    fn too_small_buffer() {
        let mut bytes = vec![0u8; 20];
        let result = write_mgmt_hdr(
            &mut BufferWriter::new(&mut bytes[..]),
            &MgmtHdrFields::new(MgmtSubtype::Beacon, [1; 6], [2; 6], [3; 6], 0),
        );
        assert_eq!(Err(FrameWriteError::BufferTooSmall), result);
    }

    #[test]
    fn reject_non_mgmt_type() {
        let mut fields = MgmtHdrFields::new(MgmtSubtype::Beacon, [1; 6], [2; 6], [3; 6], 0);
        fields.frame_ctrl.set_frame_type(mac::FRAME_TYPE_DATA);
        assert!(write_mgmt_hdr(&mut vec![], &fields).is_err());
    }
}
