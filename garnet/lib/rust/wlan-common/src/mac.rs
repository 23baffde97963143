// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::buffer_reader::BufferReader,
    byteorder::{BigEndian, ByteOrder, LittleEndian},
    zerocopy::{AsBytes, ByteSlice, FromBytes, LayoutVerified, Unaligned},
};

mod fields;
mod mgmt;

pub use {fields::*, mgmt::*};

pub type MacAddr = [u8; 6];
pub const BCAST_ADDR: MacAddr = [0xFF; 6];
pub const ZERO_ADDR: MacAddr = [0; 6];

// RFC 1042
pub const LLC_SNAP_EXTENSION: u8 = 0xAA;
pub const LLC_SNAP_UNNUMBERED_INFO: u8 = 0x03;
pub const LLC_SNAP_OUI: [u8; 3] = [0, 0, 0];

pub const MAX_ETH_FRAME_LEN: usize = 2048;

// Sequence numbers are 12 bits wide.
pub const MAX_SEQ_NUM: u16 = 0x0fff;

pub fn is_multicast(addr: &MacAddr) -> bool {
    addr[0] & 0x01 != 0
}

// IEEE Std 802.11-2016, 9.3.3.2 and 9.3.2.1
// Management and non-QoS data frames share the three-address header.
#[derive(Default, FromBytes, AsBytes, Unaligned, PartialEq, Eq, Clone, Copy, Debug)]
#[repr(C, packed)]
pub struct MacHdr {
    pub frame_ctrl: [u8; 2],
    pub duration: [u8; 2],
    pub addr1: MacAddr,
    pub addr2: MacAddr,
    pub addr3: MacAddr,
    pub seq_ctrl: [u8; 2],
}

pub type MgmtHdr = MacHdr;
pub type DataHdr = MacHdr;

impl MacHdr {
    pub fn frame_ctrl(&self) -> FrameControl {
        FrameControl(LittleEndian::read_u16(&self.frame_ctrl))
    }

    pub fn set_frame_ctrl(&mut self, val: FrameControl) {
        LittleEndian::write_u16(&mut self.frame_ctrl, val.0)
    }

    pub fn duration(&self) -> u16 {
        LittleEndian::read_u16(&self.duration)
    }

    pub fn set_duration(&mut self, val: u16) {
        LittleEndian::write_u16(&mut self.duration, val)
    }

    pub fn seq_ctrl(&self) -> SequenceControl {
        SequenceControl(LittleEndian::read_u16(&self.seq_ctrl))
    }

    pub fn set_seq_ctrl(&mut self, val: SequenceControl) {
        LittleEndian::write_u16(&mut self.seq_ctrl, val.0)
    }
}

// IEEE Std 802.11-2016, 9.3.1.5
#[derive(Default, FromBytes, AsBytes, Unaligned, PartialEq, Eq, Clone, Copy, Debug)]
#[repr(C, packed)]
pub struct PsPollHdr {
    pub frame_ctrl: [u8; 2],
    // The AID takes the place of the duration field.
    pub aid: [u8; 2],
    pub bssid: MacAddr,
    pub ta: MacAddr,
}

impl PsPollHdr {
    pub fn frame_ctrl(&self) -> FrameControl {
        FrameControl(LittleEndian::read_u16(&self.frame_ctrl))
    }

    pub fn set_frame_ctrl(&mut self, val: FrameControl) {
        LittleEndian::write_u16(&mut self.frame_ctrl, val.0)
    }

    pub fn aid(&self) -> u16 {
        LittleEndian::read_u16(&self.aid)
    }

    pub fn set_aid(&mut self, val: u16) {
        LittleEndian::write_u16(&mut self.aid, val)
    }
}

// IEEE Std 802.11-2016, Table 9-26 defines DA, SA, RA, TA, BSSID
pub fn data_dst_addr(hdr: &DataHdr) -> Option<MacAddr> {
    match hdr.frame_ctrl().direction() {
        DsDirection::NoDs | DsDirection::FromDs => Some(hdr.addr1),
        DsDirection::ToDs => Some(hdr.addr3),
        DsDirection::DsToDs => None,
    }
}

pub fn data_src_addr(hdr: &DataHdr) -> Option<MacAddr> {
    match hdr.frame_ctrl().direction() {
        DsDirection::NoDs | DsDirection::ToDs => Some(hdr.addr2),
        DsDirection::FromDs => Some(hdr.addr3),
        DsDirection::DsToDs => None,
    }
}

/// BSSID: basic service set ID
pub fn data_bssid(hdr: &DataHdr) -> Option<MacAddr> {
    match hdr.frame_ctrl().direction() {
        DsDirection::NoDs => Some(hdr.addr3),
        DsDirection::FromDs => Some(hdr.addr2),
        DsDirection::ToDs => Some(hdr.addr1),
        DsDirection::DsToDs => None,
    }
}

pub enum MacFrame<B> {
    Mgmt { mgmt_hdr: LayoutVerified<B, MgmtHdr>, body: B },
    Data { data_hdr: LayoutVerified<B, DataHdr>, body: B },
    PsPoll { ps_poll: LayoutVerified<B, PsPollHdr> },
    Ctrl { subtype: u16 },
    Unsupported { type_: u16 },
}

impl<B: ByteSlice> MacFrame<B> {
    /// Returns `None` when the frame is too short for its header or uses an unknown
    /// protocol version.
    pub fn parse(bytes: B) -> Option<MacFrame<B>> {
        let mut reader = BufferReader::new(bytes);
        let fc = {
            let raw = reader.peek::<[u8; 2]>()?;
            FrameControl(LittleEndian::read_u16(&raw[..]))
        };
        if fc.protocol_version() != 0 {
            return None;
        }
        match fc.frame_type() {
            FRAME_TYPE_MGMT => {
                let mgmt_hdr = reader.read()?;
                Some(MacFrame::Mgmt { mgmt_hdr, body: reader.into_remaining()? })
            }
            FRAME_TYPE_DATA => {
                // Four-address frames keep addr4 at the front of the body.
                let data_hdr = reader.read()?;
                Some(MacFrame::Data { data_hdr, body: reader.into_remaining()? })
            }
            FRAME_TYPE_CTRL => match fc.frame_subtype() {
                CTRL_SUBTYPE_PS_POLL => Some(MacFrame::PsPoll { ps_poll: reader.read()? }),
                subtype => Some(MacFrame::Ctrl { subtype }),
            },
            type_ => Some(MacFrame::Unsupported { type_ }),
        }
    }
}

// IEEE Std 802.2-1998, 3.2
// IETF RFC 1042
#[derive(Default, FromBytes, AsBytes, Unaligned)]
#[repr(C, packed)]
pub struct LlcHdr {
    pub dsap: u8,
    pub ssap: u8,
    pub control: u8,
    pub oui: [u8; 3],
    pub protocol_id_be: [u8; 2], // In network byte order (big endian).
}

impl LlcHdr {
    pub fn protocol_id(&self) -> u16 {
        BigEndian::read_u16(&self.protocol_id_be)
    }

    pub fn set_protocol_id(&mut self, val: u16) {
        BigEndian::write_u16(&mut self.protocol_id_be, val);
    }

    pub fn is_snap(&self) -> bool {
        self.dsap == LLC_SNAP_EXTENSION
            && self.ssap == LLC_SNAP_EXTENSION
            && self.control == LLC_SNAP_UNNUMBERED_INFO
            && self.oui == LLC_SNAP_OUI
    }
}

// IEEE Std 802.3-2015, 3.1.1
#[derive(Default, FromBytes, AsBytes, Unaligned)]
#[repr(C, packed)]
pub struct EthernetIIHdr {
    pub da: MacAddr,
    pub sa: MacAddr,
    pub ether_type_be: [u8; 2], // In network byte order (big endian).
}

impl EthernetIIHdr {
    pub fn ether_type(&self) -> u16 {
        BigEndian::read_u16(&self.ether_type_be)
    }

    pub fn set_ether_type(&mut self, val: u16) {
        BigEndian::write_u16(&mut self.ether_type_be, val)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rustfmt::skip]
    fn make_mgmt_frame() -> Vec<u8> {
        vec![
            0xb0, 0x00, // fc: auth
            0x02, 0x02, // duration
            3, 3, 3, 3, 3, 3, // addr1
            4, 4, 4, 4, 4, 4, // addr2
            5, 5, 5, 5, 5, 5, // addr3
            0x60, 0x06, // sequence control
            9, 9, 9, // body
        ]
    }

    #[test]
    fn parse_mgmt_frame() {
        let bytes = make_mgmt_frame();
        match MacFrame::parse(&bytes[..]) {
            Some(MacFrame::Mgmt { mgmt_hdr, body }) => {
                assert_eq!(FRAME_TYPE_MGMT, mgmt_hdr.frame_ctrl().frame_type());
                assert_eq!(MgmtSubtype::Auth.raw(), mgmt_hdr.frame_ctrl().frame_subtype());
                assert_eq!(0x0202, mgmt_hdr.duration());
                assert_eq!([3, 3, 3, 3, 3, 3], mgmt_hdr.addr1);
                assert_eq!([4, 4, 4, 4, 4, 4], mgmt_hdr.addr2);
                assert_eq!([5, 5, 5, 5, 5, 5], mgmt_hdr.addr3);
                assert_eq!(0x066, mgmt_hdr.seq_ctrl().seq_num());
                assert_eq!(&body[..], &[9, 9, 9]);
            }
            _ => panic!("failed parsing mgmt frame"),
        };
    }

    #[test]
    fn parse_mgmt_frame_too_short_unsupported() {
        // Valid MGMT header must have a minium length of 24 bytes.
        assert!(MacFrame::parse(&[0; 22][..]).is_none());

        // Unsupported frame type.
        match MacFrame::parse(&[0xFC; 24][..]) {
            Some(MacFrame::Unsupported { type_ }) => assert_eq!(3, type_),
            _ => panic!("didn't detect unsupported frame"),
        };
    }

    #[test]
    fn parse_rejects_unknown_protocol_version() {
        let mut bytes = make_mgmt_frame();
        bytes[0] |= 0x01;
        assert!(MacFrame::parse(&bytes[..]).is_none());
    }

    #[test]
    fn parse_ps_poll() {
        #[rustfmt::skip]
        let bytes = [
            0xa4, 0x10, // fc: ps-poll, power management
            0x01, 0xc0, // aid
            1, 1, 1, 1, 1, 1, // bssid
            2, 2, 2, 2, 2, 2, // ta
        ];
        match MacFrame::parse(&bytes[..]) {
            Some(MacFrame::PsPoll { ps_poll }) => {
                assert!(ps_poll.frame_ctrl().power_mgmt());
                assert_eq!(0xc001, ps_poll.aid());
                assert_eq!([1; 6], ps_poll.bssid);
                assert_eq!([2; 6], ps_poll.ta);
            }
            _ => panic!("failed parsing ps-poll frame"),
        };
        assert!(MacFrame::parse(&bytes[..12]).is_none());
    }

    #[test]
    fn data_hdr_addresses() {
        let mut hdr = DataHdr::default();
        hdr.addr1 = [1; 6];
        hdr.addr2 = [2; 6];
        hdr.addr3 = [3; 6];

        let mut fc = FrameControl(0);
        fc.set_frame_type(FRAME_TYPE_DATA);
        let mut check = |direction: DsDirection,
                         dst: Option<MacAddr>,
                         src: Option<MacAddr>,
                         bssid: Option<MacAddr>| {
            fc.set_direction(direction);
            hdr.set_frame_ctrl(fc);
            assert_eq!(dst, data_dst_addr(&hdr));
            assert_eq!(src, data_src_addr(&hdr));
            assert_eq!(bssid, data_bssid(&hdr));
        };
        check(DsDirection::NoDs, Some([1; 6]), Some([2; 6]), Some([3; 6]));
        check(DsDirection::ToDs, Some([3; 6]), Some([2; 6]), Some([1; 6]));
        check(DsDirection::FromDs, Some([1; 6]), Some([3; 6]), Some([2; 6]));
        check(DsDirection::DsToDs, None, None, None);
    }

    #[test]
    fn eth_hdr_big_endian() {
        let mut bytes: Vec<u8> = vec![
            1, 2, 3, 4, 5, 6, // dst_addr
            7, 8, 9, 10, 11, 12, // src_addr
            13, 14, // ether_type
            99, 99, // trailing bytes
        ];
        let (mut hdr, body) =
            LayoutVerified::<_, EthernetIIHdr>::new_unaligned_from_prefix(&mut bytes[..])
                .expect("cannot create ethernet header.");
        assert_eq!(hdr.da, [1u8, 2, 3, 4, 5, 6]);
        assert_eq!(hdr.sa, [7u8, 8, 9, 10, 11, 12]);
        assert_eq!(hdr.ether_type(), 13 << 8 | 14);
        assert_eq!(body, [99, 99]);

        hdr.set_ether_type(0x888e);
        assert_eq!(hdr.ether_type_be, [0x88, 0x8e]);
    }

    #[test]
    fn llc_snap() {
        let mut hdr = LlcHdr::default();
        assert!(!hdr.is_snap());
        hdr.dsap = LLC_SNAP_EXTENSION;
        hdr.ssap = LLC_SNAP_EXTENSION;
        hdr.control = LLC_SNAP_UNNUMBERED_INFO;
        hdr.set_protocol_id(0x0800);
        assert!(hdr.is_snap());
        assert_eq!(hdr.protocol_id_be, [0x08, 0x00]);
    }

    #[test]
    fn multicast() {
        assert!(is_multicast(&BCAST_ADDR));
        assert!(is_multicast(&[0x01, 0, 0x5e, 0, 0, 1]));
        assert!(!is_multicast(&[0x02, 0, 0, 0, 0, 1]));
    }
}
