// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Management frame codec.

use {
    crate::{
        appendable::Appendable,
        buffer_reader::BufferReader,
        error::{FrameParseError, FrameWriteError},
        ie::{self, Id, Tim},
        mac::{
            AssocReqHdr, AssocRespHdr, AuthAlgorithmNumber, AuthHdr, BeaconHdr, CapabilityInfo,
            DeauthHdr, MacAddr, MacFrame, MgmtSubtype, ReasonCode, ReassocReqHdr, StatusCode,
        },
        mgmt_writer::{write_mgmt_hdr, MgmtHdrFields},
    },
    byteorder::{ByteOrder, LittleEndian},
};

/// Fields shared by beacons and probe responses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BssFields {
    pub timestamp: u64,
    pub beacon_interval: u16,
    pub capabilities: CapabilityInfo,
    pub ssid: Vec<u8>,
    pub rates: Vec<u8>,
    pub dsss_chan: Option<u8>,
    pub ibss_atim_window: Option<u16>,
    pub tim: Option<Tim>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProbeReqFields {
    pub ssid: Vec<u8>,
    pub rates: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthFields {
    pub algorithm: AuthAlgorithmNumber,
    pub seq: u16,
    pub status: StatusCode,
}

/// An association request, or a reassociation request when `current_ap` is set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssocReqFields {
    pub capabilities: CapabilityInfo,
    pub listen_interval: u16,
    pub current_ap: Option<MacAddr>,
    pub ssid: Vec<u8>,
    pub rates: Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssocRespFields {
    pub reassoc: bool,
    pub capabilities: CapabilityInfo,
    pub status: StatusCode,
    pub aid: u16,
    pub rates: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MgmtBody {
    Beacon(BssFields),
    ProbeResp(BssFields),
    ProbeReq(ProbeReqFields),
    Auth(AuthFields),
    Deauth { reason: ReasonCode },
    Disassoc { reason: ReasonCode },
    AssocReq(AssocReqFields),
    AssocResp(AssocRespFields),
}

impl MgmtBody {
    pub fn subtype(&self) -> MgmtSubtype {
        match self {
            MgmtBody::Beacon(_) => MgmtSubtype::Beacon,
            MgmtBody::ProbeResp(_) => MgmtSubtype::ProbeResp,
            MgmtBody::ProbeReq(_) => MgmtSubtype::ProbeReq,
            MgmtBody::Auth(_) => MgmtSubtype::Auth,
            MgmtBody::Deauth { .. } => MgmtSubtype::Deauth,
            MgmtBody::Disassoc { .. } => MgmtSubtype::Disassoc,
            MgmtBody::AssocReq(fields) if fields.current_ap.is_some() => MgmtSubtype::ReassocReq,
            MgmtBody::AssocReq(_) => MgmtSubtype::AssocReq,
            MgmtBody::AssocResp(fields) if fields.reassoc => MgmtSubtype::ReassocResp,
            MgmtBody::AssocResp(_) => MgmtSubtype::AssocResp,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MgmtFrame {
    pub hdr: MgmtHdrFields,
    pub body: MgmtBody,
}

impl MgmtFrame {
    pub fn subtype(&self) -> MgmtSubtype {
        self.body.subtype()
    }

    pub fn dst(&self) -> MacAddr {
        self.hdr.addr1
    }

    pub fn src(&self) -> MacAddr {
        self.hdr.addr2
    }

    pub fn bssid(&self) -> MacAddr {
        self.hdr.addr3
    }
}

/// Elements of interest found in a frame body. Repeated elements overwrite earlier ones.
#[derive(Default)]
struct Elements<'a> {
    ssid: Option<&'a [u8]>,
    rates: Option<&'a [u8]>,
    dsss_chan: Option<u8>,
    ibss_atim_window: Option<u16>,
    tim: Option<Tim>,
}

impl<'a> Elements<'a> {
    fn parse(bytes: &'a [u8]) -> Self {
        let mut elements = Elements::default();
        for (id, body) in ie::Reader::new(bytes) {
            match id {
                Id::SSID => elements.ssid = Some(body),
                Id::SUPPORTED_RATES => elements.rates = Some(body),
                Id::DSSS_PARAM_SET if body.len() == 1 => elements.dsss_chan = Some(body[0]),
                Id::IBSS_PARAM_SET if body.len() == 2 => {
                    elements.ibss_atim_window = Some(LittleEndian::read_u16(body))
                }
                Id::TIM if body.len() >= 4 => {
                    elements.tim = Some(Tim {
                        dtim_count: body[0],
                        dtim_period: body[1],
                        bmp_ctrl: body[2],
                        partial_virtual_bmp: body[3..].to_vec(),
                    })
                }
                _ => (),
            }
        }
        elements
    }

    fn ssid(&self) -> Result<Vec<u8>, FrameParseError> {
        let ssid = self.ssid.ok_or_else(|| FrameParseError::new("missing SSID element"))?;
        if ssid.len() > ie::SSID_MAX_LEN {
            return Err(FrameParseError::new(format!("SSID too long: {} bytes", ssid.len())));
        }
        Ok(ssid.to_vec())
    }

    fn rates(&self) -> Result<Vec<u8>, FrameParseError> {
        let rates =
            self.rates.ok_or_else(|| FrameParseError::new("missing supported rates element"))?;
        if rates.len() > ie::SUPPORTED_RATES_MAX_LEN {
            return Err(FrameParseError::new(format!("too many rates: {}", rates.len())));
        }
        Ok(rates.to_vec())
    }
}

fn fixed_fields_too_short(subtype: MgmtSubtype) -> FrameParseError {
    FrameParseError::new(format!("{:?} body too short for fixed fields", subtype))
}

/// Decodes a management frame. Bodies with missing or oversized SSID or rate elements
/// are rejected.
pub fn decode_management(bytes: &[u8]) -> Result<MgmtFrame, FrameParseError> {
    let (mgmt_hdr, body) = match MacFrame::parse(bytes) {
        Some(MacFrame::Mgmt { mgmt_hdr, body }) => (mgmt_hdr, body),
        Some(_) => return Err(FrameParseError::new("not a management frame")),
        None => return Err(FrameParseError::new("frame too short for management header")),
    };
    let frame_ctrl = mgmt_hdr.frame_ctrl();
    let subtype = MgmtSubtype::from_raw(frame_ctrl.frame_subtype()).ok_or_else(|| {
        FrameParseError::new(format!("unknown subtype {}", frame_ctrl.frame_subtype()))
    })?;
    let hdr = MgmtHdrFields {
        frame_ctrl,
        duration: mgmt_hdr.duration(),
        addr1: mgmt_hdr.addr1,
        addr2: mgmt_hdr.addr2,
        addr3: mgmt_hdr.addr3,
        seq_ctrl: mgmt_hdr.seq_ctrl(),
    };

    let mut reader = BufferReader::new(body);
    let body = match subtype {
        MgmtSubtype::Beacon | MgmtSubtype::ProbeResp => {
            let fixed = reader.read::<BeaconHdr>().ok_or_else(|| fixed_fields_too_short(subtype))?;
            let elements = Elements::parse(reader.into_remaining().unwrap_or(&[]));
            let fields = BssFields {
                timestamp: fixed.timestamp(),
                beacon_interval: fixed.beacon_interval(),
                capabilities: fixed.capabilities(),
                ssid: elements.ssid()?,
                rates: elements.rates()?,
                dsss_chan: elements.dsss_chan,
                ibss_atim_window: elements.ibss_atim_window,
                tim: elements.tim.clone(),
            };
            if subtype == MgmtSubtype::Beacon {
                MgmtBody::Beacon(fields)
            } else {
                MgmtBody::ProbeResp(fields)
            }
        }
        MgmtSubtype::ProbeReq => {
            let elements = Elements::parse(reader.into_remaining().unwrap_or(&[]));
            MgmtBody::ProbeReq(ProbeReqFields { ssid: elements.ssid()?, rates: elements.rates()? })
        }
        MgmtSubtype::Auth => {
            // Challenge text elements are not used by open system authentication.
            let fixed = reader.read::<AuthHdr>().ok_or_else(|| fixed_fields_too_short(subtype))?;
            MgmtBody::Auth(AuthFields {
                algorithm: fixed.auth_alg_num(),
                seq: fixed.auth_txn_seq_num(),
                status: fixed.status_code(),
            })
        }
        MgmtSubtype::Deauth | MgmtSubtype::Disassoc => {
            let fixed =
                reader.read::<DeauthHdr>().ok_or_else(|| fixed_fields_too_short(subtype))?;
            let reason = fixed.reason_code();
            if subtype == MgmtSubtype::Deauth {
                MgmtBody::Deauth { reason }
            } else {
                MgmtBody::Disassoc { reason }
            }
        }
        MgmtSubtype::AssocReq | MgmtSubtype::ReassocReq => {
            let (capabilities, listen_interval, current_ap) = if subtype == MgmtSubtype::AssocReq
            {
                let fixed =
                    reader.read::<AssocReqHdr>().ok_or_else(|| fixed_fields_too_short(subtype))?;
                (fixed.capabilities(), fixed.listen_interval(), None)
            } else {
                let fixed = reader
                    .read::<ReassocReqHdr>()
                    .ok_or_else(|| fixed_fields_too_short(subtype))?;
                (fixed.assoc.capabilities(), fixed.assoc.listen_interval(), Some(fixed.current_ap))
            };
            let elements = Elements::parse(reader.into_remaining().unwrap_or(&[]));
            MgmtBody::AssocReq(AssocReqFields {
                capabilities,
                listen_interval,
                current_ap,
                ssid: elements.ssid()?,
                rates: elements.rates()?,
            })
        }
        MgmtSubtype::AssocResp | MgmtSubtype::ReassocResp => {
            let fixed =
                reader.read::<AssocRespHdr>().ok_or_else(|| fixed_fields_too_short(subtype))?;
            let status = fixed.status_code();
            let elements = Elements::parse(reader.into_remaining().unwrap_or(&[]));
            // A rejection does not need to carry rates.
            let rates = if status == StatusCode::SUCCESS || elements.rates.is_some() {
                elements.rates()?
            } else {
                vec![]
            };
            MgmtBody::AssocResp(AssocRespFields {
                reassoc: subtype == MgmtSubtype::ReassocResp,
                capabilities: fixed.capabilities(),
                status,
                aid: fixed.aid(),
                rates,
            })
        }
        MgmtSubtype::Atim => return Err(FrameParseError::new("ATIM frames are not supported")),
    };
    Ok(MgmtFrame { hdr, body })
}

fn write_bss_fields<B: Appendable>(buf: &mut B, fields: &BssFields) -> Result<(), FrameWriteError> {
    let mut fixed = buf.append_value_zeroed::<BeaconHdr>()?;
    fixed.set_timestamp(fields.timestamp);
    fixed.set_beacon_interval(fields.beacon_interval);
    fixed.set_capabilities(fields.capabilities);
    ie::write_ssid(buf, &fields.ssid[..])?;
    ie::write_supported_rates(buf, &fields.rates[..])?;
    if let Some(chan) = fields.dsss_chan {
        ie::write_dsss_param_set(buf, chan)?;
    }
    if let Some(atim_window) = fields.ibss_atim_window {
        ie::write_ibss_param_set(buf, atim_window)?;
    }
    if let Some(tim) = fields.tim.as_ref() {
        ie::write_tim(buf, tim)?;
    }
    Ok(())
}

/// Encodes a management frame. The subtype written to the header is taken from `body`.
pub fn encode_management<B: Appendable>(
    buf: &mut B,
    hdr: &MgmtHdrFields,
    body: &MgmtBody,
) -> Result<(), FrameWriteError> {
    let mut hdr = *hdr;
    hdr.frame_ctrl.set_frame_subtype(body.subtype().raw());
    write_mgmt_hdr(buf, &hdr)?;

    match body {
        MgmtBody::Beacon(fields) | MgmtBody::ProbeResp(fields) => write_bss_fields(buf, fields)?,
        MgmtBody::ProbeReq(fields) => {
            ie::write_ssid(buf, &fields.ssid[..])?;
            ie::write_supported_rates(buf, &fields.rates[..])?;
        }
        MgmtBody::Auth(fields) => {
            let mut fixed = buf.append_value_zeroed::<AuthHdr>()?;
            fixed.set_auth_alg_num(fields.algorithm);
            fixed.set_auth_txn_seq_num(fields.seq);
            fixed.set_status_code(fields.status);
        }
        MgmtBody::Deauth { reason } | MgmtBody::Disassoc { reason } => {
            buf.append_value_zeroed::<DeauthHdr>()?.set_reason_code(*reason);
        }
        MgmtBody::AssocReq(fields) => {
            let mut fixed = buf.append_value_zeroed::<AssocReqHdr>()?;
            fixed.set_capabilities(fields.capabilities);
            fixed.set_listen_interval(fields.listen_interval);
            if let Some(current_ap) = fields.current_ap {
                buf.append_value(&current_ap)?;
            }
            ie::write_ssid(buf, &fields.ssid[..])?;
            ie::write_supported_rates(buf, &fields.rates[..])?;
        }
        MgmtBody::AssocResp(fields) => {
            let mut fixed = buf.append_value_zeroed::<AssocRespHdr>()?;
            fixed.set_capabilities(fields.capabilities);
            fixed.set_status_code(fields.status);
            fixed.set_aid(fields.aid);
            ie::write_supported_rates(buf, &fields.rates[..])?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use {super::*, crate::mac::DsDirection, test_case::test_case};

    fn hdr() -> MgmtHdrFields {
        MgmtHdrFields::new(MgmtSubtype::Beacon, [1; 6], [2; 6], [3; 6], 42)
    }

    fn cap(ess: bool, ibss: bool, privacy: bool) -> CapabilityInfo {
        let mut cap = CapabilityInfo(0);
        cap.set_ess(ess);
        cap.set_ibss(ibss);
        cap.set_privacy(privacy);
        cap
    }

    fn bss_fields() -> BssFields {
        BssFields {
            timestamp: 0x0102030405060708,
            beacon_interval: 100,
            capabilities: cap(true, false, true),
            ssid: b"coffee".to_vec(),
            rates: vec![0x82, 0x84, 0x0b, 0x16],
            dsss_chan: None,
            ibss_atim_window: None,
            tim: None,
        }
    }

    fn round_trip(body: MgmtBody) {
        let mut buf = vec![];
        encode_management(&mut buf, &hdr(), &body).expect("failed to encode");
        let frame = decode_management(&buf[..]).expect("failed to decode");
        assert_eq!(body.subtype(), frame.subtype());
        assert_eq!(Some(body.subtype()), frame.hdr.subtype());
        assert_eq!(DsDirection::NoDs, frame.hdr.frame_ctrl.direction());
        assert_eq!(([1; 6], [2; 6], [3; 6]), (frame.dst(), frame.src(), frame.bssid()));
        assert_eq!(42, frame.hdr.seq_ctrl.seq_num());
        assert_eq!(body, frame.body);
    }

    #[test_case(None, None, None; "no optional elements")]
    #[test_case(Some(6), None, None; "dsss only")]
    #[test_case(Some(11), Some(0), None; "ibss")]
    #[test_case(
        Some(1),
        None,
        Some(Tim { dtim_count: 0, dtim_period: 1, bmp_ctrl: 0, partial_virtual_bmp: vec![0] });
        "tim"
    )]
    fn beacon_and_probe_resp_round_trip(
        dsss_chan: Option<u8>,
        ibss_atim_window: Option<u16>,
        tim: Option<Tim>,
    ) {
        let fields = BssFields { dsss_chan, ibss_atim_window, tim, ..bss_fields() };
        round_trip(MgmtBody::Beacon(fields.clone()));
        round_trip(MgmtBody::ProbeResp(fields));
    }

    #[test]
    fn other_subtypes_round_trip() {
        round_trip(MgmtBody::ProbeReq(ProbeReqFields { ssid: vec![], rates: vec![2, 4] }));
        round_trip(MgmtBody::Auth(AuthFields {
            algorithm: AuthAlgorithmNumber::OPEN,
            seq: 2,
            status: StatusCode::SUCCESS,
        }));
        round_trip(MgmtBody::Deauth { reason: ReasonCode::LEAVING_NETWORK_DEAUTH });
        round_trip(MgmtBody::Disassoc { reason: ReasonCode::LEAVING_NETWORK_DISASSOC });
        let assoc_req = AssocReqFields {
            capabilities: cap(true, false, false),
            listen_interval: 100,
            current_ap: None,
            ssid: b"coffee".to_vec(),
            rates: vec![0x82, 0x84],
        };
        round_trip(MgmtBody::AssocReq(assoc_req.clone()));
        round_trip(MgmtBody::AssocReq(AssocReqFields { current_ap: Some([9; 6]), ..assoc_req }));
        let assoc_resp = AssocRespFields {
            reassoc: false,
            capabilities: cap(true, false, false),
            status: StatusCode::SUCCESS,
            aid: 0xc001,
            rates: vec![0x82, 0x84],
        };
        round_trip(MgmtBody::AssocResp(assoc_resp.clone()));
        round_trip(MgmtBody::AssocResp(AssocRespFields { reassoc: true, ..assoc_resp }));
    }

    #[test]
    fn encode_auth_bytes() {
        let mut buf = vec![];
        let hdr = MgmtHdrFields::new(MgmtSubtype::Auth, [1; 6], [2; 6], [1; 6], 3);
        let body = MgmtBody::Auth(AuthFields {
            algorithm: AuthAlgorithmNumber::OPEN,
            seq: 1,
            status: StatusCode::SUCCESS,
        });
        encode_management(&mut buf, &hdr, &body).expect("failed to encode");
        #[rustfmt::skip]
        let expected = [
            // Mgmt header
            0xb0, 0x00, // fc
            0, 0, // duration
            1, 1, 1, 1, 1, 1, // addr1
            2, 2, 2, 2, 2, 2, // addr2
            1, 1, 1, 1, 1, 1, // addr3
            0x30, 0x00, // sequence control
            // Auth body
            0, 0, // open system
            1, 0, // sequence
            0, 0, // success
        ];
        assert_eq!(&expected[..], &buf[..]);
    }

    #[rustfmt::skip]
    fn beacon_with_elements(elements: &[u8]) -> Vec<u8> {
        let mut frame = vec![
            0x80, 0x00, // fc: beacon
            0, 0, // duration
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // addr1
            2, 2, 2, 2, 2, 2, // addr2
            2, 2, 2, 2, 2, 2, // addr3
            0x10, 0x00, // sequence control
            0, 0, 0, 0, 0, 0, 0, 0, // timestamp
            0x64, 0x00, // beacon interval
            0x01, 0x00, // capabilities
        ];
        frame.extend_from_slice(elements);
        frame
    }

    #[test]
    fn decode_beacon_skips_unknown_elements() {
        #[rustfmt::skip]
        let elements = [
            0, 3, b'f', b'o', b'o', // SSID
            221, 2, 7, 7, // vendor specific
            1, 1, 0x82, // rates
            3, 1, 6, // DSSS
        ];
        let frame = beacon_with_elements(&elements);
        match decode_management(&frame[..]).expect("expected beacon").body {
            MgmtBody::Beacon(fields) => {
                assert_eq!(b"foo", &fields.ssid[..]);
                assert_eq!(vec![0x82], fields.rates);
                assert_eq!(Some(6), fields.dsss_chan);
                assert_eq!(100, fields.beacon_interval);
                assert!(fields.capabilities.ess());
            }
            body => panic!("unexpected body: {:?}", body),
        }
    }

    #[test]
    fn decode_rejects_missing_ssid() {
        let frame = beacon_with_elements(&[1, 1, 0x82]);
        assert!(decode_management(&frame[..]).is_err());
    }

    #[test]
    fn decode_rejects_missing_rates() {
        let frame = beacon_with_elements(&[0, 0]);
        assert!(decode_management(&frame[..]).is_err());
    }

    #[test]
    fn decode_rejects_oversized_ssid() {
        let mut elements = vec![0, 33];
        elements.extend_from_slice(&[b'x'; 33][..]);
        elements.extend_from_slice(&[1, 1, 0x82]);
        let frame = beacon_with_elements(&elements[..]);
        assert!(decode_management(&frame[..]).is_err());
    }

    #[test]
    fn decode_rejects_oversized_rates() {
        let frame = beacon_with_elements(&[0, 0, 1, 9, 2, 4, 11, 22, 12, 18, 24, 36, 48]);
        assert!(decode_management(&frame[..]).is_err());
    }

    #[test]
    fn decode_rejects_short_fixed_fields() {
        let mut frame = beacon_with_elements(&[]);
        frame.truncate(24 + 6);
        assert!(decode_management(&frame[..]).is_err());
    }

    #[test]
    fn decode_rejected_assoc_resp_without_rates() {
        #[rustfmt::skip]
        let frame = [
            0x10, 0x00, // fc: association response
            0, 0, // duration
            1, 1, 1, 1, 1, 1, // addr1
            2, 2, 2, 2, 2, 2, // addr2
            2, 2, 2, 2, 2, 2, // addr3
            0x00, 0x00, // sequence control
            0x01, 0x00, // capabilities
            17, 0, // status: too many stations
            0, 0, // aid
        ];
        match decode_management(&frame[..]).expect("expected association response").body {
            MgmtBody::AssocResp(fields) => {
                assert_eq!(StatusCode::DENIED_NO_MORE_STAS, fields.status);
                assert!(fields.rates.is_empty());
            }
            body => panic!("unexpected body: {:?}", body),
        }
    }

    #[test]
    fn decode_rejects_data_frame() {
        let mut frame = beacon_with_elements(&[0, 0, 1, 1, 0x82]);
        frame[0] = 0x08;
        assert!(decode_management(&frame[..]).is_err());
    }

    #[test]
    fn encode_rejects_oversized_ssid() {
        let body = MgmtBody::ProbeReq(ProbeReqFields { ssid: vec![b'x'; 33], rates: vec![2] });
        assert!(encode_management(&mut vec![], &hdr(), &body).is_err());
    }
}
