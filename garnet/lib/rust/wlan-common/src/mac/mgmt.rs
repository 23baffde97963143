// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::{CapabilityInfo, MacAddr},
    byteorder::{ByteOrder, LittleEndian},
    zerocopy::{AsBytes, FromBytes, Unaligned},
};

/// Management frame subtypes, IEEE Std 802.11-2016, 9.2.4.1.3.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MgmtSubtype {
    AssocReq,
    AssocResp,
    ReassocReq,
    ReassocResp,
    ProbeReq,
    ProbeResp,
    Beacon,
    Atim,
    Disassoc,
    Auth,
    Deauth,
}

impl MgmtSubtype {
    pub fn from_raw(subtype: u16) -> Option<Self> {
        Some(match subtype {
            0x00 => MgmtSubtype::AssocReq,
            0x01 => MgmtSubtype::AssocResp,
            0x02 => MgmtSubtype::ReassocReq,
            0x03 => MgmtSubtype::ReassocResp,
            0x04 => MgmtSubtype::ProbeReq,
            0x05 => MgmtSubtype::ProbeResp,
            0x08 => MgmtSubtype::Beacon,
            0x09 => MgmtSubtype::Atim,
            0x0A => MgmtSubtype::Disassoc,
            0x0B => MgmtSubtype::Auth,
            0x0C => MgmtSubtype::Deauth,
            _ => return None,
        })
    }

    pub fn raw(self) -> u16 {
        match self {
            MgmtSubtype::AssocReq => 0x00,
            MgmtSubtype::AssocResp => 0x01,
            MgmtSubtype::ReassocReq => 0x02,
            MgmtSubtype::ReassocResp => 0x03,
            MgmtSubtype::ProbeReq => 0x04,
            MgmtSubtype::ProbeResp => 0x05,
            MgmtSubtype::Beacon => 0x08,
            MgmtSubtype::Atim => 0x09,
            MgmtSubtype::Disassoc => 0x0A,
            MgmtSubtype::Auth => 0x0B,
            MgmtSubtype::Deauth => 0x0C,
        }
    }
}

// IEEE Std 802.11-2016, 9.4.1.1
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AuthAlgorithmNumber(pub u16);

impl AuthAlgorithmNumber {
    pub const OPEN: Self = Self(0);
    pub const SHARED_KEY: Self = Self(1);
}

/// IEEE Std 802.11-2016, 9.4.1.7
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReasonCode(pub u16);

impl ReasonCode {
    pub const UNSPECIFIED_REASON: Self = Self(1);
    pub const INVALID_AUTHENTICATION: Self = Self(2);
    pub const LEAVING_NETWORK_DEAUTH: Self = Self(3);
    pub const REASON_INACTIVITY: Self = Self(4);
    pub const NO_MORE_STAS: Self = Self(5);
    pub const INVALID_CLASS2FRAME: Self = Self(6);
    pub const INVALID_CLASS3FRAME: Self = Self(7);
    pub const LEAVING_NETWORK_DISASSOC: Self = Self(8);
    pub const NOT_AUTHENTICATED: Self = Self(9);
}

/// IEEE Std 802.11-2016, 9.4.1.9, Table 9-46
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub const SUCCESS: Self = Self(0);
    pub const REFUSED_REASON_UNSPECIFIED: Self = Self(1);
    pub const REFUSED_CAPABILITIES_MISMATCH: Self = Self(10);
    pub const DENIED_NO_ASSOCIATION_EXISTS: Self = Self(11);
    pub const DENIED_OTHER_REASON: Self = Self(12);
    pub const UNSUPPORTED_AUTH_ALGORITHM: Self = Self(13);
    pub const TRANSACTION_SEQUENCE_ERROR: Self = Self(14);
    pub const CHALLENGE_FAILURE: Self = Self(15);
    pub const REJECTED_SEQUENCE_TIMEOUT: Self = Self(16);
    pub const DENIED_NO_MORE_STAS: Self = Self(17);
    pub const REFUSED_BASIC_RATES_MISMATCH: Self = Self(18);
}

// IEEE Std 802.11-2016, 9.3.3.3
#[derive(Default, FromBytes, AsBytes, Unaligned)]
#[repr(C, packed)]
pub struct BeaconHdr {
    pub timestamp: [u8; 8],
    pub beacon_interval: [u8; 2],
    // IEEE Std 802.11-2016, 9.4.1.4
    pub capabilities: [u8; 2],
}

impl BeaconHdr {
    pub fn timestamp(&self) -> u64 {
        LittleEndian::read_u64(&self.timestamp)
    }

    pub fn set_timestamp(&mut self, val: u64) {
        LittleEndian::write_u64(&mut self.timestamp, val)
    }

    pub fn beacon_interval(&self) -> u16 {
        LittleEndian::read_u16(&self.beacon_interval)
    }

    pub fn set_beacon_interval(&mut self, val: u16) {
        LittleEndian::write_u16(&mut self.beacon_interval, val)
    }

    pub fn capabilities(&self) -> CapabilityInfo {
        CapabilityInfo(LittleEndian::read_u16(&self.capabilities))
    }

    pub fn set_capabilities(&mut self, val: CapabilityInfo) {
        LittleEndian::write_u16(&mut self.capabilities, val.0)
    }
}

// IEEE Std 802.11-2016, 9.3.3.12
#[derive(Default, FromBytes, AsBytes, Unaligned)]
#[repr(C, packed)]
pub struct AuthHdr {
    pub auth_alg_num: [u8; 2],
    pub auth_txn_seq_num: [u8; 2],
    pub status_code: [u8; 2],
}

impl AuthHdr {
    pub fn auth_alg_num(&self) -> AuthAlgorithmNumber {
        AuthAlgorithmNumber(LittleEndian::read_u16(&self.auth_alg_num))
    }

    pub fn set_auth_alg_num(&mut self, val: AuthAlgorithmNumber) {
        LittleEndian::write_u16(&mut self.auth_alg_num, val.0)
    }

    pub fn auth_txn_seq_num(&self) -> u16 {
        LittleEndian::read_u16(&self.auth_txn_seq_num)
    }

    pub fn set_auth_txn_seq_num(&mut self, val: u16) {
        LittleEndian::write_u16(&mut self.auth_txn_seq_num, val)
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode(LittleEndian::read_u16(&self.status_code))
    }

    pub fn set_status_code(&mut self, val: StatusCode) {
        LittleEndian::write_u16(&mut self.status_code, val.0)
    }
}

// IEEE Std 802.11-2016, 9.3.3.13 and 9.3.3.5
// Deauthentication and disassociation share a layout.
#[derive(Default, FromBytes, AsBytes, Unaligned)]
#[repr(C, packed)]
pub struct DeauthHdr {
    pub reason_code: [u8; 2],
}

impl DeauthHdr {
    pub fn reason_code(&self) -> ReasonCode {
        ReasonCode(LittleEndian::read_u16(&self.reason_code))
    }

    pub fn set_reason_code(&mut self, val: ReasonCode) {
        LittleEndian::write_u16(&mut self.reason_code, val.0)
    }
}

pub type DisassocHdr = DeauthHdr;

// IEEE Std 802.11-2016, 9.3.3.6
#[derive(Default, FromBytes, AsBytes, Unaligned)]
#[repr(C, packed)]
pub struct AssocReqHdr {
    pub capabilities: [u8; 2],
    pub listen_interval: [u8; 2],
}

impl AssocReqHdr {
    pub fn capabilities(&self) -> CapabilityInfo {
        CapabilityInfo(LittleEndian::read_u16(&self.capabilities))
    }

    pub fn set_capabilities(&mut self, val: CapabilityInfo) {
        LittleEndian::write_u16(&mut self.capabilities, val.0)
    }

    pub fn listen_interval(&self) -> u16 {
        LittleEndian::read_u16(&self.listen_interval)
    }

    pub fn set_listen_interval(&mut self, val: u16) {
        LittleEndian::write_u16(&mut self.listen_interval, val)
    }
}

// IEEE Std 802.11-2016, 9.3.3.8
// A reassociation request carries the current AP after the association request fields.
#[derive(Default, FromBytes, AsBytes, Unaligned)]
#[repr(C, packed)]
pub struct ReassocReqHdr {
    pub assoc: AssocReqHdr,
    pub current_ap: MacAddr,
}

// IEEE Std 802.11-2016, 9.3.3.7
#[derive(Default, FromBytes, AsBytes, Unaligned)]
#[repr(C, packed)]
pub struct AssocRespHdr {
    pub capabilities: [u8; 2],
    pub status_code: [u8; 2],
    pub aid: [u8; 2],
}

impl AssocRespHdr {
    pub fn capabilities(&self) -> CapabilityInfo {
        CapabilityInfo(LittleEndian::read_u16(&self.capabilities))
    }

    pub fn set_capabilities(&mut self, val: CapabilityInfo) {
        LittleEndian::write_u16(&mut self.capabilities, val.0)
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode(LittleEndian::read_u16(&self.status_code))
    }

    pub fn set_status_code(&mut self, val: StatusCode) {
        LittleEndian::write_u16(&mut self.status_code, val.0)
    }

    pub fn aid(&self) -> u16 {
        LittleEndian::read_u16(&self.aid)
    }

    pub fn set_aid(&mut self, val: u16) {
        LittleEndian::write_u16(&mut self.aid, val)
    }
}
