// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Conversion between Ethernet II frames and 802.11 data frames carrying an
//! LLC/SNAP header.

use {
    crate::{
        appendable::Appendable,
        data_writer::{data_addresses, make_snap_llc_hdr, write_data_hdr},
        error::{FrameParseError, FrameWriteError},
        mac::{self, DsDirection, EthernetIIHdr, LlcHdr, MacAddr, MacFrame},
    },
    zerocopy::LayoutVerified,
};

/// Writes `eth_frame` as a data frame travelling in `direction`.
pub fn encapsulate<B: Appendable>(
    buf: &mut B,
    eth_frame: &[u8],
    direction: DsDirection,
    bssid: MacAddr,
    seq_num: u16,
) -> Result<(), FrameWriteError> {
    let (eth_hdr, payload) =
        LayoutVerified::<_, EthernetIIHdr>::new_unaligned_from_prefix(eth_frame).ok_or_else(|| {
            FrameWriteError::new_invalid_data("frame is shorter than an Ethernet header")
        })?;
    let addrs = data_addresses(direction, eth_hdr.da, eth_hdr.sa, bssid)?;
    write_data_hdr(buf, direction, addrs, seq_num)?;
    buf.append_value(&make_snap_llc_hdr(eth_hdr.ether_type()))?;
    buf.append_bytes(payload)?;
    Ok(())
}

/// Writes the Ethernet II frame carried by the data frame `frame`. Payloads without an
/// LLC/SNAP header are passed through with the payload length as the type field.
pub fn decapsulate<B: Appendable>(buf: &mut B, frame: &[u8]) -> Result<(), FrameParseError> {
    let (data_hdr, body) = match MacFrame::parse(frame) {
        Some(MacFrame::Data { data_hdr, body }) => (data_hdr, body),
        Some(_) => return Err(FrameParseError::new("not a data frame")),
        None => return Err(FrameParseError::new("frame is shorter than a data header")),
    };
    let (dst, src) = match (mac::data_dst_addr(&data_hdr), mac::data_src_addr(&data_hdr)) {
        (Some(dst), Some(src)) => (dst, src),
        _ => return Err(FrameParseError::new("four-address frames are not supported")),
    };

    let (ether_type, payload) =
        match LayoutVerified::<_, LlcHdr>::new_unaligned_from_prefix(body) {
            Some((llc_hdr, payload)) if llc_hdr.is_snap() => (llc_hdr.protocol_id(), payload),
            _ => (body.len() as u16, body),
        };

    let too_large = |_| FrameParseError::new("frame does not fit the Ethernet buffer");
    let mut eth_hdr = buf.append_value_zeroed::<EthernetIIHdr>().map_err(too_large)?;
    eth_hdr.da = dst;
    eth_hdr.sa = src;
    eth_hdr.set_ether_type(ether_type);
    buf.append_bytes(payload).map_err(too_large)?;
    Ok(())
}
