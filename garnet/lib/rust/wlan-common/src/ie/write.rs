// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::{fields::*, Id, SSID_MAX_LEN, SUPPORTED_RATES_MAX_LEN},
    crate::{appendable::Appendable, error::FrameWriteError},
};

fn write_header<B: Appendable>(buf: &mut B, id: Id, body_len: u8) -> Result<(), FrameWriteError> {
    buf.append_byte(id.0)?;
    buf.append_byte(body_len)?;
    Ok(())
}

pub fn write_ssid<B: Appendable>(buf: &mut B, ssid: &[u8]) -> Result<(), FrameWriteError> {
    if ssid.len() > SSID_MAX_LEN {
        return Err(FrameWriteError::new_invalid_data(format!(
            "SSID is too long (max: {} bytes, got: {})",
            SSID_MAX_LEN,
            ssid.len()
        )));
    }
    write_header(buf, Id::SSID, ssid.len() as u8)?;
    buf.append_bytes(ssid)?;
    Ok(())
}

/// An empty rate set is written as an empty element.
pub fn write_supported_rates<B: Appendable>(
    buf: &mut B,
    rates: &[u8],
) -> Result<(), FrameWriteError> {
    if rates.len() > SUPPORTED_RATES_MAX_LEN {
        return Err(FrameWriteError::new_invalid_data(format!(
            "too many rates (max: {}, got: {})",
            SUPPORTED_RATES_MAX_LEN,
            rates.len()
        )));
    }
    write_header(buf, Id::SUPPORTED_RATES, rates.len() as u8)?;
    buf.append_bytes(rates)?;
    Ok(())
}

pub fn write_dsss_param_set<B: Appendable>(buf: &mut B, chan: u8) -> Result<(), FrameWriteError> {
    write_header(buf, Id::DSSS_PARAM_SET, 1)?;
    buf.append_value(&DsssParamSet { current_chan: chan })?;
    Ok(())
}

pub fn write_ibss_param_set<B: Appendable>(
    buf: &mut B,
    atim_window: u16,
) -> Result<(), FrameWriteError> {
    write_header(buf, Id::IBSS_PARAM_SET, 2)?;
    buf.append_value_zeroed::<IbssParamSet>()?.set_atim_window(atim_window);
    Ok(())
}

pub fn write_tim<B: Appendable>(buf: &mut B, tim: &Tim) -> Result<(), FrameWriteError> {
    if tim.partial_virtual_bmp.is_empty() || tim.partial_virtual_bmp.len() > 251 {
        return Err(FrameWriteError::new_invalid_data(format!(
            "partial virtual bitmap length out of range: {}",
            tim.partial_virtual_bmp.len()
        )));
    }
    write_header(buf, Id::TIM, 3 + tim.partial_virtual_bmp.len() as u8)?;
    buf.append_value(&TimHeader {
        dtim_count: tim.dtim_count,
        dtim_period: tim.dtim_period,
        bmp_ctrl: tim.bmp_ctrl,
    })?;
    buf.append_bytes(&tim.partial_virtual_bmp[..])?;
    Ok(())
}
