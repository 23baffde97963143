// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Runtime configuration. Setters validate their input and report whether the new value
//! is in effect or waits for the next `Mlme::reset`.

use {
    super::{Mlme, State},
    crate::{
        channel::ChannelSet,
        config::{ConfigOutcome, OpMode, MAX_AID},
        device::DeviceOps,
        error::Error,
        rates::RATE_VAL,
        wep::WEP_NKID,
    },
    log::info,
    wlan_common::{
        ie::SSID_MAX_LEN,
        mac::{MacAddr, ZERO_ADDR},
    },
};

fn changed<T: PartialEq + ?Sized>(old: &T, new: &T) -> ConfigOutcome {
    if old == new {
        ConfigOutcome::Applied
    } else {
        ConfigOutcome::ResetRequired
    }
}

impl<D: DeviceOps> Mlme<D> {
    fn is_joining(&self) -> bool {
        self.state == State::Init || self.state == State::Scan
    }

    /// The desired SSID before a BSS is joined, the BSS's SSID after.
    pub fn ssid(&self) -> &[u8] {
        if self.is_joining() {
            &self.config.ssid[..]
        } else {
            &self.bss.ssid[..]
        }
    }

    pub fn set_ssid(&mut self, ssid: &[u8]) -> Result<ConfigOutcome, Error> {
        if ssid.len() > SSID_MAX_LEN {
            return Err(Error::InvalidArgument(format!("SSID too long: {}", ssid.len())));
        }
        let outcome = changed(&self.config.ssid[..], ssid);
        self.config.ssid = ssid.to_vec();
        Ok(outcome)
    }

    pub fn bssid(&self) -> MacAddr {
        if self.config.opmode == OpMode::HostAp {
            self.my_addr()
        } else if self.is_joining() {
            self.config.bssid.unwrap_or(ZERO_ADDR)
        } else {
            self.bss.bssid
        }
    }

    /// Pins the BSSID to join. The all-zero address removes the pin.
    pub fn set_bssid(&mut self, bssid: MacAddr) -> Result<ConfigOutcome, Error> {
        let pin = if bssid == ZERO_ADDR { None } else { Some(bssid) };
        let outcome = changed(&self.config.bssid, &pin);
        self.config.bssid = pin;
        Ok(outcome)
    }

    /// `None` stands for any channel.
    pub fn channel(&self) -> Option<u8> {
        match (self.state, self.config.opmode) {
            (State::Init, OpMode::Sta) => self.config.channel,
            (State::Init, _) => Some(self.config.ibss_channel),
            _ => Some(self.bss.chan),
        }
    }

    pub fn set_channel(&mut self, chan: Option<u8>) -> Result<ConfigOutcome, Error> {
        if let Some(chan) = chan {
            if !self.chans.active.contains(chan) {
                return Err(Error::InvalidArgument(format!("channel {} is not active", chan)));
            }
        }
        let mut outcome = changed(&self.config.channel, &chan);
        self.config.channel = chan;
        if let Some(chan) = chan {
            if chan != self.config.ibss_channel {
                outcome = ConfigOutcome::ResetRequired;
            }
            self.config.ibss_channel = chan;
        }
        Ok(outcome)
    }

    pub fn active_channels(&self) -> Vec<u8> {
        self.chans.active.iter().collect()
    }

    /// Restricts scanning and channel pins to `channels`. Channels the device does not
    /// support are ignored.
    pub fn set_active_channels(&mut self, channels: &[u8]) -> Result<ConfigOutcome, Error> {
        let requested = channels.iter().copied().collect::<ChannelSet>();
        if !requested.iter().any(|chan| self.chans.available.contains(chan)) {
            return Err(Error::InvalidArgument(format!(
                "no supported channel in {:?}",
                requested
            )));
        }
        let old = self.chans.active;
        self.chans.set_active(requested);
        if let Some(chan) = self.config.channel {
            if !self.chans.active.contains(chan) {
                self.config.channel = None;
            }
        }
        Ok(changed(&old, &self.chans.active))
    }

    pub fn fixed_rate(&self) -> Option<u8> {
        self.config.fixed_rate
    }

    pub fn set_fixed_rate(&mut self, rate: Option<u8>) -> Result<ConfigOutcome, Error> {
        if let Some(rate) = rate {
            if !self.info.rates.iter().any(|r| r & RATE_VAL == rate & RATE_VAL) {
                return Err(Error::InvalidArgument(format!("unsupported rate {}", rate)));
            }
        }
        let rate = rate.map(|rate| rate & RATE_VAL);
        let outcome = changed(&self.config.fixed_rate, &rate);
        self.config.fixed_rate = rate;
        Ok(outcome)
    }

    /// Current transmit rate in 500 kb/s units, 0 when not running.
    pub fn current_rate(&self) -> u8 {
        match self.config.fixed_rate {
            Some(rate) => rate,
            None if self.state == State::Run => self.bss.current_rate(),
            None => 0,
        }
    }

    pub fn opmode(&self) -> OpMode {
        self.config.opmode
    }

    pub fn set_opmode(&mut self, opmode: OpMode) -> Result<ConfigOutcome, Error> {
        if !self.info.caps.supports(opmode) {
            return Err(Error::NotSupported(format!("{:?} mode", opmode)));
        }
        let outcome = changed(&self.config.opmode, &opmode);
        if outcome == ConfigOutcome::ResetRequired {
            info!("operating mode {:?} -> {:?}", self.config.opmode, opmode);
        }
        self.config.opmode = opmode;
        Ok(outcome)
    }

    pub fn wep_enabled(&self) -> bool {
        self.config.wep_enabled
    }

    pub fn set_wep_enabled(&mut self, enabled: bool) -> Result<ConfigOutcome, Error> {
        if enabled {
            if !self.info.caps.wep {
                return Err(Error::NotSupported("WEP".to_string()));
            }
            if !self.keys.is_set(self.config.wep_tx_key) {
                return Err(Error::InvalidArgument(format!(
                    "transmit key {} is not set",
                    self.config.wep_tx_key
                )));
            }
        }
        let outcome = changed(&self.config.wep_enabled, &enabled);
        self.config.wep_enabled = enabled;
        Ok(outcome)
    }

    /// Length of the key in slot `kid`, or 0 if the slot is empty. Keys are not readable.
    pub fn wep_key_len(&self, kid: usize) -> usize {
        self.keys.get(kid).map(|key| key.len()).unwrap_or(0)
    }

    /// Stores a key, or clears the slot when `key` is empty.
    pub fn set_wep_key(&mut self, kid: usize, key: &[u8]) -> Result<ConfigOutcome, Error> {
        if key.is_empty() && self.config.wep_enabled && kid == self.config.wep_tx_key {
            return Err(Error::InvalidArgument("cannot clear the transmit key".to_string()));
        }
        self.keys.set(kid, key)?;
        Ok(ConfigOutcome::Applied)
    }

    pub fn wep_tx_key(&self) -> usize {
        self.config.wep_tx_key
    }

    pub fn set_wep_tx_key(&mut self, kid: usize) -> Result<ConfigOutcome, Error> {
        if kid >= WEP_NKID {
            return Err(Error::InvalidArgument(format!("invalid key index {}", kid)));
        }
        if self.config.wep_enabled && !self.keys.is_set(kid) {
            return Err(Error::InvalidArgument(format!("key {} is not set", kid)));
        }
        self.config.wep_tx_key = kid;
        Ok(ConfigOutcome::Applied)
    }

    pub fn power_mgmt(&self) -> bool {
        self.config.power_mgmt
    }

    pub fn set_power_mgmt(&mut self, enabled: bool) -> Result<ConfigOutcome, Error> {
        if enabled && !self.info.caps.power_mgmt {
            return Err(Error::NotSupported("power management".to_string()));
        }
        let outcome = changed(&self.config.power_mgmt, &enabled);
        self.config.power_mgmt = enabled;
        Ok(outcome)
    }

    pub fn listen_interval(&self) -> u16 {
        self.config.listen_interval
    }

    pub fn set_listen_interval(&mut self, interval: u16) -> Result<ConfigOutcome, Error> {
        if interval == 0 {
            return Err(Error::InvalidArgument("listen interval must be positive".to_string()));
        }
        let outcome = changed(&self.config.listen_interval, &interval);
        self.config.listen_interval = interval;
        Ok(outcome)
    }

    pub fn max_aid(&self) -> u16 {
        self.config.max_aid
    }

    pub fn set_max_aid(&mut self, max_aid: u16) -> Result<ConfigOutcome, Error> {
        if max_aid == 0 || max_aid > MAX_AID {
            return Err(Error::InvalidArgument(format!(
                "max associations must be within 1..={}, got {}",
                MAX_AID, max_aid
            )));
        }
        self.config.max_aid = max_aid;
        Ok(ConfigOutcome::Applied)
    }

    /// Whether an IBSS is created when a scan finds none to join.
    pub fn ibss_creation(&self) -> bool {
        self.config.create_ibss
    }

    pub fn set_ibss_creation(&mut self, enabled: bool) -> Result<ConfigOutcome, Error> {
        if enabled && !self.info.caps.ibss {
            return Err(Error::NotSupported("IBSS".to_string()));
        }
        let mut outcome = changed(&self.config.create_ibss, &enabled);
        if self.config.opmode != OpMode::Ibss {
            outcome = ConfigOutcome::Applied;
        }
        self.config.create_ibss = enabled;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{config::MlmeConfig, mlme::test_utils::*},
        test_case::test_case,
    };

    #[test]
    fn ssid_tracks_state() {
        let (mut mlme, _scheduler) = make_mlme(config(OpMode::Sta, b"want"));
        assert_eq!(mlme.ssid(), b"want");
        assert_eq!(mlme.set_ssid(b"want").expect("set ssid"), ConfigOutcome::Applied);
        assert_eq!(mlme.set_ssid(b"other").expect("set ssid"), ConfigOutcome::ResetRequired);
        assert!(mlme.set_ssid(&[b'a'; 33]).is_err());

        mlme.state = State::Run;
        mlme.bss.ssid = b"joined".to_vec();
        assert_eq!(mlme.ssid(), b"joined");
    }

    #[test]
    fn bssid_pin() {
        let (mut mlme, _scheduler) = make_mlme(config(OpMode::Sta, b""));
        assert_eq!(mlme.bssid(), ZERO_ADDR);
        mlme.set_bssid(AP_ADDR).expect("set bssid");
        assert_eq!(mlme.bssid(), AP_ADDR);
        assert_eq!(mlme.config.bssid, Some(AP_ADDR));
        mlme.set_bssid(ZERO_ADDR).expect("clear bssid");
        assert_eq!(mlme.config.bssid, None);

        mlme.set_opmode(OpMode::HostAp).expect("set opmode");
        assert_eq!(mlme.bssid(), MY_ADDR);
    }

    #[test]
    fn channel_pin() {
        let (mut mlme, _scheduler) = make_mlme(config(OpMode::Sta, b""));
        assert_eq!(mlme.channel(), None);
        assert!(matches!(mlme.set_channel(Some(3)), Err(Error::InvalidArgument(_))));
        assert_eq!(mlme.set_channel(Some(6)).expect("set channel"), ConfigOutcome::ResetRequired);
        assert_eq!(mlme.channel(), Some(6));

        mlme.set_opmode(OpMode::Ibss).expect("set opmode");
        assert_eq!(mlme.channel(), Some(6));
        mlme.start();
        assert_eq!(mlme.channel(), Some(11));
    }

    #[test]
    fn active_channels_restrict_pin() {
        let (mut mlme, _scheduler) = make_mlme(config(OpMode::Sta, b""));
        mlme.set_channel(Some(6)).expect("set channel");
        assert!(mlme.set_active_channels(&[2, 3]).is_err());
        assert_eq!(
            mlme.set_active_channels(&[1, 11, 14]).expect("set channels"),
            ConfigOutcome::ResetRequired
        );
        assert_eq!(mlme.active_channels(), vec![1, 11]);
        assert_eq!(mlme.channel(), None);
    }

    #[test]
    fn fixed_and_current_rate() {
        let (mut mlme, _scheduler) = make_mlme(config(OpMode::HostAp, b"ap"));
        assert_eq!(mlme.current_rate(), 0);
        mlme.start();
        assert_eq!(mlme.current_rate(), 22);
        assert!(mlme.set_fixed_rate(Some(108)).is_err());
        mlme.set_fixed_rate(Some(0x84)).expect("set rate");
        assert_eq!(mlme.fixed_rate(), Some(4));
        assert_eq!(mlme.current_rate(), 4);
    }

    #[test_case(OpMode::Sta, true; "sta")]
    #[test_case(OpMode::HostAp, true; "hostap")]
    #[test_case(OpMode::Monitor, false; "monitor")]
    fn opmode_requires_support(opmode: OpMode, supported: bool) {
        let mut info = device_info();
        info.caps.monitor = false;
        let mut mlme = Mlme::new(
            crate::device::FakeDevice::new(),
            info,
            MlmeConfig::default(),
            Box::new(crate::timer::FakeScheduler::new()),
        )
        .expect("creating MLME");
        assert_eq!(mlme.set_opmode(opmode).is_ok(), supported);
    }

    #[test]
    fn wep_configuration() {
        let (mut mlme, _scheduler) = make_mlme(config(OpMode::Sta, b""));
        assert!(matches!(mlme.set_wep_enabled(true), Err(Error::InvalidArgument(_))));
        assert!(mlme.set_wep_key(0, &[1; 4]).is_err());
        mlme.set_wep_key(0, &[1; 5]).expect("set key");
        assert_eq!(mlme.wep_key_len(0), 5);
        assert_eq!(mlme.set_wep_enabled(true).expect("enable wep"), ConfigOutcome::ResetRequired);
        assert!(mlme.set_wep_key(0, &[]).is_err());
        assert!(mlme.set_wep_tx_key(1).is_err());
        assert!(mlme.set_wep_tx_key(4).is_err());
        mlme.set_wep_key(1, &[2; 13]).expect("set key");
        mlme.set_wep_tx_key(1).expect("set tx key");
        mlme.set_wep_key(0, &[]).expect("clear key");
        assert_eq!(mlme.wep_key_len(0), 0);
    }

    #[test]
    fn wep_requires_device_support() {
        let mut info = device_info();
        info.caps.wep = false;
        let mut mlme = Mlme::new(
            crate::device::FakeDevice::new(),
            info,
            MlmeConfig::default(),
            Box::new(crate::timer::FakeScheduler::new()),
        )
        .expect("creating MLME");
        mlme.set_wep_key(0, &[1; 5]).expect("set key");
        assert!(matches!(mlme.set_wep_enabled(true), Err(Error::NotSupported(_))));
    }

    #[test]
    fn association_limits() {
        let (mut mlme, _scheduler) = make_mlme(MlmeConfig::default());
        assert_eq!(mlme.max_aid(), MAX_AID);
        assert!(mlme.set_max_aid(0).is_err());
        assert!(mlme.set_max_aid(MAX_AID + 1).is_err());
        assert_eq!(mlme.set_max_aid(10).expect("set max aid"), ConfigOutcome::Applied);
        assert!(mlme.set_listen_interval(0).is_err());
        let outcome = mlme.set_listen_interval(200).expect("set interval");
        assert_eq!(outcome, ConfigOutcome::ResetRequired);
    }

    #[test]
    fn power_mgmt_and_ibss_creation() {
        let mut info = device_info();
        info.caps.power_mgmt = false;
        let mut mlme = Mlme::new(
            crate::device::FakeDevice::new(),
            info,
            config(OpMode::Ibss, b"adhoc"),
            Box::new(crate::timer::FakeScheduler::new()),
        )
        .expect("creating MLME");
        assert!(matches!(mlme.set_power_mgmt(true), Err(Error::NotSupported(_))));
        assert_eq!(mlme.set_power_mgmt(false).expect("set pm"), ConfigOutcome::Applied);
        assert_eq!(mlme.set_ibss_creation(true).expect("set ibss"), ConfigOutcome::ResetRequired);
        assert!(mlme.ibss_creation());
    }
}
