// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Crate wlan-common hosts the IEEE 802.11 wire formats shared by the MLME:
//! MAC headers, information elements, the management frame codec and data
//! frame encapsulation.

pub mod appendable;
pub mod buffer_reader;
pub mod buffer_writer;
pub mod data;
pub mod data_writer;
pub mod error;
pub mod frame_buf;
pub mod ie;
pub mod mac;
pub mod mgmt;
pub mod mgmt_writer;
