// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstractions for external media devices

pub mod camera;
