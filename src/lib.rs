// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A polling driver for [EPEVER](https://www.epever.com) Tracer solar
//! charge controllers speaking [Modbus](https://en.wikipedia.org/wiki/Modbus)
//! RTU over a serial line.
//!
//! The controller exposes its ratings, live measurements, status flags,
//! statistics and settings as a few fixed register ranges. This library
//! reads those ranges, decodes the raw words into physical values and hands
//! them out as flat, named [`Reading`]s.
//!
//! ## Installation
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! tracer-modbus = "*"
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use tracer_modbus::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DriverConfig {
//!         port: "/dev/ttyUSB0".into(),
//!         ..Default::default()
//!     };
//!     let connector = config.rtu_connector()?;
//!     let mut reader = DeviceReader::connect(&connector)?;
//!     let reading = reader.read_live_data()?;
//!     if let Some(voltage) = reading.get("charge_input_voltage") {
//!         println!("PV voltage: {voltage} V");
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod codec;
pub mod config;
pub mod device;
pub mod driver;
pub mod prelude;
pub mod register;
pub mod retry;

mod error;
pub use self::error::{Error, Result, TransportResult};

mod frame;
pub use self::frame::{Address, AddressSpace, Exception, Quantity, Reading, Value, Word};
