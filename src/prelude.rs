// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types and traits

///////////////////////////////////////////////////////////////////
/// Modules
///////////////////////////////////////////////////////////////////
pub use crate::client;

#[allow(missing_docs)]
#[cfg(feature = "rtu")]
pub mod rtu {
    pub use crate::client::rtu::*;
}

///////////////////////////////////////////////////////////////////
/// Types
///////////////////////////////////////////////////////////////////
pub use crate::client::DeviceReader;
pub use crate::config::{DriverConfig, UnitSystem};
pub use crate::device::DeviceInfo;
pub use crate::driver::{Driver, Operation, Outcome, Packet};
pub use crate::register::catalog::Page;
pub use crate::retry::RetryPolicy;
pub use crate::{AddressSpace, Error, Exception, Reading, Result, Value};

///////////////////////////////////////////////////////////////////
/// Traits
///////////////////////////////////////////////////////////////////
pub use crate::client::{Connect, Transport};
pub use crate::driver::Sink;
