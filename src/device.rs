// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Device identification (function 0x2B, MEI type 0x0E).

use std::fmt;

use bytes::{Buf as _, Bytes};
use serde::Serialize;

use crate::error::{Error, Result};

/// Function code of "Encapsulated Interface Transport".
pub const FUNCTION_CODE: u8 = 0x2B;

/// MEI type code for "Read Device Identification".
pub const MEI_TYPE_READ_DEVICE_IDENTIFICATION: u8 = 0x0E;

/// Basic identification, stream access.
pub const READ_CODE_BASIC: u8 = 0x01;

const OBJECT_VENDOR_NAME: u8 = 0x00;
const OBJECT_PRODUCT_CODE: u8 = 0x01;
const OBJECT_MAJOR_MINOR_REVISION: u8 = 0x02;
const OBJECT_SERIAL: u8 = 0x03;

/// Payload of the identification request following the function code.
#[must_use]
pub const fn request_payload() -> [u8; 3] {
    [MEI_TYPE_READ_DEVICE_IDENTIFICATION, READ_CODE_BASIC, OBJECT_VENDOR_NAME]
}

/// A single identification object as returned by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdObject {
    pub id: u8,
    pub value: Bytes,
}

impl DeviceIdObject {
    fn value_lossy(&self) -> String {
        String::from_utf8_lossy(&self.value).trim().to_owned()
    }
}

/// What the controller tells about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub company: String,
    pub product: String,
    pub version: String,
    /// Not part of the basic object set, only present on some firmware.
    pub serial: Option<String>,
}

impl DeviceInfo {
    /// Parse the response payload following the function code.
    ///
    /// The layout is `[mei, read code, conformity, more follows,
    /// next object id, object count, (id, length, value)*]`.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let objects = decode_objects(payload)?;
        let mut info = DeviceInfo::default();
        for object in &objects {
            match object.id {
                OBJECT_VENDOR_NAME => info.company = object.value_lossy(),
                OBJECT_PRODUCT_CODE => info.product = object.value_lossy(),
                OBJECT_MAJOR_MINOR_REVISION => info.version = object.value_lossy(),
                OBJECT_SERIAL => info.serial = Some(object.value_lossy()),
                _ => {}
            }
        }
        Ok(info)
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.company, self.product, self.version)?;
        if let Some(serial) = &self.serial {
            write!(f, " (serial {serial})")?;
        }
        Ok(())
    }
}

fn decode_objects(mut buf: &[u8]) -> Result<Vec<DeviceIdObject>> {
    if buf.remaining() < 6 {
        return Err(Error::DeviceInfo(format!(
            "response too short: {} bytes",
            buf.remaining()
        )));
    }
    let mei_type = buf.get_u8();
    if mei_type != MEI_TYPE_READ_DEVICE_IDENTIFICATION {
        return Err(Error::DeviceInfo(format!(
            "unexpected MEI type 0x{mei_type:0>2X}"
        )));
    }
    let _read_code = buf.get_u8();
    let _conformity_level = buf.get_u8();
    let _more_follows = buf.get_u8();
    let _next_object_id = buf.get_u8();
    let count = buf.get_u8();
    let mut objects = Vec::with_capacity(count.into());
    for _ in 0..count {
        if buf.remaining() < 2 {
            return Err(Error::DeviceInfo("truncated object header".into()));
        }
        let id = buf.get_u8();
        let len = usize::from(buf.get_u8());
        if buf.remaining() < len {
            return Err(Error::DeviceInfo(format!(
                "object 0x{id:0>2X} needs {len} bytes, {} left",
                buf.remaining()
            )));
        }
        let value = buf.copy_to_bytes(len);
        objects.push(DeviceIdObject { id, value });
    }
    Ok(objects)
}
