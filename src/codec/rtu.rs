// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! RTU framing of the device identification exchange.
//!
//! Register reads go through the serial client, which only frames the
//! standard function codes. Function 0x2B responses have a variable
//! length that can only be determined by walking the object list.

use std::io::{Error, ErrorKind, Result};

use bytes::{BufMut as _, Bytes, BytesMut};

use crate::{device, frame::Exception};

/// Address of a device on the serial bus.
pub type SlaveId = u8;

const EXCEPTION_FLAG: u8 = 0x80;

const CRC_BYTE_COUNT: usize = 2;

/// [mei, read code, conformity, more follows, next object id, object count]
const OBJECT_LIST_OFFSET: usize = 2 + 6;

// Modbus CRC-16, returned with swapped bytes so that it can be
// written big-endian.
fn calc_crc(data: &[u8]) -> u16 {
    let mut crc = 0xFFFF;
    for x in data {
        crc ^= u16::from(*x);
        for _ in 0..8 {
            let lsb = crc & 0x0001 != 0;
            crc >>= 1;
            if lsb {
                crc ^= 0xA001;
            }
        }
    }
    crc.rotate_left(8)
}

fn invalid_data(msg: String) -> Error {
    Error::new(ErrorKind::InvalidData, msg)
}

/// Wrap `pdu` into an ADU for `slave`.
#[must_use]
pub fn encode_request(slave: SlaveId, pdu: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(1 + pdu.len() + CRC_BYTE_COUNT);
    buf.put_u8(slave);
    buf.put_slice(pdu);
    let crc = calc_crc(&buf);
    buf.put_u16(crc);
    buf.freeze()
}

/// Length of the ADU at the start of `adu`, `None` while incomplete.
fn device_id_adu_len(adu: &[u8]) -> Result<Option<usize>> {
    let Some(&function) = adu.get(1) else {
        return Ok(None);
    };
    let pdu_end = if function == device::FUNCTION_CODE | EXCEPTION_FLAG {
        3
    } else if function == device::FUNCTION_CODE {
        let Some(&count) = adu.get(OBJECT_LIST_OFFSET - 1) else {
            return Ok(None);
        };
        let mut end = OBJECT_LIST_OFFSET;
        for _ in 0..count {
            let Some(&len) = adu.get(end + 1) else {
                return Ok(None);
            };
            end += 2 + usize::from(len);
        }
        end
    } else {
        return Err(invalid_data(format!(
            "unexpected function code 0x{function:02X}"
        )));
    };
    Ok(Some(pdu_end + CRC_BYTE_COUNT))
}

/// Take one identification response of `slave` from `buf`.
///
/// Returns `Ok(None)` until `buf` holds a complete frame. A complete frame
/// is consumed and yields either the payload following the function code
/// or the exception sent by the device.
pub fn decode_device_id_response(
    slave: SlaveId,
    buf: &mut BytesMut,
) -> Result<Option<std::result::Result<Bytes, Exception>>> {
    let Some(len) = device_id_adu_len(buf)? else {
        return Ok(None);
    };
    if buf.len() < len {
        return Ok(None);
    }
    let mut adu = buf.split_to(len);
    let crc_buf = adu.split_off(len - CRC_BYTE_COUNT);
    let expected_crc = calc_crc(&adu);
    let actual_crc = u16::from_be_bytes([crc_buf[0], crc_buf[1]]);
    if expected_crc != actual_crc {
        return Err(invalid_data(format!(
            "invalid CRC: expected = 0x{expected_crc:04X}, actual = 0x{actual_crc:04X}"
        )));
    }
    if adu[0] != slave {
        return Err(invalid_data(format!(
            "response from slave {} instead of {slave}",
            adu[0]
        )));
    }
    let function = adu[1];
    let payload = adu.freeze().slice(2..);
    if function & EXCEPTION_FLAG != 0 {
        return Ok(Some(Err(Exception(payload[0]))));
    }
    Ok(Some(Ok(payload)))
}
