// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data items exchanged with the device and handed to the host.

use std::{
    collections::BTreeMap,
    error,
    fmt::{self, Display},
};

use chrono::{NaiveDateTime, NaiveTime};
use serde::Serialize;

/// A Modbus protocol address is represented by 16 bit from `0` to `65535`.
///
/// The register tables of the charge controller use these 0-based protocol
/// addresses directly, e.g. `0x3100` for the PV input voltage.
pub type Address = u16;

/// Number of items to process.
pub type Quantity = u16;

/// Modbus uses 16 bit for its data items.
///
/// Transmitted using a big-endian representation.
pub type Word = u16;

/// The register bank a read is issued against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressSpace {
    /// Read-only measurements (0x04).
    Input,
    /// Read/write parameters (0x03).
    Holding,
    /// Single bit switches (0x01), reported as words `0` or `1`.
    Coil,
}

impl AddressSpace {
    /// The function code used to read from this bank.
    #[must_use]
    pub const fn function_code(self) -> u8 {
        match self {
            Self::Coil => 0x01,
            Self::Holding => 0x03,
            Self::Input => 0x04,
        }
    }
}

impl Display for AddressSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Input => "input",
            Self::Holding => "holding",
            Self::Coil => "coil",
        };
        f.write_str(name)
    }
}

/// Exception code sent by the device instead of the requested data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Exception(pub u8);

impl Exception {
    pub const ILLEGAL_FUNCTION: Self = Self(0x01);
    pub const ILLEGAL_DATA_ADDRESS: Self = Self(0x02);
    pub const ILLEGAL_DATA_VALUE: Self = Self(0x03);
    pub const SERVER_DEVICE_FAILURE: Self = Self(0x04);
    pub const SERVER_DEVICE_BUSY: Self = Self(0x06);

    #[must_use]
    pub const fn code(self) -> u8 {
        self.0
    }
}

impl From<u8> for Exception {
    fn from(code: u8) -> Self {
        Self(code)
    }
}

impl Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Codes a Tracer answers with; anything else is shown raw.
        let text = match self.0 {
            0x01 => "Illegal function",
            0x02 => "Illegal data address",
            0x03 => "Illegal data value",
            0x04 => "Server device failure",
            0x06 => "Server device busy",
            code => return write!(f, "Exception 0x{code:02X}"),
        };
        f.write_str(text)
    }
}

impl error::Error for Exception {}

/// A single decoded value of a [`Reading`].
///
/// Serializes to the plain JSON value, i.e. numbers, strings, `null` or
/// ISO 8601 date/time strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// A scaled physical quantity.
    Float(f64),
    /// A raw count, bit field or unknown enumeration code.
    Int(i64),
    /// The label of a known enumeration code.
    Label(&'static str),
    /// A calendar date and time.
    DateTime(NaiveDateTime),
    /// A time of day.
    Time(NaiveTime),
    /// The device reported "no data".
    Absent,
    /// Diagnostic text in place of the fields of a failed page.
    Text(String),
}

impl Value {
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Float(v) => Some(v),
            #[allow(clippy::cast_precision_loss)]
            Self::Int(v) => Some(v as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Int(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Label(label) => Some(label),
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Label(v) => f.write_str(v),
            Self::DateTime(v) => write!(f, "{v}"),
            Self::Time(v) => write!(f, "{v}"),
            Self::Absent => f.write_str("None"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

/// The flat result of reading one or more pages.
///
/// Maps field names to decoded values. A page that could not be read
/// contributes a single diagnostic entry under its key instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Reading(BTreeMap<&'static str, Value>);

impl Reading {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, name: &'static str, value: Value) {
        self.0.insert(name, value);
    }

    /// Move all entries of `other` into this reading.
    pub fn merge(&mut self, other: Reading) {
        self.0.extend(other.0);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.0.iter().map(|(name, value)| (*name, value))
    }
}

impl IntoIterator for Reading {
    type Item = (&'static str, Value);
    type IntoIter = std::collections::btree_map::IntoIter<&'static str, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<(&'static str, Value)> for Reading {
    fn from_iter<I: IntoIterator<Item = (&'static str, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exception_display() {
        assert_eq!(
            Exception::ILLEGAL_DATA_ADDRESS.to_string(),
            "Illegal data address"
        );
        assert_eq!(Exception::from(0x06), Exception::SERVER_DEVICE_BUSY);
        assert_eq!(Exception(0x42).to_string(), "Exception 0x42");
        assert_eq!(Exception(0x42).code(), 0x42);
    }

    #[test]
    fn function_code_of_address_space() {
        assert_eq!(AddressSpace::Coil.function_code(), 0x01);
        assert_eq!(AddressSpace::Holding.function_code(), 0x03);
        assert_eq!(AddressSpace::Input.function_code(), 0x04);
    }

    #[test]
    fn merge_readings() {
        let mut reading: Reading = [("a", Value::Int(1)), ("b", Value::Float(0.5))]
            .into_iter()
            .collect();
        reading.merge([("c", Value::Absent)].into_iter().collect());
        assert_eq!(reading.len(), 3);
        assert!(reading.get("c").unwrap().is_absent());
        assert_eq!(reading.get("b").and_then(Value::as_f64), Some(0.5));
    }

    #[test]
    fn serialize_values() {
        let reading: Reading = [
            ("charging_mode", Value::Label("MPPT")),
            ("battery_temperature", Value::Absent),
            ("load_test_mode", Value::Int(0)),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            serde_json::to_string(&reading).unwrap(),
            r#"{"battery_temperature":null,"charging_mode":"MPPT","load_test_mode":0}"#
        );
    }
}
