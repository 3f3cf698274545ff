// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Translation of raw register words into physical values.
//!
//! All functions are pure. A [`Rule`] names one of them together with its
//! parameters, so register tables can state how a field is decoded without
//! any code of their own.

pub mod labels;
pub mod rtu;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::{
    error::{Error, Result},
    frame::{Value, Word},
};

use self::labels::EnumTable;

/// Scale factor of voltages, currents, powers and energies.
pub const CENTI: f64 = 0.01;

/// Scale factor of the sentinel-aware temperature readings.
pub const DECI: f64 = 0.1;

/// Raw value meaning "no data" for [`Rule::Calculated`] fields.
pub const ABSENT_SENTINEL: i16 = -9990;

/// Interpret `raw` as a two's-complement signed integer and scale it.
#[must_use]
pub fn decode_signed16(raw: Word, scale: f64) -> f64 {
    #[allow(clippy::cast_possible_wrap)]
    let value = raw as i16;
    f64::from(value) * scale
}

/// Combine a low and a high word into a signed 32-bit integer and scale it.
#[must_use]
pub fn decode_composite32(low: Word, high: Word, scale: f64) -> f64 {
    #[allow(clippy::cast_possible_wrap)]
    let value = ((u32::from(high) << 16) | u32::from(low)) as i32;
    f64::from(value) * scale
}

/// Signed ×0.1 decoding where [`ABSENT_SENTINEL`] means the value is missing.
#[must_use]
pub fn decode_calculated(raw: Word) -> Option<f64> {
    #[allow(clippy::cast_possible_wrap)]
    let value = raw as i16;
    (value != ABSENT_SENTINEL).then(|| f64::from(value) * DECI)
}

/// Look up the label of `raw`, falling back to the raw code.
#[must_use]
pub fn decode_enum(raw: Word, table: &EnumTable) -> Value {
    labels::lookup(table, raw).map_or_else(|| Value::Int(raw.into()), Value::Label)
}

/// Extract `(raw >> shift) & mask`.
///
/// Undefined hardware states decode to whatever the bits say.
#[must_use]
pub const fn decode_bit_field(raw: Word, mask: Word, shift: u8) -> Word {
    (raw >> shift) & mask
}

const fn split(word: Word) -> (u32, u32) {
    ((word >> 8) as u32, (word & 0xFF) as u32)
}

/// Decode the real time clock from three words with two bytes each.
///
/// The high/low bytes are (second, minute), (hour, day) and (month, year),
/// the year counting from 2000.
pub fn decode_packed_date_time(
    sec_min: Word,
    hour_day: Word,
    month_year: Word,
) -> Result<NaiveDateTime> {
    let (second, minute) = split(sec_min);
    let (hour, day) = split(hour_day);
    let (month, year) = split(month_year);
    #[allow(clippy::cast_possible_wrap)]
    let year = 2000 + year as i32;
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .ok_or(Error::InvalidDate {
            words: [sec_min, hour_day, month_year],
        })
}

/// Decode a time of day stored as one word per component.
pub fn decode_packed_time(second: Word, minute: Word, hour: Word) -> Result<NaiveTime> {
    NaiveTime::from_hms_opt(hour.into(), minute.into(), second.into()).ok_or(
        Error::InvalidTime {
            hour,
            minute,
            second,
        },
    )
}

/// How the word(s) of a single field are turned into a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    /// Signed 16-bit integer times a factor.
    Signed16(f64),
    /// Signed 32-bit integer from (low, high) times a factor.
    Composite32(f64),
    /// Signed ×0.1 with the "no data" sentinel.
    Calculated,
    /// The unsigned word itself, e.g. capacities, durations and percentages.
    Raw,
    /// Enumerated code with a label table.
    Enum(&'static EnumTable),
    /// Bit field `(raw >> shift) & mask`.
    BitField { mask: Word, shift: u8 },
    /// Date and time from three words of byte pairs.
    PackedDateTime,
    /// Time of day from (second, minute, hour) words.
    PackedTime,
}

impl Rule {
    /// Shorthand for a single bit flag.
    #[must_use]
    pub const fn bit(shift: u8) -> Self {
        Self::BitField { mask: 1, shift }
    }

    /// The number of consecutive words the rule consumes.
    #[must_use]
    pub const fn span(&self) -> usize {
        match self {
            Self::Composite32(_) => 2,
            Self::PackedDateTime | Self::PackedTime => 3,
            _ => 1,
        }
    }

    /// Decode the leading [`span`](Self::span) words of `words`.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `span()` words are given. Register tables are
    /// checked against this in the tests of [`crate::register`].
    pub fn decode(&self, words: &[Word]) -> Result<Value> {
        let value = match *self {
            Self::Signed16(scale) => Value::Float(decode_signed16(words[0], scale)),
            Self::Composite32(scale) => {
                Value::Float(decode_composite32(words[0], words[1], scale))
            }
            Self::Calculated => decode_calculated(words[0]).map_or(Value::Absent, Value::Float),
            Self::Raw => Value::Int(words[0].into()),
            Self::Enum(table) => decode_enum(words[0], table),
            Self::BitField { mask, shift } => {
                Value::Int(decode_bit_field(words[0], mask, shift).into())
            }
            Self::PackedDateTime => {
                Value::DateTime(decode_packed_date_time(words[0], words[1], words[2])?)
            }
            Self::PackedTime => Value::Time(decode_packed_time(words[0], words[1], words[2])?),
        };
        Ok(value)
    }
}
