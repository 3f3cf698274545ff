// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Labels of enumerated register codes.
//!
//! Codes missing from a table are passed through as plain integers by
//! [`decode_enum`](super::decode_enum), so newer firmware revisions with
//! additional codes still decode.

use crate::frame::{Reading, Word};

/// A fixed mapping from raw codes to labels.
pub type EnumTable = [(Word, &'static str)];

pub const CHARGING_MODE: &EnumTable = &[(0, "connect/disconnect"), (1, "PWM"), (2, "MPPT")];

pub const BATTERY_TYPE: &EnumTable = &[(0, "user"), (1, "sealed"), (2, "gel"), (3, "flooded")];

pub const LOAD_CONTROLLING_MODE: &EnumTable = &[
    (0, "manual"),
    (1, "light on/off"),
    (2, "light on + timer"),
    (3, "time control"),
];

pub const BATTERY_RATED_VOLTAGE_CODE: &EnumTable = &[
    (0, "auto"),
    (1, "12V"),
    (2, "24V"),
    (3, "36V"),
    (4, "48V"),
    (5, "60V"),
    (6, "110V"),
    (7, "120V"),
    (8, "220V"),
    (9, "240V"),
];

pub const LOAD_TIMING_CONTROL: &EnumTable = &[(0, "one timer"), (1, "two timers")];

pub const DEFAULT_LOAD_STATE: &EnumTable = &[(0, "off"), (1, "on")];

pub const BATTERY_MANAGEMENT_MODE: &EnumTable = &[(0, "voltage compensation"), (1, "SOC")];

// Multi-bit status fields. The status page reports the bare codes, these
// tables translate them for display.

pub const BATTERY_VOLTAGE_STATUS: &EnumTable = &[
    (0, "normal"),
    (1, "overvolt"),
    (2, "undervolt"),
    (3, "low volt disconnect"),
    (4, "fault"),
];

pub const BATTERY_TEMPERATURE_STATUS: &EnumTable =
    &[(0, "normal"), (1, "over temp"), (2, "low temp")];

pub const CHARGE_INPUT_VOLTAGE_STATUS: &EnumTable = &[
    (0, "normal"),
    (1, "no power connected"),
    (2, "higher volt input"),
    (3, "input volt error"),
];

pub const CHARGE_STATUS: &EnumTable = &[
    (0, "not charging"),
    (1, "float"),
    (2, "boost"),
    (3, "equalization"),
];

pub const DISCHARGE_INPUT_VOLTAGE_STATUS: &EnumTable =
    &[(0, "normal"), (1, "low"), (2, "high"), (3, "no access")];

pub const DISCHARGE_OUTPUT_POWER: &EnumTable = &[
    (0, "light load"),
    (1, "moderate"),
    (2, "rated"),
    (3, "overload"),
];

/// Find the label of `raw` in `table`.
#[must_use]
pub fn lookup(table: &EnumTable, raw: Word) -> Option<&'static str> {
    table
        .iter()
        .find_map(|(code, label)| (*code == raw).then_some(*label))
}

/// The table that labels the status field `name`, if any.
#[must_use]
pub fn status_table(name: &str) -> Option<&'static EnumTable> {
    Some(match name {
        "status_battery_voltage" => BATTERY_VOLTAGE_STATUS,
        "status_battery_temperature" => BATTERY_TEMPERATURE_STATUS,
        "status_charge_input_voltage" => CHARGE_INPUT_VOLTAGE_STATUS,
        "status_charge_status" => CHARGE_STATUS,
        "status_discharge_input_voltage" => DISCHARGE_INPUT_VOLTAGE_STATUS,
        "status_discharge_output_power" => DISCHARGE_OUTPUT_POWER,
        _ => return None,
    })
}

/// Labels of the status fields in `reading` whose code is known.
pub fn status_labels(
    reading: &Reading,
) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
    reading.iter().filter_map(|(name, value)| {
        let table = status_table(name)?;
        let raw = Word::try_from(value.as_i64()?).ok()?;
        Some((name, lookup(table, raw)?))
    })
}
