// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Register tables of the EPEVER Tracer A/B series.
//!
//! Addresses, widths and scaling follow the published controller protocol.
//! Gaps inside a range (e.g. `0x3108..=0x310B`) are read but not decoded.

use std::fmt;

use super::{Field, RegisterMap};
use crate::{
    codec::{labels, Rule, CENTI},
    frame::{Address, AddressSpace, Quantity, Word},
};

const VOLT: Rule = Rule::Signed16(CENTI);
const AMPERE: Rule = Rule::Signed16(CENTI);
const WATT: Rule = Rule::Composite32(CENTI);
const KWH: Rule = Rule::Composite32(CENTI);
const CELSIUS: Rule = Rule::Signed16(CENTI);
const PERCENT: Rule = Rule::Raw;

const fn input(
    key: &'static str,
    address: Address,
    count: Quantity,
    fields: &'static [Field],
) -> RegisterMap {
    RegisterMap {
        key,
        space: AddressSpace::Input,
        address,
        count,
        fields,
    }
}

const fn holding(
    key: &'static str,
    address: Address,
    count: Quantity,
    fields: &'static [Field],
) -> RegisterMap {
    RegisterMap {
        key,
        space: AddressSpace::Holding,
        address,
        count,
        fields,
    }
}

const fn coil(key: &'static str, address: Address, fields: &'static [Field]) -> RegisterMap {
    RegisterMap {
        key,
        space: AddressSpace::Coil,
        address,
        count: 1,
        fields,
    }
}

/// A status flag as (word index, mask, shift, name).
const fn flag(word: usize, mask: Word, shift: u8, name: &'static str) -> Field {
    Field::new(name, word, Rule::BitField { mask, shift })
}

///////////////////////////////////////////////////////////////////
/// Ratings
///////////////////////////////////////////////////////////////////
const RATED_FIELDS: &[Field] = &[
    Field::new("pv_rated_voltage", 0, VOLT),
    Field::new("pv_rated_current", 1, AMPERE),
    Field::new("pv_rated_power", 2, WATT),
    Field::new("battery_rated_voltage", 4, VOLT),
    Field::new("battery_rated_current", 5, AMPERE),
    Field::new("battery_rated_power", 6, WATT),
    Field::new("charging_mode", 8, Rule::Enum(labels::CHARGING_MODE)),
];

const LOAD_RATED_FIELDS: &[Field] = &[Field::new("rated_load_current", 0, AMPERE)];

pub const RATINGS: &[RegisterMap] = &[
    input("ratings", 0x3000, 9, RATED_FIELDS),
    input("load_ratings", 0x300E, 1, LOAD_RATED_FIELDS),
];

///////////////////////////////////////////////////////////////////
/// Live data
///////////////////////////////////////////////////////////////////
const REAL_TIME_FIELDS: &[Field] = &[
    Field::new("charge_input_voltage", 0, VOLT),
    Field::new("charge_input_current", 1, AMPERE),
    Field::new("charge_input_power", 2, WATT),
    Field::new("charge_output_voltage", 4, VOLT),
    Field::new("charge_output_current", 5, AMPERE),
    Field::new("charge_output_power", 6, WATT),
    Field::new("discharge_output_voltage", 12, VOLT),
    Field::new("discharge_output_current", 13, AMPERE),
    Field::new("discharge_output_power", 14, WATT),
    Field::new("battery_temperature", 16, Rule::Calculated),
    Field::new("device_temperature", 17, Rule::Calculated),
    Field::new("power_component_temperature", 18, Rule::Calculated),
];

const BATTERY_STATE_FIELDS: &[Field] = &[
    Field::new("battery_soc", 0, PERCENT),
    Field::new("remote_battery_temperature", 1, Rule::Calculated),
];

const BATTERY_REAL_RATING_FIELDS: &[Field] =
    &[Field::new("battery_real_rated_voltage", 0, VOLT)];

pub const LIVE_DATA: &[RegisterMap] = &[
    input("live_data", 0x3100, 19, REAL_TIME_FIELDS),
    input("battery_state", 0x311A, 2, BATTERY_STATE_FIELDS),
    input("battery_real_rating", 0x311D, 1, BATTERY_REAL_RATING_FIELDS),
];

///////////////////////////////////////////////////////////////////
/// Status
///////////////////////////////////////////////////////////////////
const STATUS_FIELDS: &[Field] = &[
    // battery
    flag(0, 0x0F, 0, "status_battery_voltage"),
    flag(0, 0x0F, 4, "status_battery_temperature"),
    flag(0, 1, 8, "status_battery_inner_resistance"),
    flag(0, 1, 15, "status_battery_rated_voltage_identification"),
    // charging equipment
    flag(1, 3, 14, "status_charge_input_voltage"),
    flag(1, 1, 13, "status_charge_mosfet_short"),
    flag(1, 1, 12, "status_charge_anti_reverse_mosfet_short_in_charging"),
    flag(1, 1, 11, "status_charge_anti_reverse_mosfet_short"),
    flag(1, 1, 10, "status_charge_input_over_current"),
    flag(1, 1, 9, "status_charge_load_over_current"),
    flag(1, 1, 8, "status_charge_load_short"),
    flag(1, 1, 7, "status_charge_load_mosfet_short"),
    flag(1, 1, 4, "status_charge_pv_input_short"),
    flag(1, 3, 2, "status_charge_status"),
    flag(1, 1, 1, "status_charge_fault"),
    flag(1, 1, 0, "status_charge_running"),
    // discharging equipment
    flag(2, 3, 14, "status_discharge_input_voltage"),
    flag(2, 3, 12, "status_discharge_output_power"),
    flag(2, 1, 11, "status_discharge_short_circuit"),
    flag(2, 1, 10, "status_discharge_unable_to_discharge"),
    flag(2, 1, 9, "status_discharge_unable_to_stop"),
    flag(2, 1, 8, "status_discharge_output_voltage_abnormal"),
    flag(2, 1, 7, "status_discharge_input_over_voltage"),
    flag(2, 1, 6, "status_discharge_high_voltage_side_short"),
    flag(2, 1, 5, "status_discharge_boost_over_voltage"),
    flag(2, 1, 4, "status_discharge_output_over_voltage"),
    flag(2, 1, 1, "status_discharge_fault"),
    flag(2, 1, 0, "status_discharge_running"),
];

pub const STATUS: &[RegisterMap] = &[input("status", 0x3200, 3, STATUS_FIELDS)];

///////////////////////////////////////////////////////////////////
/// Statistics
///////////////////////////////////////////////////////////////////
const STATISTICS_FIELDS: &[Field] = &[
    Field::new("max_pv_voltage_today", 0, VOLT),
    Field::new("min_pv_voltage_today", 1, VOLT),
    Field::new("max_battery_voltage_today", 2, VOLT),
    Field::new("min_battery_voltage_today", 3, VOLT),
    Field::new("consumed_energy_today", 4, KWH),
    Field::new("consumed_energy_month", 6, KWH),
    Field::new("consumed_energy_year", 8, KWH),
    Field::new("consumed_energy_total", 10, KWH),
    Field::new("generated_energy_today", 12, KWH),
    Field::new("generated_energy_month", 14, KWH),
    Field::new("generated_energy_year", 16, KWH),
    Field::new("generated_energy_total", 18, KWH),
    Field::new("co2_reduction", 20, Rule::Composite32(CENTI)),
    Field::new("battery_voltage", 26, VOLT),
    Field::new("battery_current", 27, Rule::Composite32(CENTI)),
    Field::new("battery_temperature_average", 29, CELSIUS),
    Field::new("ambient_temperature", 30, CELSIUS),
];

pub const STATISTICS: &[RegisterMap] = &[input("statistics", 0x3300, 31, STATISTICS_FIELDS)];

///////////////////////////////////////////////////////////////////
/// Settings
///////////////////////////////////////////////////////////////////
const BATTERY_SETTINGS_FIELDS: &[Field] = &[
    Field::new("battery_type", 0, Rule::Enum(labels::BATTERY_TYPE)),
    Field::new("battery_capacity", 1, Rule::Raw),
    Field::new("temperature_compensation_coefficient", 2, Rule::Signed16(CENTI)),
    Field::new("high_voltage_disconnect", 3, VOLT),
    Field::new("charging_limit_voltage", 4, VOLT),
    Field::new("over_voltage_reconnect", 5, VOLT),
    Field::new("equalization_voltage", 6, VOLT),
    Field::new("boost_voltage", 7, VOLT),
    Field::new("float_voltage", 8, VOLT),
    Field::new("boost_reconnect_voltage", 9, VOLT),
    Field::new("low_voltage_reconnect", 10, VOLT),
    Field::new("under_voltage_recover", 11, VOLT),
    Field::new("under_voltage_warning", 12, VOLT),
    Field::new("low_voltage_disconnect", 13, VOLT),
    Field::new("discharging_limit_voltage", 14, VOLT),
];

const CLOCK_SETTINGS_FIELDS: &[Field] = &[
    Field::new("real_time_clock", 0, Rule::PackedDateTime),
    Field::new("equalization_charging_cycle", 3, Rule::Raw),
    Field::new("battery_temperature_upper_limit", 4, CELSIUS),
    Field::new("battery_temperature_lower_limit", 5, CELSIUS),
    Field::new("device_temperature_upper_limit", 6, CELSIUS),
    Field::new("device_temperature_upper_limit_recover", 7, CELSIUS),
    Field::new("power_component_temperature_upper_limit", 8, CELSIUS),
    Field::new("power_component_temperature_upper_limit_recover", 9, CELSIUS),
    Field::new("line_impedance", 10, Rule::Signed16(CENTI)),
    Field::new("night_time_threshold_voltage", 11, VOLT),
    Field::new("light_signal_startup_delay", 12, Rule::Raw),
    Field::new("day_time_threshold_voltage", 13, VOLT),
    Field::new("light_signal_turn_off_delay", 14, Rule::Raw),
];

const LOAD_CONTROL_FIELDS: &[Field] = &[
    Field::new("load_controlling_mode", 0, Rule::Enum(labels::LOAD_CONTROLLING_MODE)),
    flag(1, 0xFF, 8, "working_time_length_1_hour"),
    flag(1, 0xFF, 0, "working_time_length_1_minute"),
    flag(2, 0xFF, 8, "working_time_length_2_hour"),
    flag(2, 0xFF, 0, "working_time_length_2_minute"),
];

const LOAD_TIMER_FIELDS: &[Field] = &[
    Field::new("turn_on_timing_1", 0, Rule::PackedTime),
    Field::new("turn_off_timing_1", 3, Rule::PackedTime),
    Field::new("turn_on_timing_2", 6, Rule::PackedTime),
    Field::new("turn_off_timing_2", 9, Rule::PackedTime),
];

const BACKLIGHT_FIELDS: &[Field] = &[Field::new("backlight_time", 0, Rule::Raw)];

const NIGHT_LENGTH_FIELDS: &[Field] = &[
    flag(0, 0xFF, 8, "length_of_night_hour"),
    flag(0, 0xFF, 0, "length_of_night_minute"),
];

const CHARGING_SETTINGS_FIELDS: &[Field] = &[
    Field::new(
        "battery_rated_voltage_code",
        0,
        Rule::Enum(labels::BATTERY_RATED_VOLTAGE_CODE),
    ),
    Field::new("load_timing_control", 2, Rule::Enum(labels::LOAD_TIMING_CONTROL)),
    Field::new("default_load_state", 3, Rule::Enum(labels::DEFAULT_LOAD_STATE)),
    Field::new("equalize_duration", 4, Rule::Raw),
    Field::new("boost_duration", 5, Rule::Raw),
    Field::new("discharging_percentage", 6, PERCENT),
    Field::new("charging_percentage", 7, PERCENT),
];

const MANAGEMENT_MODE_FIELDS: &[Field] = &[Field::new(
    "battery_management_mode",
    0,
    Rule::Enum(labels::BATTERY_MANAGEMENT_MODE),
)];

pub const SETTINGS: &[RegisterMap] = &[
    holding("battery_settings", 0x9000, 15, BATTERY_SETTINGS_FIELDS),
    holding("clock_settings", 0x9013, 15, CLOCK_SETTINGS_FIELDS),
    holding("load_control", 0x903D, 3, LOAD_CONTROL_FIELDS),
    holding("load_timers", 0x9042, 12, LOAD_TIMER_FIELDS),
    holding("backlight", 0x9063, 1, BACKLIGHT_FIELDS),
    holding("night_length", 0x9065, 1, NIGHT_LENGTH_FIELDS),
    holding("charging_settings", 0x9067, 8, CHARGING_SETTINGS_FIELDS),
    holding("management_mode", 0x9070, 1, MANAGEMENT_MODE_FIELDS),
];

///////////////////////////////////////////////////////////////////
/// Coils
///////////////////////////////////////////////////////////////////
const MANUAL_LOAD_CONTROL_FIELDS: &[Field] = &[Field::new("manual_load_control", 0, Rule::Raw)];
const DEFAULT_LOAD_CONTROL_FIELDS: &[Field] = &[Field::new("default_load_control", 0, Rule::Raw)];
const LOAD_TEST_MODE_FIELDS: &[Field] = &[Field::new("load_test_mode", 0, Rule::Raw)];
// Published key, kept as is for existing consumers.
const FORCE_LOAD_FIELDS: &[Field] = &[Field::new("force_loa", 0, Rule::Raw)];

pub const COILS: &[RegisterMap] = &[
    coil("coil_0002", 0x0002, MANUAL_LOAD_CONTROL_FIELDS),
    coil("coil_0003", 0x0003, DEFAULT_LOAD_CONTROL_FIELDS),
    coil("coil_0005", 0x0005, LOAD_TEST_MODE_FIELDS),
    coil("coil_0006", 0x0006, FORCE_LOAD_FIELDS),
];

/// The logical groups of register ranges, in polling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Ratings,
    LiveData,
    Status,
    Statistics,
    Settings,
    Coils,
}

impl Page {
    /// All pages in the order they are polled.
    pub const ALL: [Page; 6] = [
        Page::Ratings,
        Page::LiveData,
        Page::Status,
        Page::Statistics,
        Page::Settings,
        Page::Coils,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ratings => "ratings",
            Self::LiveData => "live_data",
            Self::Status => "status",
            Self::Statistics => "statistics",
            Self::Settings => "settings",
            Self::Coils => "coils",
        }
    }

    /// The register ranges making up the page.
    #[must_use]
    pub const fn maps(self) -> &'static [RegisterMap] {
        match self {
            Self::Ratings => RATINGS,
            Self::LiveData => LIVE_DATA,
            Self::Status => STATUS,
            Self::Statistics => STATISTICS,
            Self::Settings => SETTINGS,
            Self::Coils => COILS,
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Every register range of every page, in polling order.
pub fn all_maps() -> impl Iterator<Item = &'static RegisterMap> {
    Page::ALL.into_iter().flat_map(Page::maps)
}

/// Names of every field of the catalog.
pub fn field_names() -> impl Iterator<Item = &'static str> {
    all_maps().flat_map(|map| map.fields.iter().map(|field| field.name))
}
