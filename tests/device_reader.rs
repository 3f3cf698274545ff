// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

mod mock;

use std::io;

use chrono::NaiveDate;
use tracer_modbus::{
    client::{DeviceReader, State, READ_FAILED},
    register::catalog::{self, Page},
    AddressSpace, Error, Exception, Value,
};

use crate::mock::{charging_device, DeviceConnector};

fn connect(device: &mock::SharedDevice) -> DeviceReader {
    DeviceReader::connect(&DeviceConnector(device.clone())).unwrap()
}

#[test]
fn live_data() {
    let device = charging_device();
    let mut reader = connect(&device);
    let reading = reader.read_live_data().unwrap();
    assert_eq!(reading.get("charge_input_voltage"), Some(&Value::Float(12.0)));
    assert_eq!(reading.get("charge_input_current"), Some(&Value::Float(0.5)));
    assert_eq!(reading.get("charge_input_power"), Some(&Value::Float(0.0)));
    assert_eq!(reading.get("charge_output_voltage"), Some(&Value::Float(24.0)));
    assert_eq!(reading.get("battery_temperature"), Some(&Value::Float(25.0)));
    assert_eq!(reading.get("battery_soc"), Some(&Value::Int(80)));
    assert_eq!(
        device.borrow().requests,
        [
            (AddressSpace::Input, 0x3100, 19),
            (AddressSpace::Input, 0x311A, 2),
            (AddressSpace::Input, 0x311D, 1),
        ]
    );
}

#[test]
fn charging_status_flags() {
    let device = charging_device();
    device
        .borrow_mut()
        .set(AddressSpace::Input, 0x3200, &[0x0000, 0x0001, 0x0000]);
    let mut reader = connect(&device);
    let reading = reader.read_status().unwrap();
    assert_eq!(reading.len(), 28);
    assert_eq!(reading.get("status_charge_running"), Some(&Value::Int(1)));
    for (name, value) in reading.iter() {
        if name.starts_with("status_charge_") && name != "status_charge_running" {
            assert_eq!(value, &Value::Int(0), "{name}");
        }
    }
}

#[test]
fn two_bit_status_fields() {
    let device = charging_device();
    // boost charging, input voltage error, output power overload
    device
        .borrow_mut()
        .set(AddressSpace::Input, 0x3200, &[0x0002, 0x8008, 0x3000]);
    let mut reader = connect(&device);
    let reading = reader.read_status().unwrap();
    assert_eq!(reading.get("status_battery_voltage"), Some(&Value::Int(2)));
    assert_eq!(reading.get("status_charge_status"), Some(&Value::Int(2)));
    assert_eq!(reading.get("status_charge_input_voltage"), Some(&Value::Int(2)));
    assert_eq!(reading.get("status_discharge_output_power"), Some(&Value::Int(3)));
    assert_eq!(reading.get("status_discharge_running"), Some(&Value::Int(0)));
}

#[test]
fn exception_only_affects_its_page() {
    let device = charging_device();
    device
        .borrow_mut()
        .fail_with(AddressSpace::Input, 0x3300, Exception::ILLEGAL_DATA_ADDRESS);
    let mut reader = connect(&device);
    let reading = reader.read_all().unwrap();
    assert_eq!(
        reading.get("statistics").and_then(Value::as_str),
        Some("Illegal data address")
    );
    assert!(!reading.contains("max_pv_voltage_today"));
    assert_eq!(reading.get("charge_input_voltage"), Some(&Value::Float(12.0)));
    assert!(reading.contains("status_charge_running"));
    assert!(reading.contains("battery_type"));
    assert!(reading.contains("force_loa"));
}

#[test]
fn settings_page() {
    let device = charging_device();
    {
        let mut device = device.borrow_mut();
        device.set(AddressSpace::Holding, 0x9000, &[1, 200, 300, 1600]);
        // turn on 19:04:05, turn off 06:30:00
        device.set(AddressSpace::Holding, 0x9042, &[5, 4, 19, 0, 30, 6]);
        device.set(AddressSpace::Holding, 0x903D, &[2, 0x0A1E, 0x0000]);
    }
    let mut reader = connect(&device);
    let reading = reader.read_settings().unwrap();
    assert_eq!(reading.get("battery_type"), Some(&Value::Label("sealed")));
    assert_eq!(reading.get("battery_capacity"), Some(&Value::Int(200)));
    assert_eq!(reading.get("high_voltage_disconnect"), Some(&Value::Float(16.0)));
    assert_eq!(
        reading.get("real_time_clock"),
        Some(&Value::DateTime(
            NaiveDate::from_ymd_opt(2019, 9, 15)
                .unwrap()
                .and_hms_opt(14, 30, 0)
                .unwrap()
        ))
    );
    assert_eq!(
        reading.get("turn_on_timing_1").map(ToString::to_string).as_deref(),
        Some("19:04:05")
    );
    assert_eq!(
        reading.get("turn_off_timing_1").map(ToString::to_string).as_deref(),
        Some("06:30:00")
    );
    assert_eq!(reading.get("working_time_length_1_hour"), Some(&Value::Int(10)));
    assert_eq!(reading.get("working_time_length_1_minute"), Some(&Value::Int(30)));
}

#[test]
fn invalid_clock_yields_diagnostic() {
    let device = charging_device();
    // February 30th
    device
        .borrow_mut()
        .set(AddressSpace::Holding, 0x9013, &[0x0000, 0x0C1E, 0x0213]);
    let mut reader = connect(&device);
    let reading = reader.read_settings().unwrap();
    assert_eq!(
        reading.get("clock_settings").and_then(Value::as_str),
        Some(READ_FAILED)
    );
    assert!(!reading.contains("real_time_clock"));
    assert!(!reading.contains("line_impedance"));
    assert!(reading.contains("battery_type"));
}

#[test]
fn invalid_load_timer_yields_diagnostic() {
    let device = charging_device();
    // turn on at 24:00:00
    device
        .borrow_mut()
        .set(AddressSpace::Holding, 0x9042, &[0, 0, 24, 0, 30, 6]);
    let mut reader = connect(&device);
    let reading = reader.read_settings().unwrap();
    assert_eq!(
        reading.get("load_timers").and_then(Value::as_str),
        Some(READ_FAILED)
    );
    assert!(reading
        .iter()
        .all(|(name, _)| !name.starts_with("turn_on_timing_")
            && !name.starts_with("turn_off_timing_")));
    assert!(reading.contains("real_time_clock"));
    assert!(reader.is_connected());
}

#[test]
fn timeout_only_affects_its_range() {
    let device = charging_device();
    device
        .borrow_mut()
        .failures
        .push_back(io::ErrorKind::TimedOut);
    let mut reader = connect(&device);
    let reading = reader.read_all().unwrap();
    assert_eq!(
        reading.get("ratings").and_then(Value::as_str),
        Some("simulated failure")
    );
    assert!(!reading.contains("pv_rated_voltage"));
    assert_eq!(reading.get("charge_input_voltage"), Some(&Value::Float(12.0)));
    assert!(reading.contains("battery_type"));
    assert!(reading.contains("force_loa"));
    let maps = Page::ALL.into_iter().flat_map(Page::maps).count();
    assert_eq!(device.borrow().requests.len(), maps);
    assert!(reader.is_connected());
}

#[test]
fn absent_remote_temperature() {
    let device = charging_device();
    device
        .borrow_mut()
        .set(AddressSpace::Input, 0x311B, &[(-9990_i16) as u16]);
    let mut reader = connect(&device);
    let reading = reader.read_live_data().unwrap();
    assert_eq!(reading.get("remote_battery_temperature"), Some(&Value::Absent));
}

#[test]
fn coils() {
    let device = charging_device();
    device.borrow_mut().set(AddressSpace::Coil, 2, &[1]);
    let mut reader = connect(&device);
    let reading = reader.read_coils().unwrap();
    assert_eq!(reading.get("manual_load_control"), Some(&Value::Int(1)));
    assert_eq!(reading.get("default_load_control"), Some(&Value::Int(0)));
    assert_eq!(reading.get("force_loa"), Some(&Value::Int(0)));
}

#[test]
fn device_info() {
    let device = charging_device();
    let mut reader = connect(&device);
    let info = reader.read_info().unwrap();
    assert_eq!(info.product, "Tracer3210A");
}

#[test]
fn every_catalog_field_is_read() {
    let device = charging_device();
    let mut reader = connect(&device);
    let reading = reader.read_all().unwrap();
    let expected: Vec<_> = Page::ALL
        .into_iter()
        .flat_map(Page::maps)
        .filter(|map| map.key != "clock_settings" || reading.contains("real_time_clock"))
        .flat_map(|map| map.field_names())
        .collect();
    assert_eq!(expected.len(), catalog::field_names().count());
    for name in expected {
        assert!(reading.contains(name), "{name}");
    }
}

#[test]
fn closed_reader_rejects_reads() {
    let device = charging_device();
    let mut reader = connect(&device);
    reader.close().unwrap();
    assert_eq!(reader.state(), State::Disconnected);
    assert_eq!(device.borrow().closes, 1);
    assert!(matches!(reader.read_status(), Err(Error::NotConnected)));
    // closing twice is fine
    reader.close().unwrap();
    assert_eq!(device.borrow().closes, 1);
}

#[test]
fn lost_connection() {
    let device = charging_device();
    device
        .borrow_mut()
        .failures
        .push_back(io::ErrorKind::BrokenPipe);
    let mut reader = connect(&device);
    assert!(matches!(reader.read_live_data(), Err(Error::Transport(_))));
    assert!(!reader.is_connected());
}
