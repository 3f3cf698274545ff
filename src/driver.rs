// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic polling of a controller on behalf of a host application.

use std::{collections::BTreeMap, fmt, thread};

use chrono::Utc;
use log::{debug, error, info, warn};
use serde::{Serialize, Serializer};

use crate::{
    client::{Connect, DeviceReader},
    config::{DriverConfig, UnitSystem},
    device::DeviceInfo,
    error::Result,
    frame::{Reading, Value},
    register::catalog::Page,
    retry::RetryPolicy,
};

/// Everything the driver can ask the device for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Info,
    Ratings,
    LiveData,
    Status,
    Statistics,
    Settings,
    Coils,
    All,
}

impl Operation {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Ratings => "ratings",
            Self::LiveData => "live_data",
            Self::Status => "status",
            Self::Statistics => "statistics",
            Self::Settings => "settings",
            Self::Coils => "coils",
            Self::All => "all",
        }
    }

    /// The register page read by this operation, if it reads a single one.
    #[must_use]
    pub const fn page(self) -> Option<Page> {
        match self {
            Self::Ratings => Some(Page::Ratings),
            Self::LiveData => Some(Page::LiveData),
            Self::Status => Some(Page::Status),
            Self::Statistics => Some(Page::Statistics),
            Self::Settings => Some(Page::Settings),
            Self::Coils => Some(Page::Coils),
            Self::Info | Self::All => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of a successful [`Operation`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    Info(DeviceInfo),
    Reading(Reading),
}

impl Outcome {
    #[must_use]
    pub fn into_reading(self) -> Option<Reading> {
        match self {
            Self::Reading(reading) => Some(reading),
            Self::Info(_) => None,
        }
    }
}

fn serialize_unit_system<S: Serializer>(
    unit_system: &UnitSystem,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u8(unit_system.code())
}

/// One observation handed to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Packet {
    /// Unix time in whole seconds, rounded to the nearest second.
    #[serde(rename = "dateTime")]
    pub date_time: i64,
    #[serde(rename = "usUnits", serialize_with = "serialize_unit_system")]
    pub us_units: UnitSystem,
    /// Values keyed by host field name.
    #[serde(flatten)]
    pub values: BTreeMap<String, Value>,
}

impl Packet {
    /// Rename the fields of `reading` according to `sensor_map`.
    ///
    /// Fields without a host name are dropped.
    #[must_use]
    pub fn from_reading(
        reading: &Reading,
        sensor_map: &BTreeMap<String, String>,
        date_time: i64,
        us_units: UnitSystem,
    ) -> Self {
        let values = sensor_map
            .iter()
            .filter_map(|(host, hardware)| {
                reading
                    .get(hardware)
                    .map(|value| (host.clone(), value.clone()))
            })
            .collect();
        Self {
            date_time,
            us_units,
            values,
        }
    }
}

/// The current time as rounded Unix seconds.
#[must_use]
pub fn now_rounded() -> i64 {
    (Utc::now().timestamp_millis() + 500).div_euclid(1000)
}

/// Consumer of packets.
pub trait Sink {
    fn accept(&mut self, packet: Packet);
}

impl Sink for Vec<Packet> {
    fn accept(&mut self, packet: Packet) {
        self.push(packet);
    }
}

/// Polls one controller and turns its readings into [`Packet`]s.
pub struct Driver {
    config: DriverConfig,
    connector: Box<dyn Connect>,
    reader: DeviceReader,
    retry: RetryPolicy,
    sensor_map: BTreeMap<String, String>,
    info: Option<DeviceInfo>,
}

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("config", &self.config)
            .field("reader", &self.reader)
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

fn attempt(
    reader: &mut DeviceReader,
    connector: &dyn Connect,
    operation: Operation,
) -> Result<Outcome> {
    if !reader.is_connected() {
        info!("reconnecting");
        reader.reconnect(connector.connect()?);
    }
    let outcome = match operation.page() {
        Some(page) => Outcome::Reading(reader.read(page)?),
        None if operation == Operation::Info => Outcome::Info(reader.read_info()?),
        None => Outcome::Reading(reader.read_all()?),
    };
    Ok(outcome)
}

impl Driver {
    /// Connect to the device and query its identification.
    ///
    /// A failing identification is logged, polling works without it.
    pub fn new(config: DriverConfig, connector: Box<dyn Connect>) -> Result<Self> {
        config.validate()?;
        info!("driver version is {}", env!("CARGO_PKG_VERSION"));
        info!(
            "using port {}, address {}, baud rate {}",
            config.port, config.address, config.baud_rate
        );
        info!("poll interval is {}s", config.poll_interval);
        let sensor_map = config.sensor_map();
        debug!("sensor map is {sensor_map:?}");
        let reader = DeviceReader::connect(connector.as_ref())?;
        let mut driver = Self {
            retry: config.retry_policy(),
            config,
            connector,
            reader,
            sensor_map,
            info: None,
        };
        match driver.reader.read_info() {
            Ok(info) => {
                info!("device is {info}");
                driver.info = Some(info);
            }
            Err(err) => warn!("reading device identification failed: {err}"),
        }
        Ok(driver)
    }

    #[must_use]
    pub fn hardware_name(&self) -> &str {
        &self.config.model
    }

    #[must_use]
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Identification obtained while connecting.
    #[must_use]
    pub fn device_info(&self) -> Option<&DeviceInfo> {
        self.info.as_ref()
    }

    #[must_use]
    pub fn sensor_map(&self) -> &BTreeMap<String, String> {
        &self.sensor_map
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.reader.is_connected()
    }

    /// Execute `operation`, retrying according to the configured policy.
    ///
    /// A lost connection is reopened before the next attempt.
    pub fn run(&mut self, operation: Operation) -> Result<Outcome> {
        let Self {
            reader,
            connector,
            retry,
            ..
        } = self;
        retry.retry(operation.name(), |_| {
            attempt(reader, connector.as_ref(), operation)
        })
    }

    /// Read every page and build a packet of the mapped fields.
    pub fn poll(&mut self) -> Result<Packet> {
        let reading = self
            .run(Operation::All)?
            .into_reading()
            .unwrap_or_default();
        debug!("raw reading: {reading:?}");
        for map in Page::ALL.iter().flat_map(|page| page.maps()) {
            if let Some(diagnostic) = reading.get(map.key) {
                warn!("{}: {diagnostic}", map.key);
            }
        }
        Ok(Packet::from_reading(
            &reading,
            &self.sensor_map,
            now_rounded(),
            self.config.unit_system,
        ))
    }

    /// Endless sequence of poll results, `poll_interval` apart.
    pub fn packets(&mut self) -> Packets<'_> {
        Packets {
            driver: self,
            started: false,
        }
    }

    /// Forward packets to `sink`, logging failed cycles.
    ///
    /// Runs forever unless `cycles` is given.
    pub fn pump(&mut self, sink: &mut dyn Sink, cycles: Option<usize>) {
        let packets = self.packets();
        let packets: Box<dyn Iterator<Item = Result<Packet>>> = match cycles {
            Some(cycles) => Box::new(packets.take(cycles)),
            None => Box::new(packets),
        };
        for packet in packets {
            match packet {
                Ok(packet) => sink.accept(packet),
                Err(err) => error!("poll failed: {err}"),
            }
        }
    }

    /// Release the connection.
    pub fn close(&mut self) -> Result<()> {
        self.reader.close()
    }
}

/// Iterator returned by [`Driver::packets`].
#[derive(Debug)]
pub struct Packets<'a> {
    driver: &'a mut Driver,
    started: bool,
}

impl Iterator for Packets<'_> {
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.started {
            thread::sleep(self.driver.config.poll_interval());
        }
        self.started = true;
        Some(self.driver.poll())
    }
}
