// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reading register pages from a charge controller.

use std::{fmt::Debug, io};

use log::{debug, warn};

use crate::{
    device::DeviceInfo,
    error::{Error, Result, TransportResult},
    frame::{Address, AddressSpace, Quantity, Reading, Value, Word},
    register::{catalog::Page, RegisterMap},
};

#[cfg(feature = "rtu")]
pub mod rtu;

/// Diagnostic value of a page whose response could not be decoded.
pub const READ_FAILED: &str = "read failed";

/// Transport independent synchronous access to the device.
///
/// Implementations own the connection exclusively and block until a
/// response arrived or the configured timeout elapsed.
pub trait Transport: Debug {
    /// Read `cnt` consecutive items starting at `addr`.
    ///
    /// Coils are reported as words `0` or `1`.
    fn read_registers(
        &mut self,
        space: AddressSpace,
        addr: Address,
        cnt: Quantity,
    ) -> TransportResult<Vec<Word>>;

    /// Query vendor, product and version of the device.
    fn read_device_info(&mut self) -> TransportResult<DeviceInfo>;

    /// Release the connection.
    fn close(&mut self) -> io::Result<()>;
}

/// Trait for (re-)creating transports on demand.
pub trait Connect {
    /// Open a new connection to the device.
    fn connect(&self) -> Result<Box<dyn Transport>>;
}

/// Read a single register range and decode its fields.
///
/// Page reads are all or nothing: if the device answers with an exception
/// or the response cannot be decoded, the returned reading holds a single
/// diagnostic entry under the key of `map`. Transport errors are passed on.
pub fn read_page(transport: &mut dyn Transport, map: &RegisterMap) -> Result<Reading> {
    let mut reading = Reading::new();
    let words = match transport.read_registers(map.space, map.address, map.count)? {
        Ok(words) => words,
        Err(exception) => {
            warn!(
                "{}: function 0x{:02X} at 0x{:04X} failed: {exception}",
                map.key,
                map.space.function_code(),
                map.address
            );
            reading.insert(map.key, Value::Text(exception.to_string()));
            return Ok(reading);
        }
    };
    if words.len() < usize::from(map.count) {
        warn!(
            "{}: expected {} words at 0x{:04X}, got {}",
            map.key,
            map.count,
            map.address,
            words.len()
        );
        reading.insert(map.key, Value::Text(READ_FAILED.to_owned()));
        return Ok(reading);
    }
    match decode_page(map, &words) {
        Ok(decoded) => Ok(decoded),
        Err(err) => {
            warn!("{}: {err}", map.key);
            reading.insert(map.key, Value::Text(READ_FAILED.to_owned()));
            Ok(reading)
        }
    }
}

fn decode_page(map: &RegisterMap, words: &[Word]) -> Result<Reading> {
    map.fields
        .iter()
        .map(|field| {
            let value = field.rule.decode(&words[field.offset..field.end()])?;
            Ok((field.name, value))
        })
        .collect()
}

/// Read several register ranges in order and merge the results.
///
/// A failing range only affects its own entries: timeouts and malformed
/// responses become a diagnostic under the key of the range and the
/// remaining ranges are still read. Fatal transport errors are passed on.
pub fn read_pages(transport: &mut dyn Transport, maps: &[RegisterMap]) -> Result<Reading> {
    let mut reading = Reading::new();
    for map in maps {
        match read_page(transport, map) {
            Ok(page) => reading.merge(page),
            Err(err) if !err.is_fatal() => {
                warn!("{}: {err}", map.key);
                reading.insert(map.key, Value::Text(err.to_string()));
            }
            Err(err) => return Err(err),
        }
    }
    Ok(reading)
}

/// Connection state of a [`DeviceReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Disconnected,
    Connected,
}

/// Handle to one charge controller.
///
/// Owns the transport for its whole lifetime. The handle becomes
/// disconnected when closed or when the transport fails fatally; it never
/// reconnects by itself.
#[derive(Debug)]
pub struct DeviceReader {
    transport: Option<Box<dyn Transport>>,
}

impl From<Box<dyn Transport>> for DeviceReader {
    fn from(transport: Box<dyn Transport>) -> Self {
        Self {
            transport: Some(transport),
        }
    }
}

impl DeviceReader {
    /// A handle without a transport.
    #[must_use]
    pub fn disconnected() -> Self {
        Self { transport: None }
    }

    /// Open a connection through `connector`.
    pub fn connect(connector: &dyn Connect) -> Result<Self> {
        connector.connect().map(Self::from)
    }

    #[must_use]
    pub fn state(&self) -> State {
        if self.transport.is_some() {
            State::Connected
        } else {
            State::Disconnected
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == State::Connected
    }

    /// Replace the transport, closing the previous one.
    pub fn reconnect(&mut self, transport: Box<dyn Transport>) {
        if let Err(err) = self.close() {
            debug!("closing previous transport failed: {err}");
        }
        self.transport = Some(transport);
    }

    /// Close the connection.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut transport) = self.transport.take() {
            debug!("closing {transport:?}");
            transport.close()?;
        }
        Ok(())
    }

    fn with_transport<T>(
        &mut self,
        f: impl FnOnce(&mut dyn Transport) -> Result<T>,
    ) -> Result<T> {
        let transport = self.transport.as_deref_mut().ok_or(Error::NotConnected)?;
        let result = f(transport);
        if let Err(err) = &result {
            if err.is_fatal() {
                warn!("dropping connection after {err}");
                // The transport is unusable anyway, a failing close adds nothing.
                let _ = self.close();
            }
        }
        result
    }

    /// Read a single register range.
    pub fn read_page(&mut self, map: &RegisterMap) -> Result<Reading> {
        self.with_transport(|transport| read_page(transport, map))
    }

    /// Read the given register ranges and merge them.
    pub fn read_pages(&mut self, maps: &[RegisterMap]) -> Result<Reading> {
        self.with_transport(|transport| read_pages(transport, maps))
    }

    /// Read all register ranges of a logical page.
    pub fn read(&mut self, page: Page) -> Result<Reading> {
        self.read_pages(page.maps())
    }

    pub fn read_ratings(&mut self) -> Result<Reading> {
        self.read(Page::Ratings)
    }

    pub fn read_live_data(&mut self) -> Result<Reading> {
        self.read(Page::LiveData)
    }

    pub fn read_status(&mut self) -> Result<Reading> {
        self.read(Page::Status)
    }

    pub fn read_statistics(&mut self) -> Result<Reading> {
        self.read(Page::Statistics)
    }

    pub fn read_settings(&mut self) -> Result<Reading> {
        self.read(Page::Settings)
    }

    pub fn read_coils(&mut self) -> Result<Reading> {
        self.read(Page::Coils)
    }

    /// Read every page in polling order into one reading.
    pub fn read_all(&mut self) -> Result<Reading> {
        let mut reading = Reading::new();
        for page in Page::ALL {
            reading.merge(self.read(page)?);
        }
        Ok(reading)
    }

    /// Query the device identification.
    pub fn read_info(&mut self) -> Result<DeviceInfo> {
        self.with_transport(|transport| Ok(transport.read_device_info()??))
    }
}

impl Drop for DeviceReader {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!("closing transport failed: {err}");
        }
    }
}
