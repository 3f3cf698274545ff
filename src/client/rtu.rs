// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! RTU transport over a serial line

use std::{
    fmt,
    io::{self, Read, Write},
    time::Duration,
};

use bytes::BytesMut;
use log::{debug, info};
use tokio_modbus::{
    client::sync::{self, Reader as _},
    Slave,
};
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilder, StopBits};

use super::{Connect, Transport};
use crate::{
    codec::rtu::{self, SlaveId},
    device::{self, DeviceInfo},
    error::{Result, TransportResult},
    frame::{Address, AddressSpace, Exception, Quantity, Word},
};

/// Serial line settings of a controller.
///
/// The Tracer series talks 8N1 without flow control.
#[derive(Debug, Clone, PartialEq)]
pub struct RtuConnector {
    pub port: String,
    pub baud_rate: u32,
    pub address: u8,
    pub timeout: Duration,
}

impl RtuConnector {
    fn serial_port_builder(&self) -> SerialPortBuilder {
        tokio_serial::new(&self.port, self.baud_rate)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .data_bits(DataBits::Eight)
            .flow_control(FlowControl::None)
    }
}

impl Connect for RtuConnector {
    fn connect(&self) -> Result<Box<dyn Transport>> {
        RtuTransport::connect(self).map(|transport| Box::new(transport) as Box<dyn Transport>)
    }
}

/// A synchronous RTU client bound to one slave address.
pub struct RtuTransport {
    connector: RtuConnector,
    ctx: Option<sync::Context>,
}

impl fmt::Debug for RtuTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RtuTransport")
            .field("port", &self.connector.port)
            .field("connected", &self.ctx.is_some())
            .finish()
    }
}

impl RtuTransport {
    /// Open the serial port and bind to the slave address of `connector`.
    pub fn connect(connector: &RtuConnector) -> Result<Self> {
        let ctx = open_context(connector)?;
        info!(
            "connected to {} at {} baud, address {}",
            connector.port, connector.baud_rate, connector.address
        );
        Ok(Self {
            connector: connector.clone(),
            ctx: Some(ctx),
        })
    }

    fn identify(&self) -> TransportResult<DeviceInfo> {
        let mut port = self
            .connector
            .serial_port_builder()
            .timeout(self.connector.timeout)
            .open()
            .map_err(io::Error::from)?;
        read_device_identification(&mut port, self.connector.address)
    }

    fn context(&mut self) -> io::Result<&mut sync::Context> {
        self.ctx
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "port closed"))
    }
}

fn open_context(connector: &RtuConnector) -> io::Result<sync::Context> {
    let builder = connector.serial_port_builder();
    let mut ctx = sync::rtu::connect_slave(&builder, Slave(connector.address))?;
    ctx.set_timeout(Some(connector.timeout));
    Ok(ctx)
}

/// Run the identification exchange with `slave` over a raw serial line.
pub fn read_device_identification<S>(
    line: &mut S,
    slave: SlaveId,
) -> TransportResult<DeviceInfo>
where
    S: Read + Write + ?Sized,
{
    let mut pdu = vec![device::FUNCTION_CODE];
    pdu.extend_from_slice(&device::request_payload());
    line.write_all(&rtu::encode_request(slave, &pdu))?;
    line.flush()?;
    let mut buf = BytesMut::with_capacity(256);
    let mut chunk = [0; 64];
    loop {
        if let Some(response) = rtu::decode_device_id_response(slave, &mut buf)? {
            return match response {
                Ok(payload) => DeviceInfo::decode(&payload).map(Ok),
                Err(exception) => Ok(Err(exception)),
            };
        }
        let len = line.read(&mut chunk)?;
        if len == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "incomplete identification response",
            )
            .into());
        }
        buf.extend_from_slice(&chunk[..len]);
    }
}

fn map_tokio_result<T>(result: tokio_modbus::Result<T>) -> TransportResult<T> {
    match result {
        Ok(Ok(value)) => Ok(Ok(value)),
        Ok(Err(code)) => Ok(Err(Exception(code.into()))),
        Err(tokio_modbus::Error::Transport(err)) => Err(err.into()),
        // Malformed or mismatching responses
        Err(err) => Err(io::Error::new(io::ErrorKind::InvalidData, err.to_string()).into()),
    }
}

fn coils_to_words(coils: Vec<bool>) -> Vec<Word> {
    coils.into_iter().map(Word::from).collect()
}

impl Transport for RtuTransport {
    fn read_registers(
        &mut self,
        space: AddressSpace,
        addr: Address,
        cnt: Quantity,
    ) -> TransportResult<Vec<Word>> {
        let ctx = self.context()?;
        debug!("reading {cnt} {space} items at 0x{addr:04X}");
        match space {
            AddressSpace::Input => map_tokio_result(ctx.read_input_registers(addr, cnt)),
            AddressSpace::Holding => map_tokio_result(ctx.read_holding_registers(addr, cnt)),
            AddressSpace::Coil => {
                map_tokio_result(ctx.read_coils(addr, cnt)).map(|res| res.map(coils_to_words))
            }
        }
    }

    fn read_device_info(&mut self) -> TransportResult<DeviceInfo> {
        // The client cannot frame 0x2B responses, so the port is handed
        // over to a raw exchange and reopened afterwards.
        if self.ctx.take().is_none() {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "port closed").into());
        }
        let result = self.identify();
        self.ctx = Some(open_context(&self.connector)?);
        result
    }

    fn close(&mut self) -> io::Result<()> {
        if self.ctx.take().is_some() {
            debug!("closed {}", self.connector.port);
        }
        Ok(())
    }
}
