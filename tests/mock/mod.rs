// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
    io,
    rc::Rc,
};

use tracer_modbus::{
    client::{Connect, Transport},
    device::DeviceInfo,
    Address, AddressSpace, Exception, Quantity, Result, TransportResult, Word,
};

/// Register image and failure script of a simulated controller.
#[derive(Debug, Default)]
pub struct Device {
    words: HashMap<(AddressSpace, Address), Word>,
    exceptions: HashMap<(AddressSpace, Address), Exception>,
    /// Consumed one per request before anything else happens.
    pub failures: VecDeque<io::ErrorKind>,
    pub info: DeviceInfo,
    pub requests: Vec<(AddressSpace, Address, Quantity)>,
    pub connects: usize,
    pub closes: usize,
}

impl Device {
    pub fn set(&mut self, space: AddressSpace, addr: Address, words: &[Word]) {
        for (addr, word) in (addr..).zip(words) {
            self.words.insert((space, addr), *word);
        }
    }

    pub fn fail_with(&mut self, space: AddressSpace, addr: Address, exception: Exception) {
        self.exceptions.insert((space, addr), exception);
    }

    fn read(&mut self, space: AddressSpace, addr: Address, cnt: Quantity) -> TransportResult<Vec<Word>> {
        self.requests.push((space, addr, cnt));
        if let Some(kind) = self.failures.pop_front() {
            return Err(io::Error::new(kind, "simulated failure").into());
        }
        if let Some(exception) = self.exceptions.get(&(space, addr)) {
            return Ok(Err(*exception));
        }
        let words = (addr..addr + cnt)
            .map(|addr| self.words.get(&(space, addr)).copied().unwrap_or_default())
            .collect();
        Ok(Ok(words))
    }
}

pub type SharedDevice = Rc<RefCell<Device>>;

#[derive(Debug)]
pub struct DeviceTransport(SharedDevice);

impl Transport for DeviceTransport {
    fn read_registers(
        &mut self,
        space: AddressSpace,
        addr: Address,
        cnt: Quantity,
    ) -> TransportResult<Vec<Word>> {
        self.0.borrow_mut().read(space, addr, cnt)
    }

    fn read_device_info(&mut self) -> TransportResult<DeviceInfo> {
        let mut device = self.0.borrow_mut();
        if let Some(kind) = device.failures.pop_front() {
            return Err(io::Error::new(kind, "simulated failure").into());
        }
        Ok(Ok(device.info.clone()))
    }

    fn close(&mut self) -> io::Result<()> {
        self.0.borrow_mut().closes += 1;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeviceConnector(pub SharedDevice);

impl Connect for DeviceConnector {
    fn connect(&self) -> Result<Box<dyn Transport>> {
        self.0.borrow_mut().connects += 1;
        Ok(Box::new(DeviceTransport(Rc::clone(&self.0))))
    }
}

/// Live data page of a controller charging at 12 V.
pub const LIVE_DATA: [Word; 19] = [
    1200, 50, 0, 0, 2400, 25, 0, 0, 0, 0, 0, 0, 0, 0, 3700, 100, 250, 300, 280,
];

/// A device with sensible live data and a valid real time clock.
pub fn charging_device() -> SharedDevice {
    let mut device = Device {
        info: DeviceInfo {
            company: "EPsolar Tech co., Ltd".into(),
            product: "Tracer3210A".into(),
            version: "V02.13+V07.24".into(),
            serial: None,
        },
        ..Default::default()
    };
    device.set(AddressSpace::Input, 0x3100, &LIVE_DATA);
    device.set(AddressSpace::Input, 0x311A, &[80, 250]);
    // 2019-09-15 14:30:00
    device.set(AddressSpace::Holding, 0x9013, &[0x001E, 0x0E0F, 0x0913]);
    Rc::new(RefCell::new(device))
}
