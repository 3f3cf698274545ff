// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types.

use std::io;

use thiserror::Error;

use crate::frame::{Exception, Word};

/// Errors raised while talking to or decoding data from a charge controller.
#[derive(Debug, Error)]
pub enum Error {
    /// The connection was lost or a request timed out.
    #[error(transparent)]
    Transport(#[from] io::Error),

    /// The device answered with a _Modbus_ exception.
    #[error("exception: {0}")]
    Protocol(#[from] Exception),

    /// No transport is attached, i.e. the handle has been closed.
    #[error("not connected")]
    NotConnected,

    /// Three packed words do not form a valid calendar date and time.
    #[error("invalid date: words {words:04X?}")]
    InvalidDate { words: [Word; 3] },

    /// Three words do not form a valid time of day.
    #[error("invalid time: {hour:02}:{minute:02}:{second:02}")]
    InvalidTime { hour: Word, minute: Word, second: Word },

    /// The device identification response could not be parsed.
    #[error("invalid device identification: {0}")]
    DeviceInfo(String),

    /// All attempts of an operation failed.
    #[error("{operation}: max tries {tries} exceeded")]
    MaxRetriesExceeded {
        operation: &'static str,
        tries: u32,
    },

    /// The driver configuration is unusable.
    #[error("configuration: {0}")]
    Config(String),
}

impl Error {
    /// Whether the connection must be considered dead after this error.
    ///
    /// Timeouts and garbled frames leave the serial line usable, everything
    /// else on the transport level does not.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Transport(err) => !matches!(
                err.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::InvalidData | io::ErrorKind::WouldBlock
            ),
            Self::NotConnected => true,
            _ => false,
        }
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type of all fallible operations in this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Result of a single transport request.
///
/// The outer error is a transport failure that might go away on retry, the
/// inner one is the exception the device answered with.
pub type TransportResult<T> = Result<std::result::Result<T, Exception>>;
