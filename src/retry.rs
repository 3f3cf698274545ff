// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded retries of device operations.

use std::{thread, time::Duration};

use log::{debug, warn};

use crate::error::{Error, Result};

/// How often and how patiently an operation is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_tries: u32,
    /// Pause between a failed attempt and the next one.
    pub wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_tries: 3,
            wait: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_tries: u32, wait: Duration) -> Self {
        Self { max_tries, wait }
    }

    /// Invoke `f` until it succeeds or `max_tries` attempts failed.
    ///
    /// `f` receives the number of the current attempt, starting at 1.
    pub fn retry<T>(
        &self,
        operation: &'static str,
        mut f: impl FnMut(u32) -> Result<T>,
    ) -> Result<T> {
        for attempt in 1..=self.max_tries {
            match f(attempt) {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{operation}: succeeded after {attempt} attempts");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    warn!(
                        "{operation}: failed attempt {attempt} of {}: {err}",
                        self.max_tries
                    );
                    if attempt < self.max_tries && !self.wait.is_zero() {
                        thread::sleep(self.wait);
                    }
                }
            }
        }
        Err(Error::MaxRetriesExceeded {
            operation,
            tries: self.max_tries,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{io, time::Instant};

    use super::*;

    fn timeout() -> Error {
        io::Error::new(io::ErrorKind::TimedOut, "timeout").into()
    }

    #[test]
    fn first_success_is_returned() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let mut calls = 0;
        let res = policy.retry("test", |_| {
            calls += 1;
            Ok(42)
        });
        assert_eq!(res.unwrap(), 42);
        assert_eq!(calls, 1);
    }

    #[test]
    fn recover_after_failures() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let res = policy.retry("test", |attempt| {
            if attempt < 3 {
                Err(timeout())
            } else {
                Ok(attempt)
            }
        });
        assert_eq!(res.unwrap(), 3);
    }

    #[test]
    fn give_up_after_max_tries() {
        let policy = RetryPolicy::new(2, Duration::ZERO);
        let mut calls = 0;
        let res: Result<()> = policy.retry("live_data", |_| {
            calls += 1;
            Err(timeout())
        });
        assert_eq!(calls, 2);
        let err = res.unwrap_err();
        assert!(matches!(
            err,
            Error::MaxRetriesExceeded {
                operation: "live_data",
                tries: 2
            }
        ));
        assert_eq!(err.to_string(), "live_data: max tries 2 exceeded");
    }

    #[test]
    fn no_wait_after_last_attempt() {
        let policy = RetryPolicy::new(1, Duration::from_secs(30));
        let started = Instant::now();
        let res: Result<()> = policy.retry("test", |_| Err(timeout()));
        assert!(res.is_err());
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn no_tries_no_calls() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        let res: Result<()> = policy.retry("test", |_| unreachable!());
        assert!(res.is_err());
    }
}
