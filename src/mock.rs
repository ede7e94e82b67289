//! Recording bus and delay sharing one event log, for timing checks in tests.
extern crate std;

use core::cell::RefCell;
use std::vec::Vec;

use embedded_hal::i2c::{ErrorKind, ErrorType, Operation};

use crate::{Port, DEFAULT_ADDRESS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Write(u8),
    DelayMs(u32),
    DelayUs(u32),
    DelayNs(u32),
}

pub type Log = RefCell<Vec<Event>>;

pub struct RecordingBus<'a> {
    log: &'a Log,
    writes: usize,
    fail_at: Option<usize>,
}

impl<'a> RecordingBus<'a> {
    pub fn new(log: &'a Log) -> Self {
        Self {
            log,
            writes: 0,
            fail_at: None,
        }
    }

    /// Fail the `n`th write (one based) and every write after it.
    pub fn failing_at(mut self, n: usize) -> Self {
        self.fail_at = Some(n);
        self
    }

    pub fn writes(&self) -> usize {
        self.writes
    }

    fn record(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), ErrorKind> {
        assert_eq!(address, DEFAULT_ADDRESS);
        for op in operations.iter() {
            match op {
                Operation::Write(bytes) => {
                    self.writes += 1;
                    if matches!(self.fail_at, Some(n) if self.writes >= n) {
                        return Err(ErrorKind::Other);
                    }
                    let mut log = self.log.borrow_mut();
                    log.extend(bytes.iter().map(|&b| Event::Write(b)));
                }
                Operation::Read(_) => panic!("driver must not read"),
            }
        }
        Ok(())
    }
}

impl ErrorType for RecordingBus<'_> {
    type Error = ErrorKind;
}

impl embedded_hal::i2c::I2c for RecordingBus<'_> {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.record(address, operations)
    }
}

#[cfg(feature = "async")]
impl embedded_hal_async::i2c::I2c for RecordingBus<'_> {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.record(address, operations)
    }
}

pub struct RecordingDelay<'a> {
    log: &'a Log,
}

impl<'a> RecordingDelay<'a> {
    pub fn new(log: &'a Log) -> Self {
        Self { log }
    }

    fn push(&self, event: Event) {
        self.log.borrow_mut().push(event);
    }
}

impl embedded_hal::delay::DelayNs for RecordingDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.push(Event::DelayNs(ns));
    }

    fn delay_us(&mut self, us: u32) {
        self.push(Event::DelayUs(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.push(Event::DelayMs(ms));
    }
}

#[cfg(feature = "async")]
impl embedded_hal_async::delay::DelayNs for RecordingDelay<'_> {
    async fn delay_ns(&mut self, ns: u32) {
        self.push(Event::DelayNs(ns));
    }

    async fn delay_us(&mut self, us: u32) {
        self.push(Event::DelayUs(us));
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.push(Event::DelayMs(ms));
    }
}

/// Runs a future whose collaborators never pend.
#[cfg(feature = "async")]
pub fn block_on<F: core::future::Future>(fut: F) -> F::Output {
    use core::task::{Context, Poll, Waker};

    let mut fut = core::pin::pin!(fut);
    let mut cx = Context::from_waker(Waker::noop());
    loop {
        if let Poll::Ready(out) = fut.as_mut().poll(&mut cx) {
            return out;
        }
    }
}

/// Bytes written to the expander, in order.
pub fn writes(log: &Log) -> Vec<u8> {
    log.borrow()
        .iter()
        .filter_map(|e| match e {
            Event::Write(b) => Some(*b),
            _ => None,
        })
        .collect()
}

/// Splits the write stream into enable pulses and checks each one is well formed:
/// EN high then low, nothing else changing, backlight on, RW low.
pub fn pulses(bytes: &[u8]) -> Vec<u8> {
    assert_eq!(bytes.len() % 2, 0, "odd number of writes: {:02x?}", bytes);
    bytes
        .chunks(2)
        .map(|pair| {
            let (high, low) = (pair[0], pair[1]);
            assert_ne!(high & Port::Enable as u8, 0, "EN low on first write: {:02x?}", pair);
            assert_eq!(low & Port::Enable as u8, 0, "EN high on second write: {:02x?}", pair);
            assert_eq!(high ^ low, Port::Enable as u8, "pair differs beyond EN: {:02x?}", pair);
            assert_ne!(low & Port::Backlight as u8, 0, "backlight off: {:02x?}", pair);
            assert_eq!(low & Port::ReadWrite as u8, 0, "RW set: {:02x?}", pair);
            low
        })
        .collect()
}

/// Reassembles `(register select, byte)` from consecutive nibble pulses.
pub fn bytes(pulses: &[u8]) -> Vec<(bool, u8)> {
    assert_eq!(pulses.len() % 2, 0);
    pulses
        .chunks(2)
        .map(|p| {
            let rs = p[0] & Port::RegisterSelect as u8 != 0;
            assert_eq!(rs, p[1] & Port::RegisterSelect as u8 != 0);
            (rs, (p[0] & 0xf0) | (p[1] >> 4))
        })
        .collect()
}
