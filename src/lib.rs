#![no_std]
//! Driver to write characters to HD44780 LCD displays with 16x2 characters, connected via a
//! PCF8574 I2C port expander like [this one]. It requires an I2C instance implementing
//! [`embedded_hal::i2c::I2c`] and an instance to delay execution with
//! [`embedded_hal::delay::DelayNs`]. With the `async` feature the same driver is available
//! on top of the `embedded-hal-async` traits in [`async_lcd`].
//!
//! The expander pins are wired the usual way for these backpacks:
//!
//! | P0 | P1 | P2 | P3        | P4..P7 |
//! |----|----|----|-----------|--------|
//! | RS | RW | EN | Backlight | D4..D7 |
//!
//! Usage:
//! ```ignore
//! // Create a I2C instance, needs to implement embedded_hal::i2c::I2c, this
//! // particular uses the arduino_hal crate for avr microcontrollers like the arduinos.
//! let dp = arduino_hal::Peripherals::take().unwrap();
//! let pins = arduino_hal::pins!(dp);
//! let mut i2c = arduino_hal::I2c::new(
//!     dp.TWI, //
//!     pins.a4.into_pull_up_input(), // use respective pins
//!     pins.a5.into_pull_up_input(),
//!     50000,
//! );
//! let mut delay = arduino_hal::Delay::new();
//!
//! let mut lcd = lcd_hd44780_i2c::sync_lcd::Lcd::new(&mut i2c, &mut delay)
//!     .with_address(0x27) // the default, depends on the A0..A2 jumpers
//!     .init()
//!     .unwrap();
//!
//! lcd.set_cursor(2, 1).unwrap();
//! lcd.print_str("Hello").unwrap();
//! ufmt::uwrite!(lcd, " {}", 42).unwrap();
//! ```
//!
//! The driver never reads from the display, so the cursor position is whatever the
//! controller holds. Text does not wrap; use [`sync_lcd::Lcd::set_cursor`] to move on.
//!
//! [this one]: https://funduinoshop.com/elektronische-module/displays/lcd/16x02-i2c-lcd-modul-hintergrundbeleuchtung-blau

use core::fmt;

pub mod sync_lcd;

#[cfg(feature = "async")]
pub mod async_lcd;

#[cfg(test)]
mod mock;

/// Default 7 bit address of PCF8574 backpacks with all address jumpers open.
///
/// On the wire this is the write address `0x4E`.
pub const DEFAULT_ADDRESS: u8 = 0x27;

/// Number of visible rows.
pub const ROWS: u8 = 2;

/// Number of visible columns per row.
pub const COLUMNS: u8 = 16;

/// DDRAM address of the first column of each row.
const ROW_OFFSETS: [u8; ROWS as usize] = [0x00, 0x40];

/// The data lines D4..D7 sit on the upper half of the expander port.
pub const DATA_SHIFT: u8 = 4;

// Timing, taken from the HD44780 datasheet with some headroom.
pub(crate) const POWER_ON_DELAY_MS: u32 = 50;
pub(crate) const RESET_SETTLE_MS: u32 = 40;
pub(crate) const RESET_RETRY_MS: u32 = 5;
pub(crate) const RESET_FINAL_US: u32 = 100;
pub(crate) const ENABLE_PULSE_MS: u32 = 1;
pub(crate) const CLEAR_DELAY_MS: u32 = 2;

/// Control lines on the expander port.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Port {
    RegisterSelect = 0x01,
    ReadWrite = 0x02,
    Enable = 0x04,
    Backlight = 0x08,
}

/// Register addressed by the RS line.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Register {
    Command = 0x00,
    Data = 0x01,
}

#[repr(u8)]
#[derive(Copy, Clone)]
pub(crate) enum Mode {
    EntrySet = 0x04,
    DisplayControl = 0x08,
    Shift = 0x10,
    FunctionSet = 0x20,
    DDRAMAddr = 0x80,
}

pub(crate) enum Commands {
    Clear = 0x01,
    ReturnHome = 0x02,
}

pub(crate) enum BitMode {
    Bit4 = 0x0 << 4,
    Bit8 = 0x1 << 4,
}

pub(crate) enum Lines {
    Two = 0x08,
}

pub(crate) enum Font {
    Font5x8 = 0x00,
}

pub(crate) enum DisplayControl {
    DisplayOn = 0x04,
    CursorOn = 0x02,
    CursorBlink = 0x01,
}

/// Direction the cursor moves after a character is written.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EntryDirection {
    Decrement = 0x00,
    Increment = 0x02,
}

#[repr(u8)]
#[derive(Copy, Clone)]
pub(crate) enum ShiftTarget {
    Cursor = 0x00,
    Display = 0x08,
}

#[repr(u8)]
#[derive(Copy, Clone)]
pub(crate) enum ShiftDir {
    Left = 0x00,
    Right = 0x04,
}

/// Nibble that puts the controller into 8 bit mode, sent three times on reset.
pub(crate) const RESET_8BIT: u8 = (Mode::FunctionSet as u8 | BitMode::Bit8 as u8) >> DATA_SHIFT;
/// Nibble that switches the controller to 4 bit mode.
pub(crate) const RESET_4BIT: u8 = (Mode::FunctionSet as u8 | BitMode::Bit4 as u8) >> DATA_SHIFT;

/// 4 bit interface, two lines, 5x8 font.
pub(crate) const FUNCTION_SET: u8 =
    Mode::FunctionSet as u8 | BitMode::Bit4 as u8 | Lines::Two as u8 | Font::Font5x8 as u8;
/// Display on, cursor on, no blinking.
pub(crate) const DISPLAY_CONTROL: u8 =
    Mode::DisplayControl as u8 | DisplayControl::DisplayOn as u8 | DisplayControl::CursorOn as u8;
/// Cursor moves right, display does not shift.
pub(crate) const ENTRY_MODE: u8 = Mode::EntrySet as u8 | EntryDirection::Increment as u8;

/// Errors returned by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// Writing to the port expander failed.
    Bus(E),
    /// Row is not within `1..=ROWS`.
    RowOutOfRange(u8),
    /// Column is not within `1..=COLUMNS`.
    ColumnOutOfRange(u8),
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Bus(e) => write!(f, "I2C error: {:?}", e),
            Error::RowOutOfRange(row) => write!(f, "row {} out of range", row),
            Error::ColumnOutOfRange(col) => write!(f, "column {} out of range", col),
        }
    }
}

#[cfg(feature = "defmt")]
impl<E> defmt::Format for Error<E> {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Error::Bus(_e) => defmt::write!(fmt, "I2C error"),
            Error::RowOutOfRange(row) => defmt::write!(fmt, "Row {} out of range", row),
            Error::ColumnOutOfRange(col) => defmt::write!(fmt, "Column {} out of range", col),
        }
    }
}

/// Port image for one half of a nibble transfer.
///
/// The backlight bit is always set and RW always cleared.
pub const fn port_image(nibble: u8, register: Register, enable: bool) -> u8 {
    let enable = if enable { Port::Enable as u8 } else { 0 };
    ((nibble & 0x0f) << DATA_SHIFT) | Port::Backlight as u8 | enable | register as u8
}

/// Set DDRAM Address command for a one based `(row, col)` position.
pub fn ddram_address<E>(row: u8, col: u8) -> Result<u8, Error<E>> {
    if row == 0 || row > ROWS {
        return Err(Error::RowOutOfRange(row));
    }
    if col == 0 || col > COLUMNS {
        return Err(Error::ColumnOutOfRange(col));
    }
    Ok(Mode::DDRAMAddr as u8 | (ROW_OFFSETS[(row - 1) as usize] + (col - 1)))
}

pub(crate) const fn display_control(display: bool, cursor: bool, blink: bool) -> u8 {
    let mut cmd = Mode::DisplayControl as u8;
    if display {
        cmd |= DisplayControl::DisplayOn as u8;
    }
    if cursor {
        cmd |= DisplayControl::CursorOn as u8;
    }
    if blink {
        cmd |= DisplayControl::CursorBlink as u8;
    }
    cmd
}

pub(crate) const fn entry_mode(direction: EntryDirection, shift: bool) -> u8 {
    Mode::EntrySet as u8 | direction as u8 | shift as u8
}

pub(crate) const fn shift(target: ShiftTarget, dir: ShiftDir) -> u8 {
    Mode::Shift as u8 | target as u8 | dir as u8
}

/// Bytes of `data` up to the first NUL.
pub(crate) fn until_nul(data: &[u8]) -> &[u8] {
    match data.iter().position(|&b| b == 0) {
        Some(end) => &data[..end],
        None => data,
    }
}
