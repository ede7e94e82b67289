use core::ffi::CStr;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use ufmt_write::uWrite;

use crate::{
    ddram_address, display_control, entry_mode, port_image, shift, until_nul, Commands,
    EntryDirection, Error, Register, ShiftDir, ShiftTarget, CLEAR_DELAY_MS, DEFAULT_ADDRESS,
    DISPLAY_CONTROL, ENABLE_PULSE_MS, ENTRY_MODE, FUNCTION_SET, POWER_ON_DELAY_MS, RESET_4BIT,
    RESET_8BIT, RESET_FINAL_US, RESET_RETRY_MS, RESET_SETTLE_MS,
};

/// API to write to the LCD.
pub struct Lcd<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    i2c: &'a mut I,
    address: u8,
    delay: &'a mut D,
}

impl<'a, I, D> Lcd<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    /// Create new instance with only the I2C and delay instance, using [`DEFAULT_ADDRESS`].
    pub fn new(i2c: &'a mut I, delay: &'a mut D) -> Self {
        Self {
            i2c,
            delay,
            address: DEFAULT_ADDRESS,
        }
    }

    /// Set the 7 bit I2C address of the port expander.
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    /// 7 bit I2C address of the port expander.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Initializes the hardware and hands back the ready display.
    pub fn init(mut self) -> Result<Self, Error<I::Error>> {
        self.initialize()?;
        Ok(self)
    }

    /// Runs the power-on reset sequence.
    ///
    /// The controller may be in 8 bit mode or halfway through a 4 bit transfer, so it is
    /// forced into 8 bit mode three times before switching to 4 bit mode, as described in
    /// figure 24 of the HD44780 datasheet. Afterwards the display is on with a steady
    /// cursor, two lines, 5x8 font, cleared, and the cursor moves right on every write.
    ///
    /// Can be called again on a running display to get back to these defaults.
    pub fn initialize(&mut self) -> Result<(), Error<I::Error>> {
        #[cfg(feature = "defmt")]
        defmt::debug!("lcd {=u8:#x}: reset", self.address);

        // Vcc settle time after power on.
        self.delay.delay_ms(POWER_ON_DELAY_MS);

        // All lines low, backlight included.
        self.write_port(0x00)?;
        self.delay.delay_ms(RESET_SETTLE_MS);

        self.write_nibble(RESET_8BIT, Register::Command)?;
        self.delay.delay_ms(RESET_RETRY_MS);
        self.write_nibble(RESET_8BIT, Register::Command)?;
        self.delay.delay_us(RESET_FINAL_US);
        self.write_nibble(RESET_8BIT, Register::Command)?;

        // From here on every byte is two nibbles.
        self.write_nibble(RESET_4BIT, Register::Command)?;

        self.send_command(FUNCTION_SET)?;
        self.send_command(DISPLAY_CONTROL)?;
        self.clear()?;
        self.send_command(ENTRY_MODE)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("lcd {=u8:#x}: ready", self.address);
        Ok(())
    }

    fn write_port(&mut self, byte: u8) -> Result<(), Error<I::Error>> {
        self.i2c.write(self.address, &[byte]).map_err(|e| {
            #[cfg(feature = "defmt")]
            defmt::warn!("lcd {=u8:#x}: write of {=u8:#x} failed", self.address, byte);
            Error::Bus(e)
        })
    }

    /// Latches one nibble with an enable pulse.
    fn write_nibble(&mut self, nibble: u8, register: Register) -> Result<(), Error<I::Error>> {
        self.write_port(port_image(nibble, register, true))?;
        self.delay.delay_ms(ENABLE_PULSE_MS);
        self.write_port(port_image(nibble, register, false))
    }

    fn send(&mut self, data: u8, register: Register) -> Result<(), Error<I::Error>> {
        self.write_nibble(data >> 4, register)?;
        self.write_nibble(data & 0x0f, register)
    }

    /// Send a raw instruction, e.g. `0x18` to shift the display left.
    ///
    /// Clear and return home need 1.52 ms to execute; use [`Lcd::clear`] and
    /// [`Lcd::return_home`] which wait for them.
    pub fn send_command(&mut self, cmd: u8) -> Result<(), Error<I::Error>> {
        self.send(cmd, Register::Command)
    }

    /// Write one character code, no translation is done.
    pub fn print_char(&mut self, c: u8) -> Result<(), Error<I::Error>> {
        self.send(c, Register::Data)
    }

    /// Write string to display.
    ///
    /// Bytes are sent as they are, so only ASCII maps to the expected glyphs of the
    /// character ROM. Stops at a NUL byte.
    pub fn print_str(&mut self, data: &str) -> Result<(), Error<I::Error>> {
        self.print_bytes(data.as_bytes())
    }

    /// Write character codes up to the first NUL, or all of them if there is none.
    pub fn print_bytes(&mut self, data: &[u8]) -> Result<(), Error<I::Error>> {
        for &c in until_nul(data) {
            self.print_char(c)?;
        }
        Ok(())
    }

    /// Write a NUL terminated string, without the terminator.
    pub fn print_cstr(&mut self, data: &CStr) -> Result<(), Error<I::Error>> {
        self.print_bytes(data.to_bytes())
    }

    /// Clear the display
    pub fn clear(&mut self) -> Result<(), Error<I::Error>> {
        self.send_command(Commands::Clear as u8)?;
        self.delay.delay_ms(CLEAR_DELAY_MS);
        Ok(())
    }

    /// Return cursor to upper left corner, i.e. (1, 1).
    pub fn return_home(&mut self) -> Result<(), Error<I::Error>> {
        self.send_command(Commands::ReturnHome as u8)?;
        self.delay.delay_ms(CLEAR_DELAY_MS);
        Ok(())
    }

    /// Set the cursor to (row, col). Coordinates are one-based, row in `1..=2` and column
    /// in `1..=16`. Nothing is sent for a position off the display.
    pub fn set_cursor(&mut self, row: u8, col: u8) -> Result<(), Error<I::Error>> {
        let cmd = ddram_address(row, col)?;
        self.send_command(cmd)
    }

    /// Switch display, cursor and cursor blinking on or off.
    pub fn set_display_control(
        &mut self,
        display: bool,
        cursor: bool,
        blink: bool,
    ) -> Result<(), Error<I::Error>> {
        self.send_command(display_control(display, cursor, blink))
    }

    /// Cursor direction after each write, and whether the display shifts along.
    pub fn set_entry_mode(
        &mut self,
        direction: EntryDirection,
        shift_display: bool,
    ) -> Result<(), Error<I::Error>> {
        self.send_command(entry_mode(direction, shift_display))
    }

    /// Scrolls the display one char to the left
    pub fn scroll_display_left(&mut self) -> Result<(), Error<I::Error>> {
        self.send_command(shift(ShiftTarget::Display, ShiftDir::Left))
    }

    /// Scrolls the display one char to the right
    pub fn scroll_display_right(&mut self) -> Result<(), Error<I::Error>> {
        self.send_command(shift(ShiftTarget::Display, ShiftDir::Right))
    }

    /// Moves the cursor one char to the left
    pub fn scroll_cursor_left(&mut self) -> Result<(), Error<I::Error>> {
        self.send_command(shift(ShiftTarget::Cursor, ShiftDir::Left))
    }

    /// Moves the cursor one char to the right
    pub fn scroll_cursor_right(&mut self) -> Result<(), Error<I::Error>> {
        self.send_command(shift(ShiftTarget::Cursor, ShiftDir::Right))
    }
}

impl<'a, I, D> uWrite for Lcd<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    type Error = Error<I::Error>;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        self.print_str(s)
    }
}
