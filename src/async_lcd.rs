use core::ffi::CStr;

use embedded_hal_async::{delay::DelayNs, i2c::I2c};

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

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Initializes the hardware, see [`crate::sync_lcd::Lcd::initialize`].
    pub async fn init(mut self) -> Result<Self, Error<I::Error>> {
        self.initialize().await?;
        Ok(self)
    }

    /// Runs the power-on reset sequence. Safe to repeat on a running display.
    pub async fn initialize(&mut self) -> Result<(), Error<I::Error>> {
        #[cfg(feature = "defmt")]
        defmt::debug!("lcd {=u8:#x}: reset", self.address);

        self.delay.delay_ms(POWER_ON_DELAY_MS).await;

        self.write_port(0x00).await?;
        self.delay.delay_ms(RESET_SETTLE_MS).await;

        self.write_nibble(RESET_8BIT, Register::Command).await?;
        self.delay.delay_ms(RESET_RETRY_MS).await;
        self.write_nibble(RESET_8BIT, Register::Command).await?;
        self.delay.delay_us(RESET_FINAL_US).await;
        self.write_nibble(RESET_8BIT, Register::Command).await?;

        // Switch to 4 bit mode
        self.write_nibble(RESET_4BIT, Register::Command).await?;

        self.send_command(FUNCTION_SET).await?;
        self.send_command(DISPLAY_CONTROL).await?;
        self.clear().await?;
        self.send_command(ENTRY_MODE).await?;

        #[cfg(feature = "defmt")]
        defmt::debug!("lcd {=u8:#x}: ready", self.address);
        Ok(())
    }

    async fn write_port(&mut self, byte: u8) -> Result<(), Error<I::Error>> {
        self.i2c.write(self.address, &[byte]).await.map_err(|e| {
            #[cfg(feature = "defmt")]
            defmt::warn!("lcd {=u8:#x}: write of {=u8:#x} failed", self.address, byte);
            Error::Bus(e)
        })
    }

    async fn write_nibble(&mut self, nibble: u8, register: Register) -> Result<(), Error<I::Error>> {
        self.write_port(port_image(nibble, register, true)).await?;
        self.delay.delay_ms(ENABLE_PULSE_MS).await;
        self.write_port(port_image(nibble, register, false)).await
    }

    async fn send(&mut self, data: u8, register: Register) -> Result<(), Error<I::Error>> {
        self.write_nibble(data >> 4, register).await?;
        self.write_nibble(data & 0x0f, register).await
    }

    /// Send a raw instruction.
    pub async fn send_command(&mut self, cmd: u8) -> Result<(), Error<I::Error>> {
        self.send(cmd, Register::Command).await
    }

    pub async fn print_char(&mut self, c: u8) -> Result<(), Error<I::Error>> {
        self.send(c, Register::Data).await
    }

    /// Write string to display.
    pub async fn print_str(&mut self, data: &str) -> Result<(), Error<I::Error>> {
        self.print_bytes(data.as_bytes()).await
    }

    /// Write character codes up to the first NUL.
    pub async fn print_bytes(&mut self, data: &[u8]) -> Result<(), Error<I::Error>> {
        for &c in until_nul(data) {
            self.print_char(c).await?;
        }
        Ok(())
    }

    pub async fn print_cstr(&mut self, data: &CStr) -> Result<(), Error<I::Error>> {
        self.print_bytes(data.to_bytes()).await
    }

    /// Clear the display
    pub async fn clear(&mut self) -> Result<(), Error<I::Error>> {
        self.send_command(Commands::Clear as u8).await?;
        self.delay.delay_ms(CLEAR_DELAY_MS).await;
        Ok(())
    }

    /// Return cursor to upper left corner, i.e. (1, 1).
    pub async fn return_home(&mut self) -> Result<(), Error<I::Error>> {
        self.send_command(Commands::ReturnHome as u8).await?;
        self.delay.delay_ms(CLEAR_DELAY_MS).await;
        Ok(())
    }

    /// Set the cursor to (row, col). Coordinates are one-based.
    pub async fn set_cursor(&mut self, row: u8, col: u8) -> Result<(), Error<I::Error>> {
        let cmd = ddram_address(row, col)?;
        self.send_command(cmd).await
    }

    pub async fn set_display_control(
        &mut self,
        display: bool,
        cursor: bool,
        blink: bool,
    ) -> Result<(), Error<I::Error>> {
        self.send_command(display_control(display, cursor, blink)).await
    }

    pub async fn set_entry_mode(
        &mut self,
        direction: EntryDirection,
        shift_display: bool,
    ) -> Result<(), Error<I::Error>> {
        self.send_command(entry_mode(direction, shift_display)).await
    }

    /// Scrolls the display one char to the left
    pub async fn scroll_display_left(&mut self) -> Result<(), Error<I::Error>> {
        self.send_command(shift(ShiftTarget::Display, ShiftDir::Left)).await
    }

    /// Scrolls the display one char to the right
    pub async fn scroll_display_right(&mut self) -> Result<(), Error<I::Error>> {
        self.send_command(shift(ShiftTarget::Display, ShiftDir::Right)).await
    }

    /// Moves the cursor one char to the left
    pub async fn scroll_cursor_left(&mut self) -> Result<(), Error<I::Error>> {
        self.send_command(shift(ShiftTarget::Cursor, ShiftDir::Left)).await
    }

    /// Moves the cursor one char to the right
    pub async fn scroll_cursor_right(&mut self) -> Result<(), Error<I::Error>> {
        self.send_command(shift(ShiftTarget::Cursor, ShiftDir::Right)).await
    }
}
