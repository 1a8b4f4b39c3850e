//! 16×2 HD44780 character LCD behind a PCF8574 I²C backpack.
//!
//! The backpack exposes the controller in 4-bit mode:
//!
//! ```text
//!   PCF8574 bit   7  6  5  4   3    2   1   0
//!                 D7 D6 D5 D4  BL   EN  RW  RS
//! ```
//!
//! Every nibble is latched with an EN high→low pulse. RW is tied low; the
//! busy flag is never read, fixed delays cover the execution times.
//!
//! The driver does not own the bus; the BMP180 shares it.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::app::ports::DISPLAY_COLS;

const RS: u8 = 0x01;
const EN: u8 = 0x04;
const BACKLIGHT: u8 = 0x08;

const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_MODE_INC: u8 = 0x06;
const CMD_DISPLAY_ON: u8 = 0x0C;
const CMD_FUNCTION_4BIT_2LINE: u8 = 0x28;
const CMD_SET_DDRAM: u8 = 0x80;

/// DDRAM start address of each row.
const ROW_OFFSETS: [u8; 2] = [0x00, 0x40];

const POWER_ON_MS: u32 = 50;
const CLEAR_US: u32 = 2_000;
const COMMAND_US: u32 = 50;

pub struct Lcd {
    address: u8,
    backlight: bool,
}

impl Lcd {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            backlight: true,
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Datasheet 4-bit initialisation by instruction, then clear.
    pub fn init<I: I2c>(&mut self, i2c: &mut I, delay: &mut impl DelayNs) -> Result<(), I::Error> {
        delay.delay_ms(POWER_ON_MS);
        self.write_nibble(i2c, delay, 0x30, 0)?;
        delay.delay_us(4_500);
        self.write_nibble(i2c, delay, 0x30, 0)?;
        delay.delay_us(4_500);
        self.write_nibble(i2c, delay, 0x30, 0)?;
        delay.delay_us(150);
        self.write_nibble(i2c, delay, 0x20, 0)?;

        self.command(i2c, delay, CMD_FUNCTION_4BIT_2LINE)?;
        self.command(i2c, delay, CMD_DISPLAY_ON)?;
        self.clear(i2c, delay)?;
        self.command(i2c, delay, CMD_ENTRY_MODE_INC)
    }

    pub fn clear<I: I2c>(&mut self, i2c: &mut I, delay: &mut impl DelayNs) -> Result<(), I::Error> {
        self.command(i2c, delay, CMD_CLEAR)?;
        delay.delay_us(CLEAR_US);
        Ok(())
    }

    /// Rows past the last one wrap to row 0.
    pub fn set_cursor<I: I2c>(
        &mut self,
        i2c: &mut I,
        delay: &mut impl DelayNs,
        col: u8,
        row: u8,
    ) -> Result<(), I::Error> {
        let offset = ROW_OFFSETS[usize::from(row) % ROW_OFFSETS.len()];
        self.command(i2c, delay, CMD_SET_DDRAM | (offset + col.min(DISPLAY_COLS as u8 - 1)))
    }

    /// Write at the cursor. Text is cut at the row width; bytes outside
    /// printable ASCII are shown as `?`.
    pub fn write_str<I: I2c>(
        &mut self,
        i2c: &mut I,
        delay: &mut impl DelayNs,
        text: &str,
    ) -> Result<(), I::Error> {
        for c in text.chars().take(DISPLAY_COLS) {
            let byte = if c.is_ascii() && !c.is_ascii_control() {
                c as u8
            } else {
                b'?'
            };
            self.send(i2c, delay, byte, RS)?;
        }
        Ok(())
    }

    pub fn set_backlight<I: I2c>(&mut self, i2c: &mut I, on: bool) -> Result<(), I::Error> {
        self.backlight = on;
        i2c.write(self.address, &[self.backlight_bit()])
    }

    fn command<I: I2c>(&mut self, i2c: &mut I, delay: &mut impl DelayNs, cmd: u8) -> Result<(), I::Error> {
        self.send(i2c, delay, cmd, 0)?;
        delay.delay_us(COMMAND_US);
        Ok(())
    }

    fn send<I: I2c>(&mut self, i2c: &mut I, delay: &mut impl DelayNs, byte: u8, mode: u8) -> Result<(), I::Error> {
        self.write_nibble(i2c, delay, byte & 0xF0, mode)?;
        self.write_nibble(i2c, delay, byte << 4, mode)
    }

    fn write_nibble<I: I2c>(
        &mut self,
        i2c: &mut I,
        delay: &mut impl DelayNs,
        high_nibble: u8,
        mode: u8,
    ) -> Result<(), I::Error> {
        let data = high_nibble | mode | self.backlight_bit();
        i2c.write(self.address, &[data | EN])?;
        delay.delay_us(1);
        i2c.write(self.address, &[data])?;
        delay.delay_us(COMMAND_US);
        Ok(())
    }

    fn backlight_bit(&self) -> u8 {
        if self.backlight { BACKLIGHT } else { 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{ErrorKind, ErrorType, Operation};

    /// Records every byte the backpack would latch.
    #[derive(Default)]
    struct Backpack {
        writes: Vec<(u8, u8)>,
        fail: bool,
    }

    impl Backpack {
        /// Reassemble the bytes clocked into the controller, with the RS bit.
        fn latched(&self) -> Vec<(bool, u8)> {
            let pulses: Vec<u8> = self
                .writes
                .iter()
                .map(|&(_, b)| b)
                .filter(|b| b & EN != 0)
                .collect();
            // Skip the four bare init nibbles.
            pulses[4..]
                .chunks(2)
                .map(|pair| (pair[0] & RS != 0, (pair[0] & 0xF0) | (pair[1] >> 4)))
                .collect()
        }
    }

    impl ErrorType for Backpack {
        type Error = ErrorKind;
    }

    impl I2c for Backpack {
        fn transaction(&mut self, address: u8, ops: &mut [Operation<'_>]) -> Result<(), Self::Error> {
            if self.fail {
                return Err(ErrorKind::Other);
            }
            for op in ops {
                if let Operation::Write(bytes) = op {
                    self.writes.extend(bytes.iter().map(|&b| (address, b)));
                }
            }
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn ready() -> (Lcd, Backpack) {
        let mut lcd = Lcd::new(0x27);
        let mut bus = Backpack::default();
        lcd.init(&mut bus, &mut NoDelay).unwrap();
        (lcd, bus)
    }

    #[test]
    fn init_sequence_ends_in_two_line_mode() {
        let (_, bus) = ready();
        assert!(bus.writes.iter().all(|&(addr, b)| addr == 0x27 && b & BACKLIGHT != 0));
        let cmds: Vec<u8> = bus.latched().into_iter().map(|(_, b)| b).collect();
        assert_eq!(
            cmds,
            vec![CMD_FUNCTION_4BIT_2LINE, CMD_DISPLAY_ON, CMD_CLEAR, CMD_ENTRY_MODE_INC]
        );
    }

    #[test]
    fn second_row_cursor_uses_0x40() {
        let (mut lcd, mut bus) = ready();
        lcd.set_cursor(&mut bus, &mut NoDelay, 0, 1).unwrap();
        assert_eq!(bus.latched().last(), Some(&(false, 0xC0)));
    }

    #[test]
    fn text_is_sent_as_data_and_cut_at_sixteen() {
        let (mut lcd, mut bus) = ready();
        lcd.write_str(&mut bus, &mut NoDelay, "Rainfall: YES!!!extra").unwrap();
        let data: Vec<(bool, u8)> = bus.latched().into_iter().skip(4).collect();
        assert_eq!(data.len(), 16);
        assert!(data.iter().all(|&(rs, _)| rs));
        let text: String = data.iter().map(|&(_, b)| b as char).collect();
        assert_eq!(text, "Rainfall: YES!!!");
    }

    #[test]
    fn non_ascii_becomes_question_mark() {
        let (mut lcd, mut bus) = ready();
        lcd.write_str(&mut bus, &mut NoDelay, "25°C").unwrap();
        let text: String = bus.latched().into_iter().skip(4).map(|(_, b)| b as char).collect();
        assert_eq!(text, "25?C");
    }

    #[test]
    fn bus_error_propagates() {
        let mut lcd = Lcd::new(0x27);
        let mut bus = Backpack {
            fail: true,
            ..Backpack::default()
        };
        assert_eq!(lcd.clear(&mut bus, &mut NoDelay), Err(ErrorKind::Other));
    }

    #[test]
    fn backlight_off_clears_bit_on_later_writes() {
        let (mut lcd, mut bus) = ready();
        lcd.set_backlight(&mut bus, false).unwrap();
        bus.writes.clear();
        lcd.clear(&mut bus, &mut NoDelay).unwrap();
        assert!(bus.writes.iter().all(|&(_, b)| b & BACKLIGHT == 0));
    }
}
