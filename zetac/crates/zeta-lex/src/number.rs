//! Integer literal scanning.
//!
//! The core language has 64-bit signed integers only; floating-point
//! literals are not supported. Negative values are built by the prefix
//! minus operator, so the scanner itself only sees digit runs.

use crate::input::{Input, ScanError};

impl<'a> Input<'a> {
    /// Scan an integer literal: decimal, `0x...` hexadecimal or `0b...`
    /// binary.
    ///
    /// The caller has established that the current character is a digit.
    pub fn scan_int(&mut self) -> Result<i64, ScanError> {
        let pos = self.pos();

        if self.match_str("0x") {
            return self.scan_radix(16, pos);
        }
        if self.match_str("0b") {
            return self.scan_radix(2, pos);
        }
        self.scan_radix(10, pos)
    }

    fn scan_radix(&mut self, radix: u32, pos: zeta_util::SrcPos) -> Result<i64, ScanError> {
        let start = self.byte_pos();
        while self.peek_ch().is_digit(radix) {
            self.read_ch();
        }

        let digits = self.slice_from(start);
        if digits.is_empty() {
            return Err(ScanError::new(pos, "no digits in number literal"));
        }

        i64::from_str_radix(digits, radix)
            .map_err(|_| ScanError::new(pos, "integer literal overflow"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> Result<i64, ScanError> {
        Input::new(source).scan_int()
    }

    #[test]
    fn test_decimal() {
        assert_eq!(scan("0").unwrap(), 0);
        assert_eq!(scan("123").unwrap(), 123);
        assert_eq!(scan("123 + x").unwrap(), 123);
    }

    #[test]
    fn test_hex() {
        assert_eq!(scan("0xFF").unwrap(), 255);
        assert_eq!(scan("0x0").unwrap(), 0);
        assert_eq!(scan("0xdeadBEEF").unwrap(), 0xdead_beef);
    }

    #[test]
    fn test_binary() {
        assert_eq!(scan("0b101").unwrap(), 5);
        assert_eq!(scan("0b0").unwrap(), 0);
    }

    #[test]
    fn test_missing_digits_after_prefix() {
        assert!(scan("0x").is_err());
        assert!(scan("0bz").is_err());
    }

    #[test]
    fn test_overflow() {
        assert!(scan("99999999999999999999999999").is_err());
        assert_eq!(scan("9223372036854775807").unwrap(), i64::MAX);
    }

    #[test]
    fn test_hex_stops_at_non_digit() {
        let mut input = Input::new("0b101x");
        assert_eq!(input.scan_int().unwrap(), 5);
        assert_eq!(input.peek_ch(), 'x');
    }
}
