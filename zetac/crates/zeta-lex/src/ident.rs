//! Identifier scanning.

use crate::input::{Input, ScanError};

/// True for characters that may start an identifier: `[A-Za-z_$]`.
#[inline]
pub fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
}

/// True for characters that may continue an identifier: `[A-Za-z0-9_$]`.
#[inline]
pub fn is_ident_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'
}

impl<'a> Input<'a> {
    /// Scan an identifier, returning the matched slice.
    ///
    /// Fails without consuming anything if the current character cannot
    /// start an identifier.
    pub fn scan_ident(&mut self) -> Result<&'a str, ScanError> {
        if !is_ident_start(self.peek_ch()) {
            return Err(ScanError::new(self.pos(), "invalid identifier start"));
        }

        let start = self.byte_pos();
        while is_ident_continue(self.peek_ch()) {
            self.read_ch();
        }

        Ok(self.slice_from(start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> Result<&str, ScanError> {
        Input::new(source).scan_ident()
    }

    #[test]
    fn test_plain_identifiers() {
        assert_eq!(scan("foobar").unwrap(), "foobar");
        assert_eq!(scan("foo_bar baz").unwrap(), "foo_bar");
        assert_eq!(scan("_foo").unwrap(), "_foo");
    }

    #[test]
    fn test_dollar_identifiers() {
        assert_eq!(scan("$foo").unwrap(), "$foo");
        assert_eq!(scan("$foo52").unwrap(), "$foo52");
        assert_eq!(scan("$print_int64(x)").unwrap(), "$print_int64");
    }

    #[test]
    fn test_digits_may_continue_but_not_start() {
        assert_eq!(scan("x2y").unwrap(), "x2y");
        assert!(scan("2x").is_err());
    }

    #[test]
    fn test_invalid_start() {
        assert!(scan("+x").is_err());
        assert!(scan("").is_err());
    }
}
