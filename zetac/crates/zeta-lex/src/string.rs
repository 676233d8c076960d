//! String literal scanning.
//!
//! Literals may be single- or double-quoted; the opening quote has
//! already been consumed when the scanner runs, and the same character
//! closes the literal. Escape sequences are exactly `\n`, `\r`, `\t` and
//! `\0`; any other backslash sequence is an error. The scratch buffer is
//! transient: the parser interns the result, and only the interned
//! string survives.

use crate::input::{Input, ScanError};

impl<'a> Input<'a> {
    /// Scan the body of a string literal up to the closing `quote`.
    pub fn scan_string_lit(&mut self, quote: char) -> Result<String, ScanError> {
        let mut buf = String::new();

        loop {
            if self.eof() {
                return Err(ScanError::new(self.pos(), "unterminated string literal"));
            }

            let ch = self.read_ch();
            if ch == quote {
                return Ok(buf);
            }

            if ch == '\\' {
                let esc = self.read_ch();
                let decoded = match esc {
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    '0' => '\0',
                    _ => {
                        return Err(ScanError::new(self.pos(), "invalid escape sequence"));
                    }
                };
                buf.push(decoded);
                continue;
            }

            buf.push(ch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str, quote: char) -> Result<String, ScanError> {
        Input::new(source).scan_string_lit(quote)
    }

    #[test]
    fn test_simple_literals() {
        assert_eq!(scan("abc'", '\'').unwrap(), "abc");
        assert_eq!(scan("double-quoted string!\"", '"').unwrap(), "double-quoted string!");
    }

    #[test]
    fn test_other_quote_kind_is_plain_text() {
        assert_eq!(scan("say 'hi'!\"", '"').unwrap(), "say 'hi'!");
    }

    #[test]
    fn test_escape_sequences() {
        assert_eq!(scan("new\\nline'", '\'').unwrap(), "new\nline");
        assert_eq!(scan("a\\tb\\r\\0'", '\'').unwrap(), "a\tb\r\0");
    }

    #[test]
    fn test_invalid_escape() {
        let err = scan("invalid\\iesc'", '\'').unwrap_err();
        assert_eq!(err.msg, "invalid escape sequence");
    }

    #[test]
    fn test_unterminated() {
        let err = scan("runs off the end", '\'').unwrap_err();
        assert_eq!(err.msg, "unterminated string literal");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Any text free of quotes and backslashes scans to itself.
            #[test]
            fn plain_text_round_trips(text in "[^'\\\\]*") {
                let source = format!("{text}'");
                prop_assert_eq!(scan(&source, '\'').unwrap(), text);
            }
        }
    }
}
