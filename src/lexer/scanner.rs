//! Pull-based scanner for expression source.
//!
//! The scanner exposes exactly one current token. `next_token` overwrites it
//! with the next one. Malformed literals are recorded as diagnostics and
//! scanning continues with a best-effort value; only a string literal stops
//! the scanner.

use crate::error::LexerError;
use crate::intern::{Keywords, SymbolId, SymbolTable};
use crate::lexer::token::{Token, TokenKind, TokenMod};
use crate::span::Span;

const NOT_A_DIGIT: u8 = u8::MAX;

/// Digit values for every byte: `0-9` map to 0-9, `a-f`/`A-F` to 10-15.
static CHAR_TO_DIGIT: [u8; 256] = build_digit_table();

const fn build_digit_table() -> [u8; 256] {
    let mut table = [NOT_A_DIGIT; 256];
    let mut i = 0;
    while i < 10 {
        table[b'0' as usize + i] = i as u8;
        i += 1;
    }
    let mut i = 0;
    while i < 6 {
        table[b'a' as usize + i] = 10 + i as u8;
        table[b'A' as usize + i] = 10 + i as u8;
        i += 1;
    }
    table
}

fn digit_value(c: u8) -> Option<u64> {
    match CHAR_TO_DIGIT[c as usize] {
        NOT_A_DIGIT => None,
        d => Some(d as u64),
    }
}

/// Value of the character named by `\c` inside a char literal.
fn escape_to_byte(c: u8) -> Option<u8> {
    match c {
        b'0' => Some(0),
        b'\'' => Some(b'\''),
        b'"' => Some(b'"'),
        b'?' => Some(b'?'),
        b'\\' => Some(b'\\'),
        b'a' => Some(0x07),
        b'b' => Some(0x08),
        b'f' => Some(0x0C),
        b'n' => Some(b'\n'),
        b'r' => Some(b'\r'),
        b't' => Some(b'\t'),
        b'v' => Some(0x0B),
        _ => None,
    }
}

fn is_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\r' | b'\n' | 0x0B | 0x0C)
}

/// The lexer: a cursor into the source plus the current token.
pub struct Scanner<'a> {
    source: &'a str,
    bytes: &'a [u8],
    current_pos: usize,
    line: usize,
    column: usize,
    start_pos: usize,
    start_line: usize,
    start_column: usize,
    token: Token,
    symbols: &'a mut SymbolTable,
    diagnostics: Vec<LexerError>,
}

impl<'a> Scanner<'a> {
    /// Create a scanner over `source` and read the first token.
    pub fn new(source: &'a str, symbols: &'a mut SymbolTable) -> Result<Self, LexerError> {
        let mut scanner = Self {
            source,
            bytes: source.as_bytes(),
            current_pos: 0,
            line: 1,
            column: 1,
            start_pos: 0,
            start_line: 1,
            start_column: 1,
            token: Token::eof(0, 1, 1),
            symbols,
            diagnostics: Vec::new(),
        };
        scanner.next_token()?;
        Ok(scanner)
    }

    /// Restart scanning at the beginning of `source` and read its first
    /// token. Diagnostics from earlier input are kept.
    pub fn init(&mut self, source: &'a str) -> Result<(), LexerError> {
        self.source = source;
        self.bytes = source.as_bytes();
        self.current_pos = 0;
        self.line = 1;
        self.column = 1;
        self.next_token()
    }

    /// The current token.
    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn symbols(&self) -> &SymbolTable {
        &*self.symbols
    }

    /// Diagnostics recorded so far.
    pub fn diagnostics(&self) -> &[LexerError] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<LexerError> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn is_token(&self, kind: TokenKind) -> bool {
        self.token.kind == kind
    }

    pub fn is_punct(&self, c: u8) -> bool {
        self.token.is_punct(c)
    }

    /// Whether the current token is the identifier `name`, by identity.
    pub fn is_name(&self, name: SymbolId) -> bool {
        self.token.symbol() == Some(name)
    }

    pub fn is_keyword(&self, keywords: &Keywords) -> bool {
        self.token.symbol().is_some_and(|id| keywords.contains(id))
    }

    /// Consume the current token if it is the punctuation `c`.
    pub fn match_punct(&mut self, c: u8) -> Result<bool, LexerError> {
        if self.is_punct(c) {
            self.next_token()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Scan all remaining tokens, ending with (and including) end-of-input.
    pub fn scan_tokens(&mut self) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();

        loop {
            let token = self.token;
            tokens.push(token);
            if token.is_eof() {
                break;
            }
            self.next_token()?;
        }

        Ok(tokens)
    }

    /// Replace the current token with the next one from the source.
    pub fn next_token(&mut self) -> Result<(), LexerError> {
        self.skip_whitespace();
        self.mark_start();

        let Some(c) = self.peek() else {
            self.token = Token::eof(self.current_pos, self.line, self.column);
            return Ok(());
        };

        let (kind, modifier) = match c {
            b'\'' => self.scan_char(),
            b'"' => {
                self.advance();
                return Err(LexerError::StringLiteral(self.current_span()));
            }
            b'.' => self.scan_float(),
            b'0'..=b'9' => {
                if self.number_is_float() {
                    self.scan_float()
                } else {
                    self.scan_int()
                }
            }
            c if c.is_ascii_alphabetic() || c == b'_' => self.scan_identifier(),
            c => {
                self.advance();
                (TokenKind::Punct(c), TokenMod::None)
            }
        };

        self.token = self.make_token(kind, modifier);
        Ok(())
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(is_space) {
            self.advance();
        }
    }

    /// Look past the leading digit run for a `.` or exponent marker.
    fn number_is_float(&self) -> bool {
        let rest = &self.bytes[self.current_pos..];
        let digits = rest.iter().take_while(|c| c.is_ascii_digit()).count();
        matches!(rest.get(digits), Some(b'.' | b'e' | b'E'))
    }

    fn scan_char(&mut self) -> (TokenKind, TokenMod) {
        self.advance(); // opening quote

        let mut value = 0u8;
        match self.peek() {
            Some(b'\'') => {
                self.advance();
                self.diagnostics
                    .push(LexerError::EmptyChar(self.current_span()));
                return (TokenKind::Int(0), TokenMod::Char);
            }
            Some(b'\n') => {
                self.advance();
                self.diagnostics
                    .push(LexerError::NewlineInChar(self.current_span()));
            }
            Some(b'\\') => {
                self.advance();
                if let Some(escape) = self.peek() {
                    self.advance();
                    match escape_to_byte(escape) {
                        Some(byte) => value = byte,
                        None => self.diagnostics.push(LexerError::InvalidEscape(
                            escape as char,
                            self.current_span(),
                        )),
                    }
                }
            }
            Some(c) => {
                self.advance();
                value = c;
            }
            None => {}
        }

        if self.peek() == Some(b'\'') {
            self.advance();
        } else {
            let found = self.peek();
            self.diagnostics
                .push(LexerError::unterminated_char(found, self.current_span()));
        }

        (TokenKind::Int(value as u64), TokenMod::Char)
    }

    fn scan_float(&mut self) -> (TokenKind, TokenMod) {
        self.skip_digits();
        if self.peek() == Some(b'.') {
            self.advance();
        }
        self.skip_digits();
        let mut literal_end = self.current_pos;

        if matches!(self.peek(), Some(b'e' | b'E')) {
            self.advance();
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.advance();
            }
            if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.skip_digits();
                literal_end = self.current_pos;
            } else {
                let found = self.peek();
                self.diagnostics.push(LexerError::missing_exponent_digits(
                    found,
                    self.current_span(),
                ));
            }
        }

        // A bare "." has no digits at all and reads as zero.
        let text = &self.source[self.start_pos..literal_end];
        let value: f64 = text.parse().unwrap_or(0.0);
        if value.is_infinite() {
            self.diagnostics
                .push(LexerError::FloatOutOfRange(self.current_span()));
        }

        (TokenKind::Float(value), TokenMod::None)
    }

    fn scan_int(&mut self) -> (TokenKind, TokenMod) {
        let mut base = 10;
        let mut modifier = TokenMod::Dec;

        if self.peek() == Some(b'0') {
            match self.peek_at(1).map(|c| c.to_ascii_lowercase()) {
                Some(b'x') => {
                    self.advance();
                    self.advance();
                    base = 16;
                    modifier = TokenMod::Hex;
                }
                Some(b'b') => {
                    self.advance();
                    self.advance();
                    base = 2;
                    modifier = TokenMod::Bin;
                }
                Some(c) if c.is_ascii_digit() => {
                    base = 8;
                    modifier = TokenMod::Oct;
                }
                _ => {}
            }
        }

        let mut value: u64 = 0;
        while let Some(c) = self.peek() {
            if c == b'_' {
                self.advance();
                continue;
            }
            let Some(digit) = digit_value(c) else {
                break;
            };
            if digit >= base {
                let span = Span::new(
                    self.current_pos,
                    self.current_pos + 1,
                    self.line,
                    self.column,
                );
                self.diagnostics
                    .push(LexerError::digit_out_of_range(c, base, span));
            }
            if value > (u64::MAX - digit) / base {
                // Keep the rest of the run inside this token.
                while self.peek().is_some_and(|c| c == b'_' || digit_value(c).is_some()) {
                    self.advance();
                }
                self.diagnostics
                    .push(LexerError::IntegerOverflow(self.current_span()));
                value = 0;
                break;
            }
            value = value * base + digit;
            self.advance();
        }

        (TokenKind::Int(value), modifier)
    }

    fn scan_identifier(&mut self) -> (TokenKind, TokenMod) {
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
        {
            self.advance();
        }

        let name = &self.source[self.start_pos..self.current_pos];
        let id = self.symbols.intern(name);
        (TokenKind::Name(id), TokenMod::None)
    }

    fn skip_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn advance(&mut self) -> Option<u8> {
        let c = *self.bytes.get(self.current_pos)?;
        self.current_pos += 1;
        if c == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.current_pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<u8> {
        self.bytes.get(self.current_pos + n).copied()
    }

    fn mark_start(&mut self) {
        self.start_pos = self.current_pos;
        self.start_line = self.line;
        self.start_column = self.column;
    }

    fn current_span(&self) -> Span {
        Span::new(
            self.start_pos,
            self.current_pos,
            self.start_line,
            self.start_column,
        )
    }

    fn make_token(&self, kind: TokenKind, modifier: TokenMod) -> Token {
        Token::new(kind, modifier, self.current_span())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scan(source: &str) -> (Vec<TokenKind>, Vec<LexerError>) {
        let mut symbols = SymbolTable::new();
        let mut scanner = Scanner::new(source, &mut symbols).unwrap();
        let tokens = scanner.scan_tokens().unwrap();
        let diagnostics = scanner.take_diagnostics();
        (tokens.into_iter().map(|t| t.kind).collect(), diagnostics)
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (kinds, diagnostics) = scan(source);
        assert!(diagnostics.is_empty(), "unexpected diagnostics: {:?}", diagnostics);
        kinds
    }

    #[test]
    fn test_integer_literals() {
        assert_eq!(
            kinds("18446744073709551615 0xffff_ffff_ffff_ffff 0b1111 042"),
            vec![
                TokenKind::Int(18446744073709551615),
                TokenKind::Int(0xffff_ffff_ffff_ffff),
                TokenKind::Int(0xf),
                TokenKind::Int(0o42),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_integer_modifiers() {
        let mut symbols = SymbolTable::new();
        let mut scanner = Scanner::new("0x1F 0B10 017 9 0 'a'", &mut symbols).unwrap();
        let mods: Vec<TokenMod> = scanner
            .scan_tokens()
            .unwrap()
            .iter()
            .map(|t| t.modifier)
            .collect();
        assert_eq!(
            mods,
            vec![
                TokenMod::Hex,
                TokenMod::Bin,
                TokenMod::Oct,
                TokenMod::Dec,
                TokenMod::Dec,
                TokenMod::Char,
                TokenMod::None,
            ]
        );
    }

    #[test]
    fn test_float_literals() {
        assert_eq!(
            kinds("3.14 .123 42. 3e10"),
            vec![
                TokenKind::Float(3.14),
                TokenKind::Float(0.123),
                TokenKind::Float(42.0),
                TokenKind::Float(3e10),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_float_exponent_forms() {
        assert_eq!(
            kinds("1e-3 2E+2 1.5e2"),
            vec![
                TokenKind::Float(1e-3),
                TokenKind::Float(200.0),
                TokenKind::Float(150.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_char_literals() {
        assert_eq!(
            kinds(r"'a' '\n' '\r'"),
            vec![
                TokenKind::Int(97),
                TokenKind::Int(10),
                TokenKind::Int(13),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_char_escapes() {
        assert_eq!(
            kinds(r"'\0' '\\' '\'' '\t' '\v'"),
            vec![
                TokenKind::Int(0),
                TokenKind::Int(b'\\' as u64),
                TokenKind::Int(b'\'' as u64),
                TokenKind::Int(9),
                TokenKind::Int(11),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_misc_tokens() {
        let mut symbols = SymbolTable::new();
        let xy = symbols.intern("XY");
        let hello = symbols.intern("_HELLO1");
        let mut scanner = Scanner::new("XY+(XY)_HELLO1,234+994", &mut symbols).unwrap();
        let tokens: Vec<TokenKind> = scanner
            .scan_tokens()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect();
        assert_eq!(
            tokens,
            vec![
                TokenKind::Name(xy),
                TokenKind::Punct(b'+'),
                TokenKind::Punct(b'('),
                TokenKind::Name(xy),
                TokenKind::Punct(b')'),
                TokenKind::Name(hello),
                TokenKind::Punct(b','),
                TokenKind::Int(234),
                TokenKind::Punct(b'+'),
                TokenKind::Int(994),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_all_whitespace_is_skipped() {
        assert_eq!(
            kinds(" \t\r\n\x0B\x0C1"),
            vec![TokenKind::Int(1), TokenKind::Eof]
        );
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_spans_are_end_exclusive() {
        let mut symbols = SymbolTable::new();
        let mut scanner = Scanner::new("  abc\n 0x10", &mut symbols).unwrap();
        let tokens = scanner.scan_tokens().unwrap();
        assert_eq!(tokens[0].span, Span::new(2, 5, 1, 3));
        assert_eq!(tokens[1].span, Span::new(7, 11, 2, 2));
        assert_eq!(tokens[2].span, Span::new(11, 11, 2, 6));
    }

    #[test]
    fn test_digit_out_of_range_is_diagnostic() {
        let (tokens, diagnostics) = scan("09 1");
        // Accumulation continues with the out-of-range digit.
        assert_eq!(tokens, vec![TokenKind::Int(9), TokenKind::Int(1), TokenKind::Eof]);
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            diagnostics[0],
            LexerError::DigitOutOfRange { digit: '9', base: 8, .. }
        ));
    }

    #[test]
    fn test_binary_digit_out_of_range() {
        let (_, diagnostics) = scan("0b102");
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            diagnostics[0],
            LexerError::DigitOutOfRange { digit: '2', base: 2, .. }
        ));
    }

    #[test]
    fn test_integer_overflow_resets_and_consumes_run() {
        let (tokens, diagnostics) = scan("18446744073709551616999 + 1");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Int(0),
                TokenKind::Punct(b'+'),
                TokenKind::Int(1),
                TokenKind::Eof,
            ]
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(diagnostics[0], LexerError::IntegerOverflow(_)));
        assert_eq!(diagnostics[0].span().len(), 23);
    }

    #[test]
    fn test_hex_overflow() {
        let (tokens, diagnostics) = scan("0x1_0000_0000_0000_0000");
        assert_eq!(tokens, vec![TokenKind::Int(0), TokenKind::Eof]);
        assert!(matches!(diagnostics[..], [LexerError::IntegerOverflow(_)]));
    }

    #[test]
    fn test_char_diagnostics() {
        let mut symbols = SymbolTable::new();
        let b = symbols.intern("b");
        let mut scanner = Scanner::new("'' 'ab'", &mut symbols).unwrap();
        let tokens: Vec<TokenKind> = scanner
            .scan_tokens()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect();
        // The quote after 'b' opens a second literal that hits end of input.
        assert_eq!(
            tokens,
            vec![
                TokenKind::Int(0),
                TokenKind::Int(b'a' as u64),
                TokenKind::Name(b),
                TokenKind::Int(0),
                TokenKind::Eof,
            ]
        );
        let diagnostics = scanner.take_diagnostics();
        assert!(matches!(
            diagnostics[..],
            [
                LexerError::EmptyChar(_),
                LexerError::UnterminatedChar { .. },
                LexerError::UnterminatedChar { .. },
            ]
        ));
        assert!(diagnostics.iter().all(|d| !d.is_fatal()));
    }

    #[test]
    fn test_invalid_escape() {
        let (tokens, diagnostics) = scan(r"'\q'");
        assert_eq!(tokens, vec![TokenKind::Int(0), TokenKind::Eof]);
        assert!(matches!(diagnostics[..], [LexerError::InvalidEscape('q', _)]));
    }

    #[test]
    fn test_newline_in_char() {
        let (tokens, diagnostics) = scan("'\n' 5");
        assert_eq!(tokens, vec![TokenKind::Int(0), TokenKind::Int(5), TokenKind::Eof]);
        assert!(matches!(diagnostics[..], [LexerError::NewlineInChar(_)]));
    }

    #[test]
    fn test_unterminated_char_at_end() {
        let (tokens, diagnostics) = scan("'x");
        assert_eq!(tokens, vec![TokenKind::Int(b'x' as u64), TokenKind::Eof]);
        assert!(matches!(diagnostics[..], [LexerError::UnterminatedChar { .. }]));
    }

    #[test]
    fn test_float_diagnostics() {
        let (tokens, diagnostics) = scan("1e 1e400");
        assert_eq!(tokens[0], TokenKind::Float(1.0));
        assert_eq!(tokens[1], TokenKind::Float(f64::INFINITY));
        assert!(matches!(diagnostics[0], LexerError::MissingExponentDigits { .. }));
        assert!(matches!(diagnostics[1], LexerError::FloatOutOfRange(_)));
    }

    #[test]
    fn test_lone_dot_reads_as_zero() {
        assert_eq!(
            kinds(". 1"),
            vec![TokenKind::Float(0.0), TokenKind::Int(1), TokenKind::Eof]
        );
    }

    #[test]
    fn test_string_literal_is_fatal() {
        let mut symbols = SymbolTable::new();
        let err = Scanner::new("\"hi\"", &mut symbols).err().unwrap();
        assert!(err.is_fatal());
        assert_eq!(err.span(), Span::new(0, 1, 1, 1));

        let mut scanner = Scanner::new("1 \"", &mut symbols).unwrap();
        assert!(scanner.next_token().is_err());
    }

    #[test]
    fn test_identifiers_share_symbols() {
        let mut symbols = SymbolTable::new();
        let keywords = Keywords::new(&mut symbols);
        let mut scanner = Scanner::new("while foo foo", &mut symbols).unwrap();
        assert!(scanner.is_name(keywords.while_kw));
        assert!(scanner.is_keyword(&keywords));
        scanner.next_token().unwrap();
        let foo = scanner.token().symbol().unwrap();
        assert!(!scanner.is_keyword(&keywords));
        scanner.next_token().unwrap();
        assert!(scanner.is_name(foo));
        assert_eq!(scanner.symbols().get(foo), Some("foo"));
    }

    #[test]
    fn test_init_restarts() {
        let mut symbols = SymbolTable::new();
        let mut scanner = Scanner::new("1", &mut symbols).unwrap();
        assert!(scanner.is_token(TokenKind::Int(1)));
        scanner.init("(2").unwrap();
        assert!(scanner.match_punct(b'(').unwrap());
        assert!(scanner.is_token(TokenKind::Int(2)));
        assert!(!scanner.match_punct(b')').unwrap());
    }
}
