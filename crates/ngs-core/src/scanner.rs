/*!
# Scanner

Token scanner for JavaScript source.

Whitespace and comments are skipped. String, template and regular
expression literals come out as single tokens, so delimiters inside them
never take part in brace matching. Tokens only carry byte spans; their
text is always sliced from the original source, which keeps every emitted
fragment byte-for-byte identical to the input.
*/

use thiserror::Error;

/// Keywords after which a `/` starts a regular expression rather than a division
const EXPRESSION_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do",
    "else", "yield", "await",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifiers and keywords
    Ident,
    Number,
    /// Single or double quoted string
    Str,
    /// Backtick template, including any `${}` parts
    Template,
    Regex,
    Punct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn text<'src>(&self, source: &'src str) -> &'src str {
        &source[self.start..self.end]
    }

    pub fn is_punct(&self, source: &str, punct: &str) -> bool {
        self.kind == TokenKind::Punct && self.text(source) == punct
    }

    pub fn is_ident(&self, source: &str, word: &str) -> bool {
        self.kind == TokenKind::Ident && self.text(source) == word
    }

    /// Decoded contents of a string token, or of a template without substitutions
    pub fn string_value(&self, source: &str) -> Option<String> {
        let text = self.text(source);
        match self.kind {
            TokenKind::Str => Some(unescape(&text[1..text.len() - 1])),
            TokenKind::Template if !text.contains("${") => Some(unescape(&text[1..text.len() - 1])),
            _ => None,
        }
    }
}

/// Scanning or structural error with the byte offset it was detected at
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (at byte {offset})")]
pub struct SyntaxError {
    pub message: String,
    pub offset: usize,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }

    /// 1-based line and column of the error within `source`
    pub fn line_col(&self, source: &str) -> (usize, usize) {
        line_col(source, self.offset)
    }
}

/// 1-based line and column of a byte offset
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |idx| idx + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

pub struct Scanner<'src> {
    source: &'src str,
    bytes: &'src [u8],
    pos: usize,
    prev: Option<Token>,
}

impl<'src> Scanner<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            prev: None,
        }
    }

    /// Scan the whole source
    pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
        let mut scanner = Scanner::new(source);
        let mut tokens = Vec::new();
        while let Some(token) = scanner.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// Next code-level token, `None` at end of input
    pub fn next_token(&mut self) -> Result<Option<Token>, SyntaxError> {
        self.skip_trivia()?;

        let start = self.pos;
        let Some(&byte) = self.bytes.get(start) else {
            return Ok(None);
        };

        let kind = match byte {
            b'"' | b'\'' => {
                self.scan_string(byte)?;
                TokenKind::Str
            }
            b'`' => {
                self.scan_template()?;
                TokenKind::Template
            }
            b'/' if self.regex_allowed() => {
                self.scan_regex()?;
                TokenKind::Regex
            }
            b'0'..=b'9' => {
                self.scan_number();
                TokenKind::Number
            }
            b'.' if self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) => {
                self.scan_number();
                TokenKind::Number
            }
            b if is_ident_start(b) => {
                self.scan_ident();
                TokenKind::Ident
            }
            _ => {
                self.scan_punct();
                TokenKind::Punct
            }
        };

        let token = Token {
            kind,
            start,
            end: self.pos,
        };
        self.prev = Some(token);
        Ok(Some(token))
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn skip_trivia(&mut self) -> Result<(), SyntaxError> {
        if self.pos == 0 {
            if self.source.starts_with('\u{FEFF}') {
                self.pos += '\u{FEFF}'.len_utf8();
            }
            if self.source[self.pos..].starts_with("#!") {
                self.skip_line();
            }
        }
        while let Some(byte) = self.peek_at(0) {
            match byte {
                b if b.is_ascii_whitespace() => self.pos += 1,
                b if !b.is_ascii() => match self.source[self.pos..].chars().next() {
                    Some(c) if is_unicode_space(c) => self.pos += c.len_utf8(),
                    _ => break,
                },
                b'/' if self.peek_at(1) == Some(b'/') => self.skip_line(),
                b'/' if self.peek_at(1) == Some(b'*') => {
                    let start = self.pos;
                    match self.source[self.pos + 2..].find("*/") {
                        Some(idx) => self.pos += idx + 4,
                        None => return Err(SyntaxError::new("unterminated block comment", start)),
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn skip_line(&mut self) {
        match self.source[self.pos..].find('\n') {
            Some(idx) => self.pos += idx + 1,
            None => self.pos = self.bytes.len(),
        }
    }

    fn regex_allowed(&self) -> bool {
        let Some(prev) = self.prev else {
            return true;
        };
        let text = prev.text(self.source);
        match prev.kind {
            TokenKind::Ident => EXPRESSION_KEYWORDS.contains(&text),
            TokenKind::Punct => !matches!(text, ")" | "]" | "}"),
            _ => false,
        }
    }

    fn scan_string(&mut self, quote: u8) -> Result<(), SyntaxError> {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.peek_at(0) {
                None | Some(b'\n') => {
                    return Err(SyntaxError::new("unterminated string literal", start));
                }
                Some(b'\\') => self.pos += 2,
                Some(b) if b == quote => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn scan_template(&mut self) -> Result<(), SyntaxError> {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.peek_at(0) {
                None => return Err(SyntaxError::new("unterminated template literal", start)),
                Some(b'\\') => self.pos += 2,
                Some(b'`') => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(b'$') if self.peek_at(1) == Some(b'{') => {
                    self.pos += 2;
                    self.scan_substitution(start)?;
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    /// Consume a `${ ... }` body up to and including its closing brace
    fn scan_substitution(&mut self, template_start: usize) -> Result<(), SyntaxError> {
        self.prev = None;
        let mut depth = 0usize;
        loop {
            let token = self.next_token()?.ok_or_else(|| {
                SyntaxError::new("unterminated template substitution", template_start)
            })?;
            if token.is_punct(self.source, "{") {
                depth += 1;
            } else if token.is_punct(self.source, "}") {
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
            }
        }
    }

    fn scan_regex(&mut self) -> Result<(), SyntaxError> {
        let start = self.pos;
        self.pos += 1;
        let mut in_class = false;
        loop {
            match self.peek_at(0) {
                None | Some(b'\n') => {
                    return Err(SyntaxError::new("unterminated regular expression", start));
                }
                Some(b'\\') => self.pos += 2,
                Some(b'[') => {
                    in_class = true;
                    self.pos += 1;
                }
                Some(b']') => {
                    in_class = false;
                    self.pos += 1;
                }
                Some(b'/') if !in_class => {
                    self.pos += 1;
                    break;
                }
                Some(_) => self.pos += 1,
            }
        }
        while self.peek_at(0).is_some_and(is_ident_part) {
            self.pos += 1;
        }
        Ok(())
    }

    fn scan_number(&mut self) {
        let start = self.pos;
        let hex = self.source[start..].starts_with("0x") || self.source[start..].starts_with("0X");
        while let Some(byte) = self.peek_at(0) {
            let exponent_sign = matches!(byte, b'+' | b'-')
                && !hex
                && matches!(self.bytes[self.pos - 1], b'e' | b'E');
            if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'.' || exponent_sign {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn scan_ident(&mut self) {
        while let Some(c) = self.source[self.pos..].chars().next() {
            let part = if c.is_ascii() {
                is_ident_part(c as u8)
            } else {
                !is_unicode_space(c)
            };
            if !part {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn scan_punct(&mut self) {
        let rest = &self.source[self.pos..];
        if rest.starts_with("...") {
            self.pos += 3;
        } else if rest.starts_with("=>") {
            self.pos += 2;
        } else {
            self.pos += 1;
        }
    }
}

/// Non-ASCII characters that separate tokens: Unicode white space and the BOM
fn is_unicode_space(c: char) -> bool {
    c == '\u{FEFF}' || c.is_whitespace()
}

fn is_ident_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_' || byte == b'$' || byte >= 0x80
}

fn is_ident_part(byte: u8) -> bool {
    is_ident_start(byte) || byte.is_ascii_digit()
}

/// Whether `text` can be used as a bare identifier (`this.<text>`, class names)
pub fn is_identifier(text: &str) -> bool {
    let bytes = text.as_bytes();
    match bytes.first() {
        Some(&first) if is_ident_start(first) => bytes[1..].iter().all(|&b| is_ident_part(b)),
        _ => false,
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\n') | None => {}
            Some(other) => out.push(other),
        }
    }
    out
}

/// Index of the delimiter closing `tokens[open]`.
///
/// `(`, `[` and `{` are tracked together so a mismatch anywhere inside the
/// range is reported instead of silently pairing the wrong delimiters.
pub fn find_matching(tokens: &[Token], open: usize, source: &str) -> Result<usize, SyntaxError> {
    let opener = tokens
        .get(open)
        .ok_or_else(|| SyntaxError::new("expected an opening delimiter", source.len()))?;
    if opener.kind != TokenKind::Punct || !matches!(opener.text(source), "(" | "[" | "{") {
        return Err(SyntaxError::new("expected an opening delimiter", opener.start));
    }

    let mut stack: Vec<(&str, usize)> = Vec::new();
    for (idx, token) in tokens.iter().enumerate().skip(open) {
        if token.kind != TokenKind::Punct {
            continue;
        }
        let text = token.text(source);
        match text {
            "(" | "[" | "{" => stack.push((text, token.start)),
            ")" | "]" | "}" => {
                let Some((opener, _)) = stack.pop() else {
                    return Err(SyntaxError::new(format!("unexpected '{text}'"), token.start));
                };
                if closer_for(opener) != text {
                    return Err(SyntaxError::new(
                        format!("mismatched delimiter: '{opener}' closed by '{text}'"),
                        token.start,
                    ));
                }
                if stack.is_empty() {
                    return Ok(idx);
                }
            }
            _ => {}
        }
    }
    let offset = stack.last().map_or(0, |(_, start)| *start);
    Err(SyntaxError::new("unclosed delimiter", offset))
}

fn closer_for(opener: &str) -> &'static str {
    match opener {
        "(" => ")",
        "[" => "]",
        _ => "}",
    }
}
