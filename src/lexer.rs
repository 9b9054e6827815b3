//! Lexer (§10, ambient)
//!
//! Scans a source string into a flat token vector with per-token source
//! locations. Deliberately thin compared to §4's core: grounded on the
//! original's `Lexer::read_token_from_stream` character-class dispatch and
//! integer/float suffix handling, reimplemented over a `Peekable<Chars>`
//! instead of an input stream.

use crate::diagnostics::{LexError, SourceLocation};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Keyword(Keyword),
    IntLiteral { text: String, unsigned: bool, long: u8 },
    FloatLiteral { text: String, is_float: bool, is_long_double: bool },
    StringLiteral(String),
    CharLiteral(u8),
    Punct(&'static str),
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Int,
    Char,
    Short,
    Long,
    Unsigned,
    Signed,
    Float,
    Double,
    Void,
    Struct,
    Union,
    If,
    Else,
    While,
    Do,
    For,
    Switch,
    Case,
    Default,
    Break,
    Continue,
    Return,
    Goto,
    Sizeof,
    Extern,
    Static,
}

fn keyword_of(word: &str) -> Option<Keyword> {
    use Keyword::*;
    Some(match word {
        "int" => Int,
        "char" => Char,
        "short" => Short,
        "long" => Long,
        "unsigned" => Unsigned,
        "signed" => Signed,
        "float" => Float,
        "double" => Double,
        "void" => Void,
        "struct" => Struct,
        "union" => Union,
        "if" => If,
        "else" => Else,
        "while" => While,
        "do" => Do,
        "for" => For,
        "switch" => Switch,
        "case" => Case,
        "default" => Default,
        "break" => Break,
        "continue" => Continue,
        "return" => Return,
        "goto" => Goto,
        "sizeof" => Sizeof,
        "extern" => Extern,
        "static" => Static,
        _ => return None,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub loc: SourceLocation,
}

/// Multi-character punctuation, longest first so the scanner can match
/// greedily.
const PUNCT: &[&str] = &[
    "<<=", ">>=", "...", "->", "++", "--", "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "+=",
    "-=", "*=", "/=", "%=", "&=", "|=", "^=", "+", "-", "*", "/", "%", "=", "<", ">", "!", "~",
    "&", "|", "^", "(", ")", "{", "}", "[", "]", ";", ":", ",", "?", ".",
];

pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    src: &'a str,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer {
            chars: src.char_indices().peekable(),
            src,
            line: 1,
            column: 1,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                return Ok(tokens);
            }
        }
    }

    fn loc(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    fn bump(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn peek_at(&self, byte_offset: usize) -> Option<char> {
        self.src[byte_offset..].chars().next()
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let rest_idx = self.chars.peek().map(|&(i, _)| i).unwrap();
                    if self.peek_at(rest_idx + 1) == Some('/') {
                        while let Some(c) = self.peek() {
                            if c == '\n' {
                                break;
                            }
                            self.bump();
                        }
                    } else if self.peek_at(rest_idx + 1) == Some('*') {
                        self.bump();
                        self.bump();
                        loop {
                            match self.peek() {
                                None => break,
                                Some('*') => {
                                    self.bump();
                                    if self.peek() == Some('/') {
                                        self.bump();
                                        break;
                                    }
                                }
                                Some(_) => {
                                    self.bump();
                                }
                            }
                        }
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_trivia();
        let start = self.loc();
        let Some(c) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                loc: start,
            });
        };

        if c.is_alphabetic() || c == '_' {
            return Ok(self.lex_ident_or_keyword(start));
        }
        if c.is_ascii_digit() {
            return self.lex_number(start);
        }
        if c == '"' {
            return self.lex_string(start);
        }
        if c == '\'' {
            return self.lex_char(start);
        }
        for p in PUNCT {
            if self.matches_punct(p) {
                for _ in 0..p.chars().count() {
                    self.bump();
                }
                return Ok(Token {
                    kind: TokenKind::Punct(p),
                    loc: start,
                });
            }
        }
        Err(LexError {
            message: format!("unknown character '{}'", c),
            loc: start,
        })
    }

    fn matches_punct(&mut self, p: &str) -> bool {
        let idx = match self.chars.peek() {
            Some(&(i, _)) => i,
            None => return false,
        };
        self.src[idx..].starts_with(p)
    }

    fn lex_ident_or_keyword(&mut self, start: SourceLocation) -> Token {
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                s.push(c);
                self.bump();
            } else {
                break;
            }
        }
        let kind = match keyword_of(&s) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Ident(s),
        };
        Token { kind, loc: start }
    }

    fn lex_number(&mut self, start: SourceLocation) -> Result<Token, LexError> {
        let mut text = String::new();
        let mut is_hex = false;
        if self.peek() == Some('0') {
            text.push('0');
            self.bump();
            if matches!(self.peek(), Some('x') | Some('X')) {
                is_hex = true;
                text.push(self.peek().unwrap());
                self.bump();
            }
        }
        while let Some(c) = self.peek() {
            let is_digit = if is_hex { c.is_ascii_hexdigit() } else { c.is_ascii_digit() };
            if is_digit {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        let mut is_float = false;
        if self.peek() == Some('.') {
            is_float = true;
            text.push('.');
            self.bump();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            is_float = true;
            text.push(self.peek().unwrap());
            self.bump();
            if matches!(self.peek(), Some('+') | Some('-')) {
                text.push(self.peek().unwrap());
                self.bump();
            }
            let mut saw_digit = false;
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    saw_digit = true;
                    text.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
            if !saw_digit {
                return Err(LexError {
                    message: "malformed floating literal: missing exponent digits".into(),
                    loc: start,
                });
            }
        }

        if is_float {
            let mut is_f32 = false;
            let mut is_ld = false;
            match self.peek() {
                Some('f') | Some('F') => {
                    is_f32 = true;
                    self.bump();
                }
                Some('l') | Some('L') => {
                    is_ld = true;
                    self.bump();
                }
                _ => {}
            }
            return Ok(Token {
                kind: TokenKind::FloatLiteral {
                    text,
                    is_float: is_f32,
                    is_long_double: is_ld,
                },
                loc: start,
            });
        }

        let mut unsigned = false;
        let mut long = 0u8;
        loop {
            match self.peek() {
                Some('u') | Some('U') if !unsigned => {
                    unsigned = true;
                    self.bump();
                }
                Some('l') | Some('L') if long < 2 => {
                    long += 1;
                    self.bump();
                }
                _ => break,
            }
        }
        Ok(Token {
            kind: TokenKind::IntLiteral {
                text,
                unsigned,
                long,
            },
            loc: start,
        })
    }

    fn lex_string(&mut self, start: SourceLocation) -> Result<Token, LexError> {
        self.bump();
        let mut s = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(LexError {
                        message: "unterminated string literal".into(),
                        loc: start,
                    });
                }
                Some('"') => break,
                Some('\\') => {
                    let esc = self.bump().ok_or_else(|| LexError {
                        message: "unterminated escape sequence".into(),
                        loc: start,
                    })?;
                    s.push(unescape(esc));
                }
                Some(c) => s.push(c),
            }
        }
        Ok(Token {
            kind: TokenKind::StringLiteral(s),
            loc: start,
        })
    }

    fn lex_char(&mut self, start: SourceLocation) -> Result<Token, LexError> {
        self.bump();
        let c = match self.bump() {
            Some('\\') => {
                let esc = self.bump().ok_or_else(|| LexError {
                    message: "unterminated escape sequence".into(),
                    loc: start,
                })?;
                unescape(esc) as u8
            }
            Some(c) => c as u8,
            None => {
                return Err(LexError {
                    message: "unterminated character literal".into(),
                    loc: start,
                });
            }
        };
        if self.bump() != Some('\'') {
            return Err(LexError {
                message: "malformed character literal".into(),
                loc: start,
            });
        }
        Ok(Token {
            kind: TokenKind::CharLiteral(c),
            loc: start,
        })
    }
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        '\\' => '\\',
        '\'' => '\'',
        '"' => '"',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_keywords_and_identifiers() {
        let ks = kinds("int main");
        assert_eq!(
            ks,
            vec![
                TokenKind::Keyword(Keyword::Int),
                TokenKind::Ident("main".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_integer_suffixes() {
        let ks = kinds("42UL");
        match &ks[0] {
            TokenKind::IntLiteral {
                text,
                unsigned,
                long,
            } => {
                assert_eq!(text, "42");
                assert!(unsigned);
                assert_eq!(*long, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn lexes_multi_char_punctuation_greedily() {
        let ks = kinds("a+=1");
        assert!(matches!(ks[1], TokenKind::Punct("+=")));
    }

    #[test]
    fn skips_line_and_block_comments() {
        let ks = kinds("1 // comment\n/* block */2");
        assert!(matches!(ks[0], TokenKind::IntLiteral { .. }));
        assert!(matches!(ks[1], TokenKind::IntLiteral { .. }));
    }

    #[test]
    fn unknown_character_is_a_lex_error() {
        assert!(Lexer::new("`").tokenize().is_err());
    }
}
