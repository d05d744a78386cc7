//! Lexer
//!
//! This submodule prepares source code for parsing by splitting the text into
//! easy-to-work-with tokens. The [tokenize] function is its main interface.
//!
//! Lexing never fails: bytes that start no known token are emitted as
//! [TokenKind::Unknown] and rejected later by the parser.

use std::fmt;

/// The different kinds of tokens, without their payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Number,
    Identifier,

    Var,
    Function,
    If,
    Else,
    While,
    Return,
    True,
    False,

    Plus,
    Minus,
    Multiply,
    Divide,
    Assign,

    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    LogicalAnd,
    LogicalOr,
    LogicalNot,

    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Semicolon,

    Eof,
    Unknown,
}

/// A token together with its original spelling and source location
///
/// `line` and `column` are 1-based and refer to the first byte of the lexeme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: u32,
    pub column: u32,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Line {}, Col {}: {:?} '{}'",
            self.line, self.column, self.kind, self.lexeme
        )
    }
}

fn keyword(ident: &str) -> Option<TokenKind> {
    let kind = match ident {
        "var" => TokenKind::Var,
        "function" => TokenKind::Function,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "return" => TokenKind::Return,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        _ => return None,
    };
    Some(kind)
}

/// Tokenize source code
///
/// The returned sequence always ends with a single [TokenKind::Eof] token.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();

    loop {
        let token = lexer.next_token();
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            break;
        }
    }

    tokens
}

struct Lexer<'src> {
    source: &'src str,
    input: &'src [u8],
    current: usize,
    line: u32,
    column: u32,
}

impl<'src> Lexer<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            source,
            input: source.as_bytes(),
            current: 0,
            line: 1,
            column: 1,
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.input.len()
    }

    /// The byte `offset` positions ahead, or NUL past the end
    fn peek(&self, offset: usize) -> u8 {
        match self.input.get(self.current + offset) {
            Some(&c) => c,
            None => 0,
        }
    }

    fn advance(&mut self) -> u8 {
        let c = self.input[self.current];
        self.current += 1;
        if c == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

    /// Skip whitespace and `//` line comments until the next lexeme starts
    fn skip_trivia(&mut self) {
        loop {
            match self.peek(0) {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.advance();
                }
                b'/' if self.peek(1) == b'/' => {
                    while !self.is_at_end() && self.peek(0) != b'\n' {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn next_token(&mut self) -> Token {
        self.skip_trivia();

        if self.is_at_end() {
            return Token::new(TokenKind::Eof, "", self.line, self.column);
        }

        let line = self.line;
        let column = self.column;

        let c = self.peek(0);
        if c.is_ascii_digit() {
            return self.number(line, column);
        }
        if c.is_ascii_alphabetic() || c == b'_' {
            return self.identifier(line, column);
        }

        self.advance();
        let token = |kind: TokenKind, lexeme: &str| Token::new(kind, lexeme, line, column);

        match c {
            b'+' => token(TokenKind::Plus, "+"),
            b'-' => token(TokenKind::Minus, "-"),
            b'*' => token(TokenKind::Multiply, "*"),
            b'/' => token(TokenKind::Divide, "/"),
            b'(' => token(TokenKind::LeftParen, "("),
            b')' => token(TokenKind::RightParen, ")"),
            b'{' => token(TokenKind::LeftBrace, "{"),
            b'}' => token(TokenKind::RightBrace, "}"),
            b',' => token(TokenKind::Comma, ","),
            b';' => token(TokenKind::Semicolon, ";"),
            b'!' => {
                if self.peek(0) == b'=' {
                    self.advance();
                    token(TokenKind::NotEqual, "!=")
                } else {
                    token(TokenKind::LogicalNot, "!")
                }
            }
            b'=' => {
                if self.peek(0) == b'=' {
                    self.advance();
                    token(TokenKind::Equal, "==")
                } else {
                    token(TokenKind::Assign, "=")
                }
            }
            b'<' => {
                if self.peek(0) == b'=' {
                    self.advance();
                    token(TokenKind::LessEqual, "<=")
                } else {
                    token(TokenKind::LessThan, "<")
                }
            }
            b'>' => {
                if self.peek(0) == b'=' {
                    self.advance();
                    token(TokenKind::GreaterEqual, ">=")
                } else {
                    token(TokenKind::GreaterThan, ">")
                }
            }
            b'&' => {
                if self.peek(0) == b'&' {
                    self.advance();
                    token(TokenKind::LogicalAnd, "&&")
                } else {
                    token(TokenKind::Unknown, "&")
                }
            }
            b'|' => {
                if self.peek(0) == b'|' {
                    self.advance();
                    token(TokenKind::LogicalOr, "||")
                } else {
                    token(TokenKind::Unknown, "|")
                }
            }
            _ => Token::new(TokenKind::Unknown, (c as char).to_string(), line, column),
        }
    }

    /// Maximal run of decimal digits
    fn number(&mut self, line: u32, column: u32) -> Token {
        let start = self.current;
        while self.peek(0).is_ascii_digit() {
            self.advance();
        }
        Token::new(
            TokenKind::Number,
            &self.source[start..self.current],
            line,
            column,
        )
    }

    /// Maximal identifier run, then a keyword table lookup
    fn identifier(&mut self, line: u32, column: u32) -> Token {
        let start = self.current;
        while self.peek(0).is_ascii_alphanumeric() || self.peek(0) == b'_' {
            self.advance();
        }

        let lexeme = &self.source[start..self.current];
        let kind = keyword(lexeme).unwrap_or(TokenKind::Identifier);
        Token::new(kind, lexeme, line, column)
    }
}
