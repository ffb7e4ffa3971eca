use core::iter::Peekable;
use core::str::Chars;

use crate::error::{CompileError, CompileErrorKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Name(String),
    Number(i64),
    LBrace,
    RBrace,
    Lt,
    Gt,
    LBracket,
    RBracket,
    Colon,
    ColonColon,
    Semicolon,
    Comma,
    Equals,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
}

pub fn lex(source: &str) -> Result<Vec<Token>, CompileError> {
    Lexer::new(source).lex()
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: u32,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            tokens: Vec::new(),
        }
    }

    fn error(&self, msg: impl Into<String>) -> CompileError {
        CompileError::new(self.line, CompileErrorKind::Grammar(msg.into()))
    }

    fn push(&mut self, kind: TokenKind) {
        self.tokens.push(Token {
            kind,
            line: self.line,
        });
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.chars.peek() == Some(&expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn lex(mut self) -> Result<Vec<Token>, CompileError> {
        while let Some(c) = self.chars.next() {
            match c {
                '\n' => self.line += 1,
                c if c.is_whitespace() => {}
                '/' => {
                    if self.eat('/') {
                        self.line_comment();
                    } else if self.eat('*') {
                        self.block_comment()?;
                    } else {
                        return Err(self.error("unexpected character `/`"));
                    }
                }
                '{' => self.push(TokenKind::LBrace),
                '}' => self.push(TokenKind::RBrace),
                '<' => self.push(TokenKind::Lt),
                '>' => self.push(TokenKind::Gt),
                '[' => self.push(TokenKind::LBracket),
                ']' => self.push(TokenKind::RBracket),
                ';' => self.push(TokenKind::Semicolon),
                ',' => self.push(TokenKind::Comma),
                '=' => self.push(TokenKind::Equals),
                ':' => {
                    if self.eat(':') {
                        self.push(TokenKind::ColonColon);
                    } else {
                        self.push(TokenKind::Colon);
                    }
                }
                c if c.is_ascii_alphabetic() || c == '_' => self.name(c),
                c if c.is_ascii_digit() => self.number(c)?,
                c => return Err(self.error(format!("unexpected character `{c}`"))),
            }
        }
        self.push(TokenKind::Eof);
        Ok(self.tokens)
    }

    fn line_comment(&mut self) {
        for c in self.chars.by_ref() {
            if c == '\n' {
                self.line += 1;
                return;
            }
        }
    }

    fn block_comment(&mut self) -> Result<(), CompileError> {
        while let Some(c) = self.chars.next() {
            match c {
                '\n' => self.line += 1,
                '*' if self.eat('/') => return Ok(()),
                _ => {}
            }
        }
        Err(self.error("unterminated block comment"))
    }

    fn name(&mut self, first: char) {
        let mut s = String::new();
        s.push(first);
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                s.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        self.push(TokenKind::Name(s));
    }

    fn number(&mut self, first: char) -> Result<(), CompileError> {
        let mut s = String::new();
        s.push(first);
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() {
                s.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        let n: i64 = s
            .parse()
            .map_err(|_| self.error(format!("number `{s}` out of range")))?;
        self.push(TokenKind::Number(n));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn names_and_punctuation() {
        assert_eq!(
            kinds("Pair : flat { x:int32 }"),
            vec![
                TokenKind::Name("Pair".into()),
                TokenKind::Colon,
                TokenKind::Name("flat".into()),
                TokenKind::LBrace,
                TokenKind::Name("x".into()),
                TokenKind::Colon,
                TokenKind::Name("int32".into()),
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn qualified_enumerator() {
        assert_eq!(
            kinds("E::c"),
            vec![
                TokenKind::Name("E".into()),
                TokenKind::ColonColon,
                TokenKind::Name("c".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_and_lines() {
        let tokens = lex("a // one\n/* two\nthree */ b").unwrap();
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].kind, TokenKind::Name("b".into()));
        assert_eq!(tokens[1].line, 3);
    }

    #[test]
    fn unterminated_comment() {
        assert!(lex("/* nope").is_err());
    }
}
