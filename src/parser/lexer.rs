//! Hand-written lexer for REXX source (§10.1, supplemental to the core).
//!
//! Grounded on the teacher's `parser/lexer.rs` — a `Lexer` struct holding
//! the source and a cursor, with `peek`/`advance`/`peek_char` helpers —
//! structure reused directly, token set replaced with REXX's.

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Number(String),
    Str(String),
    Op(String),
    Newline,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub line: u32,
}

pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: u32,
}

const MULTI_CHAR_OPS: &[&str] = &["==", "\\==", "\u{ac}==", "\\=", "\u{ac}=", "<>", "<=", ">=", "||", "**", "//"];

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { chars: source.chars().peekable(), line: 1 }
    }

    pub fn tokenize(mut self) -> Result<Vec<SpannedToken>, String> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments()?;
            let line = self.line;
            match self.chars.peek() {
                None => {
                    tokens.push(SpannedToken { token: Token::Eof, line });
                    break;
                }
                Some('\n') => {
                    self.chars.next();
                    self.line += 1;
                    tokens.push(SpannedToken { token: Token::Newline, line });
                }
                Some(';') => {
                    self.chars.next();
                    tokens.push(SpannedToken { token: Token::Newline, line });
                }
                Some(c) if c.is_ascii_digit() => {
                    tokens.push(SpannedToken { token: Token::Number(self.read_number()), line });
                }
                Some(c) if is_ident_start(*c) => {
                    tokens.push(SpannedToken { token: Token::Ident(self.read_ident()), line });
                }
                Some('\'') | Some('"') => {
                    tokens.push(SpannedToken { token: Token::Str(self.read_string()?), line });
                }
                Some(_) => {
                    tokens.push(SpannedToken { token: Token::Op(self.read_op()), line });
                }
            }
        }
        Ok(tokens)
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), String> {
        loop {
            match self.chars.peek() {
                Some(c) if *c == ' ' || *c == '\t' || *c == '\r' => {
                    self.chars.next();
                }
                Some('/') => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    if lookahead.peek() == Some(&'*') {
                        self.chars.next();
                        self.chars.next();
                        loop {
                            match self.chars.next() {
                                None => return Err(format!("unterminated comment starting before line {}", self.line)),
                                Some('\n') => self.line += 1,
                                Some('*') if self.chars.peek() == Some(&'/') => {
                                    self.chars.next();
                                    break;
                                }
                                _ => {}
                            }
                        }
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn read_number(&mut self) -> String {
        let mut out = String::new();
        while let Some(c) = self.chars.peek() {
            if c.is_ascii_digit() {
                out.push(*c);
                self.chars.next();
            } else {
                break;
            }
        }
        if self.chars.peek() == Some(&'.') {
            out.push('.');
            self.chars.next();
            while let Some(c) = self.chars.peek() {
                if c.is_ascii_digit() {
                    out.push(*c);
                    self.chars.next();
                } else {
                    break;
                }
            }
        }
        if matches!(self.chars.peek(), Some('e') | Some('E')) {
            let mut lookahead = self.chars.clone();
            let e = lookahead.next().unwrap();
            let mut exp = String::new();
            exp.push(e);
            if matches!(lookahead.peek(), Some('+') | Some('-')) {
                exp.push(lookahead.next().unwrap());
            }
            let mut has_digit = false;
            while let Some(c) = lookahead.peek() {
                if c.is_ascii_digit() {
                    has_digit = true;
                    exp.push(*c);
                    lookahead.next();
                } else {
                    break;
                }
            }
            if has_digit {
                out.push_str(&exp);
                self.chars = lookahead;
            }
        }
        out
    }

    fn read_ident(&mut self) -> String {
        let mut out = String::new();
        while let Some(c) = self.chars.peek() {
            if is_ident_continue(*c) {
                out.push(*c);
                self.chars.next();
            } else {
                break;
            }
        }
        out
    }

    fn read_string(&mut self) -> Result<String, String> {
        let quote = self.chars.next().unwrap();
        let mut out = String::new();
        loop {
            match self.chars.next() {
                None => return Err(format!("unterminated string literal at line {}", self.line)),
                Some(c) if c == quote => {
                    if self.chars.peek() == Some(&quote) {
                        out.push(quote);
                        self.chars.next();
                    } else {
                        break;
                    }
                }
                Some('\n') => return Err(format!("unterminated string literal at line {}", self.line)),
                Some(c) => out.push(c),
            }
        }
        Ok(out)
    }

    fn read_op(&mut self) -> String {
        for op in MULTI_CHAR_OPS {
            if self.matches_literal(op) {
                for _ in 0..op.chars().count() {
                    self.chars.next();
                }
                return op.to_string();
            }
        }
        let c = self.chars.next().unwrap();
        c.to_string()
    }

    fn matches_literal(&self, literal: &str) -> bool {
        let mut lookahead = self.chars.clone();
        for expected in literal.chars() {
            match lookahead.next() {
                Some(c) if c == expected => {}
                _ => return false,
            }
        }
        true
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '@' || c == '#' || c == '$' || c == '!' || c == '?'
}

fn is_ident_continue(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit() || c == '.'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(src: &str) -> Vec<Token> {
        Lexer::new(src).tokenize().unwrap().into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn tokenizes_assignment() {
        assert_eq!(
            toks("x = 1"),
            vec![
                Token::Ident("x".to_string()),
                Token::Op("=".to_string()),
                Token::Number("1".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn tokenizes_doubled_quote_escape() {
        assert_eq!(toks("'it''s'"), vec![Token::Str("it's".to_string()), Token::Eof]);
    }

    #[test]
    fn tokenizes_compound_name() {
        assert_eq!(toks("stem.1"), vec![Token::Ident("stem.1".to_string()), Token::Eof]);
    }

    #[test]
    fn tokenizes_strict_equality_operator() {
        assert_eq!(toks("a == b"), vec![
            Token::Ident("a".to_string()),
            Token::Op("==".to_string()),
            Token::Ident("b".to_string()),
            Token::Eof,
        ]);
    }

    #[test]
    fn skips_block_comments() {
        assert_eq!(toks("/* hi */ x"), vec![Token::Ident("x".to_string()), Token::Eof]);
    }
}
