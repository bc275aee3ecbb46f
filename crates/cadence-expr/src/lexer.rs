use logos::Logos;
use std::fmt;

/// Token type for binding expressions.
///
/// Like the parser, the lexer knows no keywords: `sim`, `and`, `len` and
/// friends are all `Token::Word`, disambiguated by grammatical position.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Left parenthesis `(`.
    LParen,
    /// Right parenthesis `)`.
    RParen,
    /// Left bracket `[`.
    LBracket,
    /// Right bracket `]`.
    RBracket,
    /// Comma separator `,`.
    Comma,
    /// Attribute access `.`.
    Dot,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// Single- or double-quoted string literal.
    Str(String),
    /// Non-negative integer literal (supports Rust-style underscores).
    Integer(i64),
    /// Non-negative floating-point literal.
    Float(f64),
    /// Bare word (root name, function name, attribute, or keyword).
    Word(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Comma => write!(f, ","),
            Token::Dot => write!(f, "."),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::EqEq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::Le => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::Ge => write!(f, ">="),
            Token::Str(s) => write!(f, "'{s}'"),
            Token::Integer(n) => write!(f, "{n}"),
            Token::Float(n) => write!(f, "{n}"),
            Token::Word(w) => write!(f, "{w}"),
        }
    }
}

/// Internal logos token, converted to an owned `Token` after lexing.
#[derive(Logos, Debug)]
#[logos(skip r"[ \t\r\n]+")]
enum RawToken {
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(",")]
    Comma,

    #[token(".")]
    Dot,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("%")]
    Percent,

    #[token("==")]
    EqEq,

    #[token("!=")]
    NotEq,

    #[token("<")]
    Lt,

    #[token("<=")]
    Le,

    #[token(">")]
    Gt,

    #[token(">=")]
    Ge,

    #[regex(r#""[^"\n]*""#)]
    #[regex(r"'[^'\n]*'")]
    Str,

    #[regex(r"[0-9][0-9_]*\.[0-9][0-9_]*")]
    Float,

    #[regex(r"[0-9][0-9_]*")]
    Integer,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Word,
}

/// A lexer error with source location.
#[derive(Debug, Clone)]
pub struct LexError {
    /// Byte range of the erroneous input in the source.
    pub span: std::ops::Range<usize>,
    /// Human-readable description of the lexer error.
    pub message: String,
}

/// Lex an expression into a sequence of `(Token, Span)` pairs.
///
/// Lexing continues past errors so every bad character is reported at once.
pub fn lex(source: &str) -> (Vec<(Token, std::ops::Range<usize>)>, Vec<LexError>) {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    let mut lexer = RawToken::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(raw) => {
                let token = match raw {
                    RawToken::LParen => Token::LParen,
                    RawToken::RParen => Token::RParen,
                    RawToken::LBracket => Token::LBracket,
                    RawToken::RBracket => Token::RBracket,
                    RawToken::Comma => Token::Comma,
                    RawToken::Dot => Token::Dot,
                    RawToken::Plus => Token::Plus,
                    RawToken::Minus => Token::Minus,
                    RawToken::Star => Token::Star,
                    RawToken::Slash => Token::Slash,
                    RawToken::Percent => Token::Percent,
                    RawToken::EqEq => Token::EqEq,
                    RawToken::NotEq => Token::NotEq,
                    RawToken::Lt => Token::Lt,
                    RawToken::Le => Token::Le,
                    RawToken::Gt => Token::Gt,
                    RawToken::Ge => Token::Ge,
                    RawToken::Str => {
                        let slice = lexer.slice();
                        Token::Str(slice[1..slice.len() - 1].to_string())
                    }
                    RawToken::Float => {
                        let raw = lexer.slice();
                        match raw.replace('_', "").parse::<f64>() {
                            Ok(n) => Token::Float(n),
                            Err(_) => {
                                errors.push(LexError {
                                    span: span.clone(),
                                    message: format!("invalid float literal: {raw}"),
                                });
                                continue;
                            }
                        }
                    }
                    RawToken::Integer => {
                        let raw = lexer.slice();
                        match raw.replace('_', "").parse::<i64>() {
                            Ok(n) => Token::Integer(n),
                            Err(_) => {
                                errors.push(LexError {
                                    span: span.clone(),
                                    message: format!("invalid integer literal: {raw}"),
                                });
                                continue;
                            }
                        }
                    }
                    RawToken::Word => Token::Word(lexer.slice().to_string()),
                };
                tokens.push((token, span));
            }
            Err(()) => {
                errors.push(LexError {
                    span: span.clone(),
                    message: format!("unexpected character: {:?}", &source[span.clone()]),
                });
            }
        }
    }

    (tokens, errors)
}
