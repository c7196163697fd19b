//! Lexical analysis for the shell's line-oriented command language.
//!
//! A line is split on spaces and tabs into tokens. Exactly three control
//! tokens exist — `&`, `|` and `&&` — and they are recognized by whole-token
//! string equality only: `a&b` or `&&&` are ordinary words. There is no
//! quoting, escaping or operator merging.

/// A token produced by splitting an input line on whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// An ordinary word: a command name or argument.
    Word(String),
    /// The pipe operator, `|`.
    Pipe,
    /// The sequential-AND operator, `&&`.
    SeqAnd,
    /// The background marker, `&`.
    Background,
}

/// Split one input line into tokens.
///
/// Empty input (or input that is only whitespace) yields an empty stream.
pub fn split_into_tokens(line: &str) -> Vec<Token> {
    line.split([' ', '\t'])
        .filter(|part| !part.is_empty())
        .map(|part| match part {
            "|" => Token::Pipe,
            "&&" => Token::SeqAnd,
            "&" => Token::Background,
            word => Token::Word(word.to_string()),
        })
        .collect()
}
