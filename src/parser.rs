//! Classification of a token stream into an execution shape.
//!
//! One line maps to exactly one [`Shape`]: a simple command, a piped pair, or
//! a sequential (`&&`) pair, plus an independent background flag. The
//! classifier is a single-pass state machine; the first operator it meets
//! decides the shape, and every later operator token is swallowed as a literal
//! argument of whichever vector is being filled. A bare `&` is honored only
//! while still collecting the first command: it ends classification on the
//! spot and discards the rest of the line.

use crate::lexer::Token;
use thiserror::Error;

/// Longest accepted input line, in bytes.
pub const MAX_LINE_LEN: usize = 100;

/// Most words (command name included) a single command may carry.
pub const MAX_ARGS: usize = 10;

/// Structural classification of one parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// A single command.
    Simple(Vec<String>),
    /// Two commands joined by a pipe: left's stdout feeds right's stdin.
    Piped(Vec<String>, Vec<String>),
    /// Two commands joined by `&&`: right runs only if left exits zero.
    Sequential(Vec<String>, Vec<String>),
}

/// The result of classifying one line: a shape plus the background flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub shape: Shape,
    pub background: bool,
}

impl CommandLine {
    /// The vector whose first word decides built-in dispatch.
    pub fn primary(&self) -> &[String] {
        match &self.shape {
            Shape::Simple(argv) => argv,
            Shape::Piped(left, _) | Shape::Sequential(left, _) => left,
        }
    }
}

/// Errors reported while classifying a line. None of them ends the shell;
/// the line is dropped and the loop continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("command line longer than {MAX_LINE_LEN} bytes")]
    LineTooLong,
    #[error("too many arguments (limit is {MAX_ARGS} per command)")]
    TooManyArguments,
    #[error("missing command around `{operator}`")]
    MissingCommand { operator: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    CollectingLeft,
    CollectingPipeRight,
    CollectingSecond,
}

/// Classify a token stream into a [`CommandLine`].
///
/// An empty stream produces an empty `Simple` shape, which the caller treats
/// as a no-op.
pub fn classify(tokens: Vec<Token>) -> Result<CommandLine, ParseError> {
    let mut left: Vec<String> = Vec::new();
    let mut right: Vec<String> = Vec::new();
    let mut state = State::CollectingLeft;
    let mut background = false;

    for token in tokens {
        match (state, token) {
            (State::CollectingLeft, Token::Pipe) => {
                if left.is_empty() {
                    return Err(ParseError::MissingCommand { operator: "|" });
                }
                state = State::CollectingPipeRight;
            }
            (State::CollectingLeft, Token::SeqAnd) => {
                if left.is_empty() {
                    return Err(ParseError::MissingCommand { operator: "&&" });
                }
                state = State::CollectingSecond;
            }
            (State::CollectingLeft, Token::Background) => {
                // A bare `&` before any branch ends classification; whatever
                // follows it on the line is discarded.
                background = true;
                break;
            }
            (State::CollectingLeft, Token::Word(word)) => push_arg(&mut left, word)?,
            // Once branched, `&` and any further operator are ordinary
            // arguments of the active vector (inherited single-pass quirk).
            (State::CollectingPipeRight | State::CollectingSecond, token) => {
                push_arg(&mut right, literal_text(token))?
            }
        }
    }

    let shape = match state {
        State::CollectingLeft => Shape::Simple(left),
        State::CollectingPipeRight => {
            if right.is_empty() {
                return Err(ParseError::MissingCommand { operator: "|" });
            }
            Shape::Piped(left, right)
        }
        State::CollectingSecond => {
            if right.is_empty() {
                return Err(ParseError::MissingCommand { operator: "&&" });
            }
            Shape::Sequential(left, right)
        }
    };

    Ok(CommandLine { shape, background })
}

fn push_arg(argv: &mut Vec<String>, arg: String) -> Result<(), ParseError> {
    if argv.len() == MAX_ARGS {
        return Err(ParseError::TooManyArguments);
    }
    argv.push(arg);
    Ok(())
}

/// The verbatim text of a token, for operators demoted to arguments.
fn literal_text(token: Token) -> String {
    match token {
        Token::Word(word) => word,
        Token::Pipe => "|".to_string(),
        Token::SeqAnd => "&&".to_string(),
        Token::Background => "&".to_string(),
    }
}
