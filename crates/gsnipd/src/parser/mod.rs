//! Line-oriented state machine turning snippet files into records.
//!
//! The parser walks three states. `Scanning` skips lines until a `startsnip`
//! signature shows up and hands that same line to `Signature`, which splits it
//! into a name and a quoted description. `ScanBody` then collects lines
//! verbatim until `endsnip`. A malformed signature moves the machine into the
//! terminal `Errored` state and the run is abandoned with nothing returned.

mod errors;

use std::io::{self, BufRead};
use std::mem;

use crate::snippet::{END_KEYWORD, START_KEYWORD, Snippet};

pub use self::errors::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Scanning,
    Signature,
    ScanBody,
    Errored { number: usize, line: String },
}

/// Whether a step consumed its input line or wants it fed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Consumed,
    Replay,
}

/// Reusable snippet parser.
///
/// Every run starts from a clean state, so a single instance can parse many
/// inputs in sequence.
#[derive(Debug)]
pub struct SnippetParser {
    state: State,
    parsed: Vec<Snippet>,
    body: Vec<String>,
    opened_at: usize,
}

impl Default for SnippetParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SnippetParser {
    /// Creates a parser in the `Scanning` state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: State::Scanning,
            parsed: Vec::new(),
            body: Vec::new(),
            opened_at: 0,
        }
    }

    /// Clears all state accumulated by a previous run.
    pub fn reset(&mut self) {
        self.state = State::Scanning;
        self.parsed.clear();
        self.body.clear();
        self.opened_at = 0;
    }

    /// Parses snippet blocks from in-memory text.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Empty`] when no block is present, and
    /// [`ParseError::Line`] or [`ParseError::Truncated`] for malformed input.
    pub fn parse(&mut self, input: &str) -> Result<Vec<Snippet>, ParseError> {
        self.run(input.lines().map(Ok::<_, io::Error>))
    }

    /// Parses snippet blocks from a buffered reader.
    ///
    /// # Errors
    ///
    /// As [`SnippetParser::parse`], plus [`ParseError::Read`] when the reader
    /// fails.
    pub fn parse_reader<R: BufRead>(&mut self, reader: R) -> Result<Vec<Snippet>, ParseError> {
        self.run(reader.lines())
    }

    fn run<I, S>(&mut self, lines: I) -> Result<Vec<Snippet>, ParseError>
    where
        I: Iterator<Item = io::Result<S>>,
        S: AsRef<str>,
    {
        self.reset();
        for (index, line) in lines.enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(source) => {
                    self.reset();
                    return Err(ParseError::Read { source });
                }
            };
            self.feed(line.as_ref(), index + 1);
            if matches!(self.state, State::Errored { .. }) {
                break;
            }
        }
        self.finish()
    }

    fn feed(&mut self, line: &str, number: usize) {
        while self.step(line, number) == Step::Replay {}
    }

    fn step(&mut self, line: &str, number: usize) -> Step {
        match self.state {
            State::Scanning => {
                if line.trim().starts_with(START_KEYWORD) {
                    self.state = State::Signature;
                    Step::Replay
                } else {
                    Step::Consumed
                }
            }
            State::Signature => {
                match split_signature(line) {
                    Some((name, description)) => {
                        self.parsed.push(Snippet::new(name, description, String::new()));
                        self.opened_at = number;
                        self.state = State::ScanBody;
                    }
                    None => {
                        self.state = State::Errored {
                            number,
                            line: line.to_owned(),
                        };
                    }
                }
                Step::Consumed
            }
            State::ScanBody => {
                if line.trim().starts_with(END_KEYWORD) {
                    let body = mem::take(&mut self.body).join("\n");
                    if let Some(current) = self.parsed.last_mut() {
                        current.body = body;
                    }
                    self.state = State::Scanning;
                } else {
                    self.body.push(line.to_owned());
                }
                Step::Consumed
            }
            State::Errored { .. } => Step::Consumed,
        }
    }

    fn finish(&mut self) -> Result<Vec<Snippet>, ParseError> {
        let outcome = match self.state {
            State::Scanning if self.parsed.is_empty() => Err(ParseError::Empty),
            State::Scanning => Ok(mem::take(&mut self.parsed)),
            State::Signature | State::ScanBody => Err(ParseError::Truncated {
                name: self
                    .parsed
                    .last()
                    .map(|snippet| snippet.name.clone())
                    .unwrap_or_default(),
                opened_at: self.opened_at,
            }),
            State::Errored { ref number, ref line } => Err(ParseError::Line {
                number: *number,
                line: line.clone(),
            }),
        };
        self.reset();
        outcome
    }
}

/// Splits `startsnip <name> "<description>"` into its name and description.
///
/// The description spans from the first to the last double quote, so it may
/// contain quotes of its own.
fn split_signature(line: &str) -> Option<(&str, &str)> {
    let rest = line.trim().strip_prefix(START_KEYWORD)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let (name, remainder) = rest.trim_start().split_once(char::is_whitespace)?;
    if name.contains('"') {
        return None;
    }
    let quoted = remainder.trim();
    if !(quoted.starts_with('"') && quoted.ends_with('"')) {
        return None;
    }
    take_between(quoted, '"').map(|description| (name, description))
}

fn take_between(text: &str, delimiter: char) -> Option<&str> {
    let first = text.find(delimiter)?;
    let last = text.rfind(delimiter)?;
    if last <= first {
        return None;
    }
    text.get(first + delimiter.len_utf8()..last)
}
