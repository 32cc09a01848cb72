//! Nom-based tokenizer for raw IRC lines.
//!
//! Splits a line into its optional prefix, the command word, positional
//! arguments and the optional trailing payload, borrowing from the input.

use nom::{
    bytes::complete::{take_until, take_while1},
    character::complete::{char, space0},
    combinator::opt,
    error::ErrorKind,
    sequence::preceded,
    IResult,
};
use smallvec::SmallVec;

use crate::error::MessageParseError;

/// IRCv3 tags are skipped; nothing in the client consumes them.
fn parse_tags(input: &str) -> IResult<&str, &str> {
    preceded(char('@'), take_until(" "))(input)
}

fn parse_prefix(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), take_while1(|c| c != ' '))(input)
}

/// command = 1*letter / 3digit
fn parse_command(input: &str) -> IResult<&str, &str> {
    let (rest, cmd) = take_while1(|c: char| c.is_ascii_alphanumeric())(input)?;

    let is_all_letters = cmd.chars().all(|c| c.is_ascii_alphabetic());
    let is_three_digits = cmd.len() == 3 && cmd.chars().all(|c| c.is_ascii_digit());

    if is_all_letters || is_three_digits {
        Ok((rest, cmd))
    } else {
        Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::AlphaNumeric,
        )))
    }
}

/// Positional arguments up to the first token starting with `:`, which
/// begins the trailing payload. Runs of spaces separate a single time.
fn parse_params(input: &str) -> (SmallVec<[&str; 15]>, Option<&str>) {
    let mut args: SmallVec<[&str; 15]> = SmallVec::new();
    let mut rest = input;

    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            return (args, None);
        }
        if let Some(trailing) = rest.strip_prefix(':') {
            return (args, Some(trailing));
        }
        let end = rest.find(' ').unwrap_or(rest.len());
        args.push(&rest[..end]);
        rest = &rest[end..];
    }
}

/// A tokenized line with borrowed slices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedLine<'a> {
    pub prefix: Option<&'a str>,
    pub command: &'a str,
    pub args: SmallVec<[&'a str; 15]>,
    pub trailing: Option<&'a str>,
}

impl<'a> ParsedLine<'a> {
    /// Tokenize a line. Trailing CR/LF must already be stripped.
    pub fn parse(line: &'a str) -> Result<Self, MessageParseError> {
        if line.trim().is_empty() {
            return Err(MessageParseError::EmptyMessage);
        }

        let to_error = |rest: &str| MessageParseError::InvalidCommand {
            position: line.len() - rest.len(),
        };

        let head = |input: &'a str| -> IResult<&'a str, (Option<&'a str>, &'a str)> {
            let (input, _) = opt(parse_tags)(input)?;
            let (input, _) = space0(input)?;
            let (input, prefix) = opt(parse_prefix)(input)?;
            let (input, _) = space0(input)?;
            let (input, command) = parse_command(input)?;
            Ok((input, (prefix, command)))
        };

        let (rest, (prefix, command)) = match head(line) {
            Ok(parsed) => parsed,
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => return Err(to_error(e.input)),
            Err(nom::Err::Incomplete(_)) => return Err(to_error("")),
        };

        // The command must be followed by a separator or the end of line.
        if !rest.is_empty() && !rest.starts_with(' ') {
            return Err(to_error(rest));
        }

        let (args, trailing) = parse_params(rest);
        Ok(Self {
            prefix,
            command,
            args,
            trailing,
        })
    }
}
