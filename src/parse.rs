use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{char, u32 as decimal_u32, u64 as decimal_u64};
use nom::combinator::{all_consuming, eof, peek};
use nom::sequence::{separated_pair, terminated};
use nom::IResult;

use super::error::ParseError;
use super::types::*;

/// The line that ends a multi-line response.
const TERMINATOR: &[u8] = b".";

/// Decode a status line whose line ending has already been removed.
///
/// The first space separates the status marker from the human-readable text. A line with no
/// space has an empty text.
pub fn parse_response(line: &str) -> Result<Response, ParseError> {
    let (token, text) = line.split_once(' ').unwrap_or((line, ""));
    let status = match token {
        "+OK" => Status::Ok,
        "-ERR" => Status::Err,
        _ => return Err(ParseError::Status(token.to_string())),
    };
    Ok(Response {
        status,
        text: text.to_string(),
    })
}

fn pair(text: &str) -> IResult<&str, (u32, u64)> {
    all_consuming(separated_pair(decimal_u32, char(' '), decimal_u64))(text)
}

/// Parse the text of a `STAT` response, `count size`.
pub fn parse_stat(text: &str) -> Result<Stat, ParseError> {
    match pair(text) {
        Ok((_, (count, size))) => Ok(Stat { count, size }),
        Err(_) => Err(ParseError::Stat(text.to_string())),
    }
}

/// Parse the text of a single-message `LIST` response, `index size`.
pub fn parse_scan_listing(text: &str) -> Result<ScanListing, ParseError> {
    match pair(text) {
        Ok((_, (index, size))) => Ok(ScanListing { index, size }),
        Err(_) => Err(ParseError::ScanListing(text.to_string())),
    }
}

/// Extract the octet count a server announces in front of a `RETR` body, as in
/// `+OK 120 octets`.
pub fn parse_octets(text: &str) -> Option<u64> {
    let r: IResult<&str, u64> = terminated(decimal_u64, peek(alt((tag(" "), eof))))(text);
    r.ok().map(|(_, n)| n)
}

/// Drop a trailing CRLF or LF.
pub fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Undo the byte-stuffing of one line of a multi-line response.
///
/// Returns `None` for the terminating `.` line. Otherwise the line is returned with its line
/// ending intact and any leading `.` removed: the server doubles a leading dot, and a single
/// leading dot followed by anything but the line ending is not valid stuffing, so it is dropped
/// the same way.
pub fn unstuff_line(line: &[u8]) -> Option<&[u8]> {
    if trim_line_ending(line) == TERMINATOR && line.ends_with(b"\n") {
        return None;
    }
    Some(line.strip_prefix(TERMINATOR).unwrap_or(line))
}
