//! The XRF chunk parser.
//!
//! XRF source is runs of hex digits separated by whitespace; every run must
//! be exactly five characters and each character names one primitive
//! opcode. Input is consumed bytewise, so a multi-byte UTF-8 character is
//! several invalid bytes. The parser is total: any byte sequence yields
//! either a chunk list or a non-empty diagnostic list, never both.

pub mod reader;

use crate::error::{ParseError, ParseErrorKind};
use crate::xrf::{Chunk, Opcode, COMMANDS_PER_CHUNK};
use reader::SourceReader;

/// Parses XRF source text into its chunk list.
///
/// Diagnostics accumulate across the whole input; a chunk with a bad
/// character still has its remaining characters scanned so that length
/// errors are reported independently of character errors.
pub fn parse_source(source: &str) -> Result<Vec<Chunk>, Vec<ParseError>> {
    let mut reader = SourceReader::new(source.as_bytes());
    let mut chunks = Vec::new();
    let mut errors = Vec::new();

    while let Some(b) = reader.read() {
        if !b.is_ascii_whitespace() {
            parse_chunk(&mut reader, b, &mut chunks, &mut errors);
        }
    }

    if errors.is_empty() {
        Ok(chunks)
    } else {
        Err(errors)
    }
}

/// Scans one whitespace-delimited run starting at `first`, appending either
/// a five-command chunk or diagnostics.
fn parse_chunk(
    reader: &mut SourceReader<'_>,
    first: u8,
    chunks: &mut Vec<Chunk>,
    errors: &mut Vec<ParseError>,
) {
    let mut chunk = Chunk::new(reader.line(), reader.col());

    let mut b = Some(first);
    while let Some(byte) = b {
        if byte.is_ascii_whitespace() {
            break;
        }
        match Opcode::from_char(byte as char) {
            Some(op) => chunk.commands.push(op),
            None => errors.push(ParseError::new(
                ParseErrorKind::InvalidCharacter(byte as char),
                reader.line(),
                reader.col(),
            )),
        }
        b = reader.read();
    }

    if chunk.commands.len() < COMMANDS_PER_CHUNK {
        errors.push(ParseError::new(
            ParseErrorKind::NotEnoughCommands,
            chunk.line,
            chunk.col,
        ));
    } else if chunk.commands.len() > COMMANDS_PER_CHUNK {
        errors.push(ParseError::new(
            ParseErrorKind::TooManyCommands,
            chunk.line,
            chunk.col,
        ));
    } else {
        chunks.push(chunk);
    }
}
