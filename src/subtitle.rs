use std::path::Path;
use tracing::{debug, info};

use crate::error::{Result, SlicerError};

/// One subtitle entry, in milliseconds from the start of the recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

impl Cue {
    pub fn new<S: Into<String>>(start_ms: u64, end_ms: u64, text: S) -> Self {
        Self {
            start_ms,
            end_ms,
            text: text.into(),
        }
    }
}

/// Read and parse an SRT file, shifting every cue by `offset_seconds`
pub fn read_srt<P: AsRef<Path>>(path: P, offset_seconds: f64) -> Result<Vec<Cue>> {
    let path = path.as_ref();
    info!("Reading subtitles: {}", path.display());

    let content = std::fs::read_to_string(path)
        .map_err(|e| SlicerError::filesystem(path, e))?;
    let cues = parse_srt(&content, offset_seconds)?;

    info!("Parsed {} cues from {}", cues.len(), path.display());
    Ok(cues)
}

/// Parse SRT content into cues, in file order.
///
/// Blocks are separated by blank lines. The second line of a block holds the
/// timing, every following line is cue text joined with single spaces. Any
/// malformed block fails the whole parse.
pub fn parse_srt(content: &str, offset_seconds: f64) -> Result<Vec<Cue>> {
    let offset_ms = offset_to_ms(offset_seconds)?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut cues = Vec::new();
    for (index, block) in split_blocks(content).into_iter().enumerate() {
        let block_number = index + 1;
        let cue = parse_block(&block, block_number, offset_ms)?;
        debug!("Cue {}: {}-{} {:?}", block_number, cue.start_ms, cue.end_ms, cue.text);
        cues.push(cue);
    }

    Ok(cues)
}

fn split_blocks(content: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for line in content.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

fn parse_block(lines: &[&str], block: usize, offset_ms: i64) -> Result<Cue> {
    let timing = lines
        .get(1)
        .ok_or_else(|| SlicerError::parse(block, "missing timing line"))?;

    let (start, end) = timing
        .split_once("-->")
        .ok_or_else(|| SlicerError::parse(block, format!("timing line has no '-->': {:?}", timing)))?;

    let start_ms = shift(parse_timestamp(start.trim(), block)?, offset_ms, block)?;
    let end_ms = shift(parse_timestamp(end.trim(), block)?, offset_ms, block)?;

    if end_ms < start_ms {
        return Err(SlicerError::parse(
            block,
            format!("cue ends before it starts ({} > {})", start_ms, end_ms),
        ));
    }

    let text = lines[2..]
        .iter()
        .map(|line| line.trim())
        .collect::<Vec<_>>()
        .join(" ");

    Ok(Cue { start_ms, end_ms, text })
}

/// Parse `H:MM:SS,mmm` (or `H:MM:SS.mmm`) into milliseconds
pub fn parse_timestamp(timestamp: &str, block: usize) -> Result<u64> {
    let bad = |what: &str| SlicerError::parse(block, format!("{} in timestamp {:?}", what, timestamp));

    let mut parts = timestamp.split(':');
    let (Some(hours), Some(minutes), Some(seconds), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(bad("expected H:MM:SS,mmm"));
    };

    let (whole_seconds, fraction) = match seconds.split_once([',', '.']) {
        Some((whole, fraction)) => (whole, fraction),
        None => (seconds, ""),
    };

    let hours = parse_number(hours).ok_or_else(|| bad("invalid hours"))?;
    let minutes = parse_number(minutes).ok_or_else(|| bad("invalid minutes"))?;
    let whole_seconds = parse_number(whole_seconds).ok_or_else(|| bad("invalid seconds"))?;
    let millis = parse_fraction(fraction).ok_or_else(|| bad("invalid milliseconds"))?;

    if minutes >= 60 || whole_seconds >= 60 {
        return Err(bad("minutes or seconds out of range"));
    }

    hours
        .checked_mul(3_600_000)
        .and_then(|ms| ms.checked_add(minutes * 60_000 + whole_seconds * 1_000 + millis))
        .ok_or_else(|| bad("timestamp out of range"))
}

fn parse_number(digits: &str) -> Option<u64> {
    let digits = digits.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

// Fractional seconds: ",5" is 500 ms, digits past the third are dropped
fn parse_fraction(digits: &str) -> Option<u64> {
    if digits.is_empty() {
        return Some(0);
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let millis: String = digits.chars().chain("00".chars()).take(3).collect();
    millis.parse().ok()
}

fn offset_to_ms(offset_seconds: f64) -> Result<i64> {
    if !offset_seconds.is_finite() {
        return Err(SlicerError::Config(format!("Invalid subtitle offset: {}", offset_seconds)));
    }
    Ok((offset_seconds * 1000.0).round() as i64)
}

fn shift(ms: u64, offset_ms: i64, block: usize) -> Result<u64> {
    ms.checked_add_signed(offset_ms).ok_or_else(|| {
        SlicerError::parse(block, format!("offset {} ms moves cue before the recording start", offset_ms))
    })
}

/// Format milliseconds in SRT time format (HH:MM:SS,mmm)
pub fn format_srt_time(total_milliseconds: u64) -> String {
    let hours = total_milliseconds / 3_600_000;
    let minutes = (total_milliseconds % 3_600_000) / 60_000;
    let secs = (total_milliseconds % 60_000) / 1_000;
    let millis = total_milliseconds % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}
