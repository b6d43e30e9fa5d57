//! Tag arrival/removal event records and the reader-side event log format.
//!
//! The reader keeps an append-only log served as `events.txt`. Each line is
//! one record: an 8-hex-digit whole-second timestamp, two bytes encoding the
//! millisecond fraction, an event-type character, and an optional `=tagid`
//! payload. The chunk ends with a `@<position>` marker giving the byte
//! offset to request on the next poll.

use crate::error::{Result, RfidError};
use log::warn;
use serde::Serialize;

/// Event-log position counters wrap at 20 bits.
pub(crate) const COUNTER_WRAP_MASK: u32 = 0xFFFFF;
/// A forward delta above this is interpreted as the counter having gone
/// backward, i.e. the reader power-cycled and reset its log.
pub(crate) const POWER_CYCLE_THRESHOLD: u32 = 0x8_0000;

/// Forward delta between two advertised position counters, modulo the
/// counter wrap width.
pub(crate) fn counter_delta(prev: u32, new: u32) -> u32 {
    new.wrapping_sub(prev) & COUNTER_WRAP_MASK
}

/// Kind of tag presence change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// The tag entered the reader field.
    Arrival,
    /// The tag left the reader field.
    Removal,
}

/// One tag presence event, as delivered to callbacks and stream subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagEvent {
    /// Event time in seconds, with millisecond resolution, on the reader's
    /// monotonic clock.
    pub timestamp: f64,
    pub kind: EventKind,
    /// Tag identifier; empty when the record carried none.
    pub tag_id: String,
}

/// Event-pump bookkeeping. Mutated only by the notification path.
#[derive(Debug)]
pub(crate) struct PumpState {
    /// Byte offset into events.txt already consumed; -1 before first priming.
    pub last_event_pos: i64,
    /// Last advertised position counter seen.
    pub prev_cb_pos: u32,
    /// Timestamp guard: records at or below this stamp are stale.
    pub event_stamp: f64,
    /// The next notification must prime position state from the full log
    /// without emitting callbacks.
    pub first_invocation: bool,
}

impl Default for PumpState {
    fn default() -> Self {
        Self {
            last_event_pos: -1,
            prev_cb_pos: 0,
            event_stamp: 0.0,
            first_invocation: true,
        }
    }
}

impl PumpState {
    /// Applies a new advertised counter value. Returns true when a power
    /// cycle was detected and position state was reset.
    pub fn observe_counter(&mut self, counter: u32) -> bool {
        let delta = counter_delta(self.prev_cb_pos, counter);
        self.prev_cb_pos = counter;
        if delta > POWER_CYCLE_THRESHOLD {
            // Counter went backward: the reader rebooted and restarted its
            // log. Continuity is lost, go back to replay mode.
            self.last_event_pos = 0;
            self.first_invocation = true;
            return true;
        }
        false
    }
}

/// Decodes the two-byte millisecond field. Bytes are in the `'@'..='_'`
/// range, each carrying 5 bits.
fn decode_millis(b0: u8, b1: u8) -> Option<u32> {
    if !(b'@'..=b'_').contains(&b0) || !(b'@'..=b'_').contains(&b1) {
        return None;
    }
    Some((b0 as u32 - 64) * 32 + (b1 as u32 - 64))
}

/// Parses one event record line. Returns None for lines that do not match
/// the record format.
pub(crate) fn parse_record(line: &str) -> Option<TagEvent> {
    let bytes = line.as_bytes();
    // The format is pure ASCII; rejecting other lines up front also keeps
    // the byte-indexed slicing below on char boundaries.
    if bytes.len() < 11 || !line.is_ascii() {
        return None;
    }
    let secs = u32::from_str_radix(&line[0..8], 16).ok()?;
    let millis = decode_millis(bytes[8], bytes[9])?;
    let kind = match bytes[10] {
        b'+' => EventKind::Arrival,
        b'-' => EventKind::Removal,
        _ => return None,
    };
    let tag_id = match line[11..].strip_prefix('=') {
        Some(id) => id.to_string(),
        None if line.len() == 11 => String::new(),
        None => return None,
    };
    Some(TagEvent {
        timestamp: secs as f64 + 0.001 * millis as f64,
        kind,
        tag_id,
    })
}

/// Parses a downloaded log chunk into its records and the new consumable
/// position from the trailing `@<position>` marker.
///
/// Individual malformed records are skipped with a warning; a chunk without
/// the trailing marker is a hard protocol error, since continuing with stale
/// position state would replay or permanently lose events.
pub(crate) fn parse_chunk(text: &str) -> Result<(Vec<TagEvent>, u64)> {
    let mut events = Vec::new();
    let mut position = None;
    for line in text.lines() {
        if line.is_empty() {
            continue;
        }
        if let Some(pos_str) = line.strip_prefix('@') {
            position = Some(pos_str.trim().parse::<u64>().map_err(|_| {
                RfidError::Protocol(format!("bad event-log position marker: {:?}", line))
            })?);
            continue;
        }
        match parse_record(line) {
            Some(ev) => events.push(ev),
            None => warn!("Skipping malformed event record: {:?}", line),
        }
    }
    let position = position.ok_or_else(|| {
        RfidError::Protocol("event-log chunk is missing its position marker".to_string())
    })?;
    Ok((events, position))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_delta_wraps() {
        assert_eq!(counter_delta(10, 15), 5);
        assert_eq!(counter_delta(0xFFFFF, 2), 3);
        // Backward movement shows up as a huge forward delta.
        assert!(counter_delta(5000, 10) > POWER_CYCLE_THRESHOLD);
    }

    #[test]
    fn observe_counter_detects_power_cycle() {
        let mut state = PumpState {
            last_event_pos: 4242,
            prev_cb_pos: 5000,
            event_stamp: 17.5,
            first_invocation: false,
        };
        assert!(!state.observe_counter(5010));
        assert_eq!(state.last_event_pos, 4242);

        assert!(state.observe_counter(10));
        assert_eq!(state.last_event_pos, 0);
        assert!(state.first_invocation);
        assert_eq!(state.prev_cb_pos, 10);
    }

    #[test]
    fn record_round_trip() {
        // 0x0000002A = 42 s; '@'+'A' = 0*32+1 = 1 ms.
        let ev = parse_record("0000002a@A+=04AABBCC").unwrap();
        assert!((ev.timestamp - 42.001).abs() < 1e-9);
        assert_eq!(ev.kind, EventKind::Arrival);
        assert_eq!(ev.tag_id, "04AABBCC");

        let ev = parse_record("0000002aB_-=04AABBCC").unwrap();
        assert_eq!(ev.kind, EventKind::Removal);
        // (2)*32 + 31 = 95 ms
        assert!((ev.timestamp - 42.095).abs() < 1e-9);
    }

    #[test]
    fn record_without_tag_id() {
        let ev = parse_record("00000010@@+").unwrap();
        assert_eq!(ev.tag_id, "");
        assert_eq!(ev.timestamp, 16.0);
    }

    #[test]
    fn malformed_records_rejected() {
        assert!(parse_record("").is_none());
        assert!(parse_record("xyz").is_none());
        assert!(parse_record("zzzzzzzz@@+").is_none()); // bad hex stamp
        assert!(parse_record("00000010@@*").is_none()); // bad event char
        assert!(parse_record("00000010!@+").is_none()); // ms byte out of range
        assert!(parse_record("00000010@@+garbage").is_none()); // junk after kind
    }

    #[test]
    fn non_ascii_record_is_skipped_not_fatal() {
        // Multibyte char spanning the timestamp field must not slice
        // mid-character.
        assert!(parse_record("0000002é@A+=TAG1").is_none());
        assert!(parse_record("0000002a@A+=TAGé").is_none());

        let chunk = "0000002é@A+=TAG1\n0000002a@A+=TAG2\n@90\n";
        let (events, pos) = parse_chunk(chunk).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].tag_id, "TAG2");
        assert_eq!(pos, 90);
    }

    #[test]
    fn chunk_parses_records_and_marker() {
        let chunk = "0000002a@A+=TAG1\n0000002b@B-=TAG1\n@1234\n";
        let (events, pos) = parse_chunk(chunk).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(pos, 1234);
        assert_eq!(events[0].kind, EventKind::Arrival);
        assert_eq!(events[1].kind, EventKind::Removal);
    }

    #[test]
    fn chunk_skips_bad_records_but_keeps_marker() {
        let chunk = "not-a-record\n0000002a@A+=TAG1\n@77\n";
        let (events, pos) = parse_chunk(chunk).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(pos, 77);
    }

    #[test]
    fn chunk_without_marker_is_protocol_error() {
        let err = parse_chunk("0000002a@A+=TAG1\n").unwrap_err();
        assert!(matches!(err, RfidError::Protocol(_)));
    }

    #[test]
    fn bad_marker_is_protocol_error() {
        let err = parse_chunk("@not-a-number\n").unwrap_err();
        assert!(matches!(err, RfidError::Protocol(_)));
    }

    #[test]
    fn event_serializes_to_json() {
        let ev = TagEvent {
            timestamp: 11.0,
            kind: EventKind::Arrival,
            tag_id: "TAG1".to_string(),
        };
        let json = serde_json::to_string(&ev).unwrap();
        assert_eq!(json, r#"{"timestamp":11.0,"kind":"arrival","tag_id":"TAG1"}"#);
    }
}
