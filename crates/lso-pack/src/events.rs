//! Fixed-layout event records inside `EvSq` chunk payloads.
//!
//! An event record starts with the four bytes `12 00 00 00` followed by a
//! u32 LE tick position. Records sit on 4-byte boundaries and occupy 48
//! bytes; anything else in the payload is skipped.

use lso_buffers::Reader;

use crate::ticks::Position;

/// Leading bytes of an event record.
pub const EVENT_SIGNATURE: [u8; 4] = [0x12, 0x00, 0x00, 0x00];
/// Bytes skipped after a matched record.
pub const EVENT_RECORD_LEN: usize = 48;

const ALIGN: usize = 4;
const MIN_TAIL: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRecord {
    /// Offset of the record within the payload.
    pub offset: usize,
    pub ticks: u32,
    pub position: Position,
}

/// Collects event records from an `EvSq` payload, in payload order.
pub fn scan_events(payload: &[u8]) -> Vec<EventRecord> {
    let mut events = Vec::new();
    let mut idx = 0;
    while idx + MIN_TAIL < payload.len() {
        if payload[idx..idx + EVENT_SIGNATURE.len()] != EVENT_SIGNATURE {
            idx += ALIGN;
            continue;
        }
        let mut reader = Reader::at(payload, idx + EVENT_SIGNATURE.len());
        let Ok(ticks) = reader.u32_le() else {
            break;
        };
        events.push(EventRecord {
            offset: idx,
            ticks,
            position: Position::from_ticks(ticks as u64),
        });
        idx += EVENT_RECORD_LEN;
    }
    events
}
