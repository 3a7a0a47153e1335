//! Editor wire format
//!
//! Render commands travel to the editor plugin as codec messages:
//!
//! | Command | Address                   | Arguments                                   |
//! |---------|---------------------------|---------------------------------------------|
//! | `Set`   | `/editor/highlight/set`   | `stream_key, start_row, start_col, end_row, end_col` (all `i`) |
//! | `Clear` | `/editor/highlight/clear` | `stream_key` (`i`)                           |

use codec::{Arg, Message};
use types::{PositionRange, RenderCommand, StreamKey};

pub const SET_ADDRESS: &str = "/editor/highlight/set";
pub const CLEAR_ADDRESS: &str = "/editor/highlight/clear";

/// Encode a command as an editor message
pub fn encode_command(command: &RenderCommand) -> Message {
    match command {
        RenderCommand::Set { key, range } => Message::new(
            SET_ADDRESS,
            vec![
                Arg::Int(key.as_wire()),
                Arg::Int(wire_coord(range.start_row)),
                Arg::Int(wire_coord(range.start_col)),
                Arg::Int(wire_coord(range.end_row)),
                Arg::Int(wire_coord(range.end_col)),
            ],
        ),
        RenderCommand::Clear { key } => Message::new(CLEAR_ADDRESS, vec![Arg::Int(key.as_wire())]),
    }
}

/// Decode an editor message back into a command
///
/// Used by editor-side integrations and tests; returns `None` for anything
/// that is not a well-formed set/clear message.
pub fn decode_command(message: &Message) -> Option<RenderCommand> {
    let ints: Option<Vec<u32>> = message
        .args
        .iter()
        .map(|a| a.as_int().and_then(|v| u32::try_from(v).ok()))
        .collect();
    let ints = ints?;

    match (message.address.as_str(), ints.as_slice()) {
        (SET_ADDRESS, &[key, start_row, start_col, end_row, end_col]) => {
            let range = PositionRange::new(start_row, start_col, end_row, end_col).ok()?;
            Some(RenderCommand::Set {
                key: StreamKey(key),
                range,
            })
        }
        (CLEAR_ADDRESS, &[key]) => Some(RenderCommand::Clear {
            key: StreamKey(key),
        }),
        _ => None,
    }
}

fn wire_coord(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
