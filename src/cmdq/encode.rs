//! Flattening a batch into the engine ABI.

use bytes::{BufMut, Bytes, BytesMut};

use super::command::Command;
use super::event::EventTable;
use crate::error::Result;

/// Every encoded entry occupies one fixed-size record.
pub const RECORD_SIZE: usize = 24;

const OP_WRITE: u8 = 1;
const OP_POLL: u8 = 2;
const OP_WAIT: u8 = 3;

/// Entry as consumed by the command-queue engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawCommand {
    Write {
        subsys: u8,
        base: u64,
        offset: u32,
        value: u32,
        mask: u32,
    },
    Poll {
        subsys: u8,
        base: u64,
        offset: u32,
        value: u32,
        mask: u32,
    },
    Wait {
        event_id: u16,
    },
}

/// Bind logical events to engine ids.
pub fn resolve(cmds: &[Command], events: &EventTable) -> Result<Vec<RawCommand>> {
    cmds.iter()
        .map(|cmd| {
            Ok(match *cmd {
                Command::Write {
                    reg,
                    offset,
                    value,
                    mask,
                } => RawCommand::Write {
                    subsys: reg.subsys,
                    base: reg.base,
                    offset,
                    value,
                    mask,
                },
                Command::Poll {
                    reg,
                    offset,
                    value,
                    mask,
                    ..
                } => RawCommand::Poll {
                    subsys: reg.subsys,
                    base: reg.base,
                    offset,
                    value,
                    mask,
                },
                Command::Wait { event } => RawCommand::Wait {
                    event_id: events.id(event)?,
                },
            })
        })
        .collect()
}

/// Little-endian record stream:
/// `op:u8 subsys:u8 event:u16 offset:u32 base:u64 value:u32 mask:u32`.
pub fn encode(raw: &[RawCommand]) -> Bytes {
    let mut buf = BytesMut::with_capacity(raw.len() * RECORD_SIZE);
    for cmd in raw {
        let (op, subsys, event, base, offset, value, mask) = match *cmd {
            RawCommand::Write {
                subsys,
                base,
                offset,
                value,
                mask,
            } => (OP_WRITE, subsys, 0, base, offset, value, mask),
            RawCommand::Poll {
                subsys,
                base,
                offset,
                value,
                mask,
            } => (OP_POLL, subsys, 0, base, offset, value, mask),
            RawCommand::Wait { event_id } => (OP_WAIT, 0, event_id, 0, 0, 0, 0),
        };
        buf.put_u8(op);
        buf.put_u8(subsys);
        buf.put_u16_le(event);
        buf.put_u32_le(offset);
        buf.put_u64_le(base);
        buf.put_u32_le(value);
        buf.put_u32_le(mask);
    }
    buf.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmdq::{CmdBuilder, CompEvent, RegBase};

    #[test]
    fn test_resolve_maps_events_through_table() {
        let reg = RegBase {
            subsys: 3,
            base: 0x1400_4000,
        };
        let mut cmd = CmdBuilder::new(4);
        cmd.write(reg, 0x7c, 1, 1);
        cmd.wait(CompEvent::IspP2Done(3));

        let raw = resolve(cmd.commands(), &EventTable::default()).unwrap();
        assert_eq!(
            raw[0],
            RawCommand::Write {
                subsys: 3,
                base: 0x1400_4000,
                offset: 0x7c,
                value: 1,
                mask: 1,
            }
        );
        assert_eq!(raw[1], RawCommand::Wait { event_id: 132 });
    }

    #[test]
    fn test_encode_record_layout() {
        let bytes = encode(&[
            RawCommand::Poll {
                subsys: 1,
                base: 0x1400_1000,
                offset: 0x408,
                value: 0x100,
                mask: 0x100,
            },
            RawCommand::Wait { event_id: 20 },
        ]);

        assert_eq!(bytes.len(), 2 * RECORD_SIZE);
        assert_eq!(bytes[0], OP_POLL);
        assert_eq!(bytes[1], 1);
        assert_eq!(&bytes[4..8], &0x408u32.to_le_bytes());
        assert_eq!(&bytes[8..16], &0x1400_1000u64.to_le_bytes());
        assert_eq!(bytes[RECORD_SIZE], OP_WAIT);
        assert_eq!(&bytes[RECORD_SIZE + 2..RECORD_SIZE + 4], &20u16.to_le_bytes());
    }
}
