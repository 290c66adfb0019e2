use serde::{Deserialize, Serialize};

use super::event::CompEvent;
use crate::error::{Error, Result};

/// Upper bound the execution engine accepts for a single poll entry.
pub const MAX_POLL_RETRIES: u32 = 0x1000;

/// Register window of one block as seen by the command-queue engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegBase {
    pub subsys: u8,
    pub base: u64,
}

/// One entry of a command batch. Entries are immutable once appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Masked write: only bits set in `mask` change.
    Write {
        reg: RegBase,
        offset: u32,
        value: u32,
        mask: u32,
    },
    /// Spin until `(reg & mask) == value`, at most `retries` times.
    Poll {
        reg: RegBase,
        offset: u32,
        value: u32,
        mask: u32,
        retries: u32,
    },
    /// Hardware interrupt wait.
    Wait { event: CompEvent },
}

/// Ordered accumulator for one job's commands.
#[derive(Debug)]
pub struct CmdBuilder {
    cmds: Vec<Command>,
    poll_retries: u32,
    best_effort: Vec<Error>,
}

impl CmdBuilder {
    pub fn new(poll_retries: u32) -> Self {
        Self {
            cmds: Vec::with_capacity(128),
            poll_retries,
            best_effort: Vec::new(),
        }
    }

    pub fn write(&mut self, reg: RegBase, offset: u32, value: u32, mask: u32) {
        self.cmds.push(Command::Write {
            reg,
            offset,
            value: value & mask,
            mask,
        });
    }

    pub fn poll(&mut self, reg: RegBase, offset: u32, value: u32, mask: u32) -> Result<()> {
        if self.poll_retries == 0 || self.poll_retries > MAX_POLL_RETRIES {
            return Err(Error::ResourceUnavailable(format!(
                "poll at {:#x}+{:#x} needs a retry budget in 1..={}, have {}",
                reg.base, offset, MAX_POLL_RETRIES, self.poll_retries
            )));
        }
        self.cmds.push(Command::Poll {
            reg,
            offset,
            value: value & mask,
            mask,
            retries: self.poll_retries,
        });
        Ok(())
    }

    pub fn wait(&mut self, event: CompEvent) {
        self.cmds.push(Command::Wait { event });
    }

    /// Record an operation that was emitted without a hardware guarantee.
    pub fn mark_best_effort(&mut self, err: Error) {
        self.best_effort.push(err);
    }

    pub fn commands(&self) -> &[Command] {
        &self.cmds
    }

    pub fn best_effort(&self) -> &[Error] {
        &self.best_effort
    }

    pub fn len(&self) -> usize {
        self.cmds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    pub fn finish(self) -> (Vec<Command>, Vec<Error>) {
        (self.cmds, self.best_effort)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REG: RegBase = RegBase {
        subsys: 2,
        base: 0x1400_1000,
    };

    #[test]
    fn test_write_strips_bits_outside_mask() {
        let mut cmd = CmdBuilder::new(16);
        cmd.write(REG, 0x30, 0xFFFF_FFFF, 0x0000_00F3);

        assert_eq!(
            cmd.commands(),
            &[Command::Write {
                reg: REG,
                offset: 0x30,
                value: 0xF3,
                mask: 0xF3,
            }]
        );
    }

    #[test]
    fn test_poll_carries_budget() {
        let mut cmd = CmdBuilder::new(64);
        cmd.poll(REG, 0x408, 0x100, 0x100).unwrap();

        match cmd.commands()[0] {
            Command::Poll { retries, value, .. } => {
                assert_eq!(retries, 64);
                assert_eq!(value, 0x100);
            }
            other => panic!("unexpected entry {other:?}"),
        }
    }

    #[test]
    fn test_poll_rejects_unbounded_budget() {
        let mut zero = CmdBuilder::new(0);
        assert!(matches!(
            zero.poll(REG, 0x14, 1, 1),
            Err(Error::ResourceUnavailable(_))
        ));
        assert!(zero.is_empty());

        let mut huge = CmdBuilder::new(MAX_POLL_RETRIES + 1);
        assert!(huge.poll(REG, 0x14, 1, 1).is_err());
        assert!(huge.is_empty());
    }

    #[test]
    fn test_entries_keep_append_order() {
        let mut cmd = CmdBuilder::new(8);
        cmd.write(REG, 0x0, 1, 1);
        cmd.wait(CompEvent::Wdma0Done);
        cmd.write(REG, 0x0, 0, 1);

        let (cmds, best_effort) = cmd.finish();
        assert_eq!(cmds.len(), 3);
        assert!(matches!(cmds[1], Command::Wait { event: CompEvent::Wdma0Done }));
        assert!(best_effort.is_empty());
    }
}
