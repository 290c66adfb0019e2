//! CCORR: color correction. Runs as identity, only its size tracks the tile.

use super::{CompCtx, CompOps};
use crate::cmdq::CmdBuilder;
use crate::error::Result;

pub mod regs {
    pub const EN: u32 = 0x000;
    pub const CFG: u32 = 0x020;
    pub const SIZE: u32 = 0x030;
}

pub struct CcorrOps;

impl CompOps for CcorrOps {
    fn init(&self, ctx: &CompCtx<'_>, cmd: &mut CmdBuilder) -> Result<()> {
        let reg = ctx.comp.reg;

        cmd.write(reg, regs::EN, 0x0000_0001, 0x0000_0001);
        // Relay mode.
        cmd.write(reg, regs::CFG, 0x0000_0001, 0x0000_0001);
        Ok(())
    }

    fn config_subfrm(&self, ctx: &CompCtx<'_>, index: usize, cmd: &mut CmdBuilder) -> Result<()> {
        let size = ctx.subfrm(index)?.input.packed_size();
        cmd.write(ctx.comp.reg, regs::SIZE, size, 0x1FFF_1FFF);
        Ok(())
    }
}
