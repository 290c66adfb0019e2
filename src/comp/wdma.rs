//! WDMA: linear DMA writer.

use super::{CompCtx, CompOps, Rect};
use crate::cmdq::{CmdBuilder, CompEvent};
use crate::error::{Error, Result};

pub mod regs {
    pub const EN: u32 = 0x008;
    pub const RST: u32 = 0x00c;
    pub const CFG: u32 = 0x014;
    pub const SRC_SIZE: u32 = 0x018;
    pub const CLIP_SIZE: u32 = 0x01c;
    pub const CLIP_COORD: u32 = 0x020;
    pub const DST_W_IN_BYTE: u32 = 0x028;
    pub const ALPHA: u32 = 0x02c;
    pub const BUF_CON2: u32 = 0x03c;
    pub const DST_UV_PITCH: u32 = 0x078;
    pub const DST_ADDR_OFFSET: u32 = 0x080;
    pub const DST_ADDR_OFFSET2: u32 = 0x084;
    pub const DST_ADDR_OFFSET3: u32 = 0x088;
    pub const FLOW_CTRL_DBG: u32 = 0x0a0;
    pub const DST_ADDR: u32 = 0xf00;
    pub const DST_ADDR2: u32 = 0xf04;
    pub const DST_ADDR3: u32 = 0xf08;
}

/// Ultra and pre-ultra FIFO thresholds.
const BUF_CON2_THRESHOLDS: u32 = 0x1010_1050;

pub struct WdmaOps;

impl CompOps for WdmaOps {
    fn init(&self, ctx: &CompCtx<'_>, cmd: &mut CmdBuilder) -> Result<()> {
        let reg = ctx.comp.reg;

        cmd.write(reg, regs::RST, 0x0000_0001, 0x0000_0001);
        cmd.poll(reg, regs::FLOW_CTRL_DBG, 0x0000_0001, 0x0000_0001)?;
        cmd.write(reg, regs::RST, 0x0000_0000, 0x0000_0001);
        Ok(())
    }

    fn config_frame(&self, ctx: &CompCtx<'_>, _compose: &Rect, cmd: &mut CmdBuilder) -> Result<()> {
        let wdma = ctx.param.data.wdma()?;
        let reg = ctx.comp.reg;

        cmd.write(reg, regs::BUF_CON2, BUF_CON2_THRESHOLDS, 0xFFFF_FFFF);
        cmd.write(reg, regs::CFG, wdma.wdma_cfg, 0x0F01_B8F0);

        for (offset, iova) in [regs::DST_ADDR, regs::DST_ADDR2, regs::DST_ADDR3]
            .into_iter()
            .zip(wdma.iova)
        {
            cmd.write(reg, offset, iova, 0xFFFF_FFFF);
        }

        cmd.write(reg, regs::DST_W_IN_BYTE, wdma.w_in_byte, 0x0000_FFFF);
        cmd.write(reg, regs::DST_UV_PITCH, wdma.uv_stride, 0x0000_FFFF);
        cmd.write(reg, regs::ALPHA, 0x8000_00FF, 0x8000_00FF);
        Ok(())
    }

    fn config_subfrm(&self, ctx: &CompCtx<'_>, index: usize, cmd: &mut CmdBuilder) -> Result<()> {
        let wdma = ctx.param.data.wdma()?;
        let subfrm = wdma
            .subfrms
            .get(index)
            .ok_or_else(|| Error::invalid(format!("WDMA has no subframe {index}")))?;
        let reg = ctx.comp.reg;

        for (offset, ofst) in [
            regs::DST_ADDR_OFFSET,
            regs::DST_ADDR_OFFSET2,
            regs::DST_ADDR_OFFSET3,
        ]
        .into_iter()
        .zip(subfrm.offset)
        {
            cmd.write(reg, offset, ofst, 0x0FFF_FFFF);
        }

        cmd.write(reg, regs::SRC_SIZE, subfrm.src, 0x3FFF_3FFF);
        cmd.write(reg, regs::CLIP_SIZE, subfrm.clip, 0x3FFF_3FFF);
        cmd.write(reg, regs::CLIP_COORD, subfrm.clip_ofst, 0x3FFF_3FFF);

        cmd.write(reg, regs::EN, 0x0000_0001, 0x0000_0001);
        Ok(())
    }

    fn wait_comp_event(&self, ctx: &CompCtx<'_>, cmd: &mut CmdBuilder) -> Result<()> {
        cmd.wait(CompEvent::Wdma0Done);
        cmd.write(ctx.comp.reg, regs::EN, 0x0000_0000, 0x0000_0001);
        Ok(())
    }
}
