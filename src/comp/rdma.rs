//! RDMA: DMA read of the source frame.

use tracing::error;

use super::{rsz, CompCtx, CompId, CompOps, Rect};
use crate::cmdq::{CmdBuilder, CompEvent, RegBase};
use crate::error::{Error, Result};

pub mod regs {
    pub const EN: u32 = 0x000;
    pub const RESET: u32 = 0x008;
    pub const CON: u32 = 0x020;
    pub const GMCIF_CON: u32 = 0x028;
    pub const SRC_CON: u32 = 0x030;
    pub const MF_BKGD_SIZE_IN_BYTE: u32 = 0x060;
    pub const MF_BKGD_SIZE_IN_PXL: u32 = 0x068;
    pub const MF_SRC_SIZE: u32 = 0x070;
    pub const MF_CLIP_SIZE: u32 = 0x078;
    pub const MF_OFFSET_1: u32 = 0x080;
    pub const SF_BKGD_SIZE_IN_BYTE: u32 = 0x090;
    pub const SRC_END_0: u32 = 0x100;
    pub const SRC_END_1: u32 = 0x108;
    pub const SRC_END_2: u32 = 0x110;
    pub const SRC_OFFSET_0: u32 = 0x118;
    pub const SRC_OFFSET_1: u32 = 0x120;
    pub const SRC_OFFSET_2: u32 = 0x128;
    pub const SRC_OFFSET_0_P: u32 = 0x148;
    pub const TRANSFORM_0: u32 = 0x200;
    pub const RESV_DUMMY_0: u32 = 0x2a0;
    pub const MON_STA_1: u32 = 0x408;
    pub const SRC_BASE_0: u32 = 0xf00;
    pub const SRC_BASE_1: u32 = 0xf08;
    pub const SRC_BASE_2: u32 = 0xf10;
    pub const UFO_DEC_LENGTH_BASE_Y: u32 = 0xf20;
    pub const UFO_DEC_LENGTH_BASE_C: u32 = 0xf28;
}

/// Burst type 8 with pre-ultra fetch enabled.
const GMCIF_CTRL: u32 = (1 << 0) | (7 << 4) | (1 << 16);

/// Input width above which the upsampler must repeat instead of interpolate.
const UPSAMPLE_REPEAT_WIDTH: u32 = 320;

pub struct RdmaOps;

impl CompOps for RdmaOps {
    fn init(&self, ctx: &CompCtx<'_>, cmd: &mut CmdBuilder) -> Result<()> {
        let reg = ctx.comp.reg;

        // RSZ1 shares SRAM with RDMA0 and must be off before the reader resets.
        if ctx.caps().rdma_support_10bit && ctx.comp.id == CompId::Rdma0 {
            if let Some(prz1) = ctx.device().registry().get(CompId::Rsz1) {
                let prz1 = RegBase {
                    subsys: reg.subsys,
                    base: prz1.reg.base,
                };
                cmd.write(prz1, rsz::regs::ENABLE, 0x0000_0000, 0x0000_0001);
            }
        }

        cmd.write(reg, regs::RESET, 0x0000_0001, 0x0000_0001);
        cmd.poll(reg, regs::MON_STA_1, 0x0000_0100, 0x0000_0100)?;
        cmd.write(reg, regs::RESET, 0x0000_0000, 0x0000_0001);
        Ok(())
    }

    fn config_frame(&self, ctx: &CompCtx<'_>, _compose: &Rect, cmd: &mut CmdBuilder) -> Result<()> {
        let rdma = ctx.param.data.rdma()?;
        let caps = ctx.caps();
        let format = ctx.input.buffer.format.colorformat;
        let block10bit = format.is_10bit_packed();
        let en_ufo = format.is_ufp();
        let reg = ctx.comp.reg;

        if caps.rdma_support_10bit {
            let dummy = if block10bit { 0x0000_0007 } else { 0x0000_0000 };
            cmd.write(reg, regs::RESV_DUMMY_0, dummy, 0x0000_0007);
        }

        cmd.write(reg, regs::GMCIF_CON, GMCIF_CTRL, 0x0003_0071);
        cmd.write(reg, regs::SRC_CON, rdma.src_ctrl, 0x03C8_FE0F);

        if caps.rdma_support_10bit && en_ufo {
            cmd.write(reg, regs::UFO_DEC_LENGTH_BASE_Y, rdma.ufo_dec_y, 0xFFFF_FFFF);
            cmd.write(reg, regs::UFO_DEC_LENGTH_BASE_C, rdma.ufo_dec_c, 0xFFFF_FFFF);
            if block10bit {
                cmd.write(reg, regs::MF_BKGD_SIZE_IN_PXL, rdma.mf_bkgd_in_pxl, 0x001F_FFFF);
            }
        }

        cmd.write(reg, regs::CON, rdma.control, 0x0000_1110);

        for (offset, iova) in [regs::SRC_BASE_0, regs::SRC_BASE_1, regs::SRC_BASE_2]
            .into_iter()
            .zip(rdma.iova)
        {
            cmd.write(reg, offset, iova, 0xFFFF_FFFF);
        }
        for (offset, end) in [regs::SRC_END_0, regs::SRC_END_1, regs::SRC_END_2]
            .into_iter()
            .zip(rdma.iova_end)
        {
            cmd.write(reg, offset, end, 0xFFFF_FFFF);
        }

        cmd.write(reg, regs::MF_BKGD_SIZE_IN_BYTE, rdma.mf_bkgd, 0x001F_FFFF);
        cmd.write(reg, regs::SF_BKGD_SIZE_IN_BYTE, rdma.sf_bkgd, 0x001F_FFFF);
        cmd.write(reg, regs::TRANSFORM_0, rdma.transform, 0x0F11_0000);
        Ok(())
    }

    fn config_subfrm(&self, ctx: &CompCtx<'_>, index: usize, cmd: &mut CmdBuilder) -> Result<()> {
        let rdma = ctx.param.data.rdma()?;
        let subfrm = rdma
            .subfrms
            .get(index)
            .ok_or_else(|| Error::invalid(format!("RDMA has no subframe {index}")))?;
        let csf = ctx.subfrm(index)?;
        let caps = ctx.caps();
        let format = ctx.input.buffer.format.colorformat;
        let reg = ctx.comp.reg;

        cmd.write(reg, regs::EN, 0x0000_0001, 0x0000_0001);

        cmd.write(reg, regs::SRC_OFFSET_0, subfrm.offset[0], 0xFFFF_FFFF);
        if caps.rdma_support_10bit && format.is_10bit_packed() && format.is_ufp() {
            cmd.write(reg, regs::SRC_OFFSET_0_P, subfrm.offset_0_p, 0xFFFF_FFFF);
        }
        cmd.write(reg, regs::SRC_OFFSET_1, subfrm.offset[1], 0xFFFF_FFFF);
        cmd.write(reg, regs::SRC_OFFSET_2, subfrm.offset[2], 0xFFFF_FFFF);

        cmd.write(reg, regs::MF_SRC_SIZE, subfrm.src, 0x1FFF_1FFF);
        cmd.write(reg, regs::MF_CLIP_SIZE, subfrm.clip, 0x1FFF_1FFF);
        cmd.write(reg, regs::MF_OFFSET_1, subfrm.clip_ofst, 0x003F_001F);

        if caps.rdma_upsample_repeat_only && csf.input.width() > UPSAMPLE_REPEAT_WIDTH {
            cmd.write(reg, regs::RESV_DUMMY_0, 0x0000_0004, 0x0000_0004);
        }
        Ok(())
    }

    /// Only alias 0 is reachable from a registry; the match table has no second RDMA id.
    fn wait_comp_event(&self, ctx: &CompCtx<'_>, cmd: &mut CmdBuilder) -> Result<()> {
        if ctx.comp.alias == 0 {
            cmd.wait(CompEvent::Rdma0Done);
        } else {
            error!(alias = ctx.comp.alias, "Do not support RDMA{}_DONE event", ctx.comp.alias);
            cmd.mark_best_effort(Error::UnsupportedOperation {
                comp: ctx.comp.id,
                reason: "no completion event modeled for this RDMA alias",
            });
        }

        cmd.write(ctx.comp.reg, regs::EN, 0x0000_0000, 0x0000_0001);
        Ok(())
    }
}
