//! RSZ: polyphase resizer.

use super::{CompCtx, CompOps, Rect};
use crate::cmdq::CmdBuilder;
use crate::error::{Error, Result};

pub mod regs {
    pub const ENABLE: u32 = 0x000;
    pub const CONTROL_1: u32 = 0x004;
    pub const CONTROL_2: u32 = 0x008;
    pub const INPUT_IMAGE: u32 = 0x010;
    pub const OUTPUT_IMAGE: u32 = 0x014;
    pub const HORIZONTAL_COEFF_STEP: u32 = 0x018;
    pub const VERTICAL_COEFF_STEP: u32 = 0x01c;
    pub const LUMA_HORIZONTAL_INTEGER_OFFSET: u32 = 0x020;
    pub const LUMA_HORIZONTAL_SUBPIXEL_OFFSET: u32 = 0x024;
    pub const LUMA_VERTICAL_INTEGER_OFFSET: u32 = 0x028;
    pub const LUMA_VERTICAL_SUBPIXEL_OFFSET: u32 = 0x02c;
    pub const CHROMA_HORIZONTAL_INTEGER_OFFSET: u32 = 0x030;
    pub const CHROMA_HORIZONTAL_SUBPIXEL_OFFSET: u32 = 0x034;
}

/// Decimation clock-gating disable in CONTROL_1.
const DCM_OFF: u32 = 1 << 27;

/// Tiles this narrow or narrower stall with decimation gating enabled.
const DCM_SMALL_SAMPLE_WIDTH: u32 = 16;

pub struct RszOps;

impl RszOps {
    fn small_sample(ctx: &CompCtx<'_>, index: usize) -> Result<bool> {
        Ok(ctx.caps().rsz_disable_dcm_small_sample
            && ctx.subfrm(index)?.input.width() <= DCM_SMALL_SAMPLE_WIDTH)
    }
}

impl CompOps for RszOps {
    fn init(&self, ctx: &CompCtx<'_>, cmd: &mut CmdBuilder) -> Result<()> {
        let reg = ctx.comp.reg;

        cmd.write(reg, regs::ENABLE, 0x0001_0000, 0x0001_0000);
        cmd.write(reg, regs::ENABLE, 0x0000_0000, 0x0001_0000);
        cmd.write(reg, regs::ENABLE, 0x0000_0001, 0x0000_0001);
        Ok(())
    }

    fn config_frame(&self, ctx: &CompCtx<'_>, _compose: &Rect, cmd: &mut CmdBuilder) -> Result<()> {
        let reg = ctx.comp.reg;

        if ctx.param.frame.bypass {
            cmd.write(reg, regs::ENABLE, 0x0000_0000, 0x0000_0001);
            return Ok(());
        }

        let rsz = ctx.param.data.rsz()?;
        cmd.write(reg, regs::CONTROL_1, rsz.control1, 0x03FF_FDF3);
        cmd.write(reg, regs::CONTROL_2, rsz.control2, 0x0FFF_C290);
        cmd.write(reg, regs::HORIZONTAL_COEFF_STEP, rsz.coeff_step_x, 0x007F_FFFF);
        cmd.write(reg, regs::VERTICAL_COEFF_STEP, rsz.coeff_step_y, 0x007F_FFFF);
        Ok(())
    }

    fn config_subfrm(&self, ctx: &CompCtx<'_>, index: usize, cmd: &mut CmdBuilder) -> Result<()> {
        let rsz = ctx.param.data.rsz()?;
        let subfrm = rsz
            .subfrms
            .get(index)
            .ok_or_else(|| Error::invalid(format!("RSZ has no subframe {index}")))?;
        let csf = ctx.subfrm(index)?;
        let reg = ctx.comp.reg;

        cmd.write(reg, regs::CONTROL_2, subfrm.control2, 0x0000_3800);
        cmd.write(reg, regs::INPUT_IMAGE, subfrm.src, 0xFFFF_FFFF);

        if Self::small_sample(ctx, index)? {
            cmd.write(reg, regs::CONTROL_1, DCM_OFF, DCM_OFF);
        }

        // Offsets are signed on the wire; the registers take the raw bits.
        cmd.write(
            reg,
            regs::LUMA_HORIZONTAL_INTEGER_OFFSET,
            csf.luma.left as u32,
            0x0000_FFFF,
        );
        cmd.write(
            reg,
            regs::LUMA_HORIZONTAL_SUBPIXEL_OFFSET,
            csf.luma.left_subpix,
            0x001F_FFFF,
        );
        cmd.write(
            reg,
            regs::LUMA_VERTICAL_INTEGER_OFFSET,
            csf.luma.top as u32,
            0x0000_FFFF,
        );
        cmd.write(
            reg,
            regs::LUMA_VERTICAL_SUBPIXEL_OFFSET,
            csf.luma.top_subpix,
            0x001F_FFFF,
        );
        cmd.write(
            reg,
            regs::CHROMA_HORIZONTAL_INTEGER_OFFSET,
            csf.chroma.left as u32,
            0x0000_FFFF,
        );
        cmd.write(
            reg,
            regs::CHROMA_HORIZONTAL_SUBPIXEL_OFFSET,
            csf.chroma.left_subpix,
            0x001F_FFFF,
        );

        cmd.write(reg, regs::OUTPUT_IMAGE, subfrm.clip, 0xFFFF_FFFF);
        Ok(())
    }

    fn advance_subfrm(&self, ctx: &CompCtx<'_>, index: usize, cmd: &mut CmdBuilder) -> Result<()> {
        if Self::small_sample(ctx, index)? {
            cmd.write(ctx.comp.reg, regs::CONTROL_1, 0, DCM_OFF);
        }
        Ok(())
    }
}
