//! WROT: rotating DMA writer.

use tracing::error;

use super::{CompCtx, CompOps, Rect};
use crate::cmdq::{CmdBuilder, CompEvent};
use crate::error::{Error, Result};

pub mod regs {
    pub const CTRL: u32 = 0x000;
    pub const MAIN_BUF_SIZE: u32 = 0x008;
    pub const SOFT_RST: u32 = 0x010;
    pub const SOFT_RST_STAT: u32 = 0x014;
    pub const CROP_OFST: u32 = 0x020;
    pub const TAR_SIZE: u32 = 0x024;
    pub const OFST_ADDR: u32 = 0x02c;
    pub const STRIDE: u32 = 0x030;
    pub const OFST_ADDR_C: u32 = 0x038;
    pub const STRIDE_C: u32 = 0x03c;
    pub const DITHER: u32 = 0x054;
    pub const OFST_ADDR_V: u32 = 0x068;
    pub const STRIDE_V: u32 = 0x06c;
    pub const RSV_1: u32 = 0x070;
    pub const IN_SIZE: u32 = 0x078;
    pub const ROT_EN: u32 = 0x07c;
    pub const FIFO_TEST: u32 = 0x080;
    pub const MAT_CTRL: u32 = 0x084;
    pub const BASE_ADDR: u32 = 0xf00;
    pub const BASE_ADDR_C: u32 = 0xf04;
    pub const BASE_ADDR_V: u32 = 0xf08;
}

const FILTER_MASK: u32 = 0x0000_0077;

pub struct WrotOps;

impl CompOps for WrotOps {
    fn init(&self, ctx: &CompCtx<'_>, cmd: &mut CmdBuilder) -> Result<()> {
        let reg = ctx.comp.reg;

        cmd.write(reg, regs::SOFT_RST, 0x0000_0001, 0x0000_0001);
        cmd.poll(reg, regs::SOFT_RST_STAT, 0x0000_0001, 0x0000_0001)?;
        cmd.write(reg, regs::SOFT_RST, 0x0000_0000, 0x0000_0001);
        cmd.poll(reg, regs::SOFT_RST_STAT, 0x0000_0000, 0x0000_0001)?;
        Ok(())
    }

    fn config_frame(&self, ctx: &CompCtx<'_>, _compose: &Rect, cmd: &mut CmdBuilder) -> Result<()> {
        let wrot = ctx.param.data.wrot()?;
        let reg = ctx.comp.reg;

        for (offset, iova) in [regs::BASE_ADDR, regs::BASE_ADDR_C, regs::BASE_ADDR_V]
            .into_iter()
            .zip(wrot.iova)
        {
            cmd.write(reg, offset, iova, 0xFFFF_FFFF);
        }

        cmd.write(reg, regs::CTRL, wrot.control, 0xF131_510F);
        for (offset, stride) in [regs::STRIDE, regs::STRIDE_C, regs::STRIDE_V]
            .into_iter()
            .zip(wrot.stride)
        {
            cmd.write(reg, offset, stride, 0x0000_FFFF);
        }

        cmd.write(reg, regs::MAT_CTRL, wrot.mat_ctrl, 0x0000_00F3);
        // Alpha passthrough and dither off.
        cmd.write(reg, regs::DITHER, 0xFF00_0000, 0xFF00_0000);
        cmd.write(reg, regs::RSV_1, 0x8000_0000, 0x8000_0000);

        if wrot.fifo_test != 0 {
            cmd.write(reg, regs::FIFO_TEST, wrot.fifo_test, 0x0000_0FFF);
        }
        if ctx.caps().wrot_filter_constraint {
            cmd.write(reg, regs::MAIN_BUF_SIZE, wrot.filter, FILTER_MASK);
        }
        Ok(())
    }

    fn config_subfrm(&self, ctx: &CompCtx<'_>, index: usize, cmd: &mut CmdBuilder) -> Result<()> {
        let wrot = ctx.param.data.wrot()?;
        let subfrm = wrot
            .subfrms
            .get(index)
            .ok_or_else(|| Error::invalid(format!("WROT has no subframe {index}")))?;
        let reg = ctx.comp.reg;

        for (offset, ofst) in [regs::OFST_ADDR, regs::OFST_ADDR_C, regs::OFST_ADDR_V]
            .into_iter()
            .zip(subfrm.offset)
        {
            cmd.write(reg, offset, ofst, 0x0FFF_FFFF);
        }

        cmd.write(reg, regs::IN_SIZE, subfrm.src, 0x1FFF_1FFF);
        cmd.write(reg, regs::TAR_SIZE, subfrm.clip, 0x1FFF_1FFF);
        cmd.write(reg, regs::CROP_OFST, subfrm.clip_ofst, 0x1FFF_1FFF);
        cmd.write(reg, regs::MAIN_BUF_SIZE, subfrm.main_buf, 0x1FFF_7F00);

        cmd.write(reg, regs::ROT_EN, 0x0000_0001, 0x0000_0001);
        Ok(())
    }

    /// Only alias 0 is reachable from a registry; the match table has no second WROT id.
    fn wait_comp_event(&self, ctx: &CompCtx<'_>, cmd: &mut CmdBuilder) -> Result<()> {
        let reg = ctx.comp.reg;

        if ctx.comp.alias == 0 {
            cmd.wait(CompEvent::Wrot0Done);
        } else {
            error!(alias = ctx.comp.alias, "Do not support WROT{}_DONE event", ctx.comp.alias);
            cmd.mark_best_effort(Error::UnsupportedOperation {
                comp: ctx.comp.id,
                reason: "no completion event modeled for this WROT alias",
            });
        }

        if ctx.caps().wrot_filter_constraint {
            cmd.write(reg, regs::MAIN_BUF_SIZE, 0x0000_0000, FILTER_MASK);
        }

        cmd.write(reg, regs::ROT_EN, 0x0000_0000, 0x0000_0001);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmdq::Command;
    use crate::comp::param::{CompData, CompParam, WrotData, WrotSubfrm};
    use crate::comp::testutil::{builder, param, writes, Fixture};
    use crate::comp::{Capabilities, CompId};

    fn wrot_param(fifo_test: u32) -> CompParam {
        let data = WrotData {
            iova: [0xa000, 0xb000, 0xc000],
            control: 0x1,
            stride: [1280, 640, 640],
            mat_ctrl: 0x3,
            fifo_test,
            filter: 0x22,
            subfrms: vec![WrotSubfrm {
                offset: [0, 0x100, 0x200],
                src: (320 << 16) | 240,
                clip: (320 << 16) | 240,
                clip_ofst: 0,
                main_buf: 0x0008_0000,
            }],
        };
        param(CompId::Wrot0, 1, CompData::Wrot(data))
    }

    #[test]
    fn test_init_resets_with_handshake() {
        let fx = Fixture::new(Capabilities::default());
        let p = wrot_param(0);
        let mut cmd = builder();
        WrotOps.init(&fx.ctx(&p), &mut cmd).unwrap();

        let cmds = cmd.commands();
        assert_eq!(cmds.len(), 4);
        assert!(matches!(cmds[1], Command::Poll { offset: regs::SOFT_RST_STAT, value: 1, .. }));
        assert!(matches!(cmds[3], Command::Poll { offset: regs::SOFT_RST_STAT, value: 0, .. }));
    }

    #[test]
    fn test_frame_sets_alpha_passthrough() {
        let fx = Fixture::new(Capabilities::default());
        let p = wrot_param(0);
        let mut cmd = builder();
        WrotOps
            .config_frame(&fx.ctx(&p), &Rect::default(), &mut cmd)
            .unwrap();

        let w = writes(&cmd);
        assert!(w.contains(&(regs::DITHER, 0xFF00_0000, 0xFF00_0000)));
        assert!(w.contains(&(regs::RSV_1, 0x8000_0000, 0x8000_0000)));
        assert!(w.iter().all(|&(off, ..)| off != regs::FIFO_TEST));
        assert!(w.iter().all(|&(off, ..)| off != regs::MAIN_BUF_SIZE));
    }

    #[test]
    fn test_frame_optional_fifo_and_filter() {
        let fx = Fixture::new(Capabilities {
            wrot_filter_constraint: true,
            ..Default::default()
        });
        let p = wrot_param(0x120);
        let mut cmd = builder();
        WrotOps
            .config_frame(&fx.ctx(&p), &Rect::default(), &mut cmd)
            .unwrap();

        let w = writes(&cmd);
        assert!(w.contains(&(regs::FIFO_TEST, 0x120, 0xFFF)));
        assert_eq!(*w.last().unwrap(), (regs::MAIN_BUF_SIZE, 0x22, FILTER_MASK));
    }

    #[test]
    fn test_subfrm_enables_last() {
        let fx = Fixture::new(Capabilities::default());
        let p = wrot_param(0);
        let mut cmd = builder();
        WrotOps.config_subfrm(&fx.ctx(&p), 0, &mut cmd).unwrap();

        let w = writes(&cmd);
        assert_eq!(w.len(), 8);
        assert_eq!(w[4], (regs::TAR_SIZE, (320 << 16) | 240, 0x1FFF_1FFF));
        assert_eq!(w[7], (regs::ROT_EN, 1, 1));
    }

    #[test]
    fn test_wait_clears_filter_then_disables() {
        let fx = Fixture::new(Capabilities {
            wrot_filter_constraint: true,
            ..Default::default()
        });
        let p = wrot_param(0);
        let mut cmd = builder();
        WrotOps.wait_comp_event(&fx.ctx(&p), &mut cmd).unwrap();

        let cmds = cmd.commands();
        assert_eq!(cmds.len(), 3);
        assert!(matches!(cmds[0], Command::Wait { event: CompEvent::Wrot0Done }));
        assert_eq!(writes(&cmd), vec![(regs::MAIN_BUF_SIZE, 0, FILTER_MASK), (regs::ROT_EN, 0, 1)]);
    }
}
