//! ISP hand-off (IMGI) and direct-link input (CAMIN).

use tracing::{error, info};

use super::param::IspData;
use super::{CompCtx, CompId, CompOps, Rect};
use crate::cmdq::{CmdBuilder, CompEvent};
use crate::error::{Error, Result};

/// Completion-queue threads on the pass-2 engine.
pub const ISP_CQ_THREADS: u32 = 12;

pub mod regs {
    pub const DL_SEL: u32 = 0x0030;
    pub const CQ_TRIGGER: u32 = 0x2000;
    /// First CQ thread base; threads are `CQ_THR_STRIDE` apart.
    pub const CQ_THR0_BASEADDR: u32 = 0x2208;
    pub const CQ_THR_STRIDE: u32 = 0x000c;
    pub const TDR_BASE: u32 = 0x2304;

    /// `(SMXI, SMXO)` base pairs.
    pub const SMX_PAIRS: [(u32, u32); 4] = [
        (0x2890, 0x27d0),
        (0x28c0, 0x2800),
        (0x28f0, 0x2830),
        (0x2920, 0x2860),
    ];
}

const DL_SEL_CAMIN: u32 = 0x0000_0200;
const DL_SEL_CAMIN2: u32 = 0x0000_0c00;

fn cq_thread(ctx: &CompCtx<'_>, isp: &IspData) -> Result<u32> {
    if isp.cq_idx >= ISP_CQ_THREADS {
        error!(cq_idx = isp.cq_idx, "Invalid ISP CQ index");
        return Err(Error::invalid(format!(
            "{:?} CQ index {} outside 0..{ISP_CQ_THREADS}",
            ctx.comp.id, isp.cq_idx
        )));
    }
    Ok(isp.cq_idx)
}

pub struct ImgiOps;

impl CompOps for ImgiOps {
    fn init(&self, ctx: &CompCtx<'_>, cmd: &mut CmdBuilder) -> Result<()> {
        let isp = ctx.param.data.isp()?;

        for id in [CompId::Camin, CompId::Camin2] {
            if isp.direct_link(id) {
                info!("Direct link to {:?}", id);
                ctx.mmsys().isp_ctrl(cmd, id)?;
            }
        }
        Ok(())
    }

    fn config_frame(&self, ctx: &CompCtx<'_>, _compose: &Rect, cmd: &mut CmdBuilder) -> Result<()> {
        let isp = ctx.param.data.isp()?;
        let cq = cq_thread(ctx, isp)?;
        let reg = ctx.comp.reg;

        for (&(smxi, smxo), iova) in regs::SMX_PAIRS.iter().zip(isp.smxi_iova) {
            cmd.write(reg, smxi, iova, 0xFFFF_FFFF);
            cmd.write(reg, smxo, iova, 0xFFFF_FFFF);
        }

        let thread_base = regs::CQ_THR0_BASEADDR + regs::CQ_THR_STRIDE * cq;
        cmd.write(reg, thread_base, isp.cq_iova, 0xFFFF_FFFF);
        Ok(())
    }

    fn config_subfrm(&self, ctx: &CompCtx<'_>, index: usize, cmd: &mut CmdBuilder) -> Result<()> {
        let isp = ctx.param.data.isp()?;
        let tpipe = isp
            .tpipe_iova
            .get(index)
            .copied()
            .ok_or_else(|| Error::invalid(format!("ISP has no tpipe for subframe {index}")))?;

        cmd.write(ctx.comp.reg, regs::TDR_BASE, tpipe, 0xFFFF_FFFF);
        Ok(())
    }

    fn wait_comp_event(&self, ctx: &CompCtx<'_>, cmd: &mut CmdBuilder) -> Result<()> {
        let isp = ctx.param.data.isp()?;
        let cq = cq_thread(ctx, isp)?;
        let reg = ctx.comp.reg;

        if isp.direct_link(CompId::Camin) {
            cmd.write(reg, regs::DL_SEL, 0x0000_0000, DL_SEL_CAMIN);
        }
        if isp.direct_link(CompId::Camin2) {
            cmd.write(reg, regs::DL_SEL, 0x0000_0000, DL_SEL_CAMIN2);
        }

        cmd.write(reg, regs::CQ_TRIGGER, 1 << cq, 1 << cq);
        // cq < 12, so it fits.
        cmd.wait(CompEvent::IspP2Done(cq as u8));
        Ok(())
    }
}

pub struct CaminOps;

impl CompOps for CaminOps {
    fn config_subfrm(&self, ctx: &CompCtx<'_>, index: usize, cmd: &mut CmdBuilder) -> Result<()> {
        let id = match ctx.comp.alias {
            0 => CompId::Camin,
            1 => CompId::Camin2,
            alias => {
                return Err(Error::invalid(format!("no direct-link input with alias {alias}")))
            }
        };
        let input = ctx.subfrm(index)?.input;

        ctx.mmsys()
            .camin_ctrl(cmd, id, input.width(), input.height())
    }
}
