//! Fixed-function blocks of the data path and their command generators.

pub mod ccorr;
pub mod context;
pub mod isp;
pub mod mmsys;
pub mod param;
pub mod rdma;
pub mod registry;
pub mod rsz;
#[cfg(test)]
pub(crate) mod testutil;
pub mod wdma;
pub mod wrot;

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use crate::cmdq::{CmdBuilder, RegBase};
use crate::error::Result;

pub use context::CompCtx;
pub use mmsys::{MmsysControl, MmsysRegs};
pub use param::Rect;
pub use registry::{ComponentNode, Registry};

/// Block kind. Selects the operation set bound to a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompType {
    Rdma,
    Rsz,
    Wrot,
    Wdma,
    Path1,
    Path2,
    Ccorr,
    Imgi,
    Wpei,
    Exto,
    DlPath1,
    DlPath2,
}

/// Stable component id. Doubles as the bit index in an [`EngineMask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum CompId {
    Wpei = 0,
    Wpeo,
    Wpei2,
    Wpeo2,
    IspImgi,
    IspImgo,
    IspImg2o,
    Camin,
    Camin2,
    Rdma0,
    Ccorr0,
    Rsz0,
    Rsz1,
    Path0Sout,
    Path1Sout,
    Wrot0,
    Wdma,
}

impl CompId {
    pub const COUNT: usize = 17;

    pub const ALL: [CompId; Self::COUNT] = [
        CompId::Wpei,
        CompId::Wpeo,
        CompId::Wpei2,
        CompId::Wpeo2,
        CompId::IspImgi,
        CompId::IspImgo,
        CompId::IspImg2o,
        CompId::Camin,
        CompId::Camin2,
        CompId::Rdma0,
        CompId::Ccorr0,
        CompId::Rsz0,
        CompId::Rsz1,
        CompId::Path0Sout,
        CompId::Path1Sout,
        CompId::Wrot0,
        CompId::Wdma,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Kind and alias this id stands for.
    pub fn matched(self) -> (CompType, u32) {
        match self {
            CompId::Wpei => (CompType::Wpei, 0),
            CompId::Wpeo => (CompType::Exto, 2),
            CompId::Wpei2 => (CompType::Wpei, 1),
            CompId::Wpeo2 => (CompType::Exto, 3),
            CompId::IspImgi => (CompType::Imgi, 0),
            CompId::IspImgo => (CompType::Exto, 0),
            CompId::IspImg2o => (CompType::Exto, 1),
            CompId::Camin => (CompType::DlPath1, 0),
            CompId::Camin2 => (CompType::DlPath2, 1),
            CompId::Rdma0 => (CompType::Rdma, 0),
            CompId::Ccorr0 => (CompType::Ccorr, 0),
            CompId::Rsz0 => (CompType::Rsz, 0),
            CompId::Rsz1 => (CompType::Rsz, 1),
            CompId::Path0Sout => (CompType::Path1, 0),
            CompId::Path1Sout => (CompType::Path2, 1),
            CompId::Wrot0 => (CompType::Wrot, 0),
            CompId::Wdma => (CompType::Wdma, 0),
        }
    }

    pub fn lookup(ty: CompType, alias: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.matched() == (ty, alias))
    }

    pub fn bit(self) -> EngineMask {
        EngineMask(1 << self.index())
    }
}

/// Engine-busy bits claimed by a job, one per [`CompId`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EngineMask(pub u64);

impl EngineMask {
    pub const EMPTY: EngineMask = EngineMask(0);

    pub fn bits(self) -> u64 {
        self.0
    }

    pub fn contains(self, other: EngineMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: EngineMask) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn remove(&mut self, other: EngineMask) {
        self.0 &= !other.0;
    }

    pub fn ids(self) -> impl Iterator<Item = CompId> {
        CompId::ALL
            .into_iter()
            .filter(move |id| self.contains(id.bit()))
    }
}

impl BitOr for EngineMask {
    type Output = EngineMask;

    fn bitor(self, rhs: EngineMask) -> EngineMask {
        EngineMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for EngineMask {
    fn bitor_assign(&mut self, rhs: EngineMask) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for EngineMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#07x}", self.0)
    }
}

/// Board capability table. Operations branch on these, never on a chip name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    pub rdma_support_10bit: bool,
    pub rdma_rsz1_sram_sharing: bool,
    pub rdma_upsample_repeat_only: bool,
    pub rsz_disable_dcm_small_sample: bool,
    pub wrot_filter_constraint: bool,
}

/// Static identity of one discovered block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub ty: CompType,
    pub id: CompId,
    pub alias: u32,
    pub reg: RegBase,
}

/// Lifecycle of one block within a job.
///
/// Every hook defaults to an explicit no-op so the driver can call all of
/// them unconditionally.
pub trait CompOps: Sync {
    fn get_engine_flag(&self, ctx: &CompCtx<'_>) -> EngineMask {
        let caps = ctx.caps();
        if caps.rdma_rsz1_sram_sharing && ctx.comp.id == CompId::Rdma0 {
            return CompId::Rdma0.bit() | CompId::Rsz1.bit();
        }
        ctx.comp.id.bit()
    }

    fn init(&self, _ctx: &CompCtx<'_>, _cmd: &mut CmdBuilder) -> Result<()> {
        Ok(())
    }

    fn config_frame(&self, _ctx: &CompCtx<'_>, _compose: &Rect, _cmd: &mut CmdBuilder) -> Result<()> {
        Ok(())
    }

    fn config_subfrm(&self, _ctx: &CompCtx<'_>, _index: usize, _cmd: &mut CmdBuilder) -> Result<()> {
        Ok(())
    }

    fn advance_subfrm(&self, _ctx: &CompCtx<'_>, _index: usize, _cmd: &mut CmdBuilder) -> Result<()> {
        Ok(())
    }

    fn wait_comp_event(&self, _ctx: &CompCtx<'_>, _cmd: &mut CmdBuilder) -> Result<()> {
        Ok(())
    }

    fn post_process(&self, _ctx: &CompCtx<'_>, _cmd: &mut CmdBuilder) -> Result<()> {
        Ok(())
    }
}

/// Muxes and ISP-side DMA ports. They take part in the job and claim their
/// engine bit but program nothing.
pub struct PassThroughOps;

impl CompOps for PassThroughOps {}

impl CompType {
    /// Operation set bound to this kind.
    pub fn ops(self) -> &'static dyn CompOps {
        match self {
            CompType::Rdma => &rdma::RdmaOps,
            CompType::Rsz => &rsz::RszOps,
            CompType::Wrot => &wrot::WrotOps,
            CompType::Wdma => &wdma::WdmaOps,
            CompType::Ccorr => &ccorr::CcorrOps,
            CompType::Imgi => &isp::ImgiOps,
            CompType::DlPath1 | CompType::DlPath2 => &isp::CaminOps,
            CompType::Path1 | CompType::Path2 | CompType::Wpei | CompType::Exto => &PassThroughOps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_table_round_trips() {
        for id in CompId::ALL {
            let (ty, alias) = id.matched();
            assert_eq!(CompId::lookup(ty, alias), Some(id));
            assert_eq!(CompId::from_index(id.index()), Some(id));
        }
        assert_eq!(CompId::lookup(CompType::Rdma, 1), None);
    }

    #[test]
    fn test_engine_mask_ops() {
        let mut mask = CompId::Rdma0.bit() | CompId::Wrot0.bit();
        assert!(mask.contains(CompId::Rdma0.bit()));
        assert!(mask.intersects(CompId::Wrot0.bit() | CompId::Wdma.bit()));
        assert!(!mask.intersects(CompId::Wdma.bit()));

        mask |= CompId::Rsz1.bit();
        assert_eq!(
            mask.ids().collect::<Vec<_>>(),
            vec![CompId::Rdma0, CompId::Rsz1, CompId::Wrot0]
        );

        mask.remove(CompId::Rdma0.bit());
        assert!(!mask.contains(CompId::Rdma0.bit()));
    }

    #[test]
    fn test_pass_through_kinds_claim_their_bit() {
        use crate::comp::param::CompData;
        use crate::comp::testutil::{builder, param};
        use crate::{Config, MdpDevice};

        let mut config = Config::default();
        config
            .components
            .push(ComponentNode::new(CompType::Path1, 0, 0x1400_0000, 1));
        let dev = MdpDevice::new(&config).unwrap();
        let inputs = vec![Default::default()];
        let outputs = vec![Default::default()];
        let p = param(CompId::Path0Sout, 1, CompData::None);
        let ctx = CompCtx::new(&dev, &p, &inputs, &outputs, 1).unwrap();

        let ops = CompType::Path1.ops();
        assert_eq!(ops.get_engine_flag(&ctx), CompId::Path0Sout.bit());

        let mut cmd = builder();
        ops.init(&ctx, &mut cmd).unwrap();
        ops.config_frame(&ctx, &Rect::default(), &mut cmd).unwrap();
        ops.config_subfrm(&ctx, 0, &mut cmd).unwrap();
        ops.advance_subfrm(&ctx, 0, &mut cmd).unwrap();
        ops.wait_comp_event(&ctx, &mut cmd).unwrap();
        ops.post_process(&ctx, &mut cmd).unwrap();
        assert!(cmd.is_empty());
    }
}
