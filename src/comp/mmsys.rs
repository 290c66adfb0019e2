//! Cross-subsystem control block shared by the ISP hand-off and direct-link paths.
//!
//! Requests are addressed by the [`CompId`] of the link they concern rather
//! than by register, so the control block owns its own register layout.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::CompId;
use crate::cmdq::{CmdBuilder, RegBase};
use crate::error::{Error, Result};

pub trait MmsysControl: Send + Sync {
    /// Reset the asynchronous direct-link bridge feeding `id`.
    fn isp_ctrl(&self, cmd: &mut CmdBuilder, id: CompId) -> Result<()>;

    /// Program the direct-link input size for `id`.
    fn camin_ctrl(&self, cmd: &mut CmdBuilder, id: CompId, width: u32, height: u32) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MmsysConfig {
    pub subsys: u8,
    pub base: u64,
    pub sw0_rst_b: u32,
    pub sw1_rst_b: u32,
    pub dl_async_cfg: u32,
    pub dl_async2_cfg: u32,
}

impl Default for MmsysConfig {
    fn default() -> Self {
        Self {
            subsys: 1,
            base: 0x1400_0000,
            sw0_rst_b: 0x140,
            sw1_rst_b: 0x144,
            dl_async_cfg: 0x934,
            dl_async2_cfg: 0x938,
        }
    }
}

/// Register-backed control block.
#[derive(Debug, Clone)]
pub struct MmsysRegs {
    cfg: MmsysConfig,
}

impl MmsysRegs {
    pub fn new(cfg: MmsysConfig) -> Self {
        Self { cfg }
    }

    fn reg(&self) -> RegBase {
        RegBase {
            subsys: self.cfg.subsys,
            base: self.cfg.base,
        }
    }

    /// Active-low reset pulse: clear then set `bit`.
    fn pulse(&self, cmd: &mut CmdBuilder, offset: u32, bit: u32) {
        cmd.write(self.reg(), offset, 0, bit);
        cmd.write(self.reg(), offset, bit, bit);
    }
}

impl MmsysControl for MmsysRegs {
    fn isp_ctrl(&self, cmd: &mut CmdBuilder, id: CompId) -> Result<()> {
        // TX bridge lives in SW0, RX bridge in SW1.
        let (tx, rx) = match id {
            CompId::Camin => (1 << 3, 1 << 10),
            CompId::Camin2 => (1 << 4, 1 << 11),
            other => {
                return Err(Error::invalid(format!(
                    "{other:?} is not a direct-link input"
                )))
            }
        };
        debug!(?id, "direct-link async reset");
        self.pulse(cmd, self.cfg.sw0_rst_b, tx);
        self.pulse(cmd, self.cfg.sw1_rst_b, rx);
        Ok(())
    }

    fn camin_ctrl(&self, cmd: &mut CmdBuilder, id: CompId, width: u32, height: u32) -> Result<()> {
        let offset = match id {
            CompId::Camin => self.cfg.dl_async_cfg,
            CompId::Camin2 => self.cfg.dl_async2_cfg,
            other => {
                return Err(Error::invalid(format!(
                    "{other:?} is not a direct-link input"
                )))
            }
        };
        cmd.write(self.reg(), offset, (height << 16) | width, 0x3FFF_3FFF);
        Ok(())
    }
}
