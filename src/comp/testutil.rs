use crate::cmdq::{CmdBuilder, Command};
use crate::comp::param::{CompData, CompFrame, CompParam, CompSubfrm, ImageInput, ImageOutput};
use crate::comp::{Capabilities, CompCtx, CompId};
use crate::{Config, MdpDevice};

pub(crate) struct Fixture {
    pub dev: MdpDevice,
    pub inputs: Vec<ImageInput>,
    pub outputs: Vec<ImageOutput>,
}

impl Fixture {
    pub fn new(caps: Capabilities) -> Self {
        let mut config = Config::default();
        config.platform = caps;
        Self {
            dev: MdpDevice::new(&config).unwrap(),
            inputs: vec![ImageInput::default()],
            outputs: vec![ImageOutput::default()],
        }
    }

    pub fn ctx<'a>(&'a self, param: &'a CompParam) -> CompCtx<'a> {
        CompCtx::new(&self.dev, param, &self.inputs, &self.outputs, 14).unwrap()
    }
}

pub(crate) fn param(comp: CompId, subfrms: usize, data: CompData) -> CompParam {
    CompParam {
        comp,
        input: 0,
        outputs: vec![0],
        frame: CompFrame::default(),
        subfrms: vec![CompSubfrm::default(); subfrms],
        data,
    }
}

/// `(offset, value, mask)` of every write, in order.
pub(crate) fn writes(cmd: &CmdBuilder) -> Vec<(u32, u32, u32)> {
    cmd.commands()
        .iter()
        .filter_map(|c| match *c {
            Command::Write {
                offset,
                value,
                mask,
                ..
            } => Some((offset, value, mask)),
            _ => None,
        })
        .collect()
}

pub(crate) fn builder() -> CmdBuilder {
    CmdBuilder::new(32)
}
