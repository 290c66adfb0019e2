use tracing::error;

use super::param::{CompParam, CompSubfrm, ImageInput, ImageOutput, MAX_COMP_OUTPUTS};
use super::{Capabilities, Component, MmsysControl, Rect};
use crate::device::MdpDevice;
use crate::error::{Error, Result};

/// One block bound to one job's parameters.
pub struct CompCtx<'a> {
    pub comp: &'a Component,
    pub param: &'a CompParam,
    pub input: &'a ImageInput,
    pub outputs: Vec<&'a ImageOutput>,
    dev: &'a MdpDevice,
}

impl<'a> CompCtx<'a> {
    /// Bind `param` to its registered component and to the job's buffers.
    ///
    /// Everything an operation later indexes is checked here, so a faulty job
    /// is rejected before any command is emitted.
    pub fn new(
        dev: &'a MdpDevice,
        param: &'a CompParam,
        inputs: &'a [ImageInput],
        outputs: &'a [ImageOutput],
        num_subfrms: usize,
    ) -> Result<Self> {
        let Some(comp) = dev.registry().get(param.comp) else {
            error!("Uninit component id {:?}", param.comp);
            return Err(Error::invalid(format!(
                "component {:?} is not registered",
                param.comp
            )));
        };

        if !param.data.fits(comp.ty) {
            return Err(Error::invalid(format!(
                "{:?} parameters do not match kind {:?}",
                param.comp, comp.ty
            )));
        }

        let input = inputs.get(param.input).ok_or_else(|| {
            Error::invalid(format!(
                "{:?} reads input {} of {}",
                param.comp,
                param.input,
                inputs.len()
            ))
        })?;

        if param.outputs.len() > MAX_COMP_OUTPUTS {
            return Err(Error::invalid(format!(
                "{:?} drives {} outputs, at most {MAX_COMP_OUTPUTS}",
                param.comp,
                param.outputs.len()
            )));
        }
        let outputs = param
            .outputs
            .iter()
            .map(|&i| {
                outputs.get(i).ok_or_else(|| {
                    Error::invalid(format!("{:?} writes missing output {i}", param.comp))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if param.subfrms.len() > num_subfrms {
            return Err(Error::invalid(format!(
                "{:?} has {} subframes, path has {num_subfrms}",
                param.comp,
                param.subfrms.len()
            )));
        }
        if let Some(bad) = param.subfrms.iter().position(|sf| !sf.input.is_well_formed()) {
            return Err(Error::invalid(format!(
                "{:?} subframe {bad} has an empty input region",
                param.comp
            )));
        }
        if let Some(len) = param.data.subfrm_len() {
            if len < param.subfrms.len() {
                return Err(Error::invalid(format!(
                    "{:?} tunes {len} subframes but takes part in {}",
                    param.comp,
                    param.subfrms.len()
                )));
            }
        }

        Ok(Self {
            comp,
            param,
            input,
            outputs,
            dev,
        })
    }

    pub fn caps(&self) -> &Capabilities {
        self.dev.caps()
    }

    pub fn device(&self) -> &MdpDevice {
        self.dev
    }

    pub fn mmsys(&self) -> &dyn MmsysControl {
        self.dev.mmsys()
    }

    pub fn subfrm(&self, index: usize) -> Result<&CompSubfrm> {
        self.param.subfrm(index)
    }

    /// Compose rectangle of the first output, if the block has one.
    pub fn compose(&self) -> Rect {
        self.outputs
            .first()
            .map(|out| out.compose)
            .unwrap_or_default()
    }
}
