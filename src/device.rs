//! Pipeline session: everything a job needs that outlives the job.

use tracing::info;

use crate::cmdq::EventTable;
use crate::comp::{Capabilities, MmsysControl, MmsysRegs, Registry};
use crate::error::Result;
use crate::{Config, PipelineConfig};

pub struct MdpDevice {
    registry: Registry,
    caps: Capabilities,
    events: EventTable,
    pipeline: PipelineConfig,
    mmsys: Box<dyn MmsysControl>,
}

impl MdpDevice {
    pub fn new(config: &Config) -> Result<Self> {
        let registry = Registry::from_nodes(&config.components)?;
        info!("MDP device with {} components", registry.len());

        Ok(Self::from_parts(
            registry,
            config.platform.clone(),
            config.events.clone(),
            config.pipeline.clone(),
            Box::new(MmsysRegs::new(config.mmsys.clone())),
        ))
    }

    pub fn from_parts(
        registry: Registry,
        caps: Capabilities,
        events: EventTable,
        pipeline: PipelineConfig,
        mmsys: Box<dyn MmsysControl>,
    ) -> Self {
        Self {
            registry,
            caps,
            events,
            pipeline,
            mmsys,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn caps(&self) -> &Capabilities {
        &self.caps
    }

    pub fn events(&self) -> &EventTable {
        &self.events
    }

    pub fn pipeline(&self) -> &PipelineConfig {
        &self.pipeline
    }

    pub fn mmsys(&self) -> &dyn MmsysControl {
        self.mmsys.as_ref()
    }
}
