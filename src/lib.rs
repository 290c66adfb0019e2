pub mod cmdq;
pub mod comp;
pub mod device;
pub mod error;
pub mod pipeline;

use serde::{Deserialize, Serialize};

use cmdq::EventTable;
use comp::mmsys::MmsysConfig;
use comp::{Capabilities, CompType, ComponentNode};

pub use device::MdpDevice;
pub use error::{Error, Result};

/// System configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub platform: Capabilities,
    pub events: EventTable,
    pub mmsys: MmsysConfig,
    pub pipeline: PipelineConfig,
    pub components: Vec<ComponentNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Retry budget attached to every reset-handshake poll.
    pub poll_retries: u32,
    /// Batches that may wait for the execution engine.
    pub submit_queue_depth: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            poll_retries: 0x100,
            submit_queue_depth: 4,
        }
    }
}

impl Config {
    /// Defaults, overlaid by an optional TOML file, overlaid by `MDP3__*` variables.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Config::default())?);
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }
        let config = builder
            .add_source(config::Environment::with_prefix("MDP3").separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            platform: Capabilities {
                rdma_support_10bit: true,
                rdma_rsz1_sram_sharing: true,
                rdma_upsample_repeat_only: true,
                rsz_disable_dcm_small_sample: false,
                wrot_filter_constraint: false,
            },
            events: EventTable::default(),
            mmsys: MmsysConfig::default(),
            pipeline: PipelineConfig::default(),
            components: vec![
                ComponentNode::new(CompType::Rdma, 0, 0x1400_1000, 1),
                ComponentNode::new(CompType::Ccorr, 0, 0x1401_c000, 2),
                ComponentNode::new(CompType::Rsz, 0, 0x1400_3000, 1),
                ComponentNode::new(CompType::Rsz, 1, 0x1400_4000, 1),
                ComponentNode::new(CompType::Wrot, 0, 0x1400_5000, 1),
                ComponentNode::new(CompType::Wdma, 0, 0x1400_6000, 1),
                ComponentNode::new(CompType::Imgi, 0, 0x1502_2000, 4),
                ComponentNode::new(CompType::DlPath1, 0, 0x1400_0000, 1),
                ComponentNode::new(CompType::DlPath2, 1, 0x1400_0000, 1),
            ],
        }
    }
}
