//! Fully-populated job parameters, as handed over by the requesting side.

use serde::{Deserialize, Serialize};

use super::{CompId, CompType};
use crate::error::{Error, Result};

pub const MAX_SUBFRAMES: usize = 14;
pub const MAX_COMPONENTS: usize = 20;
pub const MAX_INPUTS: usize = 3;
pub const MAX_OUTPUTS: usize = 4;
pub const MAX_COMP_OUTPUTS: usize = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

/// Inclusive pixel region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Region {
    pub left: i16,
    pub right: i16,
    pub top: i16,
    pub bottom: i16,
}

impl Region {
    pub fn is_well_formed(&self) -> bool {
        self.right >= self.left && self.bottom >= self.top
    }

    pub fn width(&self) -> u32 {
        (i32::from(self.right) - i32::from(self.left) + 1).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (i32::from(self.bottom) - i32::from(self.top) + 1).max(0) as u32
    }

    /// Packed `width << 16 | height` as most size registers expect.
    pub fn packed_size(&self) -> u32 {
        (self.width() << 16) | self.height()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Offset {
    pub left: i16,
    pub top: i16,
    pub left_subpix: u32,
    pub top_subpix: u32,
}

/// Geometry of one block for one subframe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompSubfrm {
    pub tile_disable: bool,
    #[serde(rename = "in")]
    pub input: Region,
    #[serde(rename = "out")]
    pub output: Region,
    pub luma: Offset,
    pub chroma: Offset,
    pub out_vertical: i16,
    pub out_horizontal: i16,
}

/// Packed hardware color format word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorFormat(pub u32);

impl ColorFormat {
    const PACKED_10BIT: u32 = 1 << 27;
    const UFP: u32 = 1 << 29;

    pub fn is_10bit_packed(self) -> bool {
        self.0 & Self::PACKED_10BIT != 0
    }

    pub fn is_ufp(self) -> bool {
        self.0 & Self::UFP != 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaneFormat {
    pub size: u32,
    pub stride: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PixFormat {
    pub width: u32,
    pub height: u32,
    pub colorformat: ColorFormat,
    pub ycbcr_prof: u32,
    pub plane_fmt: [PlaneFormat; 3],
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageBuffer {
    pub format: PixFormat,
    pub iova: [u32; 3],
    pub usage: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageInput {
    pub buffer: ImageBuffer,
    pub flags: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageOutput {
    pub buffer: ImageBuffer,
    pub crop: Rect,
    pub compose: Rect,
    pub rotation: i32,
    pub flags: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameParam {
    pub frame_no: u32,
    pub inputs: Vec<ImageInput>,
    pub outputs: Vec<ImageOutput>,
}

/// Whole-frame switches of one block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompFrame {
    pub bypass: bool,
    pub output_disable: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RdmaSubfrm {
    pub offset: [u32; 3],
    pub offset_0_p: u32,
    pub src: u32,
    pub clip: u32,
    pub clip_ofst: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RdmaData {
    pub src_ctrl: u32,
    pub control: u32,
    pub iova: [u32; 3],
    pub iova_end: [u32; 3],
    pub mf_bkgd: u32,
    pub mf_bkgd_in_pxl: u32,
    pub sf_bkgd: u32,
    pub ufo_dec_y: u32,
    pub ufo_dec_c: u32,
    pub transform: u32,
    pub subfrms: Vec<RdmaSubfrm>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RszSubfrm {
    pub control2: u32,
    pub src: u32,
    pub clip: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RszData {
    pub coeff_step_x: u32,
    pub coeff_step_y: u32,
    pub control1: u32,
    pub control2: u32,
    pub subfrms: Vec<RszSubfrm>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrotSubfrm {
    pub offset: [u32; 3],
    pub src: u32,
    pub clip: u32,
    pub clip_ofst: u32,
    pub main_buf: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrotData {
    pub iova: [u32; 3],
    pub control: u32,
    pub stride: [u32; 3],
    pub mat_ctrl: u32,
    pub fifo_test: u32,
    pub filter: u32,
    pub subfrms: Vec<WrotSubfrm>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WdmaSubfrm {
    pub offset: [u32; 3],
    pub src: u32,
    pub clip: u32,
    pub clip_ofst: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WdmaData {
    pub wdma_cfg: u32,
    pub iova: [u32; 3],
    pub w_in_byte: u32,
    pub uv_stride: u32,
    pub subfrms: Vec<WdmaSubfrm>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IspData {
    /// Direct-link requests, one bit per [`CompId`].
    pub dl_flags: u64,
    pub smxi_iova: [u32; 4],
    pub cq_idx: u32,
    pub cq_iova: u32,
    pub tpipe_iova: Vec<u32>,
}

impl IspData {
    pub fn direct_link(&self, id: CompId) -> bool {
        self.dl_flags & id.bit().bits() != 0
    }
}

/// Per-kind tuning block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompData {
    #[default]
    None,
    Rdma(RdmaData),
    Rsz(RszData),
    Wrot(WrotData),
    Wdma(WdmaData),
    Isp(IspData),
}

impl CompData {
    pub fn fits(&self, ty: CompType) -> bool {
        matches!(
            (self, ty),
            (CompData::Rdma(_), CompType::Rdma)
                | (CompData::Rsz(_), CompType::Rsz)
                | (CompData::Wrot(_), CompType::Wrot)
                | (CompData::Wdma(_), CompType::Wdma)
                | (CompData::Isp(_), CompType::Imgi)
                | (
                    CompData::None,
                    CompType::Ccorr
                        | CompType::DlPath1
                        | CompType::DlPath2
                        | CompType::Path1
                        | CompType::Path2
                        | CompType::Wpei
                        | CompType::Exto
                )
        )
    }

    /// Length of the kind-specific per-subframe table, if the kind has one.
    pub fn subfrm_len(&self) -> Option<usize> {
        match self {
            CompData::None => None,
            CompData::Rdma(d) => Some(d.subfrms.len()),
            CompData::Rsz(d) => Some(d.subfrms.len()),
            CompData::Wrot(d) => Some(d.subfrms.len()),
            CompData::Wdma(d) => Some(d.subfrms.len()),
            CompData::Isp(d) => Some(d.tpipe_iova.len()),
        }
    }

    pub fn rdma(&self) -> Result<&RdmaData> {
        match self {
            CompData::Rdma(d) => Ok(d),
            _ => Err(Error::invalid("component carries no RDMA parameters")),
        }
    }

    pub fn rsz(&self) -> Result<&RszData> {
        match self {
            CompData::Rsz(d) => Ok(d),
            _ => Err(Error::invalid("component carries no RSZ parameters")),
        }
    }

    pub fn wrot(&self) -> Result<&WrotData> {
        match self {
            CompData::Wrot(d) => Ok(d),
            _ => Err(Error::invalid("component carries no WROT parameters")),
        }
    }

    pub fn wdma(&self) -> Result<&WdmaData> {
        match self {
            CompData::Wdma(d) => Ok(d),
            _ => Err(Error::invalid("component carries no WDMA parameters")),
        }
    }

    pub fn isp(&self) -> Result<&IspData> {
        match self {
            CompData::Isp(d) => Ok(d),
            _ => Err(Error::invalid("component carries no ISP parameters")),
        }
    }
}

/// Parameters of one block for one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompParam {
    pub comp: CompId,
    #[serde(default)]
    pub input: usize,
    #[serde(default)]
    pub outputs: Vec<usize>,
    #[serde(default)]
    pub frame: CompFrame,
    #[serde(default)]
    pub subfrms: Vec<CompSubfrm>,
    #[serde(default)]
    pub data: CompData,
}

impl CompParam {
    pub fn num_subfrms(&self) -> usize {
        self.subfrms.len()
    }

    /// Whether this block sits out subframe `index`.
    pub fn output_disabled(&self, index: usize) -> bool {
        match self.subfrms.get(index) {
            Some(sf) => self.frame.output_disable || sf.tile_disable,
            None => true,
        }
    }

    pub fn subfrm(&self, index: usize) -> Result<&CompSubfrm> {
        self.subfrms.get(index).ok_or_else(|| {
            Error::invalid(format!("{:?} has no subframe {index}", self.comp))
        })
    }
}

/// Blocks of one path, in data-flow order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    pub num_subfrms: usize,
    pub components: Vec<CompParam>,
}

/// One end-to-end frame transform request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Job {
    pub frame: FrameParam,
    pub config: PathConfig,
}

impl Job {
    /// Load a job description from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let job = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?
            .try_deserialize()?;
        Ok(job)
    }

    pub fn validate(&self) -> Result<()> {
        let cfg = &self.config;
        if cfg.num_subfrms == 0 || cfg.num_subfrms > MAX_SUBFRAMES {
            return Err(Error::invalid(format!(
                "subframe count {} outside 1..={MAX_SUBFRAMES}",
                cfg.num_subfrms
            )));
        }
        if cfg.components.is_empty() || cfg.components.len() > MAX_COMPONENTS {
            return Err(Error::invalid(format!(
                "component count {} outside 1..={MAX_COMPONENTS}",
                cfg.components.len()
            )));
        }
        if self.frame.inputs.len() > MAX_INPUTS {
            return Err(Error::invalid(format!(
                "{} inputs exceed {MAX_INPUTS}",
                self.frame.inputs.len()
            )));
        }
        if self.frame.outputs.len() > MAX_OUTPUTS {
            return Err(Error::invalid(format!(
                "{} outputs exceed {MAX_OUTPUTS}",
                self.frame.outputs.len()
            )));
        }
        Ok(())
    }
}
