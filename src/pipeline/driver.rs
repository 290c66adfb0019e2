//! Per-job state machine turning a [`Job`] into one command batch.

use std::fmt;
use std::time::Instant;

use bytes::Bytes;
use tracing::{debug, error, info, instrument};

use crate::cmdq::{self, CmdBuilder, Command, EventTable, RawCommand};
use crate::comp::param::Job;
use crate::comp::{CompCtx, CompOps, EngineMask};
use crate::device::MdpDevice;
use crate::error::{Error, Result};

/// Where a job is in its composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    InitAll,
    ConfigSubfrmAll(usize),
    WaitAll(usize),
    AdvanceAll(usize),
    PostProcess,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Start => write!(f, "start"),
            Stage::InitAll => write!(f, "init"),
            Stage::ConfigSubfrmAll(i) => write!(f, "config subframe {i}"),
            Stage::WaitAll(i) => write!(f, "wait subframe {i}"),
            Stage::AdvanceAll(i) => write!(f, "advance subframe {i}"),
            Stage::PostProcess => write!(f, "post process"),
            Stage::Done => write!(f, "done"),
        }
    }
}

/// Composed commands of one job plus the engines it occupies.
#[derive(Debug)]
pub struct JobBatch {
    pub frame_no: u32,
    pub commands: Vec<Command>,
    pub engine_mask: EngineMask,
    /// Recorded limitations; the batch still runs.
    pub best_effort: Vec<Error>,
}

impl JobBatch {
    pub fn resolve(&self, events: &EventTable) -> Result<Vec<RawCommand>> {
        cmdq::resolve(&self.commands, events)
    }

    pub fn encode(&self, events: &EventTable) -> Result<Bytes> {
        Ok(cmdq::encode(&self.resolve(events)?))
    }
}

struct Block<'a> {
    ctx: CompCtx<'a>,
    ops: &'static dyn CompOps,
}

/// Build the command batch for `job`.
///
/// On error nothing is returned: the partially filled builder is dropped.
#[instrument(skip_all, fields(frame = job.frame.frame_no))]
pub fn compose(dev: &MdpDevice, job: &Job) -> Result<JobBatch> {
    let start = Instant::now();
    let mut stage = Stage::Start;

    match run(dev, job, &mut stage) {
        Ok(batch) => {
            let elapsed = start.elapsed();
            metrics::counter!("mdp_jobs_composed").increment(1);
            metrics::counter!("mdp_commands_emitted").increment(batch.commands.len() as u64);
            metrics::histogram!("compose_time_us").record(elapsed.as_micros() as f64);
            info!(
                "Composed {} commands for engines {} in {:?}",
                batch.commands.len(),
                batch.engine_mask,
                elapsed
            );
            Ok(batch)
        }
        Err(e) => {
            metrics::counter!("mdp_jobs_aborted").increment(1);
            error!("Job aborted at {}: {}", stage, e);
            Err(e)
        }
    }
}

fn run(dev: &MdpDevice, job: &Job, stage: &mut Stage) -> Result<JobBatch> {
    job.validate()?;
    let path = &job.config;

    // Bind every block up front so a faulty job emits nothing.
    let mut blocks = Vec::with_capacity(path.components.len());
    for param in &path.components {
        let ctx = CompCtx::new(
            dev,
            param,
            &job.frame.inputs,
            &job.frame.outputs,
            path.num_subfrms,
        )?;
        debug!("{:?} bound as {:?}", ctx.comp.id, ctx.comp.ty);
        let ops = ctx.comp.ty.ops();
        blocks.push(Block { ctx, ops });
    }

    let mut cmd = CmdBuilder::new(dev.pipeline().poll_retries);
    let mut engine_mask = EngineMask::EMPTY;

    *stage = Stage::InitAll;
    for block in &blocks {
        block.ops.init(&block.ctx, &mut cmd)?;
        let compose = block.ctx.compose();
        block.ops.config_frame(&block.ctx, &compose, &mut cmd)?;
        engine_mask |= block.ops.get_engine_flag(&block.ctx);
    }

    for index in 0..path.num_subfrms {
        *stage = Stage::ConfigSubfrmAll(index);
        for block in blocks.iter().rev() {
            if block.ctx.param.output_disabled(index) {
                continue;
            }
            block.ops.config_subfrm(&block.ctx, index, &mut cmd)?;
        }

        *stage = Stage::WaitAll(index);
        for block in &blocks {
            if block.ctx.param.output_disabled(index) {
                continue;
            }
            block.ops.wait_comp_event(&block.ctx, &mut cmd)?;
        }

        if index + 1 == path.num_subfrms {
            break;
        }

        *stage = Stage::AdvanceAll(index);
        for block in &blocks {
            if index >= block.ctx.param.num_subfrms() {
                continue;
            }
            block.ops.advance_subfrm(&block.ctx, index, &mut cmd)?;
        }
    }

    *stage = Stage::PostProcess;
    for block in &blocks {
        block.ops.post_process(&block.ctx, &mut cmd)?;
    }

    *stage = Stage::Done;
    let (commands, best_effort) = cmd.finish();
    Ok(JobBatch {
        frame_no: job.frame.frame_no,
        commands,
        engine_mask,
        best_effort,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmdq::CompEvent;
    use crate::comp::param::{
        CompData, CompParam, CompSubfrm, PathConfig, RszData, RszSubfrm, WdmaData, WdmaSubfrm,
    };
    use crate::comp::{rsz, CompId, CompType, ComponentNode};
    use crate::Config;

    fn ccorr(subfrms: usize) -> CompParam {
        CompParam {
            comp: CompId::Ccorr0,
            input: 0,
            outputs: vec![],
            frame: Default::default(),
            subfrms: vec![CompSubfrm::default(); subfrms],
            data: CompData::None,
        }
    }

    fn job(num_subfrms: usize, components: Vec<CompParam>) -> Job {
        let mut job = Job {
            config: PathConfig {
                num_subfrms,
                components,
            },
            ..Default::default()
        };
        job.frame.inputs.push(Default::default());
        job
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::WaitAll(2).to_string(), "wait subframe 2");
        assert_eq!(Stage::InitAll.to_string(), "init");
    }

    #[test]
    fn test_compose_simple_path() {
        let dev = MdpDevice::new(&Config::default()).unwrap();
        let batch = compose(&dev, &job(2, vec![ccorr(2)])).unwrap();

        // init: 2 writes, then one size write per subframe.
        assert_eq!(batch.commands.len(), 4);
        assert_eq!(batch.engine_mask, CompId::Ccorr0.bit());
        assert!(batch.best_effort.is_empty());
    }

    #[test]
    fn test_disabled_tile_is_skipped() {
        let dev = MdpDevice::new(&Config::default()).unwrap();
        let mut param = ccorr(2);
        param.subfrms[1].tile_disable = true;
        let batch = compose(&dev, &job(2, vec![param])).unwrap();
        assert_eq!(batch.commands.len(), 3);
    }

    #[test]
    fn test_abort_discards_everything() {
        let dev = MdpDevice::new(&Config::default()).unwrap();
        let mut bad = ccorr(1);
        bad.comp = CompId::Wpei;
        assert!(compose(&dev, &job(1, vec![ccorr(1), bad])).is_err());
        assert!(compose(&dev, &job(0, vec![ccorr(1)])).is_err());
    }

    fn small_tile_rsz(num_subfrms: usize) -> CompParam {
        let mut param = CompParam {
            comp: CompId::Rsz0,
            input: 0,
            outputs: vec![],
            frame: Default::default(),
            subfrms: vec![CompSubfrm::default(); num_subfrms],
            data: CompData::Rsz(RszData {
                subfrms: vec![RszSubfrm::default(); num_subfrms],
                ..Default::default()
            }),
        };
        for sf in &mut param.subfrms {
            sf.input.right = 7;
        }
        param
    }

    fn dcm_clears(commands: &[Command]) -> Vec<usize> {
        commands
            .iter()
            .enumerate()
            .filter(|&(_, c)| {
                matches!(*c, Command::Write { offset: rsz::regs::CONTROL_1, value: 0, mask, .. }
                    if mask == 1 << 27)
            })
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn test_no_advance_after_last_subframe() {
        let mut config = Config::default();
        config.platform.rsz_disable_dcm_small_sample = true;
        let dev = MdpDevice::new(&config).unwrap();

        let batch = compose(&dev, &job(1, vec![small_tile_rsz(1)])).unwrap();
        assert!(dcm_clears(&batch.commands).is_empty());

        // Advance runs between subframes only.
        let batch = compose(&dev, &job(3, vec![small_tile_rsz(3)])).unwrap();
        assert_eq!(dcm_clears(&batch.commands).len(), 2);
    }

    #[test]
    fn test_pass_through_block_joins_engine_mask() {
        let mut config = Config::default();
        config
            .components
            .push(ComponentNode::new(CompType::Path1, 0, 0x1400_0000, 1));
        let dev = MdpDevice::new(&config).unwrap();

        let mut path = ccorr(1);
        path.comp = CompId::Path0Sout;
        let batch = compose(&dev, &job(1, vec![ccorr(1), path])).unwrap();
        assert_eq!(
            batch.engine_mask,
            CompId::Ccorr0.bit() | CompId::Path0Sout.bit()
        );
    }

    #[test]
    fn test_exhausted_poll_budget_yields_no_batch() {
        let mut config = Config::default();
        config.pipeline.poll_retries = 0;
        let dev = MdpDevice::new(&config).unwrap();

        let wdma = CompParam {
            comp: CompId::Wdma,
            input: 0,
            outputs: vec![],
            frame: Default::default(),
            subfrms: vec![CompSubfrm::default()],
            data: CompData::Wdma(WdmaData {
                subfrms: vec![WdmaSubfrm::default()],
                ..Default::default()
            }),
        };
        assert!(matches!(
            compose(&dev, &job(1, vec![ccorr(1), wdma])),
            Err(Error::ResourceUnavailable(_))
        ));
    }

    #[test]
    fn test_batch_encodes_all_records() {
        let dev = MdpDevice::new(&Config::default()).unwrap();
        let batch = compose(&dev, &job(1, vec![ccorr(1)])).unwrap();
        let bytes = batch.encode(dev.events()).unwrap();
        assert_eq!(bytes.len(), batch.commands.len() * cmdq::RECORD_SIZE);
        assert!(batch
            .commands
            .iter()
            .all(|c| !matches!(c, Command::Wait { event: CompEvent::Rdma0Done })));
    }
}
