//! Martian stage FILTER_UMIS
//! Compute the read pairs per UMI N50 and the fraction of low support read
//! pairs of each chain, chunked by GEM group.

use crate::aggregate::ChunkAggregator;
use crate::chunk::{ChunkPlanner, ScaledMemEstimator, UmiInfoChunk};
use crate::merge::merge_chunk_stats;
use crate::metrics::UmiReadPairStats;
use crate::umi_info::{UmiInfo, UmiInfoFile};
use crate::GemGroup;
use anyhow::Result;
use log::info;
use martian::prelude::{MartianRover, MartianStage};
use martian::{Resource, StageDef};
use martian_derive::{make_mro, MartianStruct};
use martian_filetypes::bin_file::BincodeFile;
use martian_filetypes::json_file::JsonFile;
use martian_filetypes::{FileTypeRead, FileTypeWrite};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;

type ChunkStatsFile = BincodeFile<UmiReadPairStats>;
pub type SummaryFile = JsonFile<Map<String, Value>>;

/// The Martian stage inputs.
#[derive(Clone, Deserialize, MartianStruct)]
pub struct FilterUmisStageInputs {
    /// UMI info table sorted by barcode.
    pub umi_info: UmiInfoFile,
    /// Accepted for compatibility and not read.
    pub vdj_reference_path: Option<PathBuf>,
    /// GEM groups of the sample.
    pub gem_groups: Vec<GemGroup>,
    /// Minimum read pairs per UMI, keyed by GEM group.
    pub min_readpairs_per_umi: HashMap<String, u64>,
}

/// The Martian stage outputs.
#[derive(Clone, Serialize, Deserialize, MartianStruct)]
pub struct FilterUmisStageOutputs {
    pub summary: SummaryFile,
}

/// FILTER_UMIS chunk inputs
#[derive(Clone, Serialize, Deserialize, MartianStruct)]
pub struct FilterUmisChunkInputs {
    pub gem_group: GemGroup,
    pub start_row: usize,
    pub end_row: usize,
}

/// FILTER_UMIS chunk outputs
#[derive(Clone, Serialize, Deserialize, MartianStruct)]
pub struct FilterUmisChunkOutputs {
    pub chunk_stats: ChunkStatsFile,
}

fn read_umi_info(args: &FilterUmisStageInputs) -> Result<UmiInfo> {
    let umi_info: UmiInfo = args.umi_info.read()?;
    umi_info.validate()?;
    Ok(umi_info)
}

fn plan_chunks(args: &FilterUmisStageInputs) -> Result<Vec<UmiInfoChunk>> {
    let planner = ChunkPlanner {
        gem_groups: &args.gem_groups,
        estimator: ScaledMemEstimator::from_parameters()?,
        max_rows_warning: *parameters_toml::umi_info_max_rows_warning()?,
    };
    planner.plan(&read_umi_info(args)?)
}

/// Martian stage FILTER_UMIS
pub struct FilterUmis;

#[make_mro]
impl MartianStage for FilterUmis {
    type StageInputs = FilterUmisStageInputs;
    type StageOutputs = FilterUmisStageOutputs;
    type ChunkInputs = FilterUmisChunkInputs;
    type ChunkOutputs = FilterUmisChunkOutputs;

    fn split(
        &self,
        args: Self::StageInputs,
        _rover: MartianRover,
    ) -> Result<StageDef<Self::ChunkInputs>> {
        Ok(plan_chunks(&args)?
            .into_iter()
            .map(|chunk| {
                (
                    FilterUmisChunkInputs {
                        gem_group: chunk.gem_group,
                        start_row: chunk.start_row,
                        end_row: chunk.end_row,
                    },
                    Resource::with_mem_gb(chunk.mem_gb),
                )
            })
            .collect())
    }

    fn main(
        &self,
        args: Self::StageInputs,
        chunk_args: Self::ChunkInputs,
        rover: MartianRover,
    ) -> Result<Self::ChunkOutputs> {
        let umi_info = read_umi_info(&args)?;
        let aggregator = ChunkAggregator {
            min_readpairs_per_umi: &args.min_readpairs_per_umi,
        };
        let stats = aggregator.aggregate(
            &umi_info,
            chunk_args.gem_group,
            chunk_args.start_row..chunk_args.end_row,
        )?;

        let chunk_stats: ChunkStatsFile = rover.make_path("chunk_stats");
        chunk_stats.write(&stats)?;
        Ok(FilterUmisChunkOutputs { chunk_stats })
    }

    fn join(
        &self,
        _args: Self::StageInputs,
        _chunk_defs: Vec<Self::ChunkInputs>,
        chunk_outs: Vec<Self::ChunkOutputs>,
        rover: MartianRover,
    ) -> Result<Self::StageOutputs> {
        let chunk_stats = chunk_outs
            .iter()
            .map(|chunk_out| -> Result<UmiReadPairStats> { chunk_out.chunk_stats.read() })
            .collect::<Result<Vec<_>>>()?;
        let summary = merge_chunk_stats(chunk_stats).summary();
        info!(
            "merged {} chunks, read pairs per UMI N50 = {}",
            chunk_outs.len(),
            summary.readpairs_per_umi_n50
        );

        let summary_file: SummaryFile = rover.make_path("summary");
        summary_file.write(&summary.to_json())?;
        Ok(FilterUmisStageOutputs {
            summary: summary_file,
        })
    }
}
