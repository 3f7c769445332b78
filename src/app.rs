use std::time::{Duration, Instant};

use camino::Utf8Path;
use serde::Serialize;
use tracing::info;

use crate::domain::{CompoundTable, DownloadOutcome, OutcomeStatus, PlantName, Provider};
use crate::downloader::StructureDownloader;
use crate::error::PhytoError;
use crate::imppat::ImppatClient;
use crate::pubchem::PubchemClient;
use crate::spreadsheet;
use crate::table::{TableColumns, parse_compound_table};
use crate::workspace::PlantWorkspace;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub provider: Provider,
    pub skip_export: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub plant: String,
    pub table: CompoundTable,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportResult {
    pub plant: String,
    pub workspace: String,
    pub spreadsheet: String,
    pub compounds: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub provider: Provider,
    pub workspace: String,
    pub outcomes: Vec<DownloadOutcome>,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchResult {
    fn new(provider: Provider, workspace: &PlantWorkspace, outcomes: Vec<DownloadOutcome>) -> Self {
        let count = |status: OutcomeStatus| outcomes.iter().filter(|o| o.status == status).count();
        Self {
            provider,
            workspace: workspace.dir().to_string(),
            succeeded: count(OutcomeStatus::Succeeded),
            skipped: count(OutcomeStatus::Skipped),
            failed: count(OutcomeStatus::Failed),
            outcomes,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub plant: String,
    pub spreadsheet: Option<String>,
    pub batch: BatchResult,
}

#[derive(Debug, Clone, Copy)]
pub enum ProgressSinkKind {
    Search,
    Export,
    Download,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

impl ProgressEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            elapsed: None,
        }
    }
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// The phytochemical pipeline. Each stage takes its inputs explicitly so the
/// caller decides what to keep between steps.
#[derive(Clone)]
pub struct App<I: ImppatClient, P: PubchemClient> {
    imppat: I,
    pubchem: P,
    columns: TableColumns,
}

impl<I: ImppatClient, P: PubchemClient> App<I, P> {
    pub fn new(imppat: I, pubchem: P, columns: TableColumns) -> Self {
        Self {
            imppat,
            pubchem,
            columns,
        }
    }

    /// Downloads and parses the plant's phytochemical table. Touches no files.
    pub fn fetch_table(
        &self,
        plant: &PlantName,
        sink: &dyn ProgressSink,
    ) -> Result<CompoundTable, PhytoError> {
        sink.event(ProgressEvent::new(format!(
            "phase=Resolve; looking up {plant} on IMPPAT"
        )));
        let start = Instant::now();
        let html = self.imppat.fetch_phytochemical_page(plant)?;
        let table = parse_compound_table(&html, &self.columns)?;
        info!(plant = %plant, compounds = table.len(), "phytochemical table parsed");
        sink.event(ProgressEvent {
            message: format!("found {} phytochemicals", table.len()),
            elapsed: Some(start.elapsed()),
        });
        Ok(table)
    }

    pub fn search(
        &self,
        plant: &PlantName,
        sink: &dyn ProgressSink,
    ) -> Result<SearchResult, PhytoError> {
        let table = self.fetch_table(plant, sink)?;
        Ok(SearchResult {
            plant: plant.to_string(),
            table,
        })
    }

    pub fn export(
        &self,
        table: &CompoundTable,
        workspace: &PlantWorkspace,
        sink: &dyn ProgressSink,
    ) -> Result<ExportResult, PhytoError> {
        sink.event(ProgressEvent::new("phase=Store; writing spreadsheet"));
        let path = spreadsheet::export_table(table, workspace)?;
        info!(%path, "spreadsheet written");
        sink.event(ProgressEvent::new(format!("saved {path}")));
        Ok(ExportResult {
            plant: workspace.plant().to_string(),
            workspace: workspace.dir().to_string(),
            spreadsheet: path.to_string(),
            compounds: table.len(),
        })
    }

    /// Fetches one structure file per row, in row order. Row failures end up
    /// in the outcomes; only an unusable workspace aborts the batch.
    pub fn download_structures(
        &self,
        table: &CompoundTable,
        workspace: &PlantWorkspace,
        provider: Provider,
        sink: &dyn ProgressSink,
    ) -> Result<BatchResult, PhytoError> {
        workspace.ensure()?;
        sink.event(ProgressEvent::new(format!(
            "phase=Fetch; downloading {} structures from {provider}",
            table.len()
        )));

        let mut downloader = StructureDownloader::new(&self.imppat, &self.pubchem, workspace, provider);
        let total = table.len();
        let mut outcomes = Vec::with_capacity(total);
        for (idx, record) in table.records.iter().enumerate() {
            let start = Instant::now();
            let outcome = downloader.download(record);
            let mut message = format!("[{}/{total}] {} {}", idx + 1, outcome.key, outcome.status);
            if let (OutcomeStatus::Failed, Some(reason)) = (outcome.status, &outcome.reason) {
                message.push_str(&format!(": {reason}"));
            }
            sink.event(ProgressEvent {
                message,
                elapsed: Some(start.elapsed()),
            });
            outcomes.push(outcome);
        }

        let result = BatchResult::new(provider, workspace, outcomes);
        info!(
            succeeded = result.succeeded,
            skipped = result.skipped,
            failed = result.failed,
            "batch finished"
        );
        sink.event(ProgressEvent::new(format!(
            "phase=Verify; {} downloaded, {} already present, {} failed",
            result.succeeded, result.skipped, result.failed
        )));
        Ok(result)
    }

    /// Fetch, export and download in one go.
    pub fn run(
        &self,
        plant: &PlantName,
        root: &Utf8Path,
        options: RunOptions,
        sink: &dyn ProgressSink,
    ) -> Result<RunResult, PhytoError> {
        let table = self.fetch_table(plant, sink)?;
        let workspace = PlantWorkspace::new(root, plant);
        let spreadsheet = if options.skip_export {
            None
        } else {
            Some(self.export(&table, &workspace, sink)?.spreadsheet)
        };
        let batch = self.download_structures(&table, &workspace, options.provider, sink)?;
        Ok(RunResult {
            plant: plant.to_string(),
            spreadsheet,
            batch,
        })
    }
}
