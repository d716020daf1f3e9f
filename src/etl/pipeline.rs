use crate::config::Config;
use crate::domain::CanonicalBatch;
use crate::errors::{EtlError, Result, Stage};
use crate::etl::{Extractor, Loader, Transformer};
use std::fs::{self, File};
use std::io::BufWriter;
use tracing::{error, info, info_span, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Loaded(usize),
    Failed { stage: Stage, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceOutcome {
    pub source_id: String,
    pub outcome: Outcome,
}

/// What happened to each source in one run, in run order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub outcomes: Vec<SourceOutcome>,
}

impl RunSummary {
    pub fn total_loaded(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o.outcome {
                Outcome::Loaded(n) => n,
                Outcome::Failed { .. } => 0,
            })
            .sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &SourceOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Failed { .. }))
    }
}

/// Tags an error with its own stage, or with `at` when it has none.
fn at_stage(at: Stage) -> impl FnOnce(EtlError) -> (Stage, EtlError) {
    move |e| match e.stage() {
        Stage::Other => (at, e),
        own => (own, e),
    }
}

/// Extract → transform → load, one source at a time.
pub struct Pipeline<'a> {
    config: &'a Config,
    extractor: Extractor<'a>,
    transformer: Transformer<'a>,
    loader: Loader,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, loader: Loader) -> Self {
        Self {
            config,
            extractor: Extractor::new(config),
            transformer: Transformer::new(config),
            loader,
        }
    }

    /// Runs every source once. A failing source is logged and skipped; only
    /// `StorageUnavailable` stops the run.
    pub fn run(&self, sources: &[String]) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for source_id in sources {
            let span = info_span!("source", source = %source_id);
            let _enter = span.enter();

            let outcome = match self.run_source(source_id) {
                Ok(n) => Outcome::Loaded(n),
                Err((_, e)) if e.is_run_fatal() => {
                    error!(source = %source_id, error = %e, "storage unavailable, aborting run");
                    return Err(e);
                }
                Err((stage, e)) => {
                    error!(source = %source_id, %stage, error = %e, "pipeline failed for source");
                    Outcome::Failed {
                        stage,
                        reason: e.to_string(),
                    }
                }
            };

            summary.outcomes.push(SourceOutcome {
                source_id: source_id.clone(),
                outcome,
            });
        }

        info!(
            sources = summary.outcomes.len(),
            failed = summary.failures().count(),
            loaded = summary.total_loaded(),
            "run finished"
        );
        Ok(summary)
    }

    fn run_source(&self, source_id: &str) -> std::result::Result<usize, (Stage, EtlError)> {
        let raw = self
            .extractor
            .extract(source_id)
            .map_err(at_stage(Stage::Extract))?;

        let batch = self
            .transformer
            .transform(raw, source_id)
            .map_err(at_stage(Stage::Transform))?;
        if batch.is_empty() {
            info!(source = source_id, "source has no rows, table will only be created");
        }

        if self.config.write_processed {
            if let Err(e) = self.write_processed(&batch) {
                warn!(source = source_id, error = %e, "could not write processed snapshot");
            }
        }

        self.loader.load(&batch).map_err(at_stage(Stage::Load))
    }

    fn write_processed(&self, batch: &CanonicalBatch) -> Result<()> {
        fs::create_dir_all(&self.config.processed_dir)?;
        let path = self.config.processed_path(&batch.source_id);
        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(writer, &batch.listings)
            .map_err(|e| EtlError::Io(e.into()))?;
        info!(path = %path.display(), rows = batch.len(), "wrote processed snapshot");
        Ok(())
    }
}
