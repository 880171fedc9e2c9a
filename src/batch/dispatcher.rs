// src/batch/dispatcher.rs - Fan one job per file out over a worker pool

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::batch::discovery::{basename_collisions, discover_videos, output_path_for};
use crate::config::BatchConfig;
use crate::error::{BatchError, Result, TransformerError};
use crate::transforms::TransformConfig;
use crate::video::{ProcessOptions, ProcessSummary, VideoBackend, VideoProcessor};

/// One input file to transform into one output file
#[derive(Debug, Clone)]
pub struct Job {
    pub input: PathBuf,
    pub output: PathBuf,
    pub config: Arc<TransformConfig>,
}

impl Job {
    /// Run the job to completion on the calling thread
    pub fn run(&self, backend: Arc<dyn VideoBackend>, options: &ProcessOptions) -> Result<ProcessSummary> {
        VideoProcessor::new(backend, Arc::clone(&self.config), options.clone())
            .process_file(&self.input, &self.output)
    }
}

/// Result of one job
#[derive(Debug)]
pub struct JobOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    pub result: Result<ProcessSummary>,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcome of every job in a batch
#[derive(Debug)]
pub struct BatchReport {
    outcomes: Vec<JobOutcome>,
    elapsed: Duration,
}

impl BatchReport {
    pub fn new(outcomes: Vec<JobOutcome>, elapsed: Duration) -> Self {
        Self { outcomes, elapsed }
    }

    pub fn outcomes(&self) -> &[JobOutcome] {
        &self.outcomes
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(JobOutcome::is_success)
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Log one line per job and a closing summary
    pub fn log_summary(&self) {
        for outcome in self.outcomes() {
            match &outcome.result {
                Ok(summary) => debug!(
                    "Done: {} → {} ({} frames)",
                    outcome.input.display(),
                    summary.output.display(),
                    summary.frames_written
                ),
                Err(e) => error!("Failed: {}: {}", outcome.input.display(), e.user_message()),
            }
        }
        info!(
            "Batch complete: {} succeeded, {} failed in {:.2}s",
            self.succeeded().count(),
            self.failed().count(),
            self.elapsed.as_secs_f64()
        );
    }

    /// `Err(BatchError::JobsFailed)` if any job failed
    pub fn into_result(self) -> Result<Self> {
        let failed = self.failed().count();
        if failed == 0 {
            Ok(self)
        } else {
            Err(BatchError::JobsFailed {
                failed,
                total: self.total(),
            }
            .into())
        }
    }
}

/// Runs one isolated job per matching file on a fixed-size worker pool
///
/// Jobs share only the read-only transform configuration and the backend.
/// Every job runs to completion; a failure or panic in one is recorded in
/// the report and never hides the others.
pub struct BatchDispatcher {
    backend: Arc<dyn VideoBackend>,
    config: Arc<TransformConfig>,
    options: ProcessOptions,
    batch: BatchConfig,
    extension: String,
}

impl BatchDispatcher {
    pub fn new(
        backend: Arc<dyn VideoBackend>,
        config: Arc<TransformConfig>,
        options: ProcessOptions,
        batch: BatchConfig,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            config,
            options,
            batch,
            extension: extension.into(),
        }
    }

    /// One job per matching file under `input_folder`
    pub fn plan(&self, input_folder: &Path, output_folder: &Path) -> Result<Vec<Job>> {
        let inputs = discover_videos(input_folder, &self.extension)?;
        if inputs.is_empty() {
            return Err(BatchError::NoMatchingFiles {
                path: input_folder.display().to_string(),
                extension: self.extension.clone(),
            }
            .into());
        }

        if !self.batch.preserve_structure {
            for (name, paths) in basename_collisions(&inputs) {
                warn!(
                    "{} inputs share the name {:?} and will overwrite each other in {} (use --preserve-structure)",
                    paths.len(),
                    name,
                    output_folder.display()
                );
            }
        }

        Ok(inputs
            .into_iter()
            .map(|input| Job {
                output: output_path_for(
                    &input,
                    input_folder,
                    output_folder,
                    self.batch.preserve_structure,
                ),
                input,
                config: Arc::clone(&self.config),
            })
            .collect())
    }

    /// Transform every matching file and wait for all of them
    pub fn run(&self, input_folder: &Path, output_folder: &Path) -> Result<BatchReport> {
        let started = Instant::now();
        let jobs = self.plan(input_folder, output_folder)?;
        std::fs::create_dir_all(output_folder)?;

        let workers = self.batch.workers.max(1).min(jobs.len());
        info!(
            "Processing {} files from {} with {} workers ({} backend)",
            jobs.len(),
            input_folder.display(),
            workers,
            self.backend.name()
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("transform-worker-{}", i))
            .build()
            .map_err(|e| BatchError::PoolBuild {
                reason: e.to_string(),
            })?;

        let outcomes: Vec<JobOutcome> = pool.install(|| {
            jobs.par_iter()
                .with_max_len(1)
                .map(|job| self.run_job(job))
                .collect()
        });

        Ok(BatchReport::new(outcomes, started.elapsed()))
    }

    fn run_job(&self, job: &Job) -> JobOutcome {
        let backend = Arc::clone(&self.backend);
        let result = panic::catch_unwind(AssertUnwindSafe(|| job.run(backend, &self.options)))
            .unwrap_or_else(|payload| {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(TransformerError::generic(format!("job panicked: {}", message)))
            });

        if let Err(e) = &result {
            warn!("{} failed: {}", job.input.display(), e);
        }

        JobOutcome {
            input: job.input.clone(),
            output: job.output.clone(),
            result,
        }
    }
}
