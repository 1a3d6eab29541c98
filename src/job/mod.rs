//! Job execution.
//!
//! A job turns one source deck into one rendered output against the shared
//! template. Jobs own all of their state; the template sits behind an `Arc`
//! and is only read.

mod atomic;
mod batch;

pub use batch::{BatchJob, BatchResult};

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError};
use serde::Serialize;

use crate::bind::{bind_with_overrides, MappingOverrides, TemplateSpec, UnboundField};
use crate::error::{Error, Result};
use crate::extract::{extract_with_options, EntryStatus, ExtractOptions, ExtractionReport};
use crate::layout::{resolve_with_options, FitStrategy, LayoutOptions, LayoutOutcome};
use crate::model::CvProfile;
use crate::parser::{PackageParser, ParseOptions};
use crate::render::{render_with_options, RenderOptions};

/// Options for running jobs.
#[derive(Debug, Clone)]
pub struct JobOptions {
    /// Deadline for one job, `None` for no limit
    pub timeout: Option<Duration>,

    /// Worker threads for batches (0 = one per CPU)
    pub workers: usize,

    pub parse: ParseOptions,
    pub extract: ExtractOptions,
    pub layout: LayoutOptions,
    pub render: RenderOptions,
}

impl JobOptions {
    /// Create new job options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-job deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Remove the per-job deadline.
    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Set the number of batch workers.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the extraction confidence threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.extract = self.extract.with_threshold(threshold);
        self
    }

    pub fn with_parse(mut self, parse: ParseOptions) -> Self {
        self.parse = parse;
        self
    }

    pub fn with_extract(mut self, extract: ExtractOptions) -> Self {
        self.extract = extract;
        self
    }

    pub fn with_layout(mut self, layout: LayoutOptions) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_render(mut self, render: RenderOptions) -> Self {
        self.render = render;
        self
    }
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(60)),
            workers: 0,
            parse: ParseOptions::default(),
            extract: ExtractOptions::default(),
            layout: LayoutOptions::default(),
            render: RenderOptions::default(),
        }
    }
}

/// Non-fatal findings of one job.
#[derive(Debug, Clone, Default, Serialize)]
pub struct JobReport {
    pub extraction: ExtractionReport,
    pub unbound: Vec<UnboundField>,
    pub layout: Vec<LayoutOutcome>,
    pub continuation_pages: usize,
}

impl JobReport {
    /// Human-readable warnings, one per finding.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings: Vec<String> = self
            .extraction
            .with_status(EntryStatus::Ambiguous)
            .map(|e| {
                format!(
                    "ambiguous {} (confidence {:.2}): {}",
                    e.field,
                    e.confidence,
                    e.excerpt.as_deref().unwrap_or("")
                )
            })
            .collect();
        warnings.extend(
            self.unbound
                .iter()
                .map(|u| format!("{} not placed: {}", u.field, u.reason)),
        );
        warnings.extend(
            self.layout
                .iter()
                .filter(|o| o.strategy == FitStrategy::Unresolved)
                .map(|o| format!("{} overflows {} at {}pt", o.field, o.slot, o.font_size)),
        );
        warnings
    }

    /// Whether the job finished without findings.
    pub fn is_clean(&self) -> bool {
        self.warnings().is_empty()
    }
}

/// Result of a job.
#[derive(Debug, Clone)]
pub struct JobOutput {
    /// Rendered package
    pub bytes: Vec<u8>,
    pub profile: CvProfile,
    pub report: JobReport,
}

/// Runs jobs against one template.
///
/// The template is loaded once and shared by every job, including jobs on
/// other threads; cloning an `Engine` is cheap.
#[derive(Debug, Clone)]
pub struct Engine {
    template: Arc<TemplateSpec>,
    overrides: Arc<MappingOverrides>,
    options: JobOptions,
}

impl Engine {
    /// Create an engine for a loaded template.
    pub fn new(template: TemplateSpec) -> Self {
        Self {
            template: Arc::new(template),
            overrides: Arc::new(MappingOverrides::default()),
            options: JobOptions::default(),
        }
    }

    /// Load the template from a file.
    pub fn from_template_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(TemplateSpec::open(path)?))
    }

    /// Set job options.
    pub fn with_options(mut self, options: JobOptions) -> Self {
        self.options = options;
        self
    }

    /// Set mapping overrides.
    pub fn with_overrides(mut self, overrides: MappingOverrides) -> Self {
        self.overrides = Arc::new(overrides);
        self
    }

    pub fn template(&self) -> &TemplateSpec {
        &self.template
    }

    pub fn options(&self) -> &JobOptions {
        &self.options
    }

    /// Run one job in memory.
    pub fn process_bytes(&self, source: &[u8]) -> Result<JobOutput> {
        self.process_bytes_cancellable(source, &AtomicBool::new(false))
    }

    /// Run one job in memory, stopping with `Error::Cancelled` at the next
    /// stage boundary once `cancel` is set.
    pub fn process_bytes_cancellable(
        &self,
        source: &[u8],
        cancel: &AtomicBool,
    ) -> Result<JobOutput> {
        let checkpoint = || {
            if cancel.load(Ordering::Relaxed) {
                Err(Error::Cancelled)
            } else {
                Ok(())
            }
        };

        let doc = PackageParser::from_bytes_with_options(source, self.options.parse.clone())?
            .parse()?;
        checkpoint()?;

        let (profile, extraction) = extract_with_options(&doc, &self.options.extract);
        drop(doc);
        checkpoint()?;

        let mapping = bind_with_overrides(&self.template, &profile, &self.overrides);
        checkpoint()?;

        let template = TemplateSpec::clone(&self.template);
        let layout = resolve_with_options(&mapping, template, &self.options.layout);
        checkpoint()?;

        let bytes = render_with_options(&layout, &self.options.render)?;

        let report = JobReport {
            extraction,
            unbound: mapping.unbound,
            layout: layout.outcomes(),
            continuation_pages: layout.pages.len(),
        };

        Ok(JobOutput {
            bytes,
            profile,
            report,
        })
    }

    /// Run one job from `input` to `output`.
    ///
    /// The job runs on a worker thread under the configured deadline. The
    /// output file is only created, atomically, once rendering succeeded; on
    /// error or timeout nothing is written.
    pub fn process_file(&self, input: &Path, output: &Path) -> Result<JobOutput> {
        let source = std::fs::read(input).map_err(|e| Error::read(input, e))?;

        let (tx, rx) = bounded(1);
        let cancel = Arc::new(AtomicBool::new(false));
        let worker = {
            let engine = self.clone();
            let cancel = Arc::clone(&cancel);
            thread::Builder::new()
                .name("cvdeck-job".into())
                .spawn(move || {
                    let result = engine.process_bytes_cancellable(&source, &cancel);
                    let _ = tx.send(result);
                })?
        };

        let result = match self.options.timeout {
            Some(timeout) => match rx.recv_timeout(timeout) {
                Ok(result) => result,
                Err(RecvTimeoutError::Timeout) => {
                    cancel.store(true, Ordering::Relaxed);
                    log::warn!("{} timed out after {:?}", input.display(), timeout);
                    return Err(Error::Timeout(timeout));
                }
                Err(RecvTimeoutError::Disconnected) => Err(worker_lost()),
            },
            None => rx.recv().unwrap_or_else(|_| Err(worker_lost())),
        };

        let _ = worker.join();
        let output_data = result?;
        atomic::write_atomic(output, &output_data.bytes)?;
        Ok(output_data)
    }

    /// Run a batch on a bounded worker pool.
    ///
    /// Every job is independent: a failing job yields an error result and
    /// does not affect the others. Results come back in input order.
    pub fn run_batch(&self, jobs: Vec<BatchJob>) -> Vec<BatchResult> {
        batch::run(self, jobs, &|_| {})
    }

    /// Run a batch, calling `progress` as each job finishes.
    pub fn run_batch_with_progress(
        &self,
        jobs: Vec<BatchJob>,
        progress: &(dyn Fn(&BatchResult) + Sync),
    ) -> Vec<BatchResult> {
        batch::run(self, jobs, progress)
    }
}

fn worker_lost() -> Error {
    Error::Render("job worker stopped before finishing".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_options_defaults() {
        let opts = JobOptions::default();
        assert_eq!(opts.timeout, Some(Duration::from_secs(60)));
        assert_eq!(opts.workers, 0);
        assert!(opts.render.timestamp.is_none());

        let opts = opts.without_timeout().with_workers(4).with_threshold(0.7);
        assert!(opts.timeout.is_none());
        assert_eq!(opts.workers, 4);
        assert_eq!(opts.extract.threshold, 0.7);
    }

    #[test]
    fn test_report_warnings() {
        let report = JobReport {
            unbound: vec![UnboundField {
                field: "experience[2]".into(),
                reason: crate::bind::UnboundReason::ExceedsCapacity,
            }],
            ..Default::default()
        };
        let warnings = report.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("experience[2] not placed"));
        assert!(!report.is_clean());
        assert!(JobReport::default().is_clean());
    }
}
