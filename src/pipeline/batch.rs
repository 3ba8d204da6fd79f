use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::{
    cache::directory::CacheDirectory,
    cache::frame_cache::FrameCache,
    capture::source::FrameSource,
    foundation::error::{GlyphcastError, GlyphcastResult},
    foundation::settings::ConvertSettings,
};

/// Counters from one recording pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecordStats {
    /// Frames pulled from the source and stored.
    pub frames_recorded: u64,
    /// Cell bytes held after recording.
    pub memory_usage_bytes: usize,
}

/// Record every frame `source` produces into `cache` under `video_id`.
///
/// The recording uses the source's frame interval so that playback lookups line up with
/// the capture cadence. Recording is stopped before returning, also on error.
pub fn record_from_source<D: CacheDirectory>(
    cache: &mut FrameCache<D>,
    video_id: &str,
    settings: &ConvertSettings,
    source: &mut dyn FrameSource,
) -> GlyphcastResult<RecordStats> {
    let settings = ConvertSettings {
        frame_interval_ms: source.frame_interval_ms(),
        ..settings.clone()
    };
    cache.start_recording(video_id, &settings);

    let mut frames_recorded = 0u64;
    let result = loop {
        match source.next_frame() {
            Ok(Some(frame)) => {
                let px = &frame.pixels;
                if let Err(e) = cache.add_frame(frame.timestamp_ms, &px.data, px.width, px.height)
                {
                    break Err(e);
                }
                frames_recorded += 1;
            }
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        }
    };
    cache.stop_recording();
    result?;

    Ok(RecordStats {
        frames_recorded,
        memory_usage_bytes: cache.memory_usage_bytes(),
    })
}

/// Deferred constructor of a job's frame source.
pub type SourceOpener =
    Box<dyn FnOnce() -> GlyphcastResult<Box<dyn FrameSource + Send>> + Send>;

/// One video to convert in a batch.
///
/// The source is opened only when the job actually runs, so cancelled and skipped jobs
/// never start a decoder.
pub struct BatchJob {
    /// Id the cache is saved under.
    pub video_id: String,
    /// Opens the raw frame producer for the video.
    pub open: SourceOpener,
}

impl BatchJob {
    /// Job whose source is opened lazily by `open`.
    pub fn new<F>(video_id: impl Into<String>, open: F) -> Self
    where
        F: FnOnce() -> GlyphcastResult<Box<dyn FrameSource + Send>> + Send + 'static,
    {
        Self {
            video_id: video_id.into(),
            open: Box::new(open),
        }
    }

    /// Job over a source that is already open.
    pub fn from_source(
        video_id: impl Into<String>,
        source: Box<dyn FrameSource + Send>,
    ) -> Self {
        Self::new(video_id, move || Ok(source))
    }
}

/// Options for [`convert_batch`].
#[derive(Clone, Debug, Default)]
pub struct BatchOptions {
    /// Convert several videos at once on a rayon pool.
    pub parallel: bool,
    /// Override rayon worker threads (parallel mode only).
    pub threads: Option<usize>,
    /// Leave videos that already have a cache untouched.
    pub skip_existing: bool,
}

/// Result of one batch job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobOutcome {
    /// Recorded and saved.
    Converted {
        /// Frames written to the cache.
        frames: u64,
    },
    /// A cache already existed and `skip_existing` was set.
    Skipped,
    /// Cancellation was requested before the job started.
    Cancelled,
    /// Opening the source, recording or saving failed.
    Failed(String),
}

/// Per-video outcomes of [`convert_batch`], in job order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// `(video_id, outcome)` pairs.
    pub outcomes: Vec<(String, JobOutcome)>,
}

impl BatchReport {
    /// Ids of videos with the given outcome kind.
    fn ids_where(&self, pred: impl Fn(&JobOutcome) -> bool) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| pred(o))
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Videos recorded and saved.
    pub fn converted(&self) -> Vec<&str> {
        self.ids_where(|o| matches!(o, JobOutcome::Converted { .. }))
    }

    /// Videos skipped because a cache existed.
    pub fn skipped(&self) -> Vec<&str> {
        self.ids_where(|o| matches!(o, JobOutcome::Skipped))
    }

    /// Videos not started because of cancellation.
    pub fn cancelled(&self) -> Vec<&str> {
        self.ids_where(|o| matches!(o, JobOutcome::Cancelled))
    }

    /// Videos that failed.
    pub fn failed(&self) -> Vec<&str> {
        self.ids_where(|o| matches!(o, JobOutcome::Failed(_)))
    }
}

/// Convert and save a list of videos, one cache per video.
///
/// `cancel` is checked before each video starts and before its source is opened; a video
/// already being recorded always runs to completion. Per-video failures are reported in
/// the [`BatchReport`] rather than aborting the batch.
pub fn convert_batch<D>(
    jobs: Vec<BatchJob>,
    dir: &D,
    settings: &ConvertSettings,
    opts: &BatchOptions,
    cancel: &AtomicBool,
) -> GlyphcastResult<BatchReport>
where
    D: CacheDirectory + Clone + Send + Sync,
{
    tracing::info!(jobs = jobs.len(), parallel = opts.parallel, "batch conversion");

    let outcomes = if opts.parallel {
        let pool = build_thread_pool(opts.threads)?;
        pool.install(|| {
            jobs.into_par_iter()
                .map(|job| run_job(job, dir, settings, opts, cancel))
                .collect::<Vec<_>>()
        })
    } else {
        jobs.into_iter()
            .map(|job| run_job(job, dir, settings, opts, cancel))
            .collect()
    };

    Ok(BatchReport { outcomes })
}

fn run_job<D: CacheDirectory + Clone>(
    job: BatchJob,
    dir: &D,
    settings: &ConvertSettings,
    opts: &BatchOptions,
    cancel: &AtomicBool,
) -> (String, JobOutcome) {
    if cancel.load(Ordering::Acquire) {
        tracing::info!(video_id = %job.video_id, "cancelled before start");
        return (job.video_id, JobOutcome::Cancelled);
    }

    let mut cache = FrameCache::new(dir.clone());
    if opts.skip_existing && cache.cache_exists(&job.video_id) {
        tracing::info!(video_id = %job.video_id, "cache exists, skipping");
        return (job.video_id, JobOutcome::Skipped);
    }

    let BatchJob { video_id, open } = job;
    let outcome = open().and_then(|mut source| {
        let stats = record_from_source(&mut cache, &video_id, settings, source.as_mut())?;
        cache.save()?;
        Ok(stats)
    });
    match outcome {
        Ok(stats) => {
            tracing::info!(
                video_id = %video_id,
                frames = stats.frames_recorded,
                "converted"
            );
            (
                video_id,
                JobOutcome::Converted {
                    frames: stats.frames_recorded,
                },
            )
        }
        Err(e) => {
            tracing::warn!(video_id = %video_id, error = %e, "conversion failed");
            (video_id, JobOutcome::Failed(e.to_string()))
        }
    }
}

fn build_thread_pool(threads: Option<usize>) -> GlyphcastResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(GlyphcastError::invalid_input(
            "batch 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder.build().map_err(|e| {
        GlyphcastError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}"))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/batch.rs"]
mod tests;
