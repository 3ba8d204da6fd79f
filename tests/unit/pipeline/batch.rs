use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use super::*;
use crate::{
    cache::directory::FsCacheDirectory,
    capture::source::{CapturedFrame, MemoryFrameSource},
    foundation::core::PixelBuffer,
};

fn frames(n: usize) -> Vec<PixelBuffer> {
    (0..n)
        .map(|i| PixelBuffer::solid(20, 10, [(i * 40) as u8, 0, 0, 255]))
        .collect()
}

fn job(id: &str, n: usize) -> BatchJob {
    BatchJob::from_source(id, Box::new(MemoryFrameSource::new(frames(n), 40)))
}

fn counted_job(id: &str, opened: &Arc<AtomicUsize>) -> BatchJob {
    let opened = Arc::clone(opened);
    BatchJob::new(id, move || {
        opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryFrameSource::new(frames(1), 40)) as Box<dyn FrameSource + Send>)
    })
}

struct FailingSource;

impl FrameSource for FailingSource {
    fn frame_interval_ms(&self) -> u32 {
        50
    }

    fn next_frame(&mut self) -> GlyphcastResult<Option<CapturedFrame>> {
        Ok(Some(CapturedFrame {
            timestamp_ms: 0,
            pixels: PixelBuffer {
                width: 0,
                height: 0,
                data: Vec::new(),
            },
        }))
    }
}

#[test]
fn record_uses_the_source_interval() {
    let tmp = tempfile::tempdir().unwrap();
    let mut cache = FrameCache::new(FsCacheDirectory::new(tmp.path()));
    let mut src = MemoryFrameSource::new(frames(3), 40);
    let stats =
        record_from_source(&mut cache, "v", &ConvertSettings::default(), &mut src).unwrap();
    assert_eq!(stats.frames_recorded, 3);
    assert_eq!(stats.memory_usage_bytes, cache.memory_usage_bytes());
    assert!(!cache.is_recording());
    assert_eq!(cache.store().metadata().unwrap().frame_interval_ms, 40);
    assert_eq!(cache.frame_at_time(80.0), Some(&cache.store().frames()[2]));
}

#[test]
fn record_stops_on_bad_frames() {
    let tmp = tempfile::tempdir().unwrap();
    let mut cache = FrameCache::new(FsCacheDirectory::new(tmp.path()));
    let err = record_from_source(
        &mut cache,
        "bad",
        &ConvertSettings::default(),
        &mut FailingSource,
    )
    .unwrap_err();
    assert!(matches!(err, GlyphcastError::InvalidInput(_)));
    assert!(!cache.is_recording());
}

#[test]
fn sequential_batch_converts_and_reports() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = FsCacheDirectory::new(tmp.path());
    let jobs = vec![
        job("one", 2),
        BatchJob::from_source("broken", Box::new(FailingSource)),
        BatchJob::new("unopenable", || {
            Err(GlyphcastError::invalid_input("no such input"))
        }),
        job("two", 1),
    ];
    let report = convert_batch(
        jobs,
        &dir,
        &ConvertSettings::default(),
        &BatchOptions::default(),
        &AtomicBool::new(false),
    )
    .unwrap();

    assert_eq!(report.converted(), vec!["one", "two"]);
    assert_eq!(report.failed(), vec!["broken", "unopenable"]);
    assert_eq!(report.outcomes[0].1, JobOutcome::Converted { frames: 2 });
    assert!(dir.exists("one.ascache"));
    assert!(dir.exists("two.ascache"));
    assert!(!dir.exists("broken.ascache"));
}

#[test]
fn cancelled_batch_starts_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = FsCacheDirectory::new(tmp.path());
    let report = convert_batch(
        vec![job("a", 1), job("b", 1)],
        &dir,
        &ConvertSettings::default(),
        &BatchOptions::default(),
        &AtomicBool::new(true),
    )
    .unwrap();
    assert_eq!(report.cancelled(), vec!["a", "b"]);
    assert!(dir.list().unwrap().is_empty());
}

#[test]
fn sources_open_only_for_jobs_that_run() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = FsCacheDirectory::new(tmp.path());
    let settings = ConvertSettings::default();
    let opened = Arc::new(AtomicUsize::new(0));

    convert_batch(
        vec![counted_job("a", &opened), counted_job("b", &opened)],
        &dir,
        &settings,
        &BatchOptions::default(),
        &AtomicBool::new(true),
    )
    .unwrap();
    assert_eq!(opened.load(Ordering::SeqCst), 0);

    let opts = BatchOptions {
        skip_existing: true,
        ..BatchOptions::default()
    };
    let cancel = AtomicBool::new(false);
    convert_batch(vec![counted_job("a", &opened)], &dir, &settings, &opts, &cancel).unwrap();
    assert_eq!(opened.load(Ordering::SeqCst), 1);

    let report =
        convert_batch(vec![counted_job("a", &opened)], &dir, &settings, &opts, &cancel).unwrap();
    assert_eq!(report.skipped(), vec!["a"]);
    assert_eq!(opened.load(Ordering::SeqCst), 1);
}

#[test]
fn skip_existing_leaves_caches_alone() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = FsCacheDirectory::new(tmp.path());
    let opts = BatchOptions {
        skip_existing: true,
        ..BatchOptions::default()
    };
    let settings = ConvertSettings::default();
    let cancel = AtomicBool::new(false);

    convert_batch(vec![job("a", 1)], &dir, &settings, &opts, &cancel).unwrap();
    let report = convert_batch(vec![job("a", 3), job("b", 1)], &dir, &settings, &opts, &cancel)
        .unwrap();
    assert_eq!(report.skipped(), vec!["a"]);
    assert_eq!(report.converted(), vec!["b"]);

    let mut cache = FrameCache::new(dir.clone());
    assert!(cache.load_from_disk("a"));
    assert_eq!(cache.frame_count(), 1);
}

#[test]
fn parallel_batch_keeps_job_order() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = FsCacheDirectory::new(tmp.path());
    let opts = BatchOptions {
        parallel: true,
        threads: Some(2),
        skip_existing: false,
    };
    let jobs = (0..6).map(|i| job(&format!("v{i}"), i + 1)).collect();
    let report = convert_batch(
        jobs,
        &dir,
        &ConvertSettings::default(),
        &opts,
        &AtomicBool::new(false),
    )
    .unwrap();
    assert_eq!(report.converted(), vec!["v0", "v1", "v2", "v3", "v4", "v5"]);
    assert_eq!(dir.list().unwrap().len(), 6);
}

#[test]
fn zero_threads_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let opts = BatchOptions {
        parallel: true,
        threads: Some(0),
        skip_existing: false,
    };
    let err = convert_batch(
        vec![],
        &FsCacheDirectory::new(tmp.path()),
        &ConvertSettings::default(),
        &opts,
        &AtomicBool::new(false),
    )
    .unwrap_err();
    assert!(matches!(err, GlyphcastError::InvalidInput(_)));
}
