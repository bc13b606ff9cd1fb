//! Headless timeline playback
//!
//! Builds a [`Timeline`] from a document, plays it to the end on a
//! [`FrameScheduler`] at a fixed frame rate and collects every sample the
//! path handlers receive.

use crate::config::TimelineDocument;
use anyhow::{Context, Result};
use fumaso_animation::{KeyframeValue, Path, Timeline};
use fumaso_core::{Clock, FrameScheduler};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

/// One value delivered to a path handler
#[derive(Debug, Clone, Serialize)]
pub struct Sample {
    /// Scheduler frame the sample was taken on
    pub frame: u64,
    /// Clock time of that frame (ms)
    pub clock_ms: f64,
    pub path: String,
    pub value: KeyframeValue,
}

/// Frame pacing for headless playback
#[derive(Debug, Clone, Copy)]
pub struct PlaybackSettings {
    pub fps: f64,
    pub max_frames: usize,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            fps: 60.0,
            max_frames: 100_000,
        }
    }
}

/// Result of a playback run
#[derive(Debug)]
pub struct PlaybackReport {
    pub samples: Vec<Sample>,
    pub frames: usize,
    pub end_time: f64,
    /// False if the frame budget ran out before the timeline went idle
    pub finished: bool,
}

/// Static facts about a document's timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineSummary {
    pub paths: usize,
    pub end_time: f64,
    pub timescale: f64,
}

type SampleSink = Rc<RefCell<Vec<Sample>>>;

fn build_timeline(
    document: &TimelineDocument,
    scheduler: &Rc<FrameScheduler>,
    sink: &SampleSink,
) -> Result<Timeline> {
    let timeline = Timeline::new(
        scheduler.clone(),
        scheduler.clock().clone(),
        document.timeline,
    )
    .context("Invalid [timeline] options")?;

    for path in &document.paths {
        let name = path.name.clone();
        let frames = Rc::downgrade(scheduler);
        let sink = sink.clone();

        let handler = move |value: &KeyframeValue| {
            let (frame, clock_ms) = frames
                .upgrade()
                .map_or((0, 0.0), |s| (s.frame(), s.clock().now()));
            sink.borrow_mut().push(Sample {
                frame,
                clock_ms,
                path: name.clone(),
                value: value.clone(),
            });
        };

        timeline
            .register_path(
                Path::new(handler)
                    .named(path.name.clone())
                    .keyframes(path.keyframes.iter().cloned()),
            )
            .with_context(|| format!("Invalid path '{}'", path.name))?;
    }

    Ok(timeline)
}

/// Validate a document and summarize its timeline
pub fn inspect(document: &TimelineDocument) -> Result<TimelineSummary> {
    let scheduler = Rc::new(FrameScheduler::new(Clock::new()));
    let sink = SampleSink::default();
    let timeline = build_timeline(document, &scheduler, &sink)?;

    Ok(TimelineSummary {
        paths: timeline.path_count(),
        end_time: timeline.end_time(),
        timescale: timeline.timescale(),
    })
}

/// Play a document from its start time to its end
pub fn play(document: &TimelineDocument, settings: PlaybackSettings) -> Result<PlaybackReport> {
    if !(settings.fps.is_finite() && settings.fps > 0.0) {
        anyhow::bail!("Frame rate must be positive, got {}", settings.fps);
    }

    let scheduler = Rc::new(FrameScheduler::new(Clock::new()));
    let sink = SampleSink::default();
    let timeline = build_timeline(document, &scheduler, &sink)?;

    tracing::info!(
        paths = timeline.path_count(),
        end_time = timeline.end_time(),
        fps = settings.fps,
        "playing timeline"
    );

    timeline.play();
    let frames = scheduler.run_until_idle(1000.0 / settings.fps, settings.max_frames);
    let finished = !scheduler.has_pending();

    if !finished {
        tracing::warn!(frames, "playback stopped before the timeline finished");
    }

    let samples = sink.take();
    Ok(PlaybackReport {
        samples,
        frames,
        end_time: timeline.end_time(),
        finished,
    })
}
