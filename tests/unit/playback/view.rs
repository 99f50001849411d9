use std::cell::Cell;
use std::collections::HashMap;
use std::io::Cursor;

use super::*;
use crate::foundation::error::FlipError;
use crate::overlay::opacity::{Overlay, OverlayWindow};
use crate::playback::scheduler::ManualScheduler;
use crate::sequence::pattern::{FrameRun, FrameSource};

struct MemLoader {
    files: HashMap<String, Vec<u8>>,
}

impl FrameLoader for MemLoader {
    fn load(&self, source: &FrameSource) -> FlipResult<Vec<u8>> {
        self.files
            .get(&source.rel_path)
            .cloned()
            .ok_or_else(|| FlipError::load(format!("missing {}", source.rel_path)))
    }
}

fn color(i: u32) -> [u8; 4] {
    [(i * 50) as u8, 255 - (i * 50) as u8, 0, 255]
}

fn close_to(px: [u8; 4], want: [u8; 4]) -> bool {
    px.iter()
        .zip(want.iter())
        .all(|(a, b)| (i16::from(*a) - i16::from(*b)).abs() <= 3)
}

fn png(rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(4, 4, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn loader(n: u32, skip: &[u32]) -> Arc<dyn FrameLoader> {
    let files = (0..n)
        .filter(|i| !skip.contains(i))
        .map(|i| (format!("f{i:03}.png"), png(color(i))))
        .collect();
    Arc::new(MemLoader { files })
}

fn scene(n: u32) -> SceneConfig {
    SceneConfig {
        name: "test".to_string(),
        sequence: SequencePattern::single(FrameRun {
            dir: String::new(),
            prefix: "f".to_string(),
            first: 0,
            last: n - 1,
            pad: 3,
            ext: "png".to_string(),
        }),
        track: TrackMode::Pinned,
        fit: FitMode::Cover,
        stage: Default::default(),
        overlays: vec![Overlay::Window(OverlayWindow {
            name: "w".to_string(),
            start: 1,
            end: 3,
            fade_in: 0,
            fade_out: 0,
        })],
        clear_rgba: [9, 9, 9, 255],
        load: Default::default(),
    }
}

fn measurement(top: f64) -> Measurement {
    Measurement {
        track: TrackLayout {
            top,
            height: 2000.0,
            viewport_height: 1000.0,
        },
        surface: SurfaceSize::new(8, 8),
    }
}

fn animating_view(n: u32, skip: &[u32]) -> PlaybackView<ManualScheduler> {
    let mut view = PlaybackView::new(
        &scene(n),
        loader(n, skip),
        ManualScheduler::new(),
        LoadOpts::default(),
    )
    .unwrap();
    view.mount().unwrap();
    assert!(view.wait_loaded());
    view
}

fn next_request(view: &mut PlaybackView<ManualScheduler>) -> FrameRequest {
    let due = view.scheduler_mut().take_due();
    assert_eq!(due.len(), 1, "exactly one tick must be outstanding");
    due[0]
}

#[test]
fn lifecycle_moves_through_every_phase_once() {
    let mut view = PlaybackView::new(
        &scene(5),
        loader(5, &[]),
        ManualScheduler::new(),
        LoadOpts::default(),
    )
    .unwrap();
    assert_eq!(view.phase(), Phase::Idle);
    assert!(!view.is_loading());
    assert!(!view.poll());

    view.mount().unwrap();
    assert_eq!(view.phase(), Phase::Loading);
    assert!(view.is_loading());
    assert_eq!(view.scheduler().pending_count(), 0);

    let mut started = 0;
    for _ in 0..2000 {
        if view.poll() {
            started += 1;
        }
        if view.phase() == Phase::Animating {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(1));
    }
    assert_eq!(started, 1);
    assert!(!view.poll());
    assert!(!view.wait_loaded());
    assert!(!view.is_loading());
    assert_eq!(view.scheduler().pending_count(), 1);
    assert_eq!(view.load_report().unwrap().loaded, 5);

    view.unmount();
    assert_eq!(view.phase(), Phase::TornDown);
    assert_eq!(view.scheduler().pending_count(), 0);
    view.unmount();
    view.mount().unwrap();
    assert_eq!(view.phase(), Phase::TornDown);
}

#[test]
fn ticks_follow_scroll_position() {
    let mut view = animating_view(5, &[]);
    let top = Cell::new(0.0);
    let probe = || Some(measurement(top.get()));

    for (t, want) in [(0.0, 0), (-500.0, 2), (-1000.0, 4), (-5000.0, 4), (300.0, 0)] {
        top.set(t);
        let req = next_request(&mut view);
        let Tick::Rendered(report) = view.on_frame(req, &probe).unwrap() else {
            panic!("expected a rendered tick");
        };
        assert_eq!(report.frame, FrameIndex(want));
        assert!(report.drew);
        let px = view.canvas().snapshot().unwrap().pixel(4, 4).unwrap();
        assert!(close_to(px, color(want as u32)), "{px:?}");
    }
}

#[test]
fn first_tick_resizes_canvas() {
    let mut view = animating_view(3, &[]);
    let probe = || Some(measurement(0.0));

    let req = next_request(&mut view);
    let Tick::Rendered(first) = view.on_frame(req, &probe).unwrap() else {
        panic!("expected a rendered tick");
    };
    assert!(first.resized);
    let req = next_request(&mut view);
    let Tick::Rendered(second) = view.on_frame(req, &probe).unwrap() else {
        panic!("expected a rendered tick");
    };
    assert!(!second.resized);
    assert_eq!(view.canvas().size(), SurfaceSize::new(8, 8));
}

#[test]
fn container_resize_between_ticks_resizes_canvas() {
    let mut view = animating_view(3, &[]);
    let surface = Cell::new(SurfaceSize::new(8, 8));
    let probe = || {
        Some(Measurement {
            surface: surface.get(),
            ..measurement(0.0)
        })
    };

    let req = next_request(&mut view);
    assert!(matches!(view.on_frame(req, &probe).unwrap(), Tick::Rendered(_)));
    assert_eq!(view.canvas().size(), SurfaceSize::new(8, 8));

    surface.set(SurfaceSize::new(16, 4));
    let req = next_request(&mut view);
    let Tick::Rendered(report) = view.on_frame(req, &probe).unwrap() else {
        panic!("expected a rendered tick");
    };
    assert!(report.resized);
    assert!(report.drew);
    assert_eq!(view.canvas().size(), SurfaceSize::new(16, 4));

    let snap = view.canvas().snapshot().unwrap();
    assert_eq!((snap.width, snap.height), (16, 4));
    assert!(close_to(snap.pixel(8, 2).unwrap(), color(0)));
}

#[test]
fn overlays_are_reported_per_tick() {
    let mut view = animating_view(5, &[]);
    let top = Cell::new(-250.0);
    let probe = || Some(measurement(top.get()));

    let req = next_request(&mut view);
    let Tick::Rendered(report) = view.on_frame(req, &probe).unwrap() else {
        panic!("expected a rendered tick");
    };
    assert_eq!(report.frame, FrameIndex(1));
    assert_eq!(report.overlays.len(), 1);
    assert_eq!(report.overlays[0].opacity, 1.0);

    top.set(-1000.0);
    let req = next_request(&mut view);
    let Tick::Rendered(report) = view.on_frame(req, &probe).unwrap() else {
        panic!("expected a rendered tick");
    };
    assert_eq!(report.overlays[0].opacity, 0.0);
}

#[test]
fn missing_frame_draws_background_only() {
    let mut view = animating_view(5, &[2]);
    assert_eq!(view.load_report().unwrap().failed, 1);
    let probe = || Some(measurement(-500.0));

    let req = next_request(&mut view);
    let Tick::Rendered(report) = view.on_frame(req, &probe).unwrap() else {
        panic!("expected a rendered tick");
    };
    assert_eq!(report.frame, FrameIndex(2));
    assert!(!report.drew);
    let px = view.canvas().snapshot().unwrap().pixel(0, 0).unwrap();
    assert_eq!(px, [9, 9, 9, 255]);
    // The loop keeps going.
    assert_eq!(view.scheduler().pending_count(), 1);
}

#[test]
fn detached_layout_skips_but_keeps_scheduling() {
    let mut view = animating_view(3, &[]);
    let detached = || -> Option<Measurement> { None };

    let req = next_request(&mut view);
    assert_eq!(view.on_frame(req, &detached).unwrap(), Tick::Skipped);
    assert!(view.canvas().snapshot().is_none());
    assert_eq!(view.scheduler().pending_count(), 1);
}

#[test]
fn stale_and_early_requests_do_nothing() {
    let mut view = PlaybackView::new(
        &scene(3),
        loader(3, &[]),
        ManualScheduler::new(),
        LoadOpts::default(),
    )
    .unwrap();
    let probe = || Some(measurement(0.0));
    assert_eq!(
        view.on_frame(FrameRequest(1), &probe).unwrap(),
        Tick::NotScheduled
    );

    view.mount().unwrap();
    view.wait_loaded();
    let req = next_request(&mut view);
    assert!(matches!(view.on_frame(req, &probe).unwrap(), Tick::Rendered(_)));
    assert_eq!(view.on_frame(req, &probe).unwrap(), Tick::NotScheduled);

    let req = next_request(&mut view);
    view.unmount();
    assert_eq!(view.on_frame(req, &probe).unwrap(), Tick::NotScheduled);
}

#[test]
fn oversized_canvas_error_stops_loop() {
    let mut view = animating_view(3, &[]);
    let probe = || {
        Some(Measurement {
            surface: SurfaceSize::new(200_000, 10),
            ..measurement(0.0)
        })
    };

    let req = next_request(&mut view);
    assert!(view.on_frame(req, &probe).is_err());
    assert_eq!(view.scheduler().pending_count(), 0);
}

#[test]
fn invalid_scene_is_rejected_up_front() {
    let mut bad = scene(3);
    bad.sequence.runs.clear();
    let res = PlaybackView::new(&bad, loader(3, &[]), ManualScheduler::new(), LoadOpts::default());
    assert!(res.is_err());
}
