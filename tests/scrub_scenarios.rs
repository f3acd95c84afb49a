use scrollscrub_core::render::{DrawOp, FrameImage, RecordingSurface};
use scrollscrub_core::{
    map_to_frame, CanvasMetrics, DeviceClass, DeviceProfile, DrawOutcome, FrameCache, FrameEngine,
    FrameRange, RecordingFetcher, ScrollGeometry, ScrubConfig,
};

#[derive(Clone, Debug, PartialEq)]
struct Frame(String);

impl FrameImage for Frame {
    fn natural_size(&self) -> (f64, f64) {
        (1920.0, 1080.0)
    }
}

type Engine = FrameEngine<Frame, RecordingFetcher>;

const VIEWPORT_HEIGHT: f64 = 900.0;

fn geometry(scroll_y: f64) -> ScrollGeometry {
    ScrollGeometry::new(scroll_y, 0.0, 5620.0, VIEWPORT_HEIGHT)
}

fn desktop_engine() -> Engine {
    FrameEngine::new(ScrubConfig::default(), RecordingFetcher::new(), 1440.0).unwrap()
}

fn load_all(engine: &mut Engine, surface: &mut RecordingSurface<Frame>) {
    for req in engine.fetcher_mut().drain() {
        engine.on_frame_loaded(req.ticket, Frame(req.locator), surface);
    }
}

#[test]
fn halfway_through_the_hero_is_frame_142() {
    let range = FrameRange::new(2, 281);
    assert_eq!(map_to_frame(&geometry(2360.0), range), 142);
    assert_eq!(map_to_frame(&geometry(-500.0), range), 2);
    assert_eq!(map_to_frame(&geometry(1.0e7), range), 281);
}

#[test]
fn scrolling_the_page_plays_the_sequence() {
    let mut engine = desktop_engine();
    let mut surface = RecordingSurface::new(CanvasMetrics::new(1440.0, VIEWPORT_HEIGHT, 2.0));

    engine.mount(&geometry(0.0), &mut surface);
    load_all(&mut engine, &mut surface);
    assert_eq!(surface.last_image(), Some(&Frame("/adaline_frames/002.jpg".into())));

    let mut previous = engine.current_frame();
    for step in 1..=40 {
        if engine.on_scroll() {
            engine.on_animation_frame(&geometry(step as f64 * 120.0), &mut surface);
        }
        load_all(&mut engine, &mut surface);
        let frame = engine.current_frame();
        assert!(frame >= previous, "frame went backwards: {previous} -> {frame}");
        assert!((2..=281).contains(&frame));
        assert_eq!(engine.render_state().last_drawn, Some(frame));
        previous = frame;
    }
    assert_eq!(engine.current_frame(), 281);
    assert_eq!(surface.last_image(), Some(&Frame("/adaline_frames/281.jpg".into())));
}

#[test]
fn crossing_the_breakpoint_switches_asset_sets() {
    let mut engine = desktop_engine();
    let mut surface = RecordingSurface::new(CanvasMetrics::new(1440.0, VIEWPORT_HEIGHT, 1.0));

    engine.mount(&geometry(2360.0), &mut surface);
    load_all(&mut engine, &mut surface);
    assert_eq!(engine.render_state().last_drawn, Some(142));

    surface.metrics = CanvasMetrics::new(390.0, 844.0, 3.0);
    engine.on_resize(390.0, true, &mut surface);
    assert_eq!(engine.device_class(), DeviceClass::Mobile);
    assert_eq!(engine.current_frame(), 142);

    let requests = &engine.fetcher().requests;
    let locators: Vec<&str> = requests.iter().map(|r| r.locator.as_str()).collect();
    assert!(locators.contains(&"/adaline_frames_3x5/142.jpg"));
    assert!(locators.iter().all(|l| l.starts_with("/adaline_frames_3x5/")));

    load_all(&mut engine, &mut surface);
    assert_eq!(surface.last_image(), Some(&Frame("/adaline_frames_3x5/142.jpg".into())));
}

#[test]
fn preload_window_is_requested_once() {
    let profile = DeviceProfile::new("/adaline_frames");
    let mut cache: FrameCache<Frame> = FrameCache::new(2);
    let mut fetcher = RecordingFetcher::new();

    let (lo, hi) = FrameRange::new(2, 281).window(142, 6);
    assert_eq!((lo, hi), (136, 148));
    assert_eq!(cache.ensure_range(lo, hi, &profile, &mut fetcher), 13);
    assert_eq!(cache.ensure_range(lo, hi, &profile, &mut fetcher), 0);
    assert_eq!(fetcher.requests.len(), 13);
    assert_eq!(fetcher.requests[0].locator, "/adaline_frames/136.jpg");
}

#[test]
fn nothing_loaded_leaves_the_canvas_alone() {
    let mut engine = desktop_engine();
    let mut surface = RecordingSurface::new(CanvasMetrics::new(1440.0, VIEWPORT_HEIGHT, 1.0));

    assert_eq!(engine.mount(&geometry(2360.0), &mut surface), DrawOutcome::Skipped);
    assert!(surface.ops.is_empty());
    assert_eq!(engine.redraw(&mut surface), DrawOutcome::Skipped);
    assert!(!surface.ops.iter().any(|op| matches!(op, DrawOp::Fill(_))));
}
