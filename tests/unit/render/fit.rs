use super::*;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn cover_wide_canvas_fills_width_and_crops_height() {
    let r = fit_rect(FitMode::Cover, SurfaceSize::new(1920, 800), 1920, 1080).unwrap();
    assert!(approx(r.x0, 0.0));
    assert!(approx(r.width(), 1920.0));
    assert!(approx(r.height(), 1080.0));
    assert!(approx(r.y0, (800.0 - 1080.0) / 2.0));
}

#[test]
fn cover_tall_canvas_fills_height_and_crops_width() {
    let r = fit_rect(FitMode::Cover, SurfaceSize::new(400, 800), 1600, 900).unwrap();
    assert!(approx(r.height(), 800.0));
    assert!(approx(r.width(), 800.0 * 16.0 / 9.0));
    assert!(approx(r.y0, 0.0));
    assert!(approx(r.center().x, 200.0));
    assert!(r.width() > 400.0);
}

#[test]
fn contain_wide_canvas_letterboxes_sides() {
    let r = fit_rect(FitMode::Contain, SurfaceSize::new(1000, 200), 400, 200).unwrap();
    assert!(approx(r.height(), 200.0));
    assert!(approx(r.width(), 400.0));
    assert!(approx(r.x0, 300.0));
    assert!(approx(r.y0, 0.0));
}

#[test]
fn contain_tall_canvas_letterboxes_top_and_bottom() {
    let r = fit_rect(FitMode::Contain, SurfaceSize::new(8, 8), 2, 1).unwrap();
    assert!(approx(r.width(), 8.0));
    assert!(approx(r.height(), 4.0));
    assert!(approx(r.y0, 2.0));
}

#[test]
fn both_modes_preserve_aspect() {
    for mode in [FitMode::Cover, FitMode::Contain] {
        for (cw, ch) in [(1920, 1080), (300, 900), (500, 500)] {
            let r = fit_rect(mode, SurfaceSize::new(cw, ch), 1280, 720).unwrap();
            assert!(approx(r.width() / r.height(), 1280.0 / 720.0));
            assert!(approx(r.center().x, f64::from(cw) / 2.0));
            assert!(approx(r.center().y, f64::from(ch) / 2.0));
        }
    }
}

#[test]
fn matching_aspect_is_exact_fit_for_both_modes() {
    for mode in [FitMode::Cover, FitMode::Contain] {
        let r = fit_rect(mode, SurfaceSize::new(640, 360), 1280, 720).unwrap();
        assert!(approx(r.x0, 0.0) && approx(r.y0, 0.0));
        assert!(approx(r.width(), 640.0) && approx(r.height(), 360.0));
    }
}

#[test]
fn zero_extents_have_no_rect() {
    assert!(fit_rect(FitMode::Cover, SurfaceSize::new(0, 10), 10, 10).is_none());
    assert!(fit_rect(FitMode::Contain, SurfaceSize::new(10, 10), 0, 10).is_none());
}
