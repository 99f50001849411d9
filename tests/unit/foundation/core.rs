use super::*;

#[test]
fn surface_size_parses_width_by_height() {
    let s: SurfaceSize = "1920x1080".parse().unwrap();
    assert_eq!(s, SurfaceSize::new(1920, 1080));
    let s: SurfaceSize = "64X32".parse().unwrap();
    assert_eq!(s, SurfaceSize::new(64, 32));
    assert!("1920".parse::<SurfaceSize>().is_err());
    assert!("ax10".parse::<SurfaceSize>().is_err());
}

#[test]
fn surface_size_aspect_and_empty() {
    assert_eq!(SurfaceSize::new(200, 100).aspect(), Some(2.0));
    assert_eq!(SurfaceSize::new(0, 100).aspect(), None);
    assert!(SurfaceSize::default().is_empty());
}

#[test]
fn surface_size_rejects_oversized_extent() {
    assert_eq!(SurfaceSize::new(640, 480).to_u16().unwrap(), (640, 480));
    assert!(SurfaceSize::new(70_000, 10).to_u16().is_err());
}

#[test]
fn premul_scales_color_channels_only() {
    assert_eq!(premul_rgba8([255, 255, 255, 255]), [255, 255, 255, 255]);
    assert_eq!(premul_rgba8([200, 100, 50, 0]), [0, 0, 0, 0]);
    assert_eq!(premul_rgba8([255, 0, 0, 128]), [128, 0, 0, 128]);
}
