use std::io::Cursor;

use super::*;

fn png_bytes(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_png_dimensions_and_premul() {
    let frame = decode_frame(&png_bytes(1, 1, [100, 50, 200, 128])).unwrap();
    assert_eq!(frame.width, 1);
    assert_eq!(frame.height, 1);
    assert_eq!(
        frame.rgba8_premul(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn decode_keeps_full_pixel_buffer() {
    let frame = decode_frame(&png_bytes(3, 2, [9, 8, 7, 255])).unwrap();
    assert_eq!((frame.width, frame.height), (3, 2));
    assert_eq!(frame.rgba8_premul().len(), 3 * 2 * 4);
    assert!(
        frame
            .rgba8_premul()
            .chunks_exact(4)
            .all(|px| px == [9, 8, 7, 255])
    );
}

#[test]
fn decode_rejects_garbage() {
    let err = decode_frame(b"definitely not an image").unwrap_err();
    assert!(matches!(err, FlipError::Other(_)));
}

#[test]
fn opaque_frames_are_flagged_opaque() {
    let opaque = decode_frame(&png_bytes(2, 2, [10, 20, 30, 255])).unwrap();
    assert!(!opaque.pixmap.may_have_opacities());

    let translucent = decode_frame(&png_bytes(2, 2, [10, 20, 30, 200])).unwrap();
    assert!(translucent.pixmap.may_have_opacities());
}
