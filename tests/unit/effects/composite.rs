use super::*;

fn canvas(w: u32, h: u32) -> Canvas {
    Canvas::new(w, h).unwrap()
}

#[test]
fn pixel_src_alpha_0_is_noop() {
    let dst = [10, 20, 30, 40];
    assert_eq!(blend_pixel(dst, [255, 255, 255, 0]), dst);
}

#[test]
fn pixel_src_opaque_replaces_dst() {
    let dst = [0, 0, 0, 255];
    let src = [255, 0, 0, 255];
    assert_eq!(blend_pixel(dst, src), src);
}

#[test]
fn opaque_fast_path_matches_general_formula() {
    for r in (0u16..=255).step_by(15) {
        for g in [0u8, 1, 128, 254, 255] {
            for d in [0u8, 77, 255] {
                let src = [r as u8, g, 255 - g, 255];
                let dst = [d, 255 - d, d / 2, d];
                assert_eq!(blend_general(dst, src), blend_pixel(dst, src));
            }
        }
    }
}

#[test]
fn pixel_partial_alpha_mixes_rgb_and_keeps_max_alpha() {
    // a = 51/255 = 0.2; 255*0.2 + 0*0.8 = 51
    assert_eq!(
        blend_pixel([0, 0, 0, 200], [255, 255, 255, 51]),
        [51, 51, 51, 200]
    );
    // alpha grows when the source is more opaque than the destination
    assert_eq!(blend_pixel([100, 100, 100, 0], [100, 100, 100, 128])[3], 128);
}

#[test]
fn pixel_partial_alpha_rounds_to_nearest() {
    // a = 85/255 = 1/3: r = 3 * 2/3 = 2, g = 1/3 + 4/3 -> 2, b = 3 * 1/3 = 1
    let out = blend_pixel([3, 2, 0, 0], [0, 1, 3, 85]);
    assert_eq!(out, [2, 2, 1, 85]);
}

#[test]
fn transparent_patch_leaves_buffer_identical() {
    let size = canvas(4, 4);
    let mut dst = (0..size.rgba_len()).map(|i| (i * 7) as u8).collect::<Vec<_>>();
    let before = dst.clone();
    let src = [123u8, 45, 67, 0].repeat(9);
    blend_patch(&mut dst, size, &src, PatchRect::new(1, 1, 3, 3)).unwrap();
    assert_eq!(dst, before);
}

#[test]
fn opaque_patch_lands_at_offset_only() {
    let size = canvas(4, 4);
    let mut dst = vec![0u8; size.rgba_len()];
    let src = [255u8, 0, 0, 255].repeat(4);
    blend_patch(&mut dst, size, &src, PatchRect::new(1, 1, 2, 2)).unwrap();

    for y in 0..4usize {
        for x in 0..4usize {
            let idx = (y * 4 + x) * 4;
            let inside = (1..3).contains(&x) && (1..3).contains(&y);
            let want = if inside { [255, 0, 0, 255] } else { [0, 0, 0, 0] };
            assert_eq!(&dst[idx..idx + 4], &want, "pixel ({x},{y})");
        }
    }
}

#[test]
fn patch_rows_map_to_canvas_rows() {
    let size = canvas(3, 3);
    let mut dst = vec![0u8; size.rgba_len()];
    // 2x2 patch with distinct pixels placed at the bottom-right corner.
    let src = [
        1, 0, 0, 255, 2, 0, 0, 255, //
        3, 0, 0, 255, 4, 0, 0, 255,
    ];
    blend_patch(&mut dst, size, &src, PatchRect::new(1, 1, 2, 2)).unwrap();
    let red = |x: usize, y: usize| dst[(y * 3 + x) * 4];
    assert_eq!([red(1, 1), red(2, 1), red(1, 2), red(2, 2)], [1, 2, 3, 4]);
    assert_eq!(red(0, 0), 0);
}

#[test]
fn out_of_bounds_placement_fails_without_writing() {
    let size = canvas(4, 4);
    let mut dst = vec![9u8; size.rgba_len()];
    let src = [1u8, 2, 3, 255].repeat(4);
    let err = blend_patch(&mut dst, size, &src, PatchRect::new(3, 0, 2, 2)).unwrap_err();
    match err {
        GifbeatError::BoundsViolation { frame, x, y } => {
            assert_eq!(frame, None);
            assert_eq!(x, 3..5);
            assert_eq!(y, 0..2);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(dst.iter().all(|&b| b == 9));
}

#[test]
fn mismatched_buffer_lengths_are_rejected() {
    let size = canvas(2, 2);
    let mut short = vec![0u8; 15];
    let src = [0u8; 4];
    assert!(blend_patch(&mut short, size, &src, PatchRect::new(0, 0, 1, 1)).is_err());

    let mut dst = vec![0u8; size.rgba_len()];
    assert!(blend_patch(&mut dst, size, &[0u8; 8], PatchRect::new(0, 0, 1, 1)).is_err());
}
