use crate::viewfinder::common::error::ViewfinderError;
use crate::viewfinder::hdr::{RgbaImageData, ToneMapper, merge};

fn gradient(width: u32, height: u32, seed: u8) -> RgbaImageData {
    let data = (0..width * height)
        .flat_map(|i| {
            let v = (i as u8).wrapping_mul(7).wrapping_add(seed);
            [v, v.wrapping_add(50), v.wrapping_add(100), 200]
        })
        .collect();
    RgbaImageData::new(width, height, data).unwrap()
}

#[test]
fn test_merge_single_image_is_identity() {
    let image = gradient(5, 4, 3);
    let merged = merge(std::slice::from_ref(&image)).unwrap();

    assert_eq!((merged.width, merged.height), (5, 4));
    for (src, dst) in image.data.chunks_exact(4).zip(merged.data.chunks_exact(4)) {
        assert_eq!(&src[..3], &dst[..3]);
        assert_eq!(dst[3], 255);
    }
}

#[test]
fn test_merge_duplicates_is_idempotent() {
    let image = gradient(6, 3, 11);
    let once = merge(std::slice::from_ref(&image)).unwrap();
    let thrice = merge(&[image.clone(), image.clone(), image]).unwrap();
    assert_eq!(once, thrice);
}

#[test]
fn test_merge_rounds_to_nearest() {
    let a = RgbaImageData::filled(2, 2, [0, 10, 255, 0]);
    let b = RgbaImageData::filled(2, 2, [1, 11, 254, 0]);
    let c = RgbaImageData::filled(2, 2, [1, 13, 254, 0]);

    let merged = merge(&[a.clone(), b.clone()]).unwrap();
    // 0.5 rounds up, 10.5 rounds up, 254.5 rounds up
    assert_eq!(merged.pixel(0, 0), Some([1, 11, 255, 255]));

    let merged = merge(&[a, b, c]).unwrap();
    // 2/3 -> 1, 34/3 -> 11, 763/3 -> 254
    assert_eq!(merged.pixel(1, 1), Some([1, 11, 254, 255]));
}

#[test]
fn test_merge_skips_mismatched_dimensions() {
    let a = gradient(4, 4, 0);
    let b = gradient(4, 4, 90);
    let odd = gradient(3, 5, 40);

    let expected = merge(&[a.clone(), b.clone()]).unwrap();
    let with_odd = merge(&[a.clone(), odd.clone(), b.clone()]).unwrap();
    assert_eq!(expected, with_odd);

    let odd_last = merge(&[a, b, odd]).unwrap();
    assert_eq!(expected, odd_last);
}

#[test]
fn test_merge_empty_input() {
    assert!(matches!(merge(&[]), Err(ViewfinderError::EmptyMerge)));
}

#[test]
fn test_merge_rejects_malformed_first_image() {
    let broken = RgbaImageData {
        width: 4,
        height: 4,
        data: vec![0; 10],
    };
    let result = merge(&[broken, gradient(4, 4, 0)]);
    assert!(matches!(result, Err(ViewfinderError::InvalidDimensions(4, 4))));
}

#[test]
fn test_merge_large_image_matches_small_path() {
    // Above the parallel threshold
    let a = gradient(320, 240, 5);
    let b = gradient(320, 240, 77);
    let merged = merge(&[a.clone(), b.clone()]).unwrap();

    for offset in [0usize, 4 * 1000, 4 * (320 * 240 - 1)] {
        for channel in 0..3 {
            let sum = u32::from(a.data[offset + channel]) + u32::from(b.data[offset + channel]);
            assert_eq!(u32::from(merged.data[offset + channel]), (sum + 1) / 2);
        }
        assert_eq!(merged.data[offset + 3], 255);
    }
}

#[test]
fn test_tone_curve_shape() {
    let mapper = ToneMapper::new();
    assert_eq!(mapper.contrast(), 6.0);
    assert!(mapper.curve(0) < 16);
    assert!(mapper.curve(255) > 239);
    assert_eq!(mapper.curve(128), 128);
    let twice = mapper.curve(mapper.curve(128));
    assert!((i32::from(twice) - 128).abs() <= 3);

    for v in 0..255u8 {
        assert!(mapper.curve(v) <= mapper.curve(v + 1), "curve not monotonic at {v}");
    }
}

#[test]
fn test_tone_contrast_changes_curve() {
    let soft = ToneMapper::with_contrast(2.0);
    let hard = ToneMapper::with_contrast(12.0);
    assert!(soft.curve(0) > hard.curve(0));
    assert!(soft.curve(255) < hard.curve(255));
}

#[test]
fn test_tone_apply_leaves_alpha() {
    let mapper = ToneMapper::new();
    let mut image = RgbaImageData::filled(3, 2, [0, 128, 255, 77]);
    mapper.apply(&mut image);

    let expected = [mapper.curve(0), mapper.curve(128), mapper.curve(255), 77];
    for px in image.data.chunks_exact(4) {
        assert_eq!(px, &expected);
    }
}

#[test]
fn test_tone_apply_large_image() {
    let mapper = ToneMapper::new();
    let mut image = gradient(320, 240, 9);
    let original = image.clone();
    mapper.apply(&mut image);

    for (src, dst) in original.data.chunks_exact(4).zip(image.data.chunks_exact(4)) {
        assert_eq!(dst[0], mapper.curve(src[0]));
        assert_eq!(dst[2], mapper.curve(src[2]));
        assert_eq!(dst[3], src[3]);
    }
}

#[test]
fn test_image_validation() {
    assert!(RgbaImageData::new(2, 2, vec![0; 16]).is_ok());
    assert!(RgbaImageData::new(2, 2, vec![0; 15]).is_err());
    assert!(RgbaImageData::new(0, 2, Vec::new()).is_err());
    assert_eq!(RgbaImageData::filled(2, 1, [1, 2, 3, 4]).pixel(1, 0), Some([1, 2, 3, 4]));
    assert_eq!(RgbaImageData::filled(2, 1, [1, 2, 3, 4]).pixel(2, 0), None);
}
