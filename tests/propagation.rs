mod common;

use common::synthetic_image::{block_image, block_mask};
use cutout::segmentation::create_propagator;
use cutout::{ColorGrid, FramePropagator, Rect, RegionHint, SegmentationConfig, Segmenter};

fn moving_block(frame: u32) -> Rect {
    Rect::new(2 + frame, 3, 7 + frame, 8)
}

#[test]
fn mask_follows_moving_block() {
    let first = ColorGrid::from_rgb(&block_image(16, 12, moving_block(0), 8, 10));
    let (refinement, mut segmenter) = create_propagator(
        &first,
        &RegionHint::Rect(Rect::new(1, 2, 9, 10)),
        SegmentationConfig::default(),
    )
    .unwrap();
    assert_eq!(refinement.mask, block_mask(16, 12, moving_block(0)));

    for frame in 1..5 {
        let image = block_image(16, 12, moving_block(frame), 8, 10 + frame as u64);
        let mask = segmenter.segment(&image).unwrap();
        assert_eq!(mask, block_mask(16, 12, moving_block(frame)), "frame {frame}");
    }
}

#[test]
fn zero_temporal_weight_matches_two_dimensional_path() {
    let first = ColorGrid::from_rgb(&block_image(12, 10, moving_block(0), 25, 20));
    let hint = RegionHint::Rect(Rect::new(1, 2, 9, 9));
    let refinement = cutout::refine(&first, &hint, &SegmentationConfig::default()).unwrap();

    let with_term = SegmentationConfig {
        is_3d: true,
        energy_term_3d: 0.0,
        ..SegmentationConfig::default()
    };
    let without_term = SegmentationConfig {
        is_3d: false,
        ..SegmentationConfig::default()
    };
    let mut three_d = FramePropagator::from_refinement(&refinement, with_term).unwrap();
    let mut two_d = FramePropagator::from_refinement(&refinement, without_term).unwrap();

    for frame in 1..4 {
        let image = block_image(12, 10, moving_block(frame), 25, 30 + frame as u64);
        assert_eq!(
            three_d.segment(&image).unwrap(),
            two_d.segment(&image).unwrap(),
            "frame {frame}"
        );
    }
}

#[test]
fn strong_temporal_term_resists_change() {
    let first = ColorGrid::from_rgb(&block_image(12, 10, moving_block(0), 0, 0));
    let refinement = cutout::refine(
        &first,
        &RegionHint::Rect(Rect::new(1, 2, 9, 9)),
        &SegmentationConfig::default(),
    )
    .unwrap();

    let config = SegmentationConfig {
        energy_term_3d: 1e7,
        ..SegmentationConfig::default()
    };
    let mut propagator = FramePropagator::from_refinement(&refinement, config).unwrap();

    let moved = block_image(12, 10, moving_block(2), 0, 0);
    assert_eq!(propagator.segment(&moved).unwrap(), refinement.mask);

    // After a reset the frame is cut on appearance alone.
    propagator.reset_state();
    assert_eq!(
        propagator.segment(&moved).unwrap(),
        block_mask(12, 10, moving_block(2))
    );
}

#[test]
fn frame_of_another_size_is_rejected() {
    let first = ColorGrid::from_rgb(&block_image(12, 10, moving_block(0), 0, 0));
    let (_, mut segmenter) = create_propagator(
        &first,
        &RegionHint::Rect(Rect::new(1, 2, 9, 9)),
        SegmentationConfig::default(),
    )
    .unwrap();
    let other = block_image(10, 10, moving_block(0), 0, 0);
    assert!(segmenter.segment(&other).is_err());
}
