use landclass::io::ground_truth::{GroundPoint, PointSet};
use landclass::{
    random_split, Crs, FeatureImage, GeoTransform, NamedBand, RasterGrid, SampleExtractor,
};
use ndarray::Array2;

fn image() -> FeatureImage {
    let grid = RasterGrid::new(
        12,
        12,
        GeoTransform::new(0.0, 12.0, 1.0, -1.0),
        Crs::Geographic,
    );
    let bands = vec![
        NamedBand::new("NDVI", Array2::from_shape_fn((12, 12), |(r, c)| {
            0.1 + 0.01 * (r * 12 + c) as f32
        })),
        NamedBand::new("VH_a", Array2::from_elem((12, 12), -15.0f32)),
    ];
    FeatureImage::assemble(grid, vec![bands]).unwrap()
}

fn scattered_points(n: usize) -> PointSet {
    PointSet::new(
        "LC_code",
        (0..n)
            .map(|i| GroundPoint {
                lon: (i % 12) as f64 + 0.5,
                lat: (i / 12 % 12) as f64 + 0.5,
                label: (i % 4 + 1) as u32,
            })
            .collect(),
    )
}

#[test]
fn test_partition_is_exhaustive_and_disjoint_across_fractions() {
    let points = scattered_points(144);

    for fraction in [0.0, 0.1, 0.3, 0.5, 0.75, 0.99] {
        let (train, val) = random_split(&points, fraction, Some(11)).unwrap();
        assert_eq!(
            train.len() + val.len(),
            points.len(),
            "partition must be exhaustive at fraction {}",
            fraction
        );
        for p in &val.points {
            assert!(
                !train.points.contains(p),
                "point duplicated across partitions at fraction {}",
                fraction
            );
        }
    }
}

#[test]
fn test_sampled_rows_carry_every_band_and_label() {
    let points = scattered_points(30);
    let table = SampleExtractor::new().sample_regions(&image(), &points).unwrap();

    assert_eq!(table.n_rows(), 30);
    assert_eq!(table.n_features(), 2);
    assert_eq!(table.feature_names(), &["NDVI".to_string(), "VH_a".to_string()]);

    // Labels preserved in point order
    assert_eq!(table.labels()[0], 1);
    assert_eq!(table.labels()[1], 2);
    assert_eq!(table.records()[[0, 1]], -15.0);
}

#[test]
fn test_points_outside_extent_are_dropped_not_fatal() {
    let mut points = scattered_points(10);
    points.points.push(GroundPoint {
        lon: 40.0,
        lat: 2.0,
        label: 1,
    });
    points.points.push(GroundPoint {
        lon: -1.0,
        lat: 2.0,
        label: 1,
    });

    let table = SampleExtractor::new().sample_regions(&image(), &points).unwrap();
    assert_eq!(table.n_rows(), 10);
}

#[test]
fn test_tile_scale_does_not_change_results() {
    use landclass::core::sample::SamplingParams;

    let points = scattered_points(50);
    let coarse = SampleExtractor::with_params(SamplingParams { tile_scale: 1 })
        .sample_regions(&image(), &points)
        .unwrap();
    let fine = SampleExtractor::with_params(SamplingParams { tile_scale: 64 })
        .sample_regions(&image(), &points)
        .unwrap();

    assert_eq!(coarse.n_rows(), fine.n_rows());
    assert_eq!(coarse.records(), fine.records());
    assert_eq!(coarse.labels(), fine.labels());
}
