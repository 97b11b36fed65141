// tests/file_round_trip.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use arrow::array::{Float32Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use giga_data::{
    load_file, save_arrays, save_data, save_dict, Data, LoadOptions, SaveOptions, StripSort,
};
use ndarray::array;
use parquet::arrow::ArrowWriter;

#[test]
fn save_data_then_load_each_pair() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sweeps.csv");

    let long = Data::from_rows(&[[0.0, 1.0], [0.5, 1.5], [1.0, 2.5]]);
    let short = Data::from_rows(&[[0.0, -1.0], [1.0, -2.0]]);
    save_data(&path, &[long.clone(), short.clone()], &["up", "down"], &SaveOptions::default()).unwrap();

    let up = load_file(&path, &LoadOptions::columns("up_X", "up_Y")).unwrap();
    assert_eq!(up, long);

    // the short column is NaN padded; stripping recovers the saved rows
    let down = load_file(
        &path,
        &LoadOptions {
            strip_sort: StripSort::Strip,
            ..LoadOptions::columns("down_X", "down_Y")
        },
    )
    .unwrap();
    assert_eq!(down, short);
}

#[test]
fn save_dict_uses_map_order_and_slash() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dict.csv");

    let mut map = BTreeMap::new();
    map.insert("2.00K".to_string(), Data::from_rows(&[[0.0, 2.0]]));
    map.insert("1.75K".to_string(), Data::from_rows(&[[0.0, 1.0]]));
    save_dict(&path, map.iter(), &SaveOptions::for_dict()).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        text.lines().next().unwrap(),
        "1.75K/X,1.75K/Y,2.00K/X,2.00K/Y"
    );
}

#[test]
fn save_arrays_then_load_with_even_resample() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("arrays.csv");
    let b = array![4.0, 0.0, 3.0, 1.0, 2.0];
    let r = array![16.0, 0.0, 9.0, 1.0, 4.0];
    save_arrays(&path, &[b.view(), r.view()], &["B", "R"], &SaveOptions::default()).unwrap();

    let options = LoadOptions {
        strip_sort: StripSort::Both,
        interp_full: Some(2.0),
        ..LoadOptions::default()
    };
    let data = load_file(&path, &options).unwrap();
    assert_eq!(data.x(), array![0.0, 2.0, 4.0]);
    assert_eq!(data.y(), array![0.0, 4.0, 16.0]);
}

#[test]
fn parquet_columns_are_widened() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sweep.parquet");

    let schema = Arc::new(Schema::new(vec![
        Field::new("temperature", DataType::Int64, false),
        Field::new("field", DataType::Float32, true),
        Field::new("resistance", DataType::Int64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(vec![2, 2, 2])),
            Arc::new(Float32Array::from(vec![Some(0.5), None, Some(1.5)])),
            Arc::new(Int64Array::from(vec![10, 11, 12])),
        ],
    )
    .unwrap();
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let data = load_file(&path, &LoadOptions::columns("field", "resistance")).unwrap();
    assert_eq!(data.len(), 3);
    assert_eq!(data.x()[0], 0.5);
    assert!(data.x()[1].is_nan());
    assert_eq!(data.y(), array![10.0, 11.0, 12.0]);

    let err = load_file(&path, &LoadOptions::columns("field", "current")).unwrap_err();
    assert!(format!("{err:#}").contains("missing 'current' column"));
}
