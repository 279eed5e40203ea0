use approx::assert_relative_eq;
use prost::Message;

use labels2yolo::config::{parse_class_ids, validate_split, ClassIds};
use labels2yolo::conversion::{denormalize, normalize, normalize_polygon, record_to_yolo};
use labels2yolo::dataset::{split_annotations, train_count};
use labels2yolo::filter_dataset::filter_labels;
use labels2yolo::formats::{dota, neon, yolo};
use labels2yolo::onnx_export::{
    attach_metadata, read_metadata, split_command, DetectorMetadata, ExportPaths, ExternalTool,
    StringStringEntry,
};
use labels2yolo::registry::FilteredLine;
use labels2yolo::{
    AnnotationFormat, CenterBox, ClassFilter, ClassRegistry, Corners, Dota, ImageSize, LabelError,
    Neon, ProcessingStats, ReadOutcome, Yolo,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

fn expect_record(outcome: ReadOutcome) -> (labels2yolo::AnnotationRecord, usize) {
    match outcome {
        ReadOutcome::Record { record, malformed } => (record, malformed.len()),
        ReadOutcome::Skipped { reason } => panic!("record skipped: {}", reason),
    }
}

#[test]
fn test_normalize_round_trip() {
    let boxes = [
        Corners::new(10.0, 10.0, 50.0, 50.0),
        Corners::new(0.0, 0.0, 640.0, 480.0),
        Corners::new(3.5, 7.25, 3.5, 100.0),
        Corners::new(120.0, 33.0, 611.0, 479.0),
    ];
    for corners in &boxes {
        let center = normalize(corners, 640.0, 480.0).unwrap();
        assert!(center.w >= 0.0 && center.h >= 0.0);
        let back = denormalize(&center, 640.0, 480.0);
        assert_relative_eq!(back.xmin, corners.xmin, epsilon = 1e-9);
        assert_relative_eq!(back.ymin, corners.ymin, epsilon = 1e-9);
        assert_relative_eq!(back.xmax, corners.xmax, epsilon = 1e-9);
        assert_relative_eq!(back.ymax, corners.ymax, epsilon = 1e-9);
    }
}

#[test]
fn test_normalize_rejects_zero_dimensions() {
    let corners = Corners::new(0.0, 0.0, 1.0, 1.0);
    assert!(matches!(
        normalize(&corners, 0.0, 10.0),
        Err(LabelError::InvalidImageSize { .. })
    ));
    assert!(normalize(&corners, 10.0, 0.0).is_err());
}

#[test]
fn test_normalize_does_not_clamp() {
    let center = normalize(&Corners::new(-20.0, 0.0, 220.0, 50.0), 100.0, 100.0).unwrap();
    assert_relative_eq!(center.cx, 1.0, epsilon = 1e-12);
    assert_relative_eq!(center.w, 2.4, epsilon = 1e-12);
}

#[test]
fn test_denormalize_formula() {
    let corners = denormalize(&CenterBox::new(0.5, 0.25, 0.2, 0.1), 200.0, 100.0);
    let expected = Corners::new(
        (0.5 - 0.2 / 2.0) * 200.0,
        (0.25 - 0.1 / 2.0) * 100.0,
        (0.5 + 0.2 / 2.0) * 200.0,
        (0.25 + 0.1 / 2.0) * 100.0,
    );
    assert_eq!(corners, expected);
}

#[test]
fn test_normalize_polygon_uses_enclosing_box() {
    // Rotated square, vertices not in corner order
    let points = [(30.0, 10.0), (50.0, 30.0), (30.0, 50.0), (10.0, 30.0)];
    let center = normalize_polygon(&points, 100.0, 100.0).unwrap();
    assert_relative_eq!(center.cx, 0.3, epsilon = 1e-12);
    assert_relative_eq!(center.cy, 0.3, epsilon = 1e-12);
    assert_relative_eq!(center.w, 0.4, epsilon = 1e-12);
    assert_relative_eq!(center.h, 0.4, epsilon = 1e-12);
}

#[test]
fn test_dota_line_to_yolo() {
    let mut classes = ClassRegistry::new();
    let outcome = Dota::read_record(
        "P0001",
        "10 10 50 10 50 50 10 50 plane 0\n",
        Some(ImageSize::new(100, 100)),
        &mut classes,
    )
    .unwrap();
    let (record, malformed) = expect_record(outcome);

    assert_eq!(malformed, 0);
    assert_eq!(classes.get("plane"), Some(0));
    assert_eq!(record.boxes[0].difficult, Some(false));

    let labels = record_to_yolo(&record).unwrap();
    assert_eq!(labels[0].class_id, 0);
    assert_relative_eq!(labels[0].bbox.cx, 0.3, epsilon = 1e-12);
    assert_relative_eq!(labels[0].bbox.cy, 0.3, epsilon = 1e-12);
    assert_relative_eq!(labels[0].bbox.w, 0.4, epsilon = 1e-12);
    assert_relative_eq!(labels[0].bbox.h, 0.4, epsilon = 1e-12);

    assert_eq!(
        Yolo::write_record(&record, &classes).unwrap(),
        "0 0.300000 0.300000 0.400000 0.400000"
    );
}

#[test]
fn test_dota_malformed_lines() {
    let content = "imagesource:GoogleEarth\ngsd:0.146\n\
                   10 10 50 10 50 50 10 50 plane 1\n\
                   10 10 50 10 50 50 10 plane 0\n\
                   10 x 50 10 50 50 10 50 ship 0\n";
    let mut classes = ClassRegistry::new();
    let (record, malformed) = expect_record(
        Dota::read_record("P0002", content, Some(ImageSize::new(100, 100)), &mut classes).unwrap(),
    );
    assert_eq!(record.boxes.len(), 1);
    assert_eq!(record.boxes[0].difficult, Some(true));
    assert_eq!(malformed, 4);
    assert_eq!(classes.len(), 1);
}

#[test]
fn test_dota_requires_image_size() {
    let mut classes = ClassRegistry::new();
    assert!(matches!(
        Dota::read_record("P0003", "", None, &mut classes),
        Err(LabelError::MissingImageSize("DOTA"))
    ));
}

#[test]
fn test_dota_parse_line_lowercases_category() {
    let object = dota::parse_line("1 2 3 4 5 6 7 8 Small-Vehicle 0").unwrap();
    assert_eq!(object.category, "small-vehicle");
    assert_eq!(object.polygon[3], (7.0, 8.0));
    assert!(!object.difficult);
}

#[test]
fn test_dota_write_axis_aligned_polygon() {
    let mut classes = ClassRegistry::new();
    classes.resolve("plane");
    let mut record = labels2yolo::AnnotationRecord::new("P0004", ImageSize::new(100, 100));
    record.push(Corners::new(10.0, 20.0, 30.0, 40.0), 0, Some(true));
    assert_eq!(
        Dota::write_record(&record, &classes).unwrap(),
        "10 20 30 20 30 40 10 40 plane 1"
    );
}

#[test]
fn test_registry_first_seen_order() {
    let mut classes = ClassRegistry::new();
    let names = ["ship", "plane", "Ship", "harbor", "plane", "PLANE"];
    let ids: Vec<usize> = names
        .iter()
        .map(|name| classes.resolve(name).unwrap())
        .collect();
    assert_eq!(ids, vec![0, 1, 0, 2, 1, 1]);

    let mapping: Vec<(&str, usize)> = classes.mapping().collect();
    assert_eq!(mapping, vec![("ship", 0), ("plane", 1), ("harbor", 2)]);
    assert_eq!(classes.name_of(2), Some("harbor"));
    assert_eq!(classes.to_string(), "{'ship': 0, 'plane': 1, 'harbor': 2}");
}

#[test]
fn test_registry_allow_list() {
    let mut classes = ClassRegistry::with_allow_list(["Plane", " small-vehicle ", ""]);
    assert_eq!(classes.resolve("ship"), None);
    assert_eq!(classes.resolve("small-vehicle"), Some(0));
    assert_eq!(classes.resolve("PLANE"), Some(1));
    assert_eq!(classes.len(), 2);
}

#[test]
fn test_allow_list_excluding_everything_yields_empty_record() {
    let mut classes = ClassRegistry::with_allow_list(["harbor"]);
    let content = "10 10 50 10 50 50 10 50 plane 0\n1 1 2 1 2 2 1 2 ship 0";
    let (record, _) = expect_record(
        Dota::read_record("P0005", content, Some(ImageSize::new(64, 64)), &mut classes).unwrap(),
    );
    assert!(record.boxes.is_empty());
    assert!(classes.is_empty());
    assert_eq!(Yolo::write_record(&record, &classes).unwrap(), "");
}

#[test]
fn test_class_filter_remaps_to_zero() {
    let filter = ClassFilter::new([2, 5]);
    assert_eq!(filter.filter_line("0 0.1 0.1 0.2 0.2"), FilteredLine::Dropped);
    assert_eq!(
        filter.filter_line("2 0.5 0.5 0.1 0.1"),
        FilteredLine::Kept("0 0.5 0.5 0.1 0.1".to_string())
    );
    assert_eq!(filter.filter_line("x 0.5 0.5 0.1 0.1"), FilteredLine::Malformed);
    assert_eq!(filter.filter_line("2 0.5 0.5"), FilteredLine::Malformed);
    assert_eq!(filter.filter_line("2 0.1 0.1 0.2 0.2 0.9"), FilteredLine::Malformed);

    let mut stats = ProcessingStats::new();
    let content = "0 0.1 0.1 0.2 0.2\n2 0.5 0.5 0.1 0.1\n\n5 0.3 0.3 0.2 0.2\n";
    assert_eq!(
        filter_labels("a.txt", content, &filter, &mut stats),
        "0 0.5 0.5 0.1 0.1\n0 0.3 0.3 0.2 0.2"
    );
    assert_eq!(stats.malformed_lines, 0);

    let mut stats = ProcessingStats::new();
    let content = "2 0.5 0.5\n2 0.1 0.1 0.2 0.2 0.9\n5 0.3 0.3 0.2 0.2\n";
    let filtered = filter_labels("b.txt", content, &filter, &mut stats);
    assert_eq!(filtered, "0 0.3 0.3 0.2 0.2");
    assert_eq!(stats.malformed_lines, 2);
    let (labels, malformed) = yolo::parse_labels(&filtered);
    assert_eq!(labels.len(), 1);
    assert!(malformed.is_empty());
}

#[test]
fn test_split_sizes_and_union() {
    let items: Vec<usize> = (0..10).collect();
    let split = split_annotations(items.clone(), 0.9, None);
    assert_eq!(split.train.len(), 9);
    assert_eq!(split.valid.len(), 1);

    let mut union: Vec<usize> = split.train.iter().chain(split.valid.iter()).copied().collect();
    union.sort();
    assert_eq!(union, items);
}

#[test]
fn test_split_with_seed_is_reproducible() {
    let items: Vec<usize> = (0..25).collect();
    let first = split_annotations(items.clone(), 0.8, Some(42));
    let second = split_annotations(items, 0.8, Some(42));
    assert_eq!(first.train, second.train);
    assert_eq!(first.valid, second.valid);
    assert_eq!(first.train.len(), 20);
}

#[test]
fn test_train_count_floors() {
    assert_eq!(train_count(10, 0.9), 9);
    assert_eq!(train_count(7, 0.5), 3);
    assert_eq!(train_count(0, 0.9), 0);
    assert_eq!(train_count(3, 0.99), 2);
}

#[test]
fn test_yolo_parse_labels_reports_malformed() {
    let (labels, malformed) = yolo::parse_labels("0 0.5 0.5 0.2 0.2\n1 0.5 0.5 0.2\n\n2 a b c d\n");
    assert_eq!(labels.len(), 1);
    assert_eq!(malformed.len(), 2);
    assert_eq!(malformed[0].line_number, 2);
    assert_eq!(malformed[1].content, "2 a b c d");
}

#[test]
fn test_yolo_read_record_denormalizes() {
    let mut classes = ClassRegistry::new();
    let (record, malformed) = expect_record(
        Yolo::read_record(
            "img",
            "3 0.5 0.5 0.5 0.5",
            Some(ImageSize::new(40, 20)),
            &mut classes,
        )
        .unwrap(),
    );
    assert_eq!(malformed, 0);
    assert_eq!(record.boxes[0].class_id, 3);
    assert_eq!(record.boxes[0].bbox, Corners::new(10.0, 5.0, 30.0, 15.0));
}

const NEON_XML: &str = r#"<annotation>
    <folder>evaluation</folder>
    <filename>SJER_062.tif</filename>
    <source><database>NEON</database></source>
    <size>
        <width>400</width>
        <height>200</height>
        <depth>3</depth>
    </size>
    <segmented>0</segmented>
    <object>
        <name>Tree</name>
        <pose>Unspecified</pose>
        <truncated>0</truncated>
        <difficult>0</difficult>
        <bndbox>
            <xmin>40</xmin>
            <ymin>20</ymin>
            <xmax>120</xmax>
            <ymax>60</ymax>
        </bndbox>
    </object>
    <object>
        <name>Tree</name>
        <bndbox>
            <xmin>200</xmin>
            <ymin>100</ymin>
            <xmax>240.5</xmax>
            <ymax>150</ymax>
        </bndbox>
    </object>
</annotation>"#;

#[test]
fn test_neon_parse_document() {
    let document = neon::parse_document(NEON_XML).unwrap();
    assert_eq!(document.folder.as_deref(), Some("evaluation"));
    assert_eq!(document.filename, "SJER_062.tif");
    assert_eq!(document.objects.len(), 2);
    assert!(!document.is_oversized());

    let record = document.to_record().unwrap();
    assert_eq!(record.size, ImageSize::new(400, 200));
    assert_eq!(record.boxes[0].bbox, Corners::new(40.0, 20.0, 120.0, 60.0));
    assert_eq!(record.boxes[1].bbox.xmax, 240.5);
    assert!(record.boxes.iter().all(|b| b.class_id == 0));
    assert_eq!(record.boxes[0].difficult, Some(false));

    assert_eq!(
        Yolo::write_record(&record, &ClassRegistry::new()).unwrap(),
        "0 0.200000 0.200000 0.200000 0.200000\n0 0.550625 0.625000 0.101250 0.250000"
    );
}

#[test]
fn test_neon_oversized_record_is_skipped() {
    let xml = NEON_XML.replace("<width>400</width>", "<width>3000</width>");
    let mut classes = ClassRegistry::new();
    match Neon::read_record("ignored", &xml, None, &mut classes).unwrap() {
        ReadOutcome::Skipped { reason } => assert!(reason.contains("SJER_062.tif")),
        ReadOutcome::Record { .. } => panic!("oversized record was not skipped"),
    }
}

#[test]
fn test_neon_width_at_threshold_is_kept() {
    let xml = NEON_XML.replace("<width>400</width>", "<width>2500</width>");
    let mut classes = ClassRegistry::new();
    let (record, _) = expect_record(Neon::read_record("ignored", &xml, None, &mut classes).unwrap());
    assert_eq!(record.size.width, 2500);
}

#[test]
fn test_neon_write_and_read_back() {
    let mut classes = ClassRegistry::new();
    classes.resolve("tree");
    let mut record = labels2yolo::AnnotationRecord::new("tile.png", ImageSize::new(100, 80));
    record.push(Corners::new(1.0, 2.0, 30.0, 40.0), 0, None);

    let xml = Neon::write_record(&record, &classes).unwrap();
    assert!(xml.contains("<name>tree</name>"));

    let document = neon::parse_document(&xml).unwrap();
    assert_eq!(document.to_record().unwrap(), record);
}

#[test]
fn test_neon_invalid_size() {
    let xml = NEON_XML.replace("<height>200</height>", "<height>0</height>");
    let mut classes = ClassRegistry::new();
    assert!(matches!(
        Neon::read_record("ignored", &xml, None, &mut classes),
        Err(LabelError::InvalidImageSize { .. })
    ));
}

#[test]
fn test_validate_split() {
    assert!(validate_split("0.9").is_ok());
    assert!(validate_split("0.5").is_ok());
    assert!(validate_split("0.0").is_err());
    assert!(validate_split("1.0").is_err());
    assert!(validate_split("abc").is_err());
}

#[test]
fn test_parse_class_ids() {
    assert_eq!(parse_class_ids("3,4").unwrap(), ClassIds(vec![3, 4]));
    assert_eq!(parse_class_ids("3, 4,,").unwrap(), ClassIds(vec![3, 4]));
    assert!(parse_class_ids("3,car").is_err());
}

#[derive(Clone, PartialEq, Message)]
struct FakeModel {
    #[prost(int64, tag = "1")]
    ir_version: i64,
    #[prost(string, tag = "2")]
    producer_name: String,
    #[prost(bytes = "vec", tag = "7")]
    graph: Vec<u8>,
    #[prost(message, repeated, tag = "14")]
    metadata_props: Vec<StringStringEntry>,
}

fn entry(key: &str, value: &str) -> StringStringEntry {
    StringStringEntry {
        key: key.to_string(),
        value: value.to_string(),
    }
}

#[test]
fn test_attach_metadata_replaces_duplicate_keys() {
    let model = FakeModel {
        ir_version: 8,
        producer_name: "pytorch".to_string(),
        graph: vec![1, 2, 3, 250],
        metadata_props: vec![entry("det_conf", "0.9"), entry("author", "someone")],
    };
    let properties = vec![
        ("det_conf".to_string(), "0.3".to_string()),
        ("model_type".to_string(), "\"Detector\"".to_string()),
    ];

    let updated = attach_metadata(&model.encode_to_vec(), &properties).unwrap();
    let decoded = FakeModel::decode(updated.as_slice()).unwrap();

    assert_eq!(decoded.ir_version, 8);
    assert_eq!(decoded.producer_name, "pytorch");
    assert_eq!(decoded.graph, vec![1, 2, 3, 250]);
    assert_eq!(
        decoded.metadata_props,
        vec![
            entry("author", "someone"),
            entry("det_conf", "0.3"),
            entry("model_type", "\"Detector\""),
        ]
    );
    assert_eq!(read_metadata(&updated).unwrap().len(), 3);
}

#[test]
fn test_attach_metadata_rejects_truncated_model() {
    let mut bytes = FakeModel {
        ir_version: 8,
        producer_name: "pytorch".to_string(),
        graph: vec![9; 16],
        metadata_props: vec![],
    }
    .encode_to_vec();
    bytes.truncate(bytes.len() - 4);
    assert!(attach_metadata(&bytes, &[]).is_err());
}

#[test]
fn test_detector_metadata_properties() {
    let properties = DetectorMetadata::default().to_properties().unwrap();
    assert_eq!(
        properties,
        vec![
            ("model_type".to_string(), "\"Detector\"".to_string()),
            ("det_iou_thresh".to_string(), "0.3".to_string()),
            ("det_type".to_string(), "\"YOLO_v8\"".to_string()),
            ("resolution".to_string(), "10".to_string()),
            ("class_names".to_string(), "{\"0\": \"tree\"}".to_string()),
            ("det_conf".to_string(), "0.3".to_string()),
            ("tiles_overlap".to_string(), "5".to_string()),
        ]
    );
}

#[test]
fn test_detector_metadata_class_names_spacing() {
    let metadata = DetectorMetadata {
        class_names: BTreeMap::from([
            ("0".to_string(), "tree".to_string()),
            ("1".to_string(), "snag".to_string()),
        ]),
        ..DetectorMetadata::default()
    };
    let properties = metadata.to_properties().unwrap();
    let class_names = properties
        .iter()
        .find(|(key, _)| key == "class_names")
        .map(|(_, value)| value.as_str());
    assert_eq!(class_names, Some("{\"0\": \"tree\", \"1\": \"snag\"}"));
}

#[test]
fn test_split_command_keeps_quoted_arguments() {
    assert_eq!(
        split_command("python -c \"import sys; print(1)\" {input}"),
        vec!["python", "-c", "import sys; print(1)", "{input}"]
    );
    assert!(split_command("   ").is_empty());
}

#[test]
fn test_external_tool_substitutes_paths() {
    let tool = ExternalTool::new("simplifier", "onnxsim {input} {output}");
    assert_eq!(
        tool.command_line(Path::new("m.onnx"), Path::new("m.onnx")),
        vec!["onnxsim", "m.onnx", "m.onnx"]
    );
}

#[test]
fn test_export_paths() {
    let paths = ExportPaths::for_weights(Path::new("runs/best.pt"));
    assert_eq!(paths.model, PathBuf::from("runs/best.onnx"));
    assert_eq!(paths.optimized, PathBuf::from("runs/best.optim.onnx"));
    assert_eq!(paths.quantized, PathBuf::from("runs/best.quant.onnx"));
}
