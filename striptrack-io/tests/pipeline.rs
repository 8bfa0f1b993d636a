use striptrack_algorithms::{reconstruct_events, ReconstructionConfig};
use striptrack_core::{GeometryTable, HitRecord, PlaneId};
use striptrack_io::{
    read_event_tracks, read_hit_records, Error, HitRecordFile, HitRecordWriter, SetupConfig,
    TrackFileWriter,
};
use tempfile::TempDir;

fn straight_event(x3_strip: usize, calorimeter: Vec<bool>) -> HitRecord {
    let mut hits = HitRecord::with_calorimeter_hits(calorimeter);
    for plane in [PlaneId::Y1, PlaneId::X1, PlaneId::Y2, PlaneId::X2, PlaneId::Y3, PlaneId::X3] {
        let mut mask = vec![false; 300];
        mask[if plane == PlaneId::X3 { x3_strip } else { 149 }] = true;
        hits.add_plane_hits(plane, &mask);
    }
    hits
}

#[test]
fn test_round_trip_edge_records() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hits.bin");

    let mut only_empty_plane = HitRecord::new();
    only_empty_plane.add_plane_hits(PlaneId::V, &[]);
    let records = vec![
        HitRecord::new(),
        only_empty_plane,
        straight_event(149, vec![true, false]),
    ];

    let mut writer = HitRecordWriter::create(&path).unwrap();
    writer.write_records(&records).unwrap();
    writer.finish().unwrap();

    let geometry = GeometryTable::default();
    assert_eq!(read_hit_records(&path, &geometry).unwrap(), records);
}

#[test]
fn test_geometry_checked_on_read() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hits.bin");

    let mut writer = HitRecordWriter::create(&path).unwrap();
    writer.write_record(&straight_event(250, Vec::new())).unwrap();
    writer.finish().unwrap();

    // Strip 250 is fine on the reference sensor, out of range on a narrower one.
    let setup = SetupConfig::from_json(
        r#"{ "geometry": { "planes": [
            { "plane": "X3", "strips": 200, "half_width": 20000.0 }
        ] } }"#,
    )
    .unwrap();
    let file = HitRecordFile::open(&path).unwrap();
    assert!(file.read_records(&GeometryTable::default()).is_ok());
    let err = file.read_records(&setup.geometry).unwrap_err();
    assert!(matches!(err, Error::MalformedRecord { record: 0, .. }), "{err}");
}

#[test]
fn test_unfinished_writer_declares_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hits.bin");
    {
        let mut writer = HitRecordWriter::create(&path).unwrap();
        writer.write_record(&HitRecord::new()).unwrap();
    }
    // Header still says zero records, so the record body is trailing data.
    assert!(matches!(
        read_hit_records(&path, &GeometryTable::default()),
        Err(Error::TrailingBytes(16))
    ));
}

#[test]
fn test_file_to_tracks_pipeline() {
    let dir = TempDir::new().unwrap();
    let hits_path = dir.path().join("hits.bin");
    let tracks_path = dir.path().join("tracks.bin");
    let csv_path = dir.path().join("tracks.csv");

    let events: Vec<HitRecord> = (0..20)
        .map(|i| straight_event(if i % 5 == 0 { 200 } else { 150 }, vec![true; i % 7 + 1]))
        .collect();
    let mut writer = HitRecordWriter::create(&hits_path).unwrap();
    writer.write_records(&events).unwrap();
    assert_eq!(writer.finish().unwrap(), 20);

    let setup = SetupConfig::default();
    let loaded = read_hit_records(&hits_path, &setup.geometry).unwrap();
    let run = reconstruct_events(&setup.geometry, &setup.reconstruction, &loaded);
    assert_eq!(run.statistics().full_tracks, 16);
    assert_eq!(run.statistics().rejected_full_tracks, 4);

    let mut out = TrackFileWriter::create(&tracks_path).unwrap();
    out.write_tracks_binary(run.tracks()).unwrap();
    assert_eq!(read_event_tracks(&tracks_path).unwrap(), run.tracks());

    let mut csv = TrackFileWriter::create(&csv_path).unwrap();
    csv.write_tracks_csv(run.tracks()).unwrap();
    let content = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(content.lines().count(), 21);
}

#[test]
fn test_reconstruction_config_from_setup() {
    let setup = SetupConfig::from_json(r#"{ "reconstruction": { "gate_sigma_factor": 11.0 } }"#)
        .unwrap();
    let events = vec![straight_event(200, Vec::new())];
    let run = reconstruct_events(&setup.geometry, &setup.reconstruction, &events);
    assert!(run.tracks()[0].full_ok);

    let strict = reconstruct_events(&setup.geometry, &ReconstructionConfig::default(), &events);
    assert!(!strict.tracks()[0].full_ok);
}
