use anyhow::Result;
use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

use pollution_near_me::constants::DATA_UNAVAILABLE;
use pollution_near_me::map::load_map;
use pollution_near_me::pipeline::processing::converters::{
    ConvertContext, SuperfundConverter, ViolationsConverter,
};
use pollution_near_me::pipeline::Pipeline;
use pollution_near_me::snapshot::{datasets, load_snapshots, DatasetSource, DirSource};

fn write(dir: &Path, name: &str, value: serde_json::Value) -> Result<()> {
    fs::write(dir.join(name), serde_json::to_string(&value)?)?;
    Ok(())
}

fn tri_items() -> serde_json::Value {
    json!([
        {"facility": "Acme Co", "chemical": "Lead", "release_lbs": 250_000_000, "year": 2023, "lat": 29.7, "lon": -95.3},
        {"facility": "Beta Inc", "chemical": "Toluene", "release_lbs": 50_000_000, "year": 2023, "lat": 41.6, "lon": -87.3},
        {"facility": "Gamma LLC", "chemical": "Benzene", "release_lbs": 900_000_000, "year": 2023}
    ])
}

#[tokio::test]
async fn one_failed_dataset_leaves_the_other_tiles() -> Result<()> {
    let dir = tempdir()?;
    write(dir.path(), "tri-2023.json", tri_items())?;
    write(dir.path(), "violations.json", json!({"count": 3, "penalty": 50000}))?;
    // superfund.json is missing

    let source: Arc<dyn DatasetSource> = Arc::new(DirSource::new(dir.path()));
    let tiles = load_snapshots(source, &datasets()).await;

    let texts: Vec<(&str, &str)> = tiles
        .iter()
        .map(|t| (t.dataset.as_str(), t.text.as_str()))
        .collect();
    assert_eq!(
        texts,
        vec![
            ("tri", "2 facilities, 0.3 billion lbs reported"),
            ("violations", DATA_UNAVAILABLE),
            ("superfund", DATA_UNAVAILABLE),
        ]
    );
    assert!(tiles[0].available);
    assert!(!tiles[1].available);
    assert_eq!(tiles[2].selector, "#snapshot-superfund .snapshot-value");
    Ok(())
}

#[tokio::test]
async fn converted_datasets_feed_the_tiles() -> Result<()> {
    let dir = tempdir()?;
    let resources = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("resources");
    let ctx = ConvertContext::default();

    Pipeline::run(
        &ViolationsConverter,
        &resources.join("echo_fixture.csv"),
        &dir.path().join("violations.json"),
        &ctx,
        None,
    )?;
    Pipeline::run(
        &SuperfundConverter,
        &resources.join("superfund_fixture.geojson"),
        &dir.path().join("superfund.json"),
        &ctx,
        None,
    )?;
    write(dir.path(), "tri-2023.json", json!([]))?;

    let source: Arc<dyn DatasetSource> = Arc::new(DirSource::new(dir.path()));
    let tiles = load_snapshots(source, &datasets()).await;

    assert_eq!(tiles[0].text, "0 facilities, 0 billion lbs reported");
    assert_eq!(tiles[1].text, "5 violations, $200,000");
    assert_eq!(tiles[2].text, "2");
    assert!(tiles.iter().all(|t| t.available));
    Ok(())
}

#[tokio::test]
async fn map_layers_agree_with_the_tiles() -> Result<()> {
    let dir = tempdir()?;
    write(dir.path(), "tri-2023.json", tri_items())?;
    write(
        dir.path(),
        "superfund.json",
        json!({"national_count": "not a number", "sites": []}),
    )?;

    let source = DirSource::new(dir.path());
    let view = load_map(&source).await;

    assert_eq!(view.layer_names(), vec!["tri"]);
    assert_eq!(view.layer("tri").map(|l| l.len()), Some(2));

    let geojson = view.to_geojson();
    assert_eq!(geojson["features"].as_array().map(Vec::len), Some(2));
    assert_eq!(geojson["features"][0]["properties"]["layer"], "tri");
    Ok(())
}
