//! End-to-end wiring: TOML config through registry, cache, and
//! orchestrator against a no-op fleet.

use std::path::Path;
use std::sync::Arc;

use fab_api::{
    Config, Error, JobMode, JobRequest, Orchestrator, Registry, StatusCache,
};
use pretty_assertions::assert_eq;
use testresult::TestResult;

const FLEET: &str = r#"
    [devices.bench-small]
    type = "noop"
    capabilities = { class = "noop", modes = ["additive-print"], envelope = { width = 250.0, depth = 250.0, height = 250.0 }, quality_tier = 3 }

    [devices.bench-large]
    type = "noop"
    capabilities = { class = "noop", modes = ["additive-print"], envelope = { width = 800.0, depth = 800.0, height = 800.0 }, quality_tier = 1 }
"#;

/// Write an ASCII STL tetrahedron with legs of the given length.
fn write_tetrahedron(path: &Path, size: f64) {
    let s = size;
    let vertices = [
        [0.0, 0.0, 0.0],
        [s, 0.0, 0.0],
        [0.0, s, 0.0],
        [0.0, 0.0, s],
    ];
    let faces = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];

    let mut text = String::from("solid tetra\n");
    for face in faces {
        text.push_str("  facet normal 0 0 0\n    outer loop\n");
        for index in face {
            let v = vertices[index];
            text.push_str(&format!("      vertex {} {} {}\n", v[0], v[1], v[2]));
        }
        text.push_str("    endloop\n  endfacet\n");
    }
    text.push_str("endsolid tetra\n");
    std::fs::write(path, text).unwrap();
}

fn orchestrator() -> Result<Orchestrator, anyhow::Error> {
    let config = Config::from_str(FLEET)?;
    let registry = Arc::new(Registry::from_config(&config));
    let cache = Arc::new(StatusCache::new(registry.clone()));
    Ok(Orchestrator::new(registry, cache))
}

#[tokio::test]
async fn test_config_to_dispatch_round_trip() -> TestResult {
    let dir = tempfile::tempdir()?;
    let model = dir.path().join("bracket.stl");
    write_tetrahedron(&model, 120.0);

    let orchestrator = orchestrator()?;
    let job = orchestrator
        .queue_job(JobRequest::new(model, JobMode::AdditivePrint))
        .await?;

    assert_eq!(job.device_id, "bench-small");
    assert_eq!(job.remote_name, "bracket.stl");
    assert!(job.rationale.contains("idle"));
    assert_eq!(job.dimensions.max_dimension, 120.0);

    // The job just started; lifecycle commands run against the device.
    orchestrator.pause_job("bench-small").await?;
    orchestrator.cancel_job("bench-small").await?;
    Ok(())
}

#[tokio::test]
async fn test_oversized_model_never_reaches_a_device() -> TestResult {
    let dir = tempfile::tempdir()?;
    let model = dir.path().join("monument.stl");
    write_tetrahedron(&model, 900.0);

    let orchestrator = orchestrator()?;
    let err = orchestrator
        .queue_job(JobRequest::new(model, JobMode::AdditivePrint))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ModelTooLarge { .. }));
    assert!(err.to_string().contains("800"));
    Ok(())
}

#[tokio::test]
async fn test_lifecycle_on_unknown_device() -> TestResult {
    let orchestrator = orchestrator()?;
    let err = orchestrator.pause_job("ghost").await.unwrap_err();
    assert!(matches!(err, Error::UnknownDevice(_)));
    Ok(())
}

#[tokio::test]
async fn test_mode_without_device_is_rejected() -> TestResult {
    let dir = tempfile::tempdir()?;
    let model = dir.path().join("coin.stl");
    write_tetrahedron(&model, 30.0);

    let orchestrator = orchestrator()?;
    let err = orchestrator
        .queue_job(JobRequest::new(model, JobMode::LaserEtch))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnknownDevice(_)));
    assert!(err.to_string().contains("laser-etch"));
    Ok(())
}
