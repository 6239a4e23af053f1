use ad_classifier::{ArtifactError, ClassifierError, ModelArtifact, ModelPredictor, ModelPredictorBuilder};
use std::fs;
use std::path::PathBuf;

fn scratch_dir(name: &str) -> Result<PathBuf, std::io::Error> {
    let dir = std::env::temp_dir().join("ad-classifier-artifact-tests").join(name);
    if dir.exists() {
        fs::remove_dir_all(&dir)?;
    }
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[test]
fn test_artifact_paths() {
    let artifact = ModelArtifact::new("./ad_classifier");
    assert!(artifact.model_path().ends_with("ad_classifier/model.onnx"));
    assert!(artifact.tokenizer_path().ends_with("ad_classifier/tokenizer.json"));
    assert!(artifact.config_path().ends_with("ad_classifier/config.json"));
    assert_eq!(artifact.dir(), PathBuf::from("./ad_classifier").as_path());
}

#[test]
fn test_missing_artifact_fails_to_load() -> Result<(), Box<dyn std::error::Error>> {
    let artifact = ModelArtifact::new(scratch_dir("empty")?);

    assert!(!artifact.is_present());
    match ModelPredictor::load(&artifact) {
        Err(ClassifierError::ModelLoadError(message)) => assert!(message.contains("model.onnx")),
        other => panic!("expected ModelLoadError, got {:?}", other.map(|p| p.model_path)),
    }
    Ok(())
}

#[test]
fn test_missing_tokenizer_is_reported() -> Result<(), Box<dyn std::error::Error>> {
    let dir = scratch_dir("no-tokenizer")?;
    fs::write(dir.join("model.onnx"), b"")?;
    let artifact = ModelArtifact::new(&dir);

    assert!(!artifact.is_present());
    match artifact.ensure_present() {
        Err(ArtifactError::NotFound(path)) => assert!(path.ends_with("tokenizer.json")),
        other => panic!("expected NotFound, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_mismatched_labels_block_loading() -> Result<(), Box<dyn std::error::Error>> {
    let dir = scratch_dir("wrong-labels")?;
    fs::write(dir.join("model.onnx"), b"")?;
    fs::write(dir.join("tokenizer.json"), b"{}")?;
    fs::write(
        dir.join("config.json"),
        r#"{"id2label": {"0": "positive", "1": "negative"}, "num_labels": 2}"#,
    )?;
    let artifact = ModelArtifact::new(&dir);

    assert!(artifact.is_present());
    assert!(matches!(
        artifact.verify_labels(),
        Err(ArtifactError::LabelCount { expected: 9, actual: 2 })
    ));
    assert!(matches!(ModelPredictor::load(&artifact), Err(ClassifierError::ModelLoadError(_))));
    Ok(())
}

#[test]
fn test_corrupt_tokenizer_fails_to_load() -> Result<(), Box<dyn std::error::Error>> {
    let dir = scratch_dir("corrupt")?;
    fs::write(dir.join("model.onnx"), b"not a model")?;
    fs::write(dir.join("tokenizer.json"), b"not a tokenizer")?;

    let result = ModelPredictorBuilder::new().with_artifact(&ModelArtifact::new(&dir));
    assert!(matches!(result, Err(ClassifierError::ModelLoadError(_))));
    Ok(())
}

#[test]
fn test_builder_validation() {
    assert!(matches!(
        ModelPredictorBuilder::new().with_batch_size(0),
        Err(ClassifierError::ValidationError(_))
    ));
    assert!(matches!(
        ModelPredictorBuilder::new().with_max_sequence_length(0),
        Err(ClassifierError::ValidationError(_))
    ));
    assert!(matches!(
        ModelPredictorBuilder::new().with_custom_model("", "tokenizer.json", None),
        Err(ClassifierError::ModelLoadError(_))
    ));
    assert!(matches!(
        ModelPredictorBuilder::new().with_custom_model("missing/model.onnx", "missing/tokenizer.json", None),
        Err(ClassifierError::ModelLoadError(_))
    ));
    assert!(matches!(ModelPredictorBuilder::new().build(), Err(ClassifierError::ModelLoadError(_))));
}
