use std::fs;

use category_classifier::{
    pipeline, ClassifierError, DatasetBuilder, DatasetError, LabeledDataset, PipelineConfig, Trainer, CATEGORIES,
};

#[test]
fn test_malformed_csv_aborts_build() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let csv_path = dir.path().join("train.csv");
    fs::write(&csv_path, "6-security;firewall\n7-storage\n")?;

    let result = DatasetBuilder::new(&PipelineConfig::default().categories).build(&csv_path, dir.path().join("tree"));
    match result {
        Err(DatasetError::MalformedRow { line, columns }) => {
            assert_eq!(line, 2);
            assert_eq!(columns, 1);
        }
        other => panic!("expected MalformedRow, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_missing_csv_fails() {
    let dir = tempfile::tempdir().unwrap();
    let result = DatasetBuilder::new(&[]).build(dir.path().join("missing.csv"), dir.path().join("tree"));
    assert!(matches!(result, Err(DatasetError::Io(_))));
}

#[test]
fn test_missing_dataset_directory_fails_training() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig::with_data_root(dir.path(), dir.path().join("model"));
    let err = pipeline::build_model(&config).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DatasetError>(),
        Some(DatasetError::MissingDirectory(_))
    ));
    assert!(!config.model_dir.exists());
}

#[test]
fn test_empty_dataset_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("6-security")).unwrap();
    let result = LabeledDataset::from_directory(dir.path(), 0);
    assert!(matches!(result, Err(DatasetError::EmptyDataset(_))));
}

#[test]
fn test_predict_without_model_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig::default().with_model_dir(dir.path().join("model"));
    assert!(pipeline::predict(&config, "firewall,vpn").is_err());
}

#[test]
fn test_unknown_label_appended_after_categories() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let data_root = dir.path().join("data");
    fs::create_dir_all(data_root.join("csv"))?;
    fs::write(data_root.join("csv").join("train.csv"), "6-security;vpn\n9-gaming;steam\n")?;
    fs::write(data_root.join("csv").join("test.csv"), "9-gaming;steam\n")?;
    let config = PipelineConfig::with_data_root(&data_root, dir.path().join("model")).with_epochs(2);

    pipeline::run(&config)?;
    let classifier = pipeline::load_classifier(&config)?;
    assert_eq!(classifier.class_names().len(), CATEGORIES.len() + 1);
    assert_eq!(&classifier.class_names()[..CATEGORIES.len()], config.categories.as_slice());
    assert_eq!(classifier.class_names()[CATEGORIES.len()], "9-gaming");
    assert_eq!(classifier.predict("steam")?.probabilities.len(), CATEGORIES.len() + 1);
    Ok(())
}

#[test]
fn test_blank_csv_row_aborts_build() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let csv_path = dir.path().join("train.csv");
    fs::write(&csv_path, "6-security;vpn\n\n7-storage;disk\n")?;

    let result = DatasetBuilder::new(&PipelineConfig::default().categories).build(&csv_path, dir.path().join("tree"));
    match result {
        Err(DatasetError::MalformedRow { line, columns }) => {
            assert_eq!(line, 2);
            assert_eq!(columns, 0);
        }
        other => panic!("expected MalformedRow, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_empty_training_set_rejected() {
    let classes = vec!["6-security".to_string()];
    let empty = LabeledDataset::from_examples(classes.clone(), Vec::new());
    let test = LabeledDataset::from_examples(classes, vec![("vpn".to_string(), 0)]);
    let result = Trainer::new(&PipelineConfig::default()).train(&empty, &test);
    assert!(matches!(result, Err(ClassifierError::TrainingError(_))));
}
