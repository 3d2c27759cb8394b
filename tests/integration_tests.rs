use shelfsort::dataset::{read_items, read_predictions, read_training_records, write_predictions};
use shelfsort::inference::apply_threshold;
use shelfsort::{
    classify, train, CompositeLabel, ItemRecord, LabeledRecord, ModelArtifact, SolverConfig,
    TrainingConfig, DEFAULT_CONFIDENCE_THRESHOLD,
};
use env_logger::{Builder, Env};
use std::fs;
use tempfile::TempDir;

// Initialize test logger
fn init() {
    let _ = Builder::from_env(Env::default().default_filter_or("warn"))
        .try_init();
}

fn products() -> Vec<LabeledRecord> {
    vec![
        LabeledRecord::new("Fresh Whole Milk 1L", "Dairy", "Milk", "Whole Milk"),
        LabeledRecord::new("Whole Milk Fresh 2L", "Dairy", "Milk", "Whole Milk"),
        LabeledRecord::new("Fresh Whole Milk Carton", "Dairy", "Milk", "Whole Milk"),
        LabeledRecord::new("Laundry Detergent Liquid", "Household", "Laundry", "Detergent"),
        LabeledRecord::new("Liquid Laundry Detergent 3L", "Household", "Laundry", "Detergent"),
        LabeledRecord::new("Laundry Detergent Pods", "Household", "Laundry", "Detergent"),
        LabeledRecord::new("Dog Food Chicken Kibble", "Pets", "Dog", "Dry Food"),
        LabeledRecord::new("Chicken Dog Food Dry", "Pets", "Dog", "Dry Food"),
        LabeledRecord::new("Dry Dog Food Kibble 5kg", "Pets", "Dog", "Dry Food"),
    ]
}

fn config() -> TrainingConfig {
    TrainingConfig::default()
        .with_passes(10)
        .with_solver(SolverConfig::default().with_max_iter(1_000))
}

#[test]
fn test_held_out_accuracy_beats_chance() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let outcome = train(&products(), &config())?;

    assert_eq!(outcome.artifact.classifier().classes().len(), 3);
    assert_eq!(outcome.report.total_support, 18);
    assert!(
        outcome.report.accuracy > 0.8,
        "held-out accuracy {} too low",
        outcome.report.accuracy
    );
    Ok(())
}

#[test]
fn test_digits_and_punctuation_still_produce_a_row() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let outcome = train(&products(), &config())?;
    let classifier = outcome.artifact.classifier();
    assert_eq!(shelfsort::normalize("123-456!!"), "");

    let items = vec![ItemRecord::new("1", "123-456!!")];
    let predictions = classify(classifier, &items, DEFAULT_CONFIDENCE_THRESHOLD)?;
    assert_eq!(predictions.len(), 1);
    assert_eq!(predictions[0].item_id, "1");
    assert_eq!(predictions[0].label.join().split(" ||| ").count(), 3);

    // No informative features leaves only the class priors, far from certain.
    let strict = classify(classifier, &items, 0.9)?;
    assert_eq!(strict[0].label, CompositeLabel::unknown());
    Ok(())
}

#[test]
fn test_confidence_at_threshold_keeps_prediction() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let label = apply_threshold("Dairy ||| Milk ||| Whole Milk", 0.05, DEFAULT_CONFIDENCE_THRESHOLD)?;
    assert_eq!(label, CompositeLabel::new("Dairy", "Milk", "Whole Milk")?);

    let below = apply_threshold("Dairy ||| Milk ||| Whole Milk", 0.0499, DEFAULT_CONFIDENCE_THRESHOLD)?;
    assert!(below.is_unknown());

    let outcome = train(&products(), &config())?;
    let classifier = outcome.artifact.classifier();
    let (predicted, confidence) = classifier.predict("whole milk")?;
    let items = vec![ItemRecord::new("7", "whole milk")];
    let predictions = classify(classifier, &items, confidence)?;
    assert_eq!(predictions[0].label.join(), predicted);
    Ok(())
}

#[test]
fn test_csv_train_save_load_classify() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let dir = TempDir::new()?;
    let training_path = dir.path().join("tagged_products.csv");
    let items_path = dir.path().join("items.csv");
    let model_path = dir.path().join("models").join("product_classifier.model");
    let output_path = dir.path().join("predicted.csv");

    let mut training = String::from("item_name,category,subcategory,specific_category\n");
    for record in products() {
        training.push_str(&format!(
            "\"{}\",{},{},{}\n",
            record.item_name.unwrap_or_default(),
            record.category.unwrap_or_default(),
            record.subcategory.unwrap_or_default(),
            record.specific_category.unwrap_or_default()
        ));
    }
    fs::write(&training_path, training)?;
    fs::write(
        &items_path,
        "item_id,item_name\n10,Whole Milk 1.5L\n11,\n12,DOG FOOD - chicken\n13,laundry pods\n",
    )?;

    let records = read_training_records(&training_path)?;
    assert_eq!(records.len(), 9);
    let outcome = train(&records, &config())?;
    outcome.artifact.save(&model_path)?;
    assert!(ModelArtifact::verify(&model_path)?);

    let artifact = ModelArtifact::load(&model_path)?;
    assert_eq!(artifact.metadata().config.as_ref(), Some(&config()));
    let items = read_items(&items_path)?;
    let predictions = classify(artifact.classifier(), &items, DEFAULT_CONFIDENCE_THRESHOLD)?;
    write_predictions(&output_path, &predictions)?;

    let bytes = fs::read(&output_path)?;
    assert!(bytes.starts_with(b"\xEF\xBB\xBF"));

    let rows = read_predictions(&output_path)?;
    let ids: Vec<&str> = rows.iter().map(|r| r.item_id.as_str()).collect();
    assert_eq!(ids, vec!["10", "11", "12", "13"]);
    assert_eq!(rows[0].label(), CompositeLabel::new("Dairy", "Milk", "Whole Milk")?);
    assert_eq!(rows[2].general_category, "Pets");
    assert_eq!(rows[3].sub_category, "Laundry");
    Ok(())
}
