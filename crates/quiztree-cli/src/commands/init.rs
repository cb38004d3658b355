//! The `quiztree init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("quiztree.toml").exists() {
        println!("quiztree.toml already exists, skipping.");
    } else {
        std::fs::write("quiztree.toml", SAMPLE_CONFIG)?;
        println!("Created quiztree.toml");
    }

    if std::path::Path::new("questions.json").exists() {
        println!("questions.json already exists, skipping.");
    } else {
        std::fs::write("questions.json", EXAMPLE_QUESTIONS)?;
        println!("Created questions.json");
    }

    println!("\nNext steps:");
    println!("  1. Edit quiztree.toml with your LMS URL and token (or keep local storage)");
    println!("  2. Run: quiztree tree --file questions.json");
    println!("  3. Run: quiztree submit --file questions.json --title \"My first test\"");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quiztree configuration

# Leave api_base_url unset to store tests and uploads on local disk.
# api_base_url = "https://lms.example.com"
# api_token = "${QUIZTREE_API_TOKEN}"

data_dir = "./quiztree-data/tests"
upload_dir = "./quiztree-data/uploads"
export_dir = "."
timeout_secs = 30
"#;

const EXAMPLE_QUESTIONS: &str = r#"{
  "questions": [
    {
      "id": "q1",
      "question": "Read the passage about the water cycle and answer the parts below.",
      "type": "ESSAY",
      "points": 0,
      "order": 0
    },
    {
      "id": "q1a",
      "question": "Which process turns water vapour into liquid?",
      "type": "MULTIPLE_CHOICE",
      "points": 2,
      "options": ["Evaporation", "Condensation", "Precipitation", "Runoff"],
      "answer": "Condensation",
      "order": 0,
      "parentId": "q1"
    },
    {
      "id": "q1b",
      "question": "Order the stages, starting from the ocean.",
      "type": "REORDER",
      "points": 3,
      "reorderItems": ["Evaporation", "Condensation", "Precipitation"],
      "answer": ["Evaporation", "Condensation", "Precipitation"],
      "order": 1,
      "parentId": "q1"
    },
    {
      "id": "q2",
      "question": "Match each term with its definition.",
      "type": "MATCHING",
      "points": 4,
      "matchPairs": [
        {"left": "Transpiration", "right": "Water released by plants"},
        {"left": "Infiltration", "right": "Water soaking into soil"}
      ],
      "order": 1
    },
    {
      "id": "q3",
      "question": "Water boils at 100 degrees Celsius at sea level.",
      "type": "TRUE_FALSE",
      "points": 1,
      "answer": true,
      "order": 2
    }
  ]
}
"#;
