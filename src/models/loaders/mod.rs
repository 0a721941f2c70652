pub mod json_loader;

pub use json_loader::{export_questions, load_questions, questions_from_json, questions_to_json};
