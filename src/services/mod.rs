pub mod exam_assembler;
pub mod prompt_builder;
pub mod question_store;
pub mod response_parser;

pub use exam_assembler::{ExamAssembler, Selection};
pub use prompt_builder::{Prompt, PromptBuilder};
pub use question_store::{QuestionFilter, QuestionStore, StoreStats};
pub use response_parser::ResponseParser;
