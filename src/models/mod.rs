pub mod draft;
pub mod exam;
pub mod loaders;
pub mod marker;
pub mod question;
pub mod request;

pub use draft::QuestionDraft;
pub use exam::{Exam, ExamSpec};
pub use loaders::{export_questions, load_questions};
pub use question::{Difficulty, NewQuestion, Question, QuestionId, QuestionType};
pub use request::GenerationRequest;
