//! quiztree-core: Hierarchical test-question model and editor logic.
//!
//! This crate owns the question forest (questions with nested
//! sub-questions), the mutations an editor performs on it, conversion to and
//! from the flat `parentId` list used by persistence, JSON import/export, and
//! automatic grading.

pub mod attachment;
pub mod draft;
pub mod editor;
pub mod error;
pub mod grading;
pub mod hierarchy;
pub mod model;
pub mod reorder;
pub mod serializer;
pub mod store;
pub mod traits;
pub mod validation;
pub mod view;

pub use draft::{TestDraft, TestMetadata};
pub use editor::QuestionEditor;
pub use error::{HierarchyError, ImportError, SubmitError};
pub use hierarchy::{flatten, organize, QuestionForest};
pub use model::{Answer, MatchPair, QuestionNode, QuestionRecord, QuestionType};
pub use store::{QuestionStore, QuestionUpdate};
pub use traits::{FileUploader, TestRepository};
