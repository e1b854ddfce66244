#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod draft;
pub mod edit;
pub mod error;
pub mod layout;
pub mod layout_dump;
pub mod model;
pub mod parser;

#[cfg(feature = "cli")]
pub use cli::run;
pub use draft::{definition_to_draft, draft_to_definition, submit};
pub use edit::{StepEdit, apply_edit, apply_edits};
pub use error::{ConfigError, ParseError, SubmitError};
pub use layout::{LayoutResult, layout_workflow, layout_workflow_with_config};
pub use model::{DraftStep, StepDefinition, WorkflowDefinition, WorkflowDraft};
