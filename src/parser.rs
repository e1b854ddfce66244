use serde::de::DeserializeOwned;

use crate::edit::StepEdit;
use crate::error::ParseError;
use crate::model::{WorkflowDefinition, WorkflowDraft};

/// Parses a workflow definition as stored and submitted on the wire.
pub fn parse_definition(input: &str) -> Result<WorkflowDefinition, ParseError> {
    parse_document(input, "workflow definition")
}

pub fn parse_draft(input: &str) -> Result<WorkflowDraft, ParseError> {
    parse_document(input, "workflow draft")
}

/// Parses an edit script: either a JSON array of edits or a single edit object.
pub fn parse_edits(input: &str) -> Result<Vec<StepEdit>, ParseError> {
    match parse_document::<Vec<StepEdit>>(input, "edit script") {
        Ok(edits) => Ok(edits),
        Err(ParseError::Empty) => Err(ParseError::Empty),
        Err(err) => parse_document::<StepEdit>(input, "edit")
            .map(|edit| vec![edit])
            .map_err(|_| err),
    }
}

/// Strict JSON first; JSON5 (comments, unquoted keys, trailing commas) as a
/// fallback for hand-written files.
fn parse_document<T: DeserializeOwned>(input: &str, what: &'static str) -> Result<T, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    match serde_json::from_str::<T>(input) {
        Ok(value) => Ok(value),
        Err(strict) => json5::from_str::<T>(input).map_err(|_| ParseError::Invalid {
            what,
            message: strict.to_string(),
        }),
    }
}
