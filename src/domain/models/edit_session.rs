use uuid::Uuid;

use super::ClassifiedError;

/// Working copy of one output while it is live edited.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditSession {
    pub id: String,
    pub round_id: String,
    pub output_id: String,
    pub code: String,
    pub is_editing_busy: bool,
}

impl EditSession {
    pub fn new(round_id: &str, output_id: &str, code: &str) -> EditSession {
        return EditSession {
            id: Uuid::new_v4().to_string(),
            round_id: round_id.to_string(),
            output_id: output_id.to_string(),
            code: code.to_string(),
            is_editing_busy: false,
        };
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum EditOutcome {
    /// The working copy was replaced with the model's revision.
    Applied,
    /// The instruction failed; the working copy is as it was.
    Unchanged(ClassifiedError),
    /// Nothing to send, either the code or the instruction was empty.
    Skipped,
    /// The session was closed or replaced while the instruction was running.
    Superseded,
}
