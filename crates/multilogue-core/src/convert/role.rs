//! Speaker-to-role assignment.

use serde::{Deserialize, Serialize};

/// Speaker name reserved for system instructions.
const INSTRUCTIONS_SPEAKER: &str = "instructions";

/// Conversation role attached to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Returns the wire identifier for this role.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Maps a speaker name to its conversation role.
///
/// Matching is case-insensitive and exact: the configured assistant name maps
/// to `Assistant`, the reserved `instructions` speaker to `System`, everyone
/// else to `User`. Total for all inputs.
pub fn assign_role(speaker: &str, assistant_name: &str) -> Role {
    if speaker_matches(speaker, assistant_name) {
        Role::Assistant
    } else if speaker_matches(speaker, INSTRUCTIONS_SPEAKER) {
        Role::System
    } else {
        Role::User
    }
}

/// Case-insensitive exact comparison of speaker names.
pub(crate) fn speaker_matches(speaker: &str, name: &str) -> bool {
    speaker.to_lowercase() == name.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_role_assistant_case_insensitive() {
        assert_eq!(assign_role("Machine", "MACHINE"), Role::Assistant);
        assert_eq!(assign_role("machine", "Machine"), Role::Assistant);
    }

    #[test]
    fn test_assign_role_instructions_is_system() {
        assert_eq!(assign_role("INSTRUCTIONS", "Machine"), Role::System);
        assert_eq!(assign_role("Instructions", "Machine"), Role::System);
    }

    #[test]
    fn test_assign_role_everyone_else_is_user() {
        assert_eq!(assign_role("ALICE", "Machine"), Role::User);
        assert_eq!(assign_role("", "Machine"), Role::User);
        assert_eq!(assign_role("漢字", "Machine"), Role::User);
    }

    #[test]
    fn test_assign_role_assistant_wins_over_instructions() {
        // An assistant literally named "instructions" is still the assistant.
        assert_eq!(assign_role("instructions", "Instructions"), Role::Assistant);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
    }
}
