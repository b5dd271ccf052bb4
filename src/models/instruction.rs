use serde::{Deserialize, Deserializer, Serialize};

/// One step of a recipe's method.
///
/// `step_number` is owned by the server: it is rewritten to the 1-based
/// position of the step every time instructions are saved, so whatever a
/// client sends (or omits) is discarded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Instruction {
    #[serde(default, deserialize_with = "lenient_step_number")]
    pub step_number: u32,
    pub description: String,
}

impl Instruction {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            step_number: 0,
            description: description.into(),
        }
    }
}

// Accepts any JSON value; anything that is not a valid step number reads as 0
// and is replaced on save.
fn lenient_step_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0))
}

/// Renumber steps to their 1-based position, keeping the given order.
pub fn normalize_steps(instructions: &mut [Instruction]) {
    for (index, instruction) in instructions.iter_mut().enumerate() {
        instruction.step_number = index as u32 + 1;
    }
}
