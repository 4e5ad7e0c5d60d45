use agent_core::{required_str, Tool, ToolError, ToolOutput, ToolPayload, ToolResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::{Component, Path, PathBuf};

/// Plays a sound effect from a fixed directory by handing the file to the caller.
pub struct PlaySoundTool {
    sounds_dir: PathBuf,
}

impl PlaySoundTool {
    pub const NAME: &'static str = "play_sound";

    pub fn new(sounds_dir: impl Into<PathBuf>) -> Self {
        Self {
            sounds_dir: sounds_dir.into(),
        }
    }
}

/// Only a bare file name; anything that could leave the sounds directory is rejected.
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[async_trait]
impl Tool for PlaySoundTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Play a local sound effect by file name."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_name": {
                    "type": "string",
                    "description": "Name of the sound effect file"
                }
            },
            "required": ["file_name"]
        })
    }

    async fn execute(&self, arguments: Value, invocation_id: &str) -> Result<ToolOutput, ToolError> {
        let file_name = required_str(&arguments, "file_name")?;
        if !is_plain_file_name(file_name) {
            return Err(ToolError::Validation(format!(
                "'{}' is not a plain file name",
                file_name
            )));
        }
        let path = self.sounds_dir.join(file_name);
        if !path.is_file() {
            return Ok(ToolOutput::text(format!(
                "Sound file {} does not exist",
                file_name
            )));
        }
        let result = ToolResult::new(Self::NAME, invocation_id, ToolPayload::File(path));
        Ok(ToolOutput::with_results(
            format!("Playing sound: {}", file_name),
            vec![result],
        ))
    }
}
