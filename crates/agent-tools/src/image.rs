use agent_core::{required_str, Tool, ToolError, ToolOutput, ToolPayload, ToolResult};
use async_trait::async_trait;
use image_generation_client::ImageGenerator;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

pub struct GenerateImageTool {
    generator: Arc<dyn ImageGenerator>,
}

impl GenerateImageTool {
    pub const NAME: &'static str = "generate_image";

    pub fn new(generator: Arc<dyn ImageGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Tool for GenerateImageTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Generate an image from a prompt. The image is sent to the user directly."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "Detailed description of the picture to generate"
                }
            },
            "required": ["prompt"]
        })
    }

    async fn execute(&self, arguments: Value, invocation_id: &str) -> Result<ToolOutput, ToolError> {
        let prompt = required_str(&arguments, "prompt")?;
        let urls = self.generator.generate(prompt).await.map_err(|e| {
            warn!(error = %e, "image generation failed");
            ToolError::Execution(format!("image generation failed: {}", e))
        })?;
        if urls.is_empty() {
            return Err(ToolError::Execution(
                "image generation finished without any image".to_string(),
            ));
        }
        info!(count = urls.len(), "step: images generated");
        let results = urls
            .into_iter()
            .enumerate()
            .map(|(index, url)| {
                ToolResult::new(
                    Self::NAME,
                    format!("{}_{}", invocation_id, index),
                    ToolPayload::Image(url),
                )
            })
            .collect();
        Ok(ToolOutput::with_results("Image generated successfully.", results))
    }
}
