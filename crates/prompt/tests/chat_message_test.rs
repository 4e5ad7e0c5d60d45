//! Tests for `prompt::ChatMessage` constructors and the request builders.
//!
//! External interactions: none (pure function tests).

use prompt::{
    format_transcript, memorize_request, ChatMessage, MessageRole, ToolCall, MEMORIZE_INSTRUCTION,
};

/// **Test: Constructors set role and the role-specific fields only.**
#[test]
fn constructors_set_role_specific_fields() {
    let user = ChatMessage::user_with_images("look", vec!["https://example.com/a.png".into()]);
    assert_eq!(user.role, MessageRole::User);
    assert_eq!(user.images.len(), 1);
    assert!(user.tool_call_id.is_none());

    let call = ToolCall {
        id: "call_9".into(),
        name: "generate_image".into(),
        arguments: r#"{"prompt":"cat"}"#.into(),
    };
    let assistant = ChatMessage::assistant_with_tool_calls("", vec![call.clone()]);
    assert!(assistant.has_tool_calls());
    assert_eq!(assistant.tool_calls[0], call);

    let tool = ChatMessage::tool("call_9", "done");
    assert_eq!(tool.role, MessageRole::Tool);
    assert_eq!(tool.tool_call_id.as_deref(), Some("call_9"));
}

/// **Test: Serialized messages omit empty optional fields and use lowercase roles.**
#[test]
fn serde_uses_lowercase_roles_and_skips_empty_fields() {
    let json = serde_json::to_string(&ChatMessage::system("be brief")).unwrap();
    assert!(json.contains(r#""role":"system""#));
    assert!(!json.contains("tool_calls"));
    assert!(!json.contains("images"));
}

/// **Test: Memorize request wraps the transcript after the extraction instruction.**
#[test]
fn memorize_request_wraps_transcript() {
    let messages = vec![ChatMessage::user("I love green tea"), ChatMessage::assistant("Noted!")];
    let req = memorize_request(&messages);
    assert_eq!(req[0].content, MEMORIZE_INSTRUCTION);
    assert!(req[1].content.contains(&format_transcript(&messages)));
    assert!(req[1].content.starts_with("<conversation>"));
}

