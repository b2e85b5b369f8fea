// Text merges into the note body: AI continuations and quick captures.

use crate::assist::Prompt;

/// System instruction sent with every completion request.
pub const SYSTEM_INSTRUCTION: &str = "\
You are a writing assistant embedded in a note editor.
You receive CONTEXT_TEXT from a note together with a REQUEST, and you write more text for the note.
Reply only with text that belongs in the note after the context, following the request.
Never open with phrases like 'Sure' or 'Here you go:', never address the user, and never comment on yourself or the request.
Match the style of the context text.";

/// Build the completion prompt for `request` against the note body.
///
/// `title` is `None` while the note is unnamed.
pub fn build_prompt(title: Option<&str>, context: &str, request: &str) -> Prompt {
    let mut user = String::from(
        "Given the CONTEXT_TEXT below, provide text in the same style to add to it as \
         described by the REQUEST.\n\nHere is the CONTEXT_TEXT:",
    );
    if let Some(title) = title {
        user.push_str("\nTitle: ");
        user.push_str(title);
    }
    user.push('\n');
    user.push_str(context);
    user.push_str("\n\nHere is the REQUEST:\n");
    user.push_str(request);
    user.push_str(
        "\n\nDo not repeat the CONTEXT_TEXT or the REQUEST. Write text that follows on \
         naturally from the CONTEXT_TEXT and does what the REQUEST asks.",
    );
    Prompt { system: SYSTEM_INSTRUCTION.to_string(), user }
}

/// Append a completion to the body. `None` when there is nothing to add.
pub fn merge_continuation(content: &str, continuation: &str) -> Option<String> {
    if continuation.trim().is_empty() {
        return None;
    }
    let mut merged = String::with_capacity(content.len() + continuation.len() + 2);
    merged.push_str(content);
    merged.push('\n');
    merged.push_str(continuation);
    merged.push('\n');
    Some(merged)
}

/// Append a quick-capture line. The text is trimmed; an empty body gets no
/// leading newline. `None` for blank captures.
pub fn append_capture(content: &str, text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if content.is_empty() {
        return Some(text.to_string());
    }
    Some(format!("{content}\n{text}"))
}
