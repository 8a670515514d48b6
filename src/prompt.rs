// src/prompt.rs
// Prompt templates for drafting and completion modes

const DRAFTING_TEMPLATE: &str = "\
You are an expert writing assistant. The attached audio is a spoken brief.

The speaker may give INSTRUCTIONS such as:
- the kind of document (email, article, presentation, report, message...)
- tone and style (professional, casual, sales, academic...)
- target length and audience
- the purpose of the text

and CONTENT such as:
- facts and figures
- the main ideas to develop
- key points to highlight
- a preferred structure

YOUR JOB:
1. Separate the instructions from the content in the brief.
2. Write a coherent, well structured text that follows the instructions.
3. Match the requested tone and style.
4. Unless told otherwise, format the text so it can be pasted straight into a text editor or a chat tool.

IMPORTANT: Reply with the finished text only, ready to use. If the instructions are vague, infer the intent and still produce a quality text.";

const COMPLETION_TEMPLATE: &str = "\
You are an expert writing assistant. Below is a text that was already written:

<existing_text>
{{existing_text}}
</existing_text>

The attached audio contains spoken instructions about this text. They may ask you to modify, correct, shorten, extend or continue it.

YOUR JOB:
1. Understand what the speaker wants changed or added.
2. Apply those changes to the existing text, keeping everything the speaker did not ask to change.
3. Keep the tone, style and formatting of the existing text unless told otherwise.

IMPORTANT: Reply with the complete updated text only, ready to use. Do not explain the changes.";

/// Which template a request uses. Derived from the prior text, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    Drafting,
    Completion,
}

pub fn mode_for(existing_text: Option<&str>) -> PromptMode {
    match existing_text {
        Some(text) if !text.trim().is_empty() => PromptMode::Completion,
        _ => PromptMode::Drafting,
    }
}

/// Build the instructional prompt. A non-blank `existing_text` is embedded
/// verbatim and switches to completion mode.
pub fn build_prompt(existing_text: Option<&str>) -> String {
    match (mode_for(existing_text), existing_text) {
        (PromptMode::Completion, Some(text)) => {
            COMPLETION_TEMPLATE.replace("{{existing_text}}", text)
        }
        _ => DRAFTING_TEMPLATE.to_string(),
    }
}
