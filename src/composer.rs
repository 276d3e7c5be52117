//! Context composition: builds the outgoing payload for one turn.

use crate::memory::MemoryContext;
use crate::protocol::UNLOCK_PHRASE;
use crate::types::{ConversationMode, ImageAttachment, Part, RequestPayload};

pub const USER_CONTEXT_OPEN: &str = "[SYSTEM: USER CONTEXT]";
pub const USER_CONTEXT_CLOSE: &str = "[END USER CONTEXT]";

/// Compose the request for a turn.
///
/// Outside Unlock mode the text part is, in order: the robot-model tag, the
/// hidden user-context block, the user's message. In Unlock mode the text is
/// exactly [`UNLOCK_PHRASE`] with nothing around it. An image, when present,
/// is attached in every mode, ahead of the text part.
pub fn compose(
    mode: ConversationMode,
    message: &str,
    image: Option<&ImageAttachment>,
    robot_model: Option<&str>,
    memory: Option<&MemoryContext>,
) -> RequestPayload {
    let text = if mode.is_unlock() {
        UNLOCK_PHRASE.to_string()
    } else {
        let mut text = match memory {
            Some(ctx) => format!("{}{}", user_context_block(ctx), message),
            None => message.to_string(),
        };
        if let Some(model) = robot_model.map(str::trim).filter(|m| !m.is_empty()) {
            text = format!("{}\n\n{}", robot_model_tag(model), text);
        }
        text
    };

    let mut parts = Vec::with_capacity(2);
    if let Some(image) = image {
        parts.push(Part::from(image));
    }
    parts.push(Part::text(text));

    RequestPayload { mode, parts }
}

pub fn robot_model_tag(model: &str) -> String {
    format!("[Context: Robot Model = {}]", model)
}

/// Hidden block biasing the backend towards what it already knows about the user.
pub fn user_context_block(ctx: &MemoryContext) -> String {
    let mut block = format!(
        "{}\nNAME: {}\nIDENTITY: {}\n",
        USER_CONTEXT_OPEN, ctx.display_name, ctx.identity
    );
    if !ctx.memory.is_empty() {
        block.push_str(&format!("KNOWN FACTS/MEMORY: {}\n", ctx.memory));
    }
    block.push_str(USER_CONTEXT_CLOSE);
    block.push_str("\n\n");
    block
}
