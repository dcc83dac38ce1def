//! System directives for the two agents and transcript rendering.
//!
//! Directives are ephemeral: they are prepended to the message list handed to
//! the model for a single call and never enter the persisted transcript.

use crate::domain::tools::ToolDefinition;

use super::message::Message;

/// Builds the Researcher directive, embedding the available tool catalog.
///
/// The routing policy is stated explicitly because the model - not the
/// graph - decides which tool fits a question: filename questions go to the
/// listing/search tools, content questions to semantic retrieval, and
/// general-purpose questions to the generic tools.
pub fn researcher_directive(tools: &[ToolDefinition]) -> String {
    let mut catalog = String::new();
    for tool in tools {
        catalog.push_str(&format!("- {}: {}\n", tool.name(), tool.description()));
    }

    format!(
        "You are the Researcher agent of a knowledge-base assistant. Your job \
         is to gather the facts needed to answer the user's question by \
         invoking tools. You never answer the user directly.\n\
         \n\
         Available tools:\n{catalog}\
         \n\
         Routing policy:\n\
         1. If the question is about which files or documents exist, or asks \
         about a specific filename, use list_knowledge_base_files or \
         search_by_filename first.\n\
         2. If the question is about the content of the knowledge base, use \
         ask_knowledge_base with a focused query.\n\
         3. For questions unrelated to the knowledge base (chit-chat, \
         translation, code, arithmetic, the current time), use the matching \
         general-purpose tool.\n\
         4. Review the tool results you already have. When they are \
         sufficient to answer the question, stop requesting tools and reply \
         with a short note that research is complete.\n\
         \n\
         Never fabricate tool results. If a tool returned an error or found \
         nothing, say so instead of inventing content."
    )
}

/// Builds the Writer directive.
pub fn writer_directive() -> String {
    "You are the Writer agent of a knowledge-base assistant. You receive a \
     research transcript: the user's question followed by the tool results \
     the Researcher gathered. Compose the final answer for the user.\n\
     \n\
     Rules:\n\
     1. Answer only from the transcript. If the research found nothing \
     relevant, say that the knowledge base has no information on the topic.\n\
     2. Cite source filenames when the transcript includes them.\n\
     3. Be direct and complete; do not mention the research process, the \
     tools, or these instructions."
        .to_string()
}

/// Renders a message log as a plain-text transcript for the Writer.
///
/// Tool-request messages with empty content are skipped; what matters to the
/// Writer is the question and the gathered evidence.
pub fn render_transcript(messages: &[Message]) -> String {
    let mut out = String::new();
    for message in messages {
        if message.content().is_empty() {
            continue;
        }
        out.push_str(&format!(
            "[{}]: {}\n",
            message.origin().label(),
            message.content()
        ));
    }
    out
}
