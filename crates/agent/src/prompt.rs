//! Prompt text for the listings assistant.

use corretor_core::message::Message;

/// Default system prompt. The model answers in Portuguese and opens its reply
/// with the marker when it needs the property table.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that answers user questions in Portuguese. You have access to a table containing information about available properties, with columns: IMOVEL (property name or description), STATUS (all 'LIVRE'), ENDEREÇO (address), and DESCRIÇÃO (brief description).

For questions about these properties, use the table to provide accurate information. Handle queries such as:

Location-based: Filter by ENDEREÇO and list properties with their descriptions.
Specific property: Provide the address, status, and description.
Characteristic-based: Search DESCRIÇÃO for relevant keywords and list matching properties.
If the user asks a question that requires information about properties, disponibility, address, or any data that would typically be found in a database or spreadsheet, respond with \"NEED_DATA\" at the very beginning of your message followed by your normal response.

When using the table, incorporate the information naturally as if you already knew it, without mentioning its source.

Use your best judgment to determine if the question can be answered with the property table or if additional data is needed based on the context and nature of the question.";

/// The configured override, or the default prompt.
pub fn system_prompt(override_text: Option<&str>) -> String {
    match override_text.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => SYSTEM_PROMPT.to_string(),
    }
}

/// Second-request user message carrying the fetched data.
pub fn augmented_query(original_query: &str, data: &str, marker: &str) -> String {
    format!(
        "Original question: {original_query}\n\n\
         Here is the data you requested:\n{data}\n\n\
         Please use this data to provide a complete response to the original question. \
         DO NOT include the phrase \"{marker}\" in your response."
    )
}

/// Replace the last message with the augmented query built from it.
///
/// Only the outgoing request changes; the caller's history is separate.
pub fn augment_messages(mut messages: Vec<Message>, data: &str, marker: &str) -> Vec<Message> {
    if let Some(last) = messages.last_mut() {
        *last = Message::user(augmented_query(&last.content, data, marker));
    }
    messages
}
