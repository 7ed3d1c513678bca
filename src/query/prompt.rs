//! Prompt assembly

use std::fmt::Write;

use crate::core::types::RetrievedDoc;

/// Appended to every prompt so answers cite their sources inline
pub const CITATION_INSTRUCTION: &str = "When you use information from the reference material, \
cite it inline with the marker <<filename|page>>, for example <<report.pdf|3>>. \
If the reference material does not cover the question, say so and answer from general knowledge.";

/// Label each retrieved document and concatenate them in ranked order
pub fn format_context(docs: &[RetrievedDoc]) -> String {
    let mut context = String::new();
    for doc in docs {
        // Writing to a String cannot fail
        let _ = write!(
            context,
            "[source: {} | page: {}]\n{}\n\n",
            doc.filename, doc.page_number, doc.content
        );
    }
    context
}

/// Combine context, question and citation instruction into one prompt.
///
/// An empty context yields a prompt without a reference section.
pub fn build_prompt(context: &str, query: &str) -> String {
    if context.is_empty() {
        return format!("Question: {}\n\n{}", query, CITATION_INSTRUCTION);
    }
    format!(
        "Reference material:\n{}Question: {}\n\n{}",
        context, query, CITATION_INSTRUCTION
    )
}
