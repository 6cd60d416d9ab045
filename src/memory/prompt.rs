//! Grounding prompt composition
//!
//! `compose` is a pure function: identical inputs produce byte-identical
//! output, and any input (including an empty context) yields well-formed
//! text. The template wording tells the model that the context is
//! recency-sorted and that newer messages win; changes must keep those
//! instructions intact.

use crate::memory::retriever::{RankedContext, DEFAULT_CONTEXT_SIZE};

const CONTEXT_DELIMITER: &str = "---------------------";

/// Render the ranked context and the question into model input text
pub fn compose(query: &str, context: &RankedContext) -> String {
    let mut rendered = String::new();
    for record in &context.records {
        rendered.push_str("when: ");
        rendered.push_str(&record.when);
        rendered.push('\n');
        rendered.push_str(&record.text);
        rendered.push('\n');
    }

    format!(
        "Your context is a series of chat messages. Each one is tagged with 'when:'\n\
         indicating when it was said, followed by a line break and then what was said.\n\
         There can be up to {DEFAULT_CONTEXT_SIZE} chat messages.\n\
         The messages are sorted by recency, so the most recent one is first in the list.\n\
         The most recent messages should take precedence over older ones.\n\
         {CONTEXT_DELIMITER}\n\
         {rendered}\
         {CONTEXT_DELIMITER}\n\
         You are a helpful AI assistant who has been listening to everything everyone\n\
         has been saying. Given the most relevant chat messages above, please answer\n\
         this question: {query}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::record::Record;

    fn context(records: Vec<Record>) -> RankedContext {
        RankedContext {
            query: "what did we decide?".to_string(),
            records,
        }
    }

    #[test]
    fn test_compose_is_deterministic() {
        let ctx = context(vec![
            Record::new("ship it", vec![1.0], "2023-06-02 10:00:00"),
            Record::new("hold off", vec![1.0], "2023-06-01 10:00:00"),
        ]);

        let first = compose(&ctx.query, &ctx);
        let second = compose(&ctx.query, &ctx);
        assert_eq!(first, second);
    }

    #[test]
    fn test_compose_renders_records_in_context_order() {
        let ctx = context(vec![
            Record::new("newest", vec![1.0], "2023-06-03 10:00:00"),
            Record::new("middle", vec![1.0], "2023-06-02 10:00:00"),
            Record::new("oldest", vec![1.0], "2023-06-01 10:00:00"),
        ]);

        let prompt = compose(&ctx.query, &ctx);
        let newest = prompt.find("newest").unwrap();
        let middle = prompt.find("middle").unwrap();
        let oldest = prompt.find("oldest").unwrap();
        assert!(newest < middle && middle < oldest);
        assert!(prompt.contains("when: 2023-06-03 10:00:00\nnewest\n"));
    }

    #[test]
    fn test_compose_empty_context_is_well_formed() {
        let ctx = context(vec![]);
        let prompt = compose(&ctx.query, &ctx);

        assert!(prompt.contains("what did we decide?"));
        assert!(prompt.contains(&format!("{CONTEXT_DELIMITER}\n{CONTEXT_DELIMITER}")));
        assert!(prompt.contains("sorted by recency"));
    }

    #[test]
    fn test_compose_keeps_recency_instructions() {
        let ctx = context(vec![Record::new("a", vec![1.0], "2023-06-01 10:00:00")]);
        let prompt = compose(&ctx.query, &ctx);

        assert!(prompt.contains("the most recent one is first in the list"));
        assert!(prompt.contains("take precedence over older ones"));
        assert!(prompt.contains("up to 20 chat messages"));
    }

    #[test]
    fn test_compose_preserves_message_text_verbatim() {
        let ctx = context(vec![Record::new(
            "multi\nline message",
            vec![1.0],
            "2023-06-01 10:00:00",
        )]);
        let prompt = compose(&ctx.query, &ctx);
        assert!(prompt.contains("multi\nline message"));
    }
}
