//! Card payload for agent replies.

use serde_json::{Value as JsonValue, json};

/// Builds an adaptive-card attachment payload carrying the agent's answer.
/// The payload is opaque to the dispatch core; the reply channel forwards it
/// to the chat surface unrendered.
#[must_use]
pub fn agent_reply_card(text: &str) -> JsonValue {
    json!({
        "contentType": "application/vnd.microsoft.card.adaptive",
        "content": {
            "$schema": "http://adaptivecards.io/schemas/adaptive-card.json",
            "type": "AdaptiveCard",
            "version": "1.5",
            "body": [
                {
                    "type": "TextBlock",
                    "text": text,
                    "wrap": true,
                }
            ],
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_carries_the_answer_text() {
        let card = agent_reply_card("hello from the agent");
        assert_eq!(
            card["content"]["body"][0]["text"],
            json!("hello from the agent")
        );
        assert_eq!(card["content"]["body"][0]["wrap"], json!(true));
        assert_eq!(
            card["contentType"],
            json!("application/vnd.microsoft.card.adaptive")
        );
    }
}
