#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversationTurn {
    pub question: String,
    pub answer: String,
}

/// Completed question/answer pairs of a chat session. Only the trailing
/// `window` turns are replayed to the backend.
#[derive(Clone, Debug, Default)]
pub struct ConversationHistory {
    turns: Vec<ConversationTurn>,
    window: usize,
}

impl ConversationHistory {
    pub fn new(window: usize) -> ConversationHistory {
        return ConversationHistory {
            turns: vec![],
            window,
        };
    }

    pub fn push(&mut self, question: &str, answer: &str) {
        self.turns.push(ConversationTurn {
            question: question.to_string(),
            answer: answer.to_string(),
        });
    }

    pub fn len(&self) -> usize {
        return self.turns.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.turns.is_empty();
    }

    /// The last `min(len, window)` turns, oldest first.
    pub fn recent(&self) -> &[ConversationTurn] {
        let start = self.turns.len().saturating_sub(self.window);
        return &self.turns[start..];
    }

    /// Formats the recent turns as a text block to prepend to the next
    /// question. Returns an empty string when there is nothing to replay.
    pub fn format(&self) -> String {
        let recent = self.recent();
        if recent.is_empty() {
            return "".to_string();
        }

        let mut res = "\nRecent conversation history:\n".to_string();
        for (idx, turn) in recent.iter().enumerate() {
            let n = idx + 1;
            res += &format!("\nQ{n}: {}\nA{n}: {}\n", turn.question, turn.answer);
        }

        return res;
    }
}
