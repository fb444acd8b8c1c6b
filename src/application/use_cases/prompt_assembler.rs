use crate::domain::Message;

/// Cue appended after the dialogue; the model continues from here.
pub const ASSISTANT_CUE: &str = "\n\nAssistant:";

/// Flatten the dialogue into the single prompt string the model expects.
///
/// Starts from `system_prompt`, adds one `"\n\n<Speaker>: <content>"` block per
/// transcript message in order, then the new user turn, then
/// [`ASSISTANT_CUE`]. Pure and deterministic; history is never truncated here.
pub fn build_prompt(system_prompt: &str, transcript: &[Message], new_user_text: &str) -> String {
    let capacity = system_prompt.len()
        + transcript
            .iter()
            .map(|m| m.content().len() + 16)
            .sum::<usize>()
        + new_user_text.len()
        + 32;
    let mut prompt = String::with_capacity(capacity);

    prompt.push_str(system_prompt);
    for message in transcript {
        push_turn(&mut prompt, message.role().label(), message.content());
    }
    push_turn(&mut prompt, "User", new_user_text);
    prompt.push_str(ASSISTANT_CUE);

    prompt
}

fn push_turn(prompt: &mut String, speaker: &str, content: &str) {
    prompt.push_str("\n\n");
    prompt.push_str(speaker);
    prompt.push_str(": ");
    prompt.push_str(content);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_dialogue_with_cue() {
        let transcript = vec![
            Message::assistant("Hi! How can I help?"),
            Message::user("My knee hurts"),
            Message::assistant("Rest it."),
        ];

        let prompt = build_prompt("SYS", &transcript, "Still hurts");

        assert_eq!(
            prompt,
            "SYS\n\nAssistant: Hi! How can I help?\n\nUser: My knee hurts\n\nAssistant: Rest it.\n\nUser: Still hurts\n\nAssistant:"
        );
    }

    #[test]
    fn empty_history_still_has_user_turn_and_cue() {
        let prompt = build_prompt("SYS", &[], "");
        assert_eq!(prompt, "SYS\n\nUser: \n\nAssistant:");
    }

    #[test]
    fn is_deterministic() {
        let transcript = vec![Message::assistant("hello"), Message::user("fever")];
        assert_eq!(
            build_prompt("S", &transcript, "x"),
            build_prompt("S", &transcript, "x")
        );
    }

    #[test]
    fn grows_strictly_with_transcript_length() {
        let mut transcript = Vec::new();
        let mut previous = build_prompt("S", &transcript, "q").len();

        for i in 0..6 {
            let message = if i % 2 == 0 {
                Message::assistant("")
            } else {
                Message::user("")
            };
            transcript.push(message);
            let current = build_prompt("S", &transcript, "q").len();
            assert!(current > previous);
            previous = current;
        }
    }

    #[test]
    fn ends_with_assistant_cue() {
        let prompt = build_prompt("S", &[Message::user("a")], "b");
        assert!(prompt.ends_with(ASSISTANT_CUE));
        assert!(!prompt.ends_with("Assistant: "));
    }
}
