//! Reply formatting for Discord.

/// Discord's message limit for standard users.
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;

/// Formats a successful exchange as shown in the channel.
pub fn format_answer(question: &str, answer: &str) -> String {
    format!("**Tu pregunta:** {question}\n**Respuesta de la IA:** {answer}")
}

/// Splits `text` into chunks Discord accepts, preferring line boundaries.
///
/// Whitespace-only chunks are dropped since Discord rejects empty messages.
pub fn split_message(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();

        if current_len + line_len > DISCORD_MESSAGE_LIMIT && !current.is_empty() {
            push_chunk(std::mem::take(&mut current), &mut chunks);
            current_len = 0;
        }

        if line_len > DISCORD_MESSAGE_LIMIT {
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(DISCORD_MESSAGE_LIMIT) {
                push_chunk(piece.iter().collect(), &mut chunks);
            }
            continue;
        }

        current.push_str(line);
        current_len += line_len;
    }

    push_chunk(current, &mut chunks);
    if chunks.is_empty() {
        chunks.push(text.to_string());
    }
    chunks
}

fn push_chunk(chunk: String, chunks: &mut Vec<String>) {
    if !chunk.trim().is_empty() {
        chunks.push(chunk);
    }
}
