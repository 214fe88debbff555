use super::rules::RuleDocument;

const INSTRUCTIONS: &str = "Eres un moderador de un servidor de Discord. \
Tu tarea es decidir si el siguiente mensaje infringe alguna de las reglas del servidor.";

const ANSWER_FORMAT: &str = r#"Responde únicamente con un objeto JSON, sin texto adicional ni bloques de código, con exactamente estos campos:
{"infraccion": "Sí" o "No", "regla_infringida": "la regla citada", "penalizacion_recomendada": "Warn" | "Mute 1h" | "Kick" | "Ban", "justificacion": "explicación breve"}
Si el mensaje no infringe ninguna regla, responde {"infraccion": "No"}."#;

/// Builds the single-shot classification prompt for one message.
///
/// The rules and the message text are embedded verbatim.
pub fn build_classification_prompt(rules: &RuleDocument, author: &str, content: &str) -> String {
    let mut prompt = String::with_capacity(
        INSTRUCTIONS.len() + ANSWER_FORMAT.len() + rules.as_str().len() + content.len() + 128,
    );
    prompt.push_str(INSTRUCTIONS);
    prompt.push_str("\n\nReglas del servidor:\n");
    prompt.push_str(rules.as_str());
    prompt.push_str("\n\nMensaje a revisar:\nAutor: ");
    prompt.push_str(author);
    prompt.push_str("\nContenido: ");
    prompt.push_str(content);
    prompt.push_str("\n\n");
    prompt.push_str(ANSWER_FORMAT);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeds_rules_author_and_message_verbatim() {
        let rules = RuleDocument::new("Regla 1: No insultar.").expect("rules");
        let prompt = build_classification_prompt(&rules, "Pepe", "Eres un idiota");

        assert!(prompt.contains("Regla 1: No insultar."));
        assert!(prompt.contains("Autor: Pepe"));
        assert!(prompt.contains("Eres un idiota"));
        for field in [
            "infraccion",
            "regla_infringida",
            "penalizacion_recomendada",
            "justificacion",
        ] {
            assert!(prompt.contains(field), "missing field {field}");
        }
    }
}
