//! Strict parsing of the model's moderation answer.

use serde::Deserialize;
use strum::{Display, EnumString};

use crate::error::{BotError, Result};

/// Sanction the model may recommend. Never applied automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Penalty {
    Warn,
    #[strum(
        to_string = "Mute 1h",
        serialize = "Mute-1h",
        serialize = "Mute (1h)",
        serialize = "Mute"
    )]
    Mute1h,
    Kick,
    Ban,
}

/// A flagged message as reported by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub rule: String,
    pub penalty: Penalty,
    pub justification: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationVerdict {
    Clear,
    Violation(Violation),
}

/// The model's yes/no answer. Surrounding whitespace and ASCII case are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Deserialize)]
#[strum(ascii_case_insensitive)]
#[serde(try_from = "String")]
enum InfractionFlag {
    #[strum(serialize = "Sí", serialize = "SÍ", serialize = "Si")]
    Yes,
    No,
}

impl TryFrom<String> for InfractionFlag {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value
            .trim()
            .parse()
            .map_err(|_| format!("unknown infraccion value '{value}'"))
    }
}

#[derive(Debug, Deserialize)]
struct RawVerdict {
    infraccion: InfractionFlag,
    regla_infringida: Option<String>,
    penalizacion_recomendada: Option<String>,
    justificacion: Option<String>,
}

/// Removes a surrounding markdown code fence (with or without a language tag).
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    inner
        .trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .trim()
}

/// Parses the raw model output into a verdict.
///
/// A flagged verdict must name the rule, one of the known penalties and a
/// justification; anything less is [`BotError::VerdictParse`].
pub fn parse_verdict(raw: &str) -> Result<ModerationVerdict> {
    let verdict: RawVerdict = serde_json::from_str(strip_code_fences(raw))?;

    match verdict.infraccion {
        InfractionFlag::No => Ok(ModerationVerdict::Clear),
        InfractionFlag::Yes => {
            let rule = required(verdict.regla_infringida, "regla_infringida")?;
            let penalty_text = required(verdict.penalizacion_recomendada, "penalizacion_recomendada")?;
            let penalty = penalty_text.trim().parse::<Penalty>().map_err(|_| {
                BotError::VerdictParse(format!("unknown penalty '{penalty_text}'"))
            })?;
            let justification = required(verdict.justificacion, "justificacion")?;

            Ok(ModerationVerdict::Violation(Violation {
                rule,
                penalty,
                justification,
            }))
        }
    }
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| BotError::VerdictParse(format!("missing field '{field}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flagged_verdict() {
        let verdict = parse_verdict(
            r#"{"infraccion":"Sí","regla_infringida":"Regla 1","penalizacion_recomendada":"Warn","justificacion":"Insulto directo."}"#,
        )
        .expect("valid verdict");

        assert_eq!(
            verdict,
            ModerationVerdict::Violation(Violation {
                rule: "Regla 1".to_string(),
                penalty: Penalty::Warn,
                justification: "Insulto directo.".to_string(),
            })
        );
    }

    #[test]
    fn bare_no_is_clear() {
        assert_eq!(
            parse_verdict(r#"{"infraccion":"No"}"#).expect("valid verdict"),
            ModerationVerdict::Clear
        );
    }

    #[test]
    fn fenced_reply_is_accepted() {
        let raw = "```json\n{\"infraccion\":\"No\"}\n```";
        assert_eq!(strip_code_fences(raw), r#"{"infraccion":"No"}"#);
        assert_eq!(parse_verdict(raw).expect("valid verdict"), ModerationVerdict::Clear);
        assert_eq!(strip_code_fences("```{\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn non_json_is_a_parse_error() {
        let err = parse_verdict("No veo ninguna infracción.").unwrap_err();
        assert!(matches!(err, BotError::VerdictParse(_)));
    }

    #[test]
    fn flagged_verdict_without_rule_is_rejected() {
        let err = parse_verdict(
            r#"{"infraccion":"Sí","penalizacion_recomendada":"Ban","justificacion":"x"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, BotError::VerdictParse(msg) if msg.contains("regla_infringida")));
    }

    #[test]
    fn unknown_penalty_is_rejected() {
        let err = parse_verdict(
            r#"{"infraccion":"Si","regla_infringida":"Regla 2","penalizacion_recomendada":"Exile","justificacion":"x"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, BotError::VerdictParse(msg) if msg.contains("Exile")));
    }

    #[test]
    fn flag_tolerates_padding_and_case() {
        let verdict = parse_verdict(
            r#"{"infraccion":"Sí ","regla_infringida":"R","penalizacion_recomendada":"Warn","justificacion":"j"}"#,
        )
        .expect("valid verdict");
        assert!(matches!(verdict, ModerationVerdict::Violation(v) if v.rule == "R"));

        for raw in [r#"{"infraccion":" no"}"#, r#"{"infraccion":"NO"}"#] {
            assert_eq!(parse_verdict(raw).expect("valid verdict"), ModerationVerdict::Clear);
        }
        for flag in ["sí", "SI", "SÍ"] {
            let raw = format!(
                r#"{{"infraccion":"{flag}","regla_infringida":"R","penalizacion_recomendada":"Ban","justificacion":"j"}}"#
            );
            assert!(matches!(parse_verdict(&raw), Ok(ModerationVerdict::Violation(_))), "{flag}");
        }
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let err = parse_verdict(r#"{"infraccion":"Quizás"}"#).unwrap_err();
        assert!(matches!(err, BotError::VerdictParse(msg) if msg.contains("Quizás")));
    }

    #[test]
    fn penalty_accepts_common_spellings() {
        for text in ["Mute 1h", "mute-1h", "Mute (1h)"] {
            assert_eq!(text.parse::<Penalty>().ok(), Some(Penalty::Mute1h), "{text}");
        }
        assert_eq!(Penalty::Mute1h.to_string(), "Mute 1h");
        assert_eq!("ban".parse::<Penalty>().ok(), Some(Penalty::Ban));
    }
}
