//! Empathy scoring of the reconciled dialogue.
//!
//! Scoring is delegated to the chat backend under a fixed Hebrew rubric that
//! restricts the evaluation to lines tagged `Nurse`. This module owns exact
//! prompt construction and collapsing the response to the single contract
//! line.

use crate::error::ScoringError;
use crate::llm_client::send_chat_completion;
use crate::settings::ChatSettings;
use crate::transcript::ReconciledLine;
use log::{debug, info};
use regex::Regex;

const SCORE_SYSTEM_PROMPT: &str = "Assess empathetic language concisely. Return exactly ONE line.";

const SCORE_TEMPERATURE: f32 = 0.0;
const SCORE_MAX_TOKENS: u32 = 600;

/// The fixed Hebrew scoring rubric. `{final_transcript}` is replaced with
/// the flattened reconciled dialogue.
const EMPATHY_PROMPT_TEMPLATE: &str = r#"את/ה בוחן/ת איכות תקשורת של סטודנטית לסיעוד בתרגול סימולציה.

המשימה: להעריך את **השפה האמפתית** של הסטודנטית.
התבסס/י רק על שורות המסומנות `Nurse` בתמליל המצורף.
מה נחשב לשפה אמפתית? ביטויים שמכירים ברגש, משקפים את דברי המטופל ומאשרים את תחושותיו (למשל הכרה בכאב/מבוכה, נרמול, הזמנה לשיתוף, הבטחת זמינות, שיקוף תוכן).

הוראות:
1) קרא/י את התמליל (הסופי והמאוחד).
2) אל תוסיף/י תוכן שלא מופיע בטקסט.
3) בנימוקים יש לציין בקצרה גם **מה הוריד את הציון או מה היה חסר** (למשל: מעט/בלי הכרה ברגש; אין שיקוף; ללא הזמנה לשיתוף; היעדר הבטחת זמינות; טון פקודי/מהיר מדי).

פלט מבוקש (שורה אחת בלבד):
שפה אמפתית: [ציון 1–5] – [נימוקים קצרים עם ציטוטים רלוונטיים מהשורות של Nurse. יש לזכור שאיסוף מידע רפואי ומתן טיפול הם חלק טבעי מהמפגש, ולכן אינם מורידים מהציון. ההערכה מתמקדת בשאלה האם שולבו גם ביטויים של שפה אמפתית כגון הכרה ברגש, נרמול, שיקוף, הזמנה לשיתוף והבטחת זמינות.]
תמליל:
{final_transcript}
"#;

/// The single-line verdict: a 1-5 score plus a rationale quoting the nurse's
/// own lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmpathyVerdict {
    pub score: u8,
    pub rationale: String,
}

impl EmpathyVerdict {
    /// Render back to the contract line.
    pub fn as_line(&self) -> String {
        format!("שפה אמפתית: {} – {}", self.score, self.rationale)
    }
}

/// Interpolate the reconciled dialogue into the rubric template.
pub fn build_scoring_prompt(reconciled: &[ReconciledLine]) -> String {
    let flattened = reconciled
        .iter()
        .map(ReconciledLine::render)
        .collect::<Vec<_>>()
        .join("\n");
    EMPATHY_PROMPT_TEMPLATE.replace("{final_transcript}", &flattened)
}

/// Score the nurse's empathetic language over the reconciled dialogue.
pub async fn score_empathy(
    reconciled: &[ReconciledLine],
    chat: &ChatSettings,
) -> Result<EmpathyVerdict, ScoringError> {
    let prompt = build_scoring_prompt(reconciled);
    info!("Scoring empathy over {} reconciled line(s)", reconciled.len());

    let api_key = chat.resolved_api_key().unwrap_or_default();
    let raw = send_chat_completion(
        &chat.base_url,
        &api_key,
        &chat.model,
        SCORE_SYSTEM_PROMPT,
        &prompt,
        SCORE_TEMPERATURE,
        SCORE_MAX_TOKENS,
    )
    .await?;

    let collapsed = collapse_to_single_line(&raw);
    if collapsed.is_empty() {
        return Err(ScoringError::EmptyResponse);
    }
    debug!("Verdict line: {}", collapsed);

    parse_verdict(&collapsed).ok_or(ScoringError::MalformedVerdict { raw: collapsed })
}

/// The contract requires exactly one output line; fold any embedded line
/// breaks (and the whitespace around them) into single spaces.
pub fn collapse_to_single_line(raw: &str) -> String {
    raw.trim()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract the 1-5 score and rationale from the verdict line. Tolerates the
/// score being bracketed and either an en dash or a hyphen before the
/// rationale.
fn parse_verdict(line: &str) -> Option<EmpathyVerdict> {
    let re = Regex::new(r"\[?([1-5])\]?\s*[–—-]\s*(.+)$").ok()?;
    let captures = re.captures(line)?;
    let score: u8 = captures.get(1)?.as_str().parse().ok()?;
    let rationale = captures.get(2)?.as_str().trim().to_string();
    if rationale.is_empty() {
        return None;
    }
    Some(EmpathyVerdict { score, rationale })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Role;

    fn nurse_line(timestamp_seconds: u64, text: &str) -> ReconciledLine {
        ReconciledLine {
            timestamp_seconds,
            role: Role::Nurse,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_prompt_contains_flattened_transcript() {
        let prompt = build_scoring_prompt(&[
            nurse_line(5, "shalom, ani ha'achot"),
            ReconciledLine {
                timestamp_seconds: 9,
                role: Role::Patient,
                text: "koev li".to_string(),
            },
        ]);
        assert!(prompt.contains("[00:00:05] Nurse: shalom, ani ha'achot"));
        assert!(prompt.contains("[00:00:09] Patient: koev li"));
        assert!(!prompt.contains("{final_transcript}"));
    }

    #[test]
    fn test_collapse_to_single_line() {
        let raw = "שפה אמפתית: 4 – first half\nsecond half";
        assert_eq!(
            collapse_to_single_line(raw),
            "שפה אמפתית: 4 – first half second half"
        );
    }

    #[test]
    fn test_collapse_folds_blank_lines_and_padding() {
        let raw = "  line one  \n\n   line two\n";
        assert_eq!(collapse_to_single_line(raw), "line one line two");
    }

    #[test]
    fn test_parse_verdict_en_dash() {
        let verdict = parse_verdict("שפה אמפתית: 4 – שיקוף ונרמול הופיעו").unwrap();
        assert_eq!(verdict.score, 4);
        assert_eq!(verdict.rationale, "שיקוף ונרמול הופיעו");
    }

    #[test]
    fn test_parse_verdict_bracketed_score_and_hyphen() {
        let verdict = parse_verdict("שפה אמפתית: [2] - מעט הכרה ברגש").unwrap();
        assert_eq!(verdict.score, 2);
        assert_eq!(verdict.rationale, "מעט הכרה ברגש");
    }

    #[test]
    fn test_parse_verdict_rejects_scoreless_line() {
        assert!(parse_verdict("no score in this line").is_none());
    }

    #[test]
    fn test_verdict_renders_back_to_contract_line() {
        let verdict = EmpathyVerdict {
            score: 5,
            rationale: "הכרה ברגש ושיקוף לאורך המפגש".to_string(),
        };
        assert_eq!(
            verdict.as_line(),
            "שפה אמפתית: 5 – הכרה ברגש ושיקוף לאורך המפגש"
        );
    }
}
