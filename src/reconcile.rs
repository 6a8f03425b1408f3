//! Multi-source reconciliation: merging the independent transcripts of one
//! simulation session into a single role-tagged dialogue.
//!
//! Role assignment and cross-source temporal merge need semantic judgment
//! beyond string matching, so the merge itself is delegated to the chat
//! backend under a fixed instruction. This module owns building that request
//! deterministically and parsing the response; it never invents or alters
//! dialogue content.

use crate::error::MergeError;
use crate::llm_client::send_chat_completion;
use crate::settings::ChatSettings;
use crate::transcript::{parse_timestamp, ReconciledLine, Role, SourceTranscript};
use log::{debug, info, warn};
use std::collections::HashSet;

const MERGE_SYSTEM_PROMPT: &str =
    "You merge transcripts faithfully. Output ONLY the cleaned, role-tagged transcript.";

const MERGE_TEMPERATURE: f32 = 0.1;
const MERGE_MAX_TOKENS: u32 = 4000;

/// The fixed merge instruction. Rules 1-11 govern ordering, fidelity, role
/// assignment, OOC tagging and duplicate collapse across sources.
const MERGE_PREAMBLE: &str = r#"You are reviewing a Hebrew-language nursing simulation dialogue.
Each of the three transcripts comes from a different camera angle or microphone and may contain only part of the conversation.
The transcriptions were generated automatically using Whisper, so they may include errors such as:
- Missing or incomplete sentences
- Repeated or disfluent phrases
- Slight timing misalignment

Your task is to reconstruct a **clean, coherent, and chronologically accurate** transcript using the following rules:

1. **Use the timestamps ([HH:MM:SS])** to place lines in the correct order. Reconstruct the conversation sequence based on time, even if the lines appear in different transcripts.
2. **Do NOT add or imagine content.** Only use what appears in the provided transcripts.
3. **Fix transcription errors where appropriate, but retain as much of the original information as possible.** Prioritize keeping all clinically or contextually meaningful content from the transcripts, even if phrased imperfectly. Only omit redundant, broken, or clearly meaningless lines.
4. **Assign speaker roles** based on content and context. Use only these roles:
   - `Nurse`
   - `Patient`
5. Do NOT alternate roles mechanically. Assign roles based on what is said.
6. If the same line appears in more than one transcript, **merge or choose the clearest version**. Avoid duplication.
7. Keep the transcript in a natural, readable flow that resembles a real dialogue.
8. **Fix malformed Hebrew words** when clearly misrecognized (e.g., "להתעברר" → "להתאוורר"), but do not invent content.
9. Preserve **simulation-side comments** (like when the nurse speaks to herself, to colleagues, or refers to the patient in third person such as “אותה”). These are **in-character clinical planning remarks**, not spoken to the patient. Keep them in the flow and tag them as `Nurse`, not as OOC.
10. If someone speaks **outside of character (OOC)** — for example, asking instructors, reacting to simulation errors, or breaking the scene — keep the line, and **tag it clearly** as one of:
    - `Nurse (OOC)`
    - `Patient (OOC)`
11. Treat repeated "תודה רבה" at the end or start of the transcripts as likely Whisper artifacts — omit them from the final merged transcript unless clearly part of the dialogue.

Return only the cleaned and role-tagged transcript in the following format:
[HH:MM:SS] Role: Sentence"#;

/// Render the deterministic merge payload: the fixed preamble followed by
/// each source transcript as a numbered block, in upload order. An empty
/// source list still yields a well-formed request that documents the absence
/// of transcripts.
pub fn build_merge_prompt(transcripts: &[SourceTranscript]) -> String {
    let mut parts = vec![
        MERGE_PREAMBLE.to_string(),
        "\nHere are the raw transcripts:".to_string(),
    ];
    if transcripts.is_empty() {
        parts.push("\n(Empty input — no transcripts provided.)".to_string());
    } else {
        for (i, transcript) in transcripts.iter().enumerate() {
            parts.push(format!("\nTRANSCRIPT {}:\n{}\n", i + 1, transcript.render()));
        }
    }
    parts.join("\n")
}

/// Merge the session's source transcripts into one chronological,
/// role-tagged dialogue.
pub async fn reconcile(
    transcripts: &[SourceTranscript],
    chat: &ChatSettings,
) -> Result<Vec<ReconciledLine>, MergeError> {
    let prompt = build_merge_prompt(transcripts);
    info!(
        "Merging {} transcript(s) ({} chars of payload)",
        transcripts.len(),
        prompt.len()
    );

    let api_key = chat.resolved_api_key().unwrap_or_default();
    let raw = send_chat_completion(
        &chat.base_url,
        &api_key,
        &chat.model,
        MERGE_SYSTEM_PROMPT,
        &prompt,
        MERGE_TEMPERATURE,
        MERGE_MAX_TOKENS,
    )
    .await?;

    let raw = raw.trim();
    if raw.is_empty() {
        return Err(MergeError::EmptyResponse);
    }

    let lines = parse_reconciled(raw);
    if lines.is_empty() {
        return Err(MergeError::MalformedResponse {
            raw: raw.to_string(),
        });
    }
    info!("Reconciled dialogue has {} line(s)", lines.len());
    Ok(lines)
}

/// Parse `[HH:MM:SS] Role: Sentence` lines out of the merge response.
/// Malformed lines are skipped, duplicate (timestamp, text) pairs are
/// collapsed, and the result is ordered by timestamp.
pub fn parse_reconciled(raw: &str) -> Vec<ReconciledLine> {
    let mut seen: HashSet<(u64, String)> = HashSet::new();
    let mut lines = Vec::new();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_reconciled_line(line) {
            Some(parsed) => {
                if seen.insert((parsed.timestamp_seconds, parsed.text.clone())) {
                    lines.push(parsed);
                } else {
                    debug!("Dropping duplicate merged line: {:?}", line);
                }
            }
            None => warn!("Skipping unparseable merge line: {:?}", line),
        }
    }

    lines.sort_by_key(|line| line.timestamp_seconds);
    lines
}

fn parse_reconciled_line(line: &str) -> Option<ReconciledLine> {
    let rest = line.strip_prefix('[')?;
    let close = rest.find(']')?;
    let timestamp_seconds = parse_timestamp(&rest[..close])?;
    let after = rest[close + 1..].trim_start();
    let (role_part, text_part) = after.split_once(':')?;
    let role = Role::parse(role_part)?;
    let text = text_part.trim();
    if text.is_empty() {
        return None;
    }
    Some(ReconciledLine {
        timestamp_seconds,
        role,
        text: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::TranscriptLine;

    fn source(lines: &[(u64, &str)]) -> SourceTranscript {
        SourceTranscript {
            lines: lines
                .iter()
                .map(|(timestamp_seconds, text)| TranscriptLine {
                    timestamp_seconds: *timestamp_seconds,
                    text: text.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_prompt_renders_sources_in_upload_order() {
        let prompt = build_merge_prompt(&[
            source(&[(0, "shalom"), (5, "ma shlomech")]),
            source(&[(2, "shalom shalom")]),
        ]);
        let first = prompt.find("TRANSCRIPT 1:").unwrap();
        let second = prompt.find("TRANSCRIPT 2:").unwrap();
        assert!(first < second);
        assert!(prompt.contains("[00:00:00] shalom\n[00:00:05] ma shlomech"));
        assert!(prompt.contains("[00:00:02] shalom shalom"));
    }

    #[test]
    fn test_prompt_for_empty_input_is_well_formed() {
        let prompt = build_merge_prompt(&[]);
        assert!(prompt.contains("(Empty input — no transcripts provided.)"));
        assert!(!prompt.contains("TRANSCRIPT 1:"));
        assert!(prompt.starts_with("You are reviewing a Hebrew-language nursing simulation dialogue."));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let sources = vec![source(&[(0, "line one")]), source(&[(1, "line two")])];
        assert_eq!(build_merge_prompt(&sources), build_merge_prompt(&sources));
    }

    #[test]
    fn test_parse_reconciled_roles_and_order() {
        let raw = "[00:00:10] Patient: boker tov\n\
                   [00:00:05] Nurse: shalom, ani ha'achot\n\
                   [00:01:00] Nurse (OOC): should I restart the scenario?";
        let lines = parse_reconciled(raw);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].role, Role::Nurse);
        assert_eq!(lines[0].timestamp_seconds, 5);
        assert_eq!(lines[1].role, Role::Patient);
        assert_eq!(lines[2].role, Role::NurseOoc);
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let raw = "Here is the transcript:\n\
                   [00:00:05] Nurse: shalom\n\
                   not a transcript line\n\
                   [bad time] Patient: hm\n\
                   [00:00:08] Doctor: not a valid role";
        let lines = parse_reconciled(raw);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "shalom");
    }

    #[test]
    fn test_parse_collapses_duplicate_timestamp_text_pairs() {
        let raw = "[00:00:05] Nurse: shalom\n[00:00:05] Nurse: shalom";
        assert_eq!(parse_reconciled(raw).len(), 1);
    }

    #[test]
    fn test_parse_rejects_empty_text() {
        assert!(parse_reconciled("[00:00:05] Nurse:").is_empty());
        assert!(parse_reconciled("[00:00:05] Nurse:   ").is_empty());
    }
}
