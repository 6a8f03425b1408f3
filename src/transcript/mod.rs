//! Transcript data model shared between the pipeline, the reconciler and
//! the scorer.

pub mod consolidate;
pub mod filter;

use serde::{Deserialize, Serialize};

/// One timestamped utterance on a single recording's clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptLine {
    /// Seconds from the start of the source recording.
    pub timestamp_seconds: u64,
    /// Non-empty after trimming.
    pub text: String,
}

impl TranscriptLine {
    pub fn render(&self) -> String {
        format!("[{}] {}", format_timestamp(self.timestamp_seconds), self.text)
    }
}

/// Ordered lines produced from one uploaded recording. Timestamps are
/// non-decreasing within a source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTranscript {
    pub lines: Vec<TranscriptLine>,
}

impl SourceTranscript {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// The `[HH:MM:SS] text` block handed to the reconciler.
    pub fn render(&self) -> String {
        self.lines
            .iter()
            .map(TranscriptLine::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Speaker tag assigned by the reconciler. OOC marks dialogue spoken outside
/// the simulated scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Nurse,
    Patient,
    #[serde(rename = "Nurse (OOC)")]
    NurseOoc,
    #[serde(rename = "Patient (OOC)")]
    PatientOoc,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Nurse => "Nurse",
            Role::Patient => "Patient",
            Role::NurseOoc => "Nurse (OOC)",
            Role::PatientOoc => "Patient (OOC)",
        }
    }

    /// Accepts the rendered forms with or without the space before "(OOC)".
    pub fn parse(s: &str) -> Option<Role> {
        match s.trim() {
            "Nurse" => Some(Role::Nurse),
            "Patient" => Some(Role::Patient),
            "Nurse (OOC)" | "Nurse(OOC)" => Some(Role::NurseOoc),
            "Patient (OOC)" | "Patient(OOC)" => Some(Role::PatientOoc),
            _ => None,
        }
    }
}

/// One line of the merged, role-tagged dialogue, globally time-ordered
/// across all sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledLine {
    pub timestamp_seconds: u64,
    pub role: Role,
    pub text: String,
}

impl ReconciledLine {
    pub fn render(&self) -> String {
        format!(
            "[{}] {}: {}",
            format_timestamp(self.timestamp_seconds),
            self.role.as_str(),
            self.text
        )
    }
}

/// Zero-padded HH:MM:SS.
pub fn format_timestamp(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Parse HH:MM:SS (or MM:SS) back into seconds.
pub fn parse_timestamp(s: &str) -> Option<u64> {
    let parts: Vec<&str> = s.trim().split(':').collect();
    let (h, m, sec) = match parts.as_slice() {
        [h, m, s] => (h.parse::<u64>().ok()?, m.parse::<u64>().ok()?, s.parse::<u64>().ok()?),
        [m, s] => (0, m.parse::<u64>().ok()?, s.parse::<u64>().ok()?),
        _ => return None,
    };
    if m >= 60 || sec >= 60 {
        return None;
    }
    Some(h * 3600 + m * 60 + sec)
}
