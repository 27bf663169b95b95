//! Section extraction for generated insight text.
//!
//! Generated replies are a sequence of labeled blocks:
//!
//! ```text
//! [DASHBOARD STATUS]
//! Grid stable, battery discharging slowly.
//! [ALERT]
//! None
//! ```
//!
//! Parsing is a single linear pass that collects tag markers with their
//! offsets, followed by slicing the text between consecutive markers. A tag
//! marker is `[label]` on one line where the label contains at least one
//! letter; bracketed numbers such as citation marks (`[1]`) are content.

use ecopulse_core::NOT_AVAILABLE;

/// The labeled blocks requested from the generation backend, in prompt order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionTag {
    DashboardStatus,
    EnergyInsight,
    AiPrediction,
    SolarForecast,
    Alert,
    RecommendedAction,
    SustainabilityImpact,
    Narrative,
}

impl SectionTag {
    /// Tags requested in every mode.
    pub const REQUIRED: [SectionTag; 7] = [
        SectionTag::DashboardStatus,
        SectionTag::EnergyInsight,
        SectionTag::AiPrediction,
        SectionTag::SolarForecast,
        SectionTag::Alert,
        SectionTag::RecommendedAction,
        SectionTag::SustainabilityImpact,
    ];

    /// The literal label between the brackets.
    pub fn label(self) -> &'static str {
        match self {
            SectionTag::DashboardStatus => "DASHBOARD STATUS",
            SectionTag::EnergyInsight => "ENERGY INSIGHT",
            SectionTag::AiPrediction => "AI PREDICTION",
            SectionTag::SolarForecast => "SOLAR FORECAST",
            SectionTag::Alert => "ALERT",
            SectionTag::RecommendedAction => "RECOMMENDED ACTION",
            SectionTag::SustainabilityImpact => "SUSTAINABILITY IMPACT",
            SectionTag::Narrative => "NARRATIVE",
        }
    }

    /// The bracketed marker as it appears in text, e.g. `[ALERT]`.
    pub fn marker(self) -> String {
        format!("[{}]", self.label())
    }
}

impl std::fmt::Display for SectionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A tag marker found in the text.
#[derive(Debug, Clone, Copy)]
struct Marker {
    /// Byte range of the label (between the brackets)
    label: (usize, usize),
    /// Offset of the opening bracket
    start: usize,
    /// Offset just past the closing bracket
    content_start: usize,
}

/// Sections of a generated text, in order of appearance.
#[derive(Debug, Clone, Default)]
pub struct SectionMap<'a> {
    sections: Vec<(&'a str, &'a str)>,
}

impl<'a> SectionMap<'a> {
    /// Scan the text once and slice it into labeled sections.
    pub fn parse(text: &'a str) -> Self {
        let markers = scan_markers(text);
        let sections = markers
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let end = markers.get(i + 1).map_or(text.len(), |next| next.start);
                (&text[m.label.0..m.label.1], &text[m.content_start..end])
            })
            .collect();
        Self { sections }
    }

    /// Trimmed content of the first section whose label matches `tag`
    /// case-insensitively, or `"N/A"` when absent or blank.
    pub fn get(&self, tag: &str) -> String {
        let wanted = tag.to_lowercase();
        self.sections
            .iter()
            .find(|(label, _)| label.to_lowercase() == wanted)
            .map(|(_, content)| content.trim())
            .filter(|content| !content.is_empty())
            .unwrap_or(NOT_AVAILABLE)
            .to_string()
    }

    /// Convenience lookup by typed tag.
    pub fn section(&self, tag: SectionTag) -> String {
        self.get(tag.label())
    }

    /// Labels in order of appearance (duplicates included).
    #[cfg(test)]
    fn labels(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.sections.iter().map(|(label, _)| *label)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Extract the trimmed content following `[section_tag]`.
///
/// Returns `"N/A"` when the tag is missing or its content is blank.
pub fn extract_section(full_text: &str, section_tag: &str) -> String {
    SectionMap::parse(full_text).get(section_tag)
}

fn scan_markers(text: &str) -> Vec<Marker> {
    let bytes = text.as_bytes();
    let mut markers = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'[' {
            i += 1;
            continue;
        }

        let label_start = i + 1;
        let mut j = label_start;
        while j < bytes.len() && !matches!(bytes[j], b'[' | b']' | b'\n') {
            j += 1;
        }

        if j < bytes.len() && bytes[j] == b']' && is_tag_label(&text[label_start..j]) {
            markers.push(Marker {
                label: (label_start, j),
                start: i,
                content_start: j + 1,
            });
            i = j + 1;
        } else {
            // No '[' between i and j, so the next candidate starts at j
            i = j;
        }
    }

    markers
}

fn is_tag_label(label: &str) -> bool {
    !label.trim().is_empty() && label.chars().any(char::is_alphabetic)
}
