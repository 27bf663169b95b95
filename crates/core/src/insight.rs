//! Derived analysis outputs handed to the presentation layer.
//!
//! Everything here is a plain value type: serializable, cloneable, and free
//! of behavior beyond small read-only helpers.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// Sentinel substituted for any insight field whose section was not found.
pub const NOT_AVAILABLE: &str = "N/A";

/// How the generated insights should be phrased.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Concise technical tone
    #[default]
    Analytical,
    /// Figurative, narrative tone; also requests a narrative section
    Storytelling,
}

impl AnalysisMode {
    pub fn from_storytelling(storytelling: bool) -> Self {
        if storytelling {
            AnalysisMode::Storytelling
        } else {
            AnalysisMode::Analytical
        }
    }

    pub fn is_storytelling(self) -> bool {
        self == AnalysisMode::Storytelling
    }

    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            AnalysisMode::Analytical => AnalysisMode::Storytelling,
            AnalysisMode::Storytelling => AnalysisMode::Analytical,
        }
    }
}

impl std::fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisMode::Analytical => f.write_str("analytical"),
            AnalysisMode::Storytelling => f.write_str("storytelling"),
        }
    }
}

impl std::str::FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "analytical" => Ok(AnalysisMode::Analytical),
            "storytelling" => Ok(AnalysisMode::Storytelling),
            other => Err(format!("unknown analysis mode '{other}'")),
        }
    }
}

/// Typed insight record assembled from the generated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightRecord {
    pub status: String,
    pub insight: String,
    pub prediction: String,
    pub solar_forecast: String,
    pub alert: String,
    pub action: String,
    pub impact: String,

    /// Only produced in storytelling mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

impl InsightRecord {
    /// The fixed record returned when the generation call fails.
    pub fn fallback() -> Self {
        Self {
            status: "Error".into(),
            insight: "Telemetry link severed.".into(),
            prediction: NOT_AVAILABLE.into(),
            solar_forecast: NOT_AVAILABLE.into(),
            alert: "System Failure".into(),
            action: "Reconnect".into(),
            impact: "Unknown".into(),
            narrative: None,
        }
    }

    /// A record with every required field set to the `N/A` sentinel.
    pub fn unavailable() -> Self {
        Self {
            status: NOT_AVAILABLE.into(),
            insight: NOT_AVAILABLE.into(),
            prediction: NOT_AVAILABLE.into(),
            solar_forecast: NOT_AVAILABLE.into(),
            alert: NOT_AVAILABLE.into(),
            action: NOT_AVAILABLE.into(),
            impact: NOT_AVAILABLE.into(),
            narrative: None,
        }
    }

    /// Whether this is the fixed failure record.
    pub fn is_fallback(&self) -> bool {
        *self == Self::fallback()
    }

    /// True when the alert section carries something worth highlighting.
    pub fn has_active_alert(&self) -> bool {
        let alert = self.alert.trim();
        !alert.is_empty() && alert != NOT_AVAILABLE && !alert.eq_ignore_ascii_case("none")
    }

    /// The lead text to show: the narrative in storytelling mode when one
    /// was produced, otherwise the status line.
    pub fn headline(&self, mode: AnalysisMode) -> &str {
        match (&self.narrative, mode) {
            (Some(narrative), AnalysisMode::Storytelling) if narrative != NOT_AVAILABLE => narrative,
            _ => &self.status,
        }
    }

    /// The required fields paired with their display labels, in prompt order.
    pub fn fields(&self) -> [(&'static str, &str); 7] {
        [
            ("status", &self.status),
            ("insight", &self.insight),
            ("prediction", &self.prediction),
            ("solar_forecast", &self.solar_forecast),
            ("alert", &self.alert),
            ("action", &self.action),
            ("impact", &self.impact),
        ]
    }
}

/// Projected battery runtime. Serialized as a number of hours or the string
/// `"infinite"` when the battery is charging or holding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HoursRemaining {
    Infinite,
    Finite(f64),
}

impl HoursRemaining {
    pub fn as_hours(self) -> Option<f64> {
        match self {
            HoursRemaining::Infinite => None,
            HoursRemaining::Finite(h) => Some(h),
        }
    }
}

impl Serialize for HoursRemaining {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            HoursRemaining::Infinite => serializer.serialize_str("infinite"),
            HoursRemaining::Finite(hours) => serializer.serialize_f64(*hours),
        }
    }
}

impl<'de> Deserialize<'de> for HoursRemaining {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Hours(f64),
            Label(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Hours(hours) => Ok(HoursRemaining::Finite(hours)),
            Raw::Label(label) if label.eq_ignore_ascii_case("infinite") => {
                Ok(HoursRemaining::Infinite)
            }
            Raw::Label(label) => Err(de::Error::custom(format!(
                "expected hours or \"infinite\", got \"{label}\""
            ))),
        }
    }
}

/// Battery-depletion projection computed from a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryProjection {
    /// "Charging" or "{h}h {m}m"
    pub label: String,

    /// Less than two hours of runtime left
    pub is_critical: bool,

    pub hours_remaining: HoursRemaining,

    /// Latest reserve reading is below 20 %
    #[serde(default)]
    pub reserve_low: bool,
}
