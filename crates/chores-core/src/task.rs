use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    /// Catch-all for unrecognized persisted values. Never offered for
    /// input; sorts last and renders without color.
    Unknown,
}

// Persisted priority values are read leniently: anything unrecognized
// becomes `Unknown` instead of poisoning the whole task array.
impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Self::Low,
            "medium" => Self::Medium,
            "high" => Self::High,
            _ => Self::Unknown,
        })
    }
}

impl Priority {
    pub fn weight(self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
            Self::Unknown => 0,
        }
    }

    /// The stable token used on the command line, empty for `Unknown`.
    pub fn code(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Unknown => "",
        }
    }

    pub fn label_key(self) -> &'static str {
        match self {
            Self::High => "priority.high",
            Self::Medium => "priority.medium",
            Self::Low => "priority.low",
            Self::Unknown => "priority.unknown",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(anyhow::anyhow!(
                "invalid priority '{other}' (expected low, medium or high)"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    pub text: String,

    #[serde(default = "default_priority")]
    pub priority: Priority,

    #[serde(default, deserialize_with = "opt_date_lenient")]
    pub start_date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "opt_date_lenient")]
    pub end_date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "opt_text_lenient")]
    pub category: Option<String>,

    #[serde(default)]
    pub completed: bool,

    /// Assigned once at creation. Records persisted by older versions may
    /// lack it; those get the load instant instead and keep it from then on.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(
        text: String,
        priority: Priority,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        category: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            priority,
            start_date,
            end_date,
            category,
            completed: false,
            created_at: now,
        }
    }
}

/// Distinct non-empty categories across all tasks, sorted for a stable
/// display order.
pub fn distinct_categories(tasks: &[Task]) -> Vec<String> {
    let mut out: Vec<String> = tasks
        .iter()
        .filter_map(|task| task.category.as_deref())
        .filter(|category| !category.is_empty())
        .map(str::to_string)
        .collect();
    out.sort();
    out.dedup();
    out
}

fn default_priority() -> Priority {
    Priority::Unknown
}

// The original storage format kept unset dates and categories as empty
// strings rather than omitting them.
fn opt_date_lenient<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse::<NaiveDate>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

fn opt_text_lenient<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty()))
}
