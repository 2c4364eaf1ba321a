use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub const UNKNOWN_LABEL: &str = "unknown";

/// The closed set of tasks that have a planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Cleaning,
    Cooking,
    Dishwashing,
    Laundry,
    Organizing,
}

impl TaskKind {
    pub const ALL: [TaskKind; 5] = [
        TaskKind::Cleaning,
        TaskKind::Cooking,
        TaskKind::Dishwashing,
        TaskKind::Laundry,
        TaskKind::Organizing,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Cleaning => "cleaning",
            TaskKind::Cooking => "cooking",
            TaskKind::Dishwashing => "dishwashing",
            TaskKind::Laundry => "laundry",
            TaskKind::Organizing => "organizing",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        TaskKind::ALL.iter().copied().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classifier output label.
///
/// `Other` covers class names a model artifact declares beyond the closed set;
/// they carry no planner and surface as configuration faults downstream.
/// Serialized as the bare label string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum TaskLabel {
    Task(TaskKind),
    Other(String),
    Unknown,
}

impl TaskLabel {
    pub fn from_name(name: &str) -> Self {
        if name == UNKNOWN_LABEL {
            TaskLabel::Unknown
        } else if let Some(kind) = TaskKind::from_name(name) {
            TaskLabel::Task(kind)
        } else {
            TaskLabel::Other(name.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaskLabel::Task(kind) => kind.as_str(),
            TaskLabel::Other(name) => name,
            TaskLabel::Unknown => UNKNOWN_LABEL,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, TaskLabel::Unknown)
    }
}

impl From<TaskKind> for TaskLabel {
    fn from(kind: TaskKind) -> Self {
        TaskLabel::Task(kind)
    }
}

impl From<String> for TaskLabel {
    fn from(name: String) -> Self {
        TaskLabel::from_name(&name)
    }
}

impl From<TaskLabel> for String {
    fn from(label: TaskLabel) -> Self {
        match label {
            TaskLabel::Other(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for TaskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Class probabilities in the model's declared class order.
///
/// Keys are exactly the model's known classes (never `unknown`); values sum to 1
/// within floating point tolerance. Serializes as a JSON object in class order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProbabilityDistribution {
    entries: Vec<(String, f64)>,
}

impl ProbabilityDistribution {
    pub fn from_entries(entries: Vec<(String, f64)>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, class: &str) -> Option<f64> {
        self.entries.iter().find(|(name, _)| name == class).map(|(_, p)| *p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(name, p)| (name.as_str(), *p))
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn sum(&self) -> f64 {
        self.entries.iter().map(|(_, p)| p).sum()
    }

    /// First class holding the highest probability.
    pub fn argmax(&self) -> Option<(&str, f64)> {
        let mut best: Option<(&str, f64)> = None;
        for (name, p) in self.iter() {
            match best {
                Some((_, best_p)) if p <= best_p => {}
                _ => best = Some((name, p)),
            }
        }
        best
    }
}

impl Serialize for ProbabilityDistribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, p) in &self.entries {
            map.serialize_entry(name, p)?;
        }
        map.end()
    }
}

struct DistributionVisitor;

impl<'de> Visitor<'de> for DistributionVisitor {
    type Value = ProbabilityDistribution;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of class name to probability")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((name, p)) = access.next_entry::<String, f64>()? {
            entries.push((name, p));
        }
        Ok(ProbabilityDistribution { entries })
    }
}

impl<'de> Deserialize<'de> for ProbabilityDistribution {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(DistributionVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parsing() {
        assert_eq!(TaskLabel::from_name("laundry"), TaskLabel::Task(TaskKind::Laundry));
        assert_eq!(TaskLabel::from_name("unknown"), TaskLabel::Unknown);
        assert_eq!(TaskLabel::from_name("foo"), TaskLabel::Other("foo".into()));
    }

    #[test]
    fn test_label_serializes_as_string() {
        let json = serde_json::to_string(&TaskLabel::Task(TaskKind::Dishwashing)).unwrap();
        assert_eq!(json, "\"dishwashing\"");
        let back: TaskLabel = serde_json::from_str("\"foo\"").unwrap();
        assert_eq!(back, TaskLabel::Other("foo".into()));
    }

    #[test]
    fn test_argmax_prefers_first_on_tie() {
        let probs = ProbabilityDistribution::from_entries(vec![
            ("a".into(), 0.4),
            ("b".into(), 0.4),
            ("c".into(), 0.2),
        ]);
        assert_eq!(probs.argmax(), Some(("a", 0.4)));
    }

    #[test]
    fn test_distribution_keeps_class_order_through_json() {
        let probs = ProbabilityDistribution::from_entries(vec![
            ("zeta".into(), 0.7),
            ("alpha".into(), 0.3),
        ]);
        let json = serde_json::to_string(&probs).unwrap();
        assert_eq!(json, r#"{"zeta":0.7,"alpha":0.3}"#);
        let back: ProbabilityDistribution = serde_json::from_str(&json).unwrap();
        assert_eq!(back, probs);
        assert_eq!(back.classes().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
    }
}
