//! Named collections of restrictors, combined with ALL/ANY logic.

use crate::error::Result;
use crate::Restrictor;

/// How per-restrictor verdicts combine into the set's verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CombinationLogic {
    /// Every restrictor must be satisfied
    #[default]
    All,
    /// At least one restrictor must be satisfied
    Any,
}

impl CombinationLogic {
    /// Combine individual verdicts. An empty list never satisfies, under
    /// either logic.
    pub fn combine(&self, verdicts: &[bool]) -> bool {
        if verdicts.is_empty() {
            return false;
        }
        match self {
            CombinationLogic::All => verdicts.iter().all(|v| *v),
            CombinationLogic::Any => verdicts.iter().any(|v| *v),
        }
    }
}

impl std::fmt::Display for CombinationLogic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CombinationLogic::All => f.write_str("all"),
            CombinationLogic::Any => f.write_str("any"),
        }
    }
}

/// A named, user-owned collection of restrictors.
///
/// # Example
/// ```
/// use flight_track::{CombinationLogic, GpsPoint, Restrictor, RestrictorSet};
///
/// let set = RestrictorSet::new("Arrivals", CombinationLogic::All)
///     .with_user("ops@example.com")
///     .with_tag("sfo")
///     .with_restrictor(Restrictor::square_box("SFO", GpsPoint::new(37.6188, -122.3750), 10.0).unwrap());
///
/// assert_eq!(set.len(), 1);
/// assert_eq!(set.oneline_string(), "Arrivals[sfo], SFO: 10.0km box at (37.61880,-122.37500), any altitude");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RestrictorSet {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub user: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub logic: CombinationLogic,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tags: Vec<String>,
    pub restrictors: Vec<Restrictor>,
}

impl RestrictorSet {
    pub fn new(name: &str, logic: CombinationLogic) -> Self {
        Self {
            name: name.to_string(),
            logic,
            ..Default::default()
        }
    }

    pub fn with_user(mut self, user: &str) -> Self {
        self.user = user.to_string();
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    pub fn with_restrictor(mut self, restrictor: Restrictor) -> Self {
        self.restrictors.push(restrictor);
        self
    }

    pub fn push(&mut self, restrictor: Restrictor) {
        self.restrictors.push(restrictor);
    }

    pub fn len(&self) -> usize {
        self.restrictors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.restrictors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Restrictor> {
        self.restrictors.iter()
    }

    /// Validate every restrictor (useful after deserializing).
    pub fn validate(&self) -> Result<()> {
        self.restrictors.iter().try_for_each(Restrictor::validate)
    }

    pub fn combine(&self, verdicts: &[bool]) -> bool {
        self.logic.combine(verdicts)
    }

    /// Compact single-line summary for report headers.
    pub fn oneline_string(&self) -> String {
        let tags = if self.tags.is_empty() {
            String::new()
        } else {
            format!("[{}]", self.tags.join(","))
        };
        let logic = match (self.restrictors.len() > 1, self.logic) {
            (false, _) => "",
            (true, CombinationLogic::All) => "All of: ",
            (true, CombinationLogic::Any) => "Any of: ",
        };
        let restrictors: Vec<String> = self.restrictors.iter().map(Restrictor::describe).collect();
        format!("{}{}, {}{}", self.name, tags, logic, restrictors.join("; "))
    }
}

impl std::fmt::Display for RestrictorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "RestrictorSet '{}' <{}>", self.name, self.user)?;
        writeln!(f, "* Tags: [{}]", self.tags.join(","))?;
        writeln!(f, "{} of:-", self.logic)?;
        for (i, r) in self.restrictors.iter().enumerate() {
            writeln!(f, "* [{:02}] {}", i, r)?;
        }
        Ok(())
    }
}
