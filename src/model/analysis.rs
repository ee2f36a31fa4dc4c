use std::fmt;
use std::str::FromStr;

/// The three prioritisation analyses offered by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisKind {
    /// Classify a task into urgent/important quadrants
    Eisenhower,
    /// Pick the hardest, highest-impact task to do first
    Laborit,
    /// Judge whether a daily plan sits at a sustainable load
    YerkesDodson,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 3] = [
        AnalysisKind::Eisenhower,
        AnalysisKind::Laborit,
        AnalysisKind::YerkesDodson,
    ];

    /// Path segment under `/api/`
    pub fn endpoint(self) -> &'static str {
        match self {
            AnalysisKind::Eisenhower => "eisenhower",
            AnalysisKind::Laborit => "laborit",
            AnalysisKind::YerkesDodson => "yerkes-dodson",
        }
    }

    /// JSON field the backend reads the input from
    pub fn field(self) -> &'static str {
        match self {
            AnalysisKind::Eisenhower => "task",
            AnalysisKind::Laborit => "tasks",
            AnalysisKind::YerkesDodson => "plan",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            AnalysisKind::Eisenhower => "Eisenhower",
            AnalysisKind::Laborit => "Laborit",
            AnalysisKind::YerkesDodson => "Yerkes-Dodson",
        }
    }

    /// Prompt shown above the input box
    pub fn prompt(self) -> &'static str {
        match self {
            AnalysisKind::Eisenhower => "Describe a task to place in the Eisenhower matrix",
            AnalysisKind::Laborit => "List your tasks (with time estimates) to find the one to do first",
            AnalysisKind::YerkesDodson => "Paste your daily plan to check its load",
        }
    }

    /// Validation message for empty input
    pub fn empty_input_message(self) -> &'static str {
        match self {
            AnalysisKind::Eisenhower => "enter at least one task to analyze",
            AnalysisKind::Laborit => "enter a list of tasks to analyze",
            AnalysisKind::YerkesDodson => "enter a daily plan to analyze",
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            AnalysisKind::Eisenhower => "task analyzed",
            AnalysisKind::Laborit => "task list analyzed",
            AnalysisKind::YerkesDodson => "daily plan analyzed",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

impl FromStr for AnalysisKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eisenhower" => Ok(AnalysisKind::Eisenhower),
            "laborit" => Ok(AnalysisKind::Laborit),
            "yerkes-dodson" | "yerkes" => Ok(AnalysisKind::YerkesDodson),
            other => Err(format!(
                "unknown analysis '{}' (expected: eisenhower, laborit, yerkes-dodson)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_and_fields() {
        assert_eq!(AnalysisKind::Eisenhower.endpoint(), "eisenhower");
        assert_eq!(AnalysisKind::Eisenhower.field(), "task");
        assert_eq!(AnalysisKind::Laborit.field(), "tasks");
        assert_eq!(AnalysisKind::YerkesDodson.endpoint(), "yerkes-dodson");
        assert_eq!(AnalysisKind::YerkesDodson.field(), "plan");
    }

    #[test]
    fn test_parse_round_trips_endpoint() {
        for kind in AnalysisKind::ALL {
            assert_eq!(kind.endpoint().parse::<AnalysisKind>(), Ok(kind));
        }
        assert!("pareto".parse::<AnalysisKind>().is_err());
    }
}
