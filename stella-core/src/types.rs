//! Core domain types shared across stella modules
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Assessment** | Ordered sections of questions answered once per attempt |
//! | **Module** | A training unit from the catalog (EVA fundamentals, core conditioning, ...) |
//! | **Exercise** | One drill inside a module; completing it earns credits |
//! | **Session** | A timed run through a module with start/pause/resume/end |
//! | **Guidance** | A message plus action items produced by STELLA |

use serde::{Deserialize, Serialize};

// ============================================
// Assessments
// ============================================

/// Which assessment a definition belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssessmentType {
    #[serde(rename = "initial")]
    Initial,
    #[serde(rename = "module-specific")]
    Module,
    #[serde(rename = "mission-specific")]
    Mission,
}

impl AssessmentType {
    pub const ALL: [AssessmentType; 3] = [
        AssessmentType::Initial,
        AssessmentType::Module,
        AssessmentType::Mission,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentType::Initial => "initial",
            AssessmentType::Module => "module-specific",
            AssessmentType::Mission => "mission-specific",
        }
    }
}

impl std::fmt::Display for AssessmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AssessmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initial" => Ok(AssessmentType::Initial),
            "module-specific" | "module" => Ok(AssessmentType::Module),
            "mission-specific" | "mission" => Ok(AssessmentType::Mission),
            _ => Err(format!("unknown assessment type: {}", s)),
        }
    }
}

// ============================================
// Exercises
// ============================================

/// Every exercise the training catalog knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Exercise {
    Plank,
    SingleLegStand,
    Squat,
    Pushup,
    Burpee,
    TreadmillIntervals,
    RowingIntervals,
    SuitDonning,
    TetherManagement,
    ToolHandling,
    AirlockProcedure,
    VestibularChair,
}

impl Exercise {
    pub const ALL: [Exercise; 12] = [
        Exercise::Plank,
        Exercise::SingleLegStand,
        Exercise::Squat,
        Exercise::Pushup,
        Exercise::Burpee,
        Exercise::TreadmillIntervals,
        Exercise::RowingIntervals,
        Exercise::SuitDonning,
        Exercise::TetherManagement,
        Exercise::ToolHandling,
        Exercise::AirlockProcedure,
        Exercise::VestibularChair,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Exercise::Plank => "plank",
            Exercise::SingleLegStand => "single-leg-stand",
            Exercise::Squat => "squat",
            Exercise::Pushup => "pushup",
            Exercise::Burpee => "burpee",
            Exercise::TreadmillIntervals => "treadmill-intervals",
            Exercise::RowingIntervals => "rowing-intervals",
            Exercise::SuitDonning => "suit-donning",
            Exercise::TetherManagement => "tether-management",
            Exercise::ToolHandling => "tool-handling",
            Exercise::AirlockProcedure => "airlock-procedure",
            Exercise::VestibularChair => "vestibular-chair",
        }
    }
}

impl std::fmt::Display for Exercise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Exercise {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase().replace('_', "-");
        Exercise::ALL
            .into_iter()
            .find(|e| e.as_str() == needle)
            .ok_or_else(|| format!("unknown exercise: {}", s))
    }
}

// ============================================
// Guidance
// ============================================

/// How urgently a guidance message should be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A guidance message produced for one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidanceRecord {
    pub message: String,
    #[serde(default)]
    pub action_items: Vec<String>,
    #[serde(default)]
    pub priority: Priority,
}

impl GuidanceRecord {
    pub fn new(message: impl Into<String>, priority: Priority) -> Self {
        Self {
            message: message.into(),
            action_items: Vec::new(),
            priority,
        }
    }

    pub fn with_actions<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.action_items = items.into_iter().map(Into::into).collect();
        self
    }
}
