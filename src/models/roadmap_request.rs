use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

macro_rules! choice_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| {
                        let options: Vec<&str> = $name::ALL.iter().map(|v| v.label()).collect();
                        format!("'{}' is not one of: {}", s, options.join(", "))
                    })
            }
        }
    };
}

choice_enum!(
    /// Exam the roadmap prepares for.
    Goal {
        Upsc => "UPSC",
        Jee => "JEE",
        Neet => "NEET",
        Gate => "GATE",
        Ca => "CA",
    }
);

choice_enum!(LearningSpeed {
    Fast => "Fast learner",
    Medium => "Medium learner",
    Slow => "Slow learner",
});

choice_enum!(LearningLevel {
    Beginner => "Beginner",
    Intermediate => "Intermediate",
    Advanced => "Advanced",
});

/// Per-field validation messages keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn insert(&mut self, field: &str, message: impl Into<String>) {
        self.0.insert(field.to_string(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        f.write_str(&parts.join("; "))
    }
}

/// Roadmap form as filled by the user. Every field may still be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapForm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_goal: Option<Goal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_speed: Option<LearningSpeed>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_level: Option<LearningLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

/// A fully validated roadmap request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoadmapParams {
    pub goal: Goal,
    pub speed: LearningSpeed,
    pub level: LearningLevel,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl RoadmapForm {
    pub fn validate(&self) -> Result<RoadmapParams, FieldErrors> {
        let mut errors = FieldErrors::default();

        if self.end_goal.is_none() {
            errors.insert("endGoal", "Please select an end goal");
        }
        if self.learning_speed.is_none() {
            errors.insert("learningSpeed", "Please select your learning speed");
        }
        if self.learning_level.is_none() {
            errors.insert("learningLevel", "Please select your learning level");
        }
        if self.start_date.is_none() {
            errors.insert("startDate", "Please select a start date");
        }
        if self.end_date.is_none() {
            errors.insert("endDate", "Please select an end date");
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                errors.insert("dateRange", "End date must be after start date");
            }
        }

        match (
            self.end_goal,
            self.learning_speed,
            self.learning_level,
            self.start_date,
            self.end_date,
        ) {
            (Some(goal), Some(speed), Some(level), Some(start_date), Some(end_date))
                if errors.is_empty() =>
            {
                Ok(RoadmapParams {
                    goal,
                    speed,
                    level,
                    start_date,
                    end_date,
                })
            }
            _ => Err(errors),
        }
    }
}

impl From<RoadmapParams> for RoadmapForm {
    fn from(params: RoadmapParams) -> Self {
        Self {
            end_goal: Some(params.goal),
            learning_speed: Some(params.speed),
            learning_level: Some(params.level),
            start_date: Some(params.start_date),
            end_date: Some(params.end_date),
        }
    }
}
