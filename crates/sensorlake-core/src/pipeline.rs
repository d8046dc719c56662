use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Fold applied by rollup and aggregate transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fold {
    Sum,
    Mean,
    Min,
    Max,
    Count,
    Stddev,
    First,
    Last,
}

impl Fold {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Min => "min",
            Self::Max => "max",
            Self::Count => "count",
            Self::Stddev => "stddev",
            Self::First => "first",
            Self::Last => "last",
        }
    }
}

impl Display for Fold {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gap-filling strategy for interpolate transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    Linear,
    /// Zero-order hold.
    Zoh,
}

impl Interpolation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Zoh => "zoh",
        }
    }
}

/// One server-side transform descriptor. Never interpreted client-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineFunction {
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<String>,
}

impl PipelineFunction {
    pub fn new<I, S>(name: impl Into<String>, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            arguments: arguments.into_iter().map(Into::into).collect(),
        }
    }
}

/// Ordered transform chain carried with a read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    pub functions: Vec<PipelineFunction>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, function: PipelineFunction) -> Self {
        self.functions.push(function);
        self
    }

    /// Rolls values up per `period` (ISO-8601 duration, e.g. `PT1H`).
    pub fn rollup(self, fold: Fold, period: impl Into<String>) -> Self {
        self.then(PipelineFunction::new(
            "rollup",
            [fold.as_str().to_owned(), period.into()],
        ))
    }

    pub fn interpolate(self, interpolation: Interpolation, period: impl Into<String>) -> Self {
        self.then(PipelineFunction::new(
            "interpolate",
            [interpolation.as_str().to_owned(), period.into()],
        ))
    }

    /// Folds all selected series into one.
    pub fn aggregate(self, fold: Fold) -> Self {
        self.then(PipelineFunction::new("aggregation", [fold.as_str()]))
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PipelineFunction> {
        self.functions.iter()
    }
}
