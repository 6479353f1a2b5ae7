use std::fmt;
use std::ops::{Index, IndexMut};

/// One of the four fixed pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum StepId {
    #[default]
    Search,
    Selection,
    Summary,
    Newsletter,
}

impl StepId {
    pub const ALL: [StepId; 4] = [
        StepId::Search,
        StepId::Selection,
        StepId::Summary,
        StepId::Newsletter,
    ];

    /// Wire ordinal, 1-based.
    pub fn ordinal(self) -> u8 {
        self.index() as u8 + 1
    }

    pub fn title(self) -> &'static str {
        match self {
            StepId::Search => "Search Results",
            StepId::Selection => "Best URLs",
            StepId::Summary => "Summary",
            StepId::Newsletter => "Newsletter",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StepId::Search => "Finding articles",
            StepId::Selection => "Selecting top articles",
            StepId::Summary => "Analyzing content",
            StepId::Newsletter => "Generating newsletter",
        }
    }

    fn index(self) -> usize {
        match self {
            StepId::Search => 0,
            StepId::Selection => 1,
            StepId::Summary => 2,
            StepId::Newsletter => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("step ordinal {0} is outside 1..=4")]
pub struct InvalidStepId(pub u64);

impl TryFrom<u64> for StepId {
    type Error = InvalidStepId;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(StepId::Search),
            2 => Ok(StepId::Selection),
            3 => Ok(StepId::Summary),
            4 => Ok(StepId::Newsletter),
            other => Err(InvalidStepId(other)),
        }
    }
}

impl TryFrom<u8> for StepId {
    type Error = InvalidStepId;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        StepId::try_from(u64::from(value))
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ordinal())
    }
}

/// Per-step progress. Only moves forward within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum StepStatus {
    #[default]
    Wait,
    Process,
    Finish,
}

impl StepStatus {
    pub fn has_started(self) -> bool {
        !matches!(self, StepStatus::Wait)
    }
}

/// Fixed table holding one value per step; all four keys always exist.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StepTable<T> {
    slots: [T; 4],
}

impl<T> Index<StepId> for StepTable<T> {
    type Output = T;

    fn index(&self, step: StepId) -> &T {
        &self.slots[step.index()]
    }
}

impl<T> IndexMut<StepId> for StepTable<T> {
    fn index_mut(&mut self, step: StepId) -> &mut T {
        &mut self.slots[step.index()]
    }
}
