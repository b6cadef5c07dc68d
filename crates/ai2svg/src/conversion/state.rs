//! Transition table for the page conversion loop.
//!
//! | State              | Signal                      | Next state                         |
//! |--------------------|-----------------------------|------------------------------------|
//! | `ProbingPage(0)`   | `Failed`                    | `Failed(FirstPage)`                |
//! | `ProbingPage(n>0)` | `Failed`                    | `Succeeded`                        |
//! | `ProbingPage(n)`   | `Empty`, nothing collected  | `FallbackAttempt`                  |
//! | `ProbingPage(n)`   | `Empty`, pages collected    | `Succeeded`                        |
//! | `ProbingPage(n)`   | `Exported`, `n + 1 < max`   | `ProbingPage(n + 1)`               |
//! | `ProbingPage(n)`   | `Exported`, `n + 1 == max`  | `Succeeded`                        |
//! | `FallbackAttempt`  | `Exported`                  | `Succeeded`                        |
//! | `FallbackAttempt`  | `Empty` or `Failed`         | `Failed(Fallback)`                 |
//!
//! A failure is only trusted as an end-of-pages signal after at least one page was
//! exported; on the first page it means the input is unreadable.

/// What one converter invocation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSignal {
    /// Non-empty SVG text was written
    Exported(String),
    /// The converter succeeded but wrote nothing (or an empty file)
    Empty,
    /// The converter failed
    Failed { diagnostic: String },
}

impl PageSignal {
    fn diagnostic(&self) -> Option<String> {
        match self {
            PageSignal::Failed { diagnostic } => Some(diagnostic.clone()),
            _ => None,
        }
    }
}

/// Which strategy gave up when the loop ends in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    FirstPage,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopState {
    ProbingPage(usize),
    FallbackAttempt,
    Succeeded,
    Failed {
        stage: FailureStage,
        diagnostic: Option<String>,
    },
}

impl LoopState {
    /// Initial state of every conversion.
    pub fn start() -> Self {
        LoopState::ProbingPage(0)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LoopState::Succeeded | LoopState::Failed { .. })
    }

    /// Advance the machine given the signal observed in the current state.
    ///
    /// `collected` is the number of pages exported before this signal.
    pub fn next(&self, signal: &PageSignal, collected: usize, max_pages: usize) -> LoopState {
        match self {
            LoopState::ProbingPage(index) => match signal {
                PageSignal::Failed { .. } if *index == 0 => LoopState::Failed {
                    stage: FailureStage::FirstPage,
                    diagnostic: signal.diagnostic(),
                },
                PageSignal::Failed { .. } | PageSignal::Empty => {
                    if collected > 0 {
                        LoopState::Succeeded
                    } else {
                        LoopState::FallbackAttempt
                    }
                }
                PageSignal::Exported(_) => {
                    if index + 1 < max_pages {
                        LoopState::ProbingPage(index + 1)
                    } else {
                        LoopState::Succeeded
                    }
                }
            },
            LoopState::FallbackAttempt => match signal {
                PageSignal::Exported(_) => LoopState::Succeeded,
                PageSignal::Empty | PageSignal::Failed { .. } => LoopState::Failed {
                    stage: FailureStage::Fallback,
                    diagnostic: signal.diagnostic(),
                },
            },
            terminal => terminal.clone(),
        }
    }
}
