use std::{collections::VecDeque, time::Duration};

/// Single entry of a timed sequence.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Step<A> {
    /// Suspends the sequence until the duration has elapsed.
    Wait(Duration),
    /// Hands the action back to the owner for execution.
    Run(A),
}

/// Result of advancing a sequence by one tick.
#[derive(Debug, PartialEq)]
pub(crate) enum Advance<A> {
    /// The sequence is suspended on a wait step.
    Waiting,
    /// The next action is ready for execution.
    Run(A),
    /// No steps remain.
    Finished,
}

/// Ordered step list advanced at most one step per tick.
#[derive(Clone, Debug)]
pub(crate) struct Sequence<A> {
    steps: VecDeque<Step<A>>,
    elapsed: Duration,
}

impl<A> Sequence<A> {
    pub(crate) fn new(steps: Vec<Step<A>>) -> Self {
        Self {
            steps: steps.into(),
            elapsed: Duration::ZERO,
        }
    }

    pub(crate) fn advance(&mut self, dt: Duration) -> Advance<A> {
        let Some(front) = self.steps.front() else {
            return Advance::Finished;
        };

        if let Step::Wait(duration) = front {
            let duration = *duration;
            self.elapsed = self.elapsed.saturating_add(dt);
            if self.elapsed >= duration {
                self.elapsed = Duration::ZERO;
                let _ = self.steps.pop_front();
            }
            return Advance::Waiting;
        }

        match self.steps.pop_front() {
            Some(Step::Run(action)) => Advance::Run(action),
            Some(Step::Wait(_)) | None => Advance::Finished,
        }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.steps.is_empty()
    }

    /// Drops every pending step, returning how many were skipped.
    pub(crate) fn skip_remaining(&mut self) -> usize {
        let skipped = self.steps.len();
        self.steps.clear();
        self.elapsed = Duration::ZERO;
        skipped
    }

    pub(crate) fn extend(&mut self, steps: Vec<Step<A>>) {
        self.steps.extend(steps);
    }
}
