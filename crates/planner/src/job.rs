//! Job port: progress reporting, user questions and cancellation.
//!
//! The planner never talks to a user or a scheduler directly. It reports
//! progress, asks whether to overwrite, and checks for cancellation through
//! [`Job`]. [`JobStatus`] is the reference implementation, handing questions
//! to whoever holds the matching [`QuestionReceiver`].

use async_trait::async_trait;
use grove_store::EntityId;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Asked when a moving file collides with a file of the same display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverwriteQuestion {
    /// The file being moved.
    pub source: EntityId,
    /// The file already occupying the destination.
    pub destination: EntityId,
}

/// Answer to an [`OverwriteQuestion`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverwriteDecision {
    pub overwrite: bool,
    /// Reuse this answer for every later collision of the same request.
    pub apply_to_all: bool,
}

/// Everything a running request needs from its surroundings.
#[async_trait]
pub trait Job: Send + Sync {
    /// Enter a sub-operation made of `steps` items.
    fn push_level(&self, steps: usize);
    /// One item of the innermost sub-operation is done.
    fn step(&self);
    /// Leave the innermost sub-operation.
    fn pop_level(&self);
    /// Suspend until the question is answered. `None` means no answer will
    /// come (the job was cancelled or nobody is listening).
    async fn ask(&self, question: OverwriteQuestion) -> Option<OverwriteDecision>;
    fn is_cancelled(&self) -> bool;
}

/// A progress level that is popped when dropped, so every early return (or
/// `?`) leaves the progress stack balanced.
#[must_use = "the level is popped as soon as the guard is dropped"]
pub struct ProgressLevel<'a> {
    job: &'a dyn Job,
}
impl<'a> ProgressLevel<'a> {
    pub fn push(job: &'a dyn Job, steps: usize) -> Self {
        job.push_level(steps);
        Self { job }
    }

    pub fn step(&self) {
        self.job.step();
    }
}
impl Drop for ProgressLevel<'_> {
    fn drop(&mut self) {
        self.job.pop_level();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frame {
    total: usize,
    completed: usize,
}

/// Nested progress stack.
///
/// Each frame is a sub-operation of one step of the frame below it, so a
/// frame that is half done contributes half a step to its parent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    frames: Vec<Frame>,
}
impl Progress {
    pub fn push(&mut self, total: usize) {
        self.frames.push(Frame { total, completed: 0 });
    }

    /// Advance the innermost frame. Steps past a frame's total are ignored.
    pub fn step(&mut self) {
        match self.frames.last_mut() {
            Some(frame) if frame.completed < frame.total => frame.completed += 1,
            Some(frame) => tracing::warn!(total = frame.total, "Progress step beyond level total ignored"),
            None => tracing::warn!("Progress step without a level ignored"),
        }
    }

    pub fn pop(&mut self) {
        if self.frames.pop().is_none() {
            tracing::warn!("Progress level popped more often than pushed");
        }
    }

    /// Number of levels currently entered.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Overall completion in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        let mut fraction = 0.0;
        let mut scale = 1.0;
        for frame in &self.frames {
            if frame.total == 0 {
                break;
            }
            let total = frame.total as f64;
            fraction += scale * frame.completed as f64 / total;
            scale /= total;
        }
        fraction.clamp(0.0, 1.0)
    }
}

/// A question waiting for an answer.
///
/// Dropping it unanswered interrupts the question.
#[derive(Debug)]
pub struct PendingQuestion {
    question: OverwriteQuestion,
    reply: oneshot::Sender<OverwriteDecision>,
}
impl PendingQuestion {
    pub fn question(&self) -> &OverwriteQuestion {
        &self.question
    }

    /// Returns `false` if the asking side stopped waiting.
    pub fn answer(self, decision: OverwriteDecision) -> bool {
        self.reply.send(decision).is_ok()
    }
}

pub type QuestionReceiver = mpsc::Receiver<PendingQuestion>;

/// Reference [`Job`]: progress behind a mutex, questions over a channel and
/// cooperative cancellation through a [`CancellationToken`].
///
/// # Examples
///
/// ```
/// use grove_planner::{Job, JobStatus, OverwriteDecision, OverwriteQuestion};
/// use grove_store::EntityId;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let (job, mut questions) = JobStatus::new();
/// tokio::spawn(async move {
///     while let Some(pending) = questions.recv().await {
///         pending.answer(OverwriteDecision { overwrite: true, apply_to_all: false });
///     }
/// });
///
/// let question = OverwriteQuestion {
///     source: EntityId::new("Drive", "new")?,
///     destination: EntityId::new("Drive", "old")?,
/// };
/// assert_eq!(job.ask(question).await.map(|d| d.overwrite), Some(true));
/// # Ok(())
/// # }
/// ```
pub struct JobStatus {
    progress: Mutex<Progress>,
    questions: mpsc::Sender<PendingQuestion>,
    cancel: CancellationToken,
}
impl JobStatus {
    /// Questions are asked one at a time, so a single slot is enough.
    const QUESTION_BUFFER: usize = 1;

    pub fn new() -> (Self, QuestionReceiver) {
        Self::with_token(CancellationToken::new())
    }

    /// Create a job cancelled through (a child of) an existing token.
    pub fn with_token(cancel: CancellationToken) -> (Self, QuestionReceiver) {
        let (questions, receiver) = mpsc::channel(Self::QUESTION_BUFFER);
        let status = Self {
            progress: Mutex::new(Progress::default()),
            questions,
            cancel,
        };
        (status, receiver)
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Snapshot of the progress stack.
    pub fn progress(&self) -> Progress {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Progress> {
        // Progress is plain counters; a panic elsewhere cannot leave it half-updated.
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Job for JobStatus {
    fn push_level(&self, steps: usize) {
        self.lock().push(steps);
    }

    fn step(&self) {
        self.lock().step();
    }

    fn pop_level(&self) {
        self.lock().pop();
    }

    async fn ask(&self, question: OverwriteQuestion) -> Option<OverwriteDecision> {
        let (reply, answer) = oneshot::channel();
        let pending = PendingQuestion { question, reply };
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => return None,
            sent = self.questions.send(pending) => sent.ok()?,
        }
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => None,
            answer = answer => answer.ok(),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> OverwriteQuestion {
        OverwriteQuestion {
            source: EntityId::new("Drive", "new").unwrap(),
            destination: EntityId::new("Drive", "old").unwrap(),
        }
    }

    #[test]
    fn test_fraction_nests() {
        let mut progress = Progress::default();
        assert_eq!(progress.fraction(), 0.0);
        progress.push(4);
        progress.step();
        assert_eq!(progress.fraction(), 0.25);
        // Half of the second item.
        progress.push(2);
        progress.step();
        assert_eq!(progress.fraction(), 0.375);
        progress.pop();
        progress.step();
        assert_eq!(progress.fraction(), 0.5);
    }

    #[test]
    fn test_step_never_exceeds_total() {
        let mut progress = Progress::default();
        progress.push(1);
        progress.step();
        progress.step();
        assert_eq!(progress.fraction(), 1.0);
        progress.pop();
        progress.pop();
        assert_eq!(progress.depth(), 0);
    }

    #[test]
    fn test_guard_pops_on_drop() {
        let (job, _questions) = JobStatus::new();
        {
            let outer = ProgressLevel::push(&job, 2);
            let _inner = ProgressLevel::push(&job, 3);
            assert_eq!(job.progress().depth(), 2);
            outer.step();
        }
        assert_eq!(job.progress().depth(), 0);
    }

    #[tokio::test]
    async fn test_ask_is_answered() {
        let (job, mut questions) = JobStatus::new();
        let answering = tokio::spawn(async move {
            let pending = questions.recv().await.unwrap();
            assert_eq!(pending.question(), &question());
            pending.answer(OverwriteDecision { overwrite: true, apply_to_all: true })
        });
        let decision = job.ask(question()).await;
        assert_eq!(decision, Some(OverwriteDecision { overwrite: true, apply_to_all: true }));
        assert!(answering.await.unwrap());
    }

    #[tokio::test]
    async fn test_dropped_question_is_interrupted() {
        let (job, mut questions) = JobStatus::new();
        tokio::spawn(async move {
            drop(questions.recv().await);
        });
        assert_eq!(job.ask(question()).await, None);
    }

    #[tokio::test]
    async fn test_nobody_listening_is_interrupted() {
        let (job, questions) = JobStatus::new();
        drop(questions);
        assert_eq!(job.ask(question()).await, None);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_waiting_question() {
        let (job, mut questions) = JobStatus::new();
        let token = job.cancellation_token();
        // Keep the question alive but never answer it.
        let holder = tokio::spawn(async move {
            let pending = questions.recv().await;
            token.cancel();
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            drop(pending);
        });
        assert_eq!(job.ask(question()).await, None);
        assert!(job.is_cancelled());
        holder.await.unwrap();
    }
}
