use crate::job::{Job, OverwriteQuestion};
use grove_store::EntityId;

/// What to do about one file-name collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    Overwrite,
    Keep,
    /// The question went unanswered. The existing file is kept.
    NoAnswer,
}

/// Decides, once per collision, whether a moving file replaces the file
/// already using its name.
///
/// One resolver lives for exactly one request: an "apply to all" answer is
/// remembered for the rest of that request and nowhere else.
#[derive(Debug)]
pub(crate) struct OverwriteResolver {
    interactive: bool,
    remembered: Option<bool>,
}
impl OverwriteResolver {
    pub(crate) fn new(interactive: bool) -> Self {
        Self { interactive, remembered: None }
    }

    pub(crate) async fn decide(&mut self, job: &dyn Job, source: &EntityId, destination: &EntityId) -> Decision {
        if !self.interactive {
            return Decision::Keep;
        }
        let overwrite = match self.remembered {
            Some(overwrite) => overwrite,
            None => {
                let question = OverwriteQuestion { source: source.clone(), destination: destination.clone() };
                let Some(answer) = job.ask(question).await else {
                    return Decision::NoAnswer;
                };
                if answer.apply_to_all {
                    tracing::debug!(overwrite = answer.overwrite, "Remembering overwrite answer for remaining collisions");
                    self.remembered = Some(answer.overwrite);
                }
                answer.overwrite
            },
        };
        if overwrite { Decision::Overwrite } else { Decision::Keep }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::OverwriteDecision;
    use async_trait::async_trait;
    use rstest::rstest;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Answers questions from a script and counts how many were asked.
    struct Scripted {
        answers: Mutex<VecDeque<Option<OverwriteDecision>>>,
        asked: Mutex<usize>,
    }
    impl Scripted {
        fn new(answers: impl IntoIterator<Item = Option<OverwriteDecision>>) -> Self {
            Self { answers: Mutex::new(answers.into_iter().collect()), asked: Mutex::new(0) }
        }

        fn asked(&self) -> usize {
            *self.asked.lock().unwrap()
        }
    }
    #[async_trait]
    impl Job for Scripted {
        fn push_level(&self, _steps: usize) {}
        fn step(&self) {}
        fn pop_level(&self) {}
        async fn ask(&self, _question: OverwriteQuestion) -> Option<OverwriteDecision> {
            *self.asked.lock().unwrap() += 1;
            self.answers.lock().unwrap().pop_front().flatten()
        }
        fn is_cancelled(&self) -> bool {
            false
        }
    }

    fn id(name: &str) -> EntityId {
        EntityId::new("Drive", name).unwrap()
    }

    fn answer(overwrite: bool, apply_to_all: bool) -> Option<OverwriteDecision> {
        Some(OverwriteDecision { overwrite, apply_to_all })
    }

    #[tokio::test]
    async fn test_non_interactive_never_asks() {
        let job = Scripted::new([answer(true, false)]);
        let mut resolver = OverwriteResolver::new(false);
        assert_eq!(resolver.decide(&job, &id("f"), &id("g")).await, Decision::Keep);
        assert_eq!(job.asked(), 0);
    }

    #[rstest]
    #[case(true, Decision::Overwrite)]
    #[case(false, Decision::Keep)]
    #[tokio::test]
    async fn test_apply_to_all_is_remembered(#[case] overwrite: bool, #[case] expected: Decision) {
        let job = Scripted::new([answer(overwrite, true)]);
        let mut resolver = OverwriteResolver::new(true);
        for _ in 0..3 {
            assert_eq!(resolver.decide(&job, &id("f"), &id("g")).await, expected);
        }
        assert_eq!(job.asked(), 1);
    }

    #[tokio::test]
    async fn test_asks_again_without_apply_to_all() {
        let job = Scripted::new([answer(true, false), answer(false, false)]);
        let mut resolver = OverwriteResolver::new(true);
        assert_eq!(resolver.decide(&job, &id("f1"), &id("g1")).await, Decision::Overwrite);
        assert_eq!(resolver.decide(&job, &id("f2"), &id("g2")).await, Decision::Keep);
        assert_eq!(job.asked(), 2);
    }

    #[tokio::test]
    async fn test_no_answer_is_not_remembered() {
        let job = Scripted::new([None, answer(true, false)]);
        let mut resolver = OverwriteResolver::new(true);
        assert_eq!(resolver.decide(&job, &id("f"), &id("g")).await, Decision::NoAnswer);
        assert_eq!(resolver.decide(&job, &id("f"), &id("g")).await, Decision::Overwrite);
    }
}
