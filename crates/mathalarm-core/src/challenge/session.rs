//! Dismiss challenge state machine.
//!
//! One session per alarm firing. The signal plays from activation until the
//! challenge is solved or the session ends some other way.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Active -> Solved
//!           |  ^
//!           +--+  wrong answer
//!           |
//!           +-> Cancelled
//! ```
//!
//! `Solved` and `Cancelled` are terminal. Dropping an `Active` session stops
//! the signal as well.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use super::problem::{Challenge, ChallengePolicy, WrongAnswerPolicy};
use crate::alarm::AlarmId;
use crate::events::Event;
use crate::signal::{SignalGuard, SignalOutput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Active,
    Solved,
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Solved | SessionState::Cancelled)
    }
}

pub struct DismissSession<S: SignalOutput> {
    alarm_id: AlarmId,
    policy: ChallengePolicy,
    looping: bool,
    state: SessionState,
    challenge: Option<Challenge>,
    attempts: u32,
    signal: SignalGuard<S>,
    rng: Box<dyn RngCore + Send>,
}

impl<S: SignalOutput> DismissSession<S> {
    pub fn new(alarm_id: AlarmId, policy: ChallengePolicy, output: S) -> Self {
        Self::with_rng(alarm_id, policy, output, StdRng::from_entropy())
    }

    /// Session with a caller-supplied random source (seeded in tests).
    pub fn with_rng(
        alarm_id: AlarmId,
        policy: ChallengePolicy,
        output: S,
        rng: impl RngCore + Send + 'static,
    ) -> Self {
        Self {
            alarm_id,
            policy,
            looping: true,
            state: SessionState::Idle,
            challenge: None,
            attempts: 0,
            signal: SignalGuard::new(output),
            rng: Box::new(rng),
        }
    }

    /// Play the signal once instead of looping it.
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn alarm_id(&self) -> AlarmId {
        self.alarm_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn challenge(&self) -> Option<&Challenge> {
        self.challenge.as_ref()
    }

    /// Number of answers submitted while active.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_signal_active(&self) -> bool {
        self.signal.is_playing()
    }

    pub fn signal(&self) -> &S {
        self.signal.output()
    }

    pub fn snapshot(&self) -> Event {
        Event::ChallengeSnapshot {
            alarm_id: self.alarm_id,
            state: self.state,
            prompt: self.challenge.as_ref().map(Challenge::prompt),
            attempts: self.attempts,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Notification arrived: issue a problem and start ringing.
    pub fn activate(&mut self) -> Option<Event> {
        if self.state != SessionState::Idle {
            return None;
        }
        let challenge = Challenge::generate(&self.policy, &mut self.rng);
        tracing::debug!(alarm_id = %self.alarm_id, problem = %challenge, "challenge issued");
        let prompt = challenge.prompt();
        self.challenge = Some(challenge);
        self.state = SessionState::Active;
        self.signal.acquire(self.looping);
        Some(Event::ChallengeIssued {
            alarm_id: self.alarm_id,
            prompt,
            at: Utc::now(),
        })
    }

    /// Judge a raw text answer.
    ///
    /// Returns `ChallengeSolved` or `ChallengeFailed`, or `None` when the
    /// session is not active.
    pub fn submit(&mut self, raw: &str) -> Option<Event> {
        if self.state != SessionState::Active {
            return None;
        }
        let challenge = self.challenge.as_mut()?;
        self.attempts += 1;

        if challenge.check(raw) {
            self.state = SessionState::Solved;
            self.signal.release();
            tracing::info!(alarm_id = %self.alarm_id, attempts = self.attempts, "alarm dismissed");
            return Some(Event::ChallengeSolved {
                alarm_id: self.alarm_id,
                attempts: self.attempts,
                at: Utc::now(),
            });
        }

        let regenerated = self.policy.on_wrong_answer == WrongAnswerPolicy::Regenerate;
        if regenerated {
            *challenge = Challenge::generate(&self.policy, &mut self.rng);
        }
        tracing::debug!(alarm_id = %self.alarm_id, attempts = self.attempts, regenerated, "wrong answer");
        Some(Event::ChallengeFailed {
            alarm_id: self.alarm_id,
            attempts: self.attempts,
            regenerated,
            prompt: challenge.prompt(),
            at: Utc::now(),
        })
    }

    /// User backed out. The signal stops; the alarm counts as not dismissed.
    pub fn cancel(&mut self) -> Option<Event> {
        if self.state.is_terminal() {
            return None;
        }
        self.state = SessionState::Cancelled;
        self.signal.release();
        tracing::info!(alarm_id = %self.alarm_id, "challenge cancelled");
        Some(Event::ChallengeCancelled {
            alarm_id: self.alarm_id,
            attempts: self.attempts,
            at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::OperatorSet;
    use rand_pcg::Mcg128Xsl64;

    #[derive(Debug, Default)]
    struct Recorder {
        starts: Vec<bool>,
        stops: u32,
    }

    impl SignalOutput for Recorder {
        fn start(&mut self, looping: bool) {
            self.starts.push(looping);
        }
        fn stop(&mut self) {
            self.stops += 1;
        }
    }

    fn session(policy: ChallengePolicy) -> DismissSession<Recorder> {
        DismissSession::with_rng(
            AlarmId::new(),
            policy,
            Recorder::default(),
            Mcg128Xsl64::seed_from_u64(42),
        )
    }

    fn expected(s: &DismissSession<Recorder>) -> i64 {
        s.challenge().unwrap().expected()
    }

    #[test]
    fn activate_starts_looping_signal() {
        let mut s = session(ChallengePolicy::default());
        assert_eq!(s.state(), SessionState::Idle);
        assert!(s.challenge().is_none());

        assert!(matches!(s.activate(), Some(Event::ChallengeIssued { .. })));
        assert_eq!(s.state(), SessionState::Active);
        assert_eq!(s.signal().starts, vec![true]);
        assert!(s.is_signal_active());

        assert!(s.activate().is_none());
        assert_eq!(s.signal().starts.len(), 1);
    }

    #[test]
    fn correct_answer_solves_and_stops_signal() {
        let mut s = session(ChallengePolicy::default());
        s.activate();
        let answer = expected(&s).to_string();
        match s.submit(&answer) {
            Some(Event::ChallengeSolved { attempts, .. }) => assert_eq!(attempts, 1),
            other => panic!("Expected ChallengeSolved, got {other:?}"),
        }
        assert_eq!(s.state(), SessionState::Solved);
        assert_eq!(s.signal().stops, 1);
        assert!(!s.is_signal_active());
    }

    #[test]
    fn wrong_answer_keeps_ringing() {
        let mut s = session(ChallengePolicy::default());
        s.activate();
        let wrong = (expected(&s) + 1).to_string();
        assert!(matches!(s.submit(&wrong), Some(Event::ChallengeFailed { .. })));
        assert!(matches!(s.submit("seven"), Some(Event::ChallengeFailed { .. })));
        assert_eq!(s.state(), SessionState::Active);
        assert_eq!(s.signal().stops, 0);
        assert_eq!(s.attempts(), 2);
    }

    #[test]
    fn keep_problem_policy_keeps_challenge() {
        let mut s = session(ChallengePolicy {
            on_wrong_answer: WrongAnswerPolicy::KeepProblem,
            ..ChallengePolicy::default()
        });
        s.activate();
        let before = s.challenge().cloned();
        match s.submit("not a number") {
            Some(Event::ChallengeFailed { regenerated, .. }) => assert!(!regenerated),
            other => panic!("Expected ChallengeFailed, got {other:?}"),
        }
        assert_eq!(s.challenge().cloned(), before);
    }

    #[test]
    fn regenerate_policy_reports_fresh_prompt() {
        let mut s = session(ChallengePolicy {
            operators: OperatorSet::Addition,
            ..ChallengePolicy::default()
        });
        s.activate();
        match s.submit("-1") {
            Some(Event::ChallengeFailed {
                regenerated, prompt, ..
            }) => {
                assert!(regenerated);
                assert_eq!(prompt, s.challenge().unwrap().prompt());
            }
            other => panic!("Expected ChallengeFailed, got {other:?}"),
        }
        let answer = expected(&s).to_string();
        assert!(matches!(s.submit(&answer), Some(Event::ChallengeSolved { attempts: 2, .. })));
    }

    #[test]
    fn submit_before_activation_is_ignored() {
        let mut s = session(ChallengePolicy::default());
        assert!(s.submit("1").is_none());
        assert_eq!(s.attempts(), 0);
    }

    #[test]
    fn solved_session_ignores_further_input() {
        let mut s = session(ChallengePolicy::default());
        s.activate();
        let answer = expected(&s).to_string();
        s.submit(&answer);
        assert!(s.submit(&answer).is_none());
        assert!(s.cancel().is_none());
        assert_eq!(s.signal().stops, 1);
    }

    #[test]
    fn cancel_releases_signal_once() {
        let mut s = session(ChallengePolicy::default());
        s.activate();
        assert!(matches!(s.cancel(), Some(Event::ChallengeCancelled { .. })));
        assert!(s.cancel().is_none());
        assert_eq!(s.state(), SessionState::Cancelled);
        assert_eq!(s.signal().stops, 1);
    }

    #[test]
    fn dropping_active_session_stops_signal() {
        let mut device = Recorder::default();
        {
            let mut s = DismissSession::with_rng(
                AlarmId::new(),
                ChallengePolicy::default(),
                &mut device,
                Mcg128Xsl64::seed_from_u64(3),
            );
            s.activate();
        }
        assert_eq!(device.starts.len(), 1);
        assert_eq!(device.stops, 1);
    }

    #[test]
    fn dropping_solved_session_does_not_stop_twice() {
        let mut device = Recorder::default();
        {
            let mut s = DismissSession::with_rng(
                AlarmId::new(),
                ChallengePolicy::default(),
                &mut device,
                Mcg128Xsl64::seed_from_u64(5),
            );
            s.activate();
            let answer = s.challenge().unwrap().expected().to_string();
            s.submit(&answer);
        }
        assert_eq!(device.stops, 1);
    }
}
