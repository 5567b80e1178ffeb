mod problem;
mod session;

pub use problem::{
    parse_answer, Challenge, ChallengePolicy, ChallengeState, Operator, OperatorSet,
    WrongAnswerPolicy,
};
pub use session::{DismissSession, SessionState};
