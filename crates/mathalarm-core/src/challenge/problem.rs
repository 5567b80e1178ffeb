//! Arithmetic problems used to dismiss a ringing alarm.

use std::fmt;
use std::ops::RangeInclusive;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Allowed values for a configured operand bound.
pub const OPERAND_BOUNDS: RangeInclusive<i64> = 1..=1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "×",
        }
    }

    /// Operands are `i32` so every result fits in an `i64`.
    pub fn apply(&self, a: i32, b: i32) -> i64 {
        let (a, b) = (i64::from(a), i64::from(b));
        match self {
            Operator::Add => a + b,
            Operator::Subtract => a - b,
            Operator::Multiply => a * b,
        }
    }
}

/// Which operators a generated problem may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorSet {
    /// Addition only.
    Addition,
    /// Addition, subtraction and multiplication.
    Mixed,
}

impl OperatorSet {
    pub fn operators(&self) -> &'static [Operator] {
        match self {
            OperatorSet::Addition => &[Operator::Add],
            OperatorSet::Mixed => &[Operator::Add, Operator::Subtract, Operator::Multiply],
        }
    }
}

/// What happens to the problem after a wrong answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrongAnswerPolicy {
    /// The same problem stays on screen.
    KeepProblem,
    /// A fresh problem replaces the failed one.
    Regenerate,
}

/// How dismiss challenges are generated and judged.
///
/// Operand bounds are checked against [`OPERAND_BOUNDS`] on deserialization,
/// so a policy loaded from config always yields solvable problems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawChallengePolicy")]
pub struct ChallengePolicy {
    pub operators: OperatorSet,
    pub on_wrong_answer: WrongAnswerPolicy,
    pub operand_min: i32,
    pub operand_max: i32,
}

#[derive(Deserialize)]
struct RawChallengePolicy {
    #[serde(default = "default_operators")]
    operators: OperatorSet,
    #[serde(default = "default_on_wrong_answer")]
    on_wrong_answer: WrongAnswerPolicy,
    #[serde(default = "default_operand_min")]
    operand_min: i64,
    #[serde(default = "default_operand_max")]
    operand_max: i64,
}

fn bounded_operand(value: i64) -> Result<i32, ValidationError> {
    if !OPERAND_BOUNDS.contains(&value) {
        return Err(ValidationError::OperandOutOfRange(value));
    }
    i32::try_from(value).map_err(|_| ValidationError::OperandOutOfRange(value))
}

impl TryFrom<RawChallengePolicy> for ChallengePolicy {
    type Error = ValidationError;

    fn try_from(raw: RawChallengePolicy) -> Result<Self, Self::Error> {
        Ok(Self {
            operators: raw.operators,
            on_wrong_answer: raw.on_wrong_answer,
            operand_min: bounded_operand(raw.operand_min)?,
            operand_max: bounded_operand(raw.operand_max)?,
        })
    }
}

fn default_operators() -> OperatorSet {
    OperatorSet::Mixed
}
fn default_on_wrong_answer() -> WrongAnswerPolicy {
    WrongAnswerPolicy::Regenerate
}
fn default_operand_min() -> i64 {
    1
}
fn default_operand_max() -> i64 {
    10
}

impl Default for ChallengePolicy {
    fn default() -> Self {
        Self {
            operators: default_operators(),
            on_wrong_answer: default_on_wrong_answer(),
            operand_min: 1,
            operand_max: 10,
        }
    }
}

impl ChallengePolicy {
    /// Inclusive operand bounds, ordered even if configured backwards.
    pub fn operand_range(&self) -> (i32, i32) {
        if self.operand_min <= self.operand_max {
            (self.operand_min, self.operand_max)
        } else {
            (self.operand_max, self.operand_min)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeState {
    Active,
    Solved,
}

/// One arithmetic problem. `expected` is always derived from the operands
/// and operator by the constructor; there is no way to deserialize one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Challenge {
    operands: (i32, i32),
    operator: Operator,
    expected: i64,
    state: ChallengeState,
}

impl Challenge {
    pub fn new(a: i32, b: i32, operator: Operator) -> Self {
        Self {
            operands: (a, b),
            operator,
            expected: operator.apply(a, b),
            state: ChallengeState::Active,
        }
    }

    /// Draw operands and operator uniformly according to `policy`.
    pub fn generate<R: Rng + ?Sized>(policy: &ChallengePolicy, rng: &mut R) -> Self {
        let (lo, hi) = policy.operand_range();
        let a = rng.gen_range(lo..=hi);
        let b = rng.gen_range(lo..=hi);
        let ops = policy.operators.operators();
        let operator = ops[rng.gen_range(0..ops.len())];
        Self::new(a, b, operator)
    }

    pub fn operands(&self) -> (i32, i32) {
        self.operands
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn expected(&self) -> i64 {
        self.expected
    }

    pub fn state(&self) -> ChallengeState {
        self.state
    }

    pub fn is_solved(&self) -> bool {
        self.state == ChallengeState::Solved
    }

    /// Text shown to the user, e.g. `"3 × 4 = ?"`.
    pub fn prompt(&self) -> String {
        format!("{self} = ?")
    }

    /// Judge a raw answer. A match moves the challenge to `Solved`; a solved
    /// challenge accepts nothing further.
    pub fn check(&mut self, raw: &str) -> bool {
        if self.state == ChallengeState::Solved {
            return false;
        }
        if parse_answer(raw) == Some(self.expected) {
            self.state = ChallengeState::Solved;
            return true;
        }
        false
    }
}

impl fmt::Display for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.operands.0,
            self.operator.symbol(),
            self.operands.1
        )
    }
}

/// Base-10 integer parse of user input. Anything else is `None`, which never
/// matches an expected value.
pub fn parse_answer(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}
