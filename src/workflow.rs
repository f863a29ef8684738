//! Approval state machine shared by both document kinds
//!
//! Each kind owns an ordered stage sequence plus the side-terminal
//! `Rejected` stage. `advance` walks the sequence one step, `reject`
//! jumps to `Rejected`. Neither knows who is authorized to act; the
//! caller checks that before it gets here.

/// Result of applying an action to a document's stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Stage moved one step forward in the sequence.
    Advanced,
    /// Stage moved to the side-terminal `Rejected`.
    Rejected,
    /// Document was already terminal; stage left unchanged. This is
    /// informational, not an error.
    AlreadyTerminal,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStage {
    #[n(0)]
    PendingFinance,
    #[n(1)]
    ApprovedFinance,
    #[n(2)]
    ApprovedManager,
    #[n(3)]
    ApprovedCeo,
    #[n(4)]
    Rejected,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStage {
    #[n(0)]
    PendingCeo,
    #[n(1)]
    PendingFactory,
    #[n(2)]
    Exited,
    #[n(3)]
    Rejected,
}

/// Ordered stage sequence of one document kind.
pub trait StageFlow: Copy + Eq + Sized + 'static {
    /// Approval sequence in order, terminal stage last. Does not
    /// include `Rejected`.
    fn sequence() -> &'static [Self];
    /// The side-terminal rejected stage.
    fn rejected() -> Self;
    /// Whether a reject action is refused at this stage. The two kinds
    /// block at different points; see the per-kind impls.
    fn reject_blocked(self) -> bool;
    /// Human-readable stage label for replies.
    fn label(self) -> &'static str;

    fn first() -> Self {
        Self::sequence()[0]
    }
    fn is_terminal(self) -> bool {
        self == Self::rejected() || Self::sequence().last() == Some(&self)
    }
}

impl StageFlow for PaymentStage {
    fn sequence() -> &'static [Self] {
        &[
            Self::PendingFinance,
            Self::ApprovedFinance,
            Self::ApprovedManager,
            Self::ApprovedCeo,
        ]
    }
    fn rejected() -> Self {
        Self::Rejected
    }
    // Payments refuse a reject only once fully approved. A rejected
    // payment may still receive reject actions; the first rejection
    // record wins.
    fn reject_blocked(self) -> bool {
        self == Self::ApprovedCeo
    }
    fn label(self) -> &'static str {
        match self {
            Self::PendingFinance => "Pending Finance",
            Self::ApprovedFinance => "Approved by Finance",
            Self::ApprovedManager => "Approved by Manager",
            Self::ApprovedCeo => "Approved by CEO",
            Self::Rejected => "Rejected",
        }
    }
}

impl StageFlow for ExitStage {
    fn sequence() -> &'static [Self] {
        &[Self::PendingCeo, Self::PendingFactory, Self::Exited]
    }
    fn rejected() -> Self {
        Self::Rejected
    }
    // Exit permits refuse a reject only once the cargo has exited.
    fn reject_blocked(self) -> bool {
        self == Self::Exited
    }
    fn label(self) -> &'static str {
        match self {
            Self::PendingCeo => "Pending CEO",
            Self::PendingFactory => "Pending Factory",
            Self::Exited => "Exited",
            Self::Rejected => "Rejected",
        }
    }
}

/// Move a stage one step forward in its kind's sequence.
///
/// A terminal or rejected stage is returned unchanged with
/// [`Outcome::AlreadyTerminal`]; there is no un-rejecting via advance.
pub fn advance<S: StageFlow>(stage: S) -> (S, Outcome) {
    if stage == S::rejected() {
        return (stage, Outcome::AlreadyTerminal);
    }
    let seq = S::sequence();
    let Some(idx) = seq.iter().position(|s| *s == stage) else {
        return (stage, Outcome::AlreadyTerminal);
    };
    match seq.get(idx + 1) {
        Some(next) => (*next, Outcome::Advanced),
        None => (stage, Outcome::AlreadyTerminal),
    }
}

/// Move a stage to `Rejected`, unless the kind's terminal rule blocks it.
pub fn reject<S: StageFlow>(stage: S) -> (S, Outcome) {
    if stage.reject_blocked() {
        (stage, Outcome::AlreadyTerminal)
    } else {
        (S::rejected(), Outcome::Rejected)
    }
}
