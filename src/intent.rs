//! The closed set of interpreted chat commands

/// Structured result of interpreting one raw text command. Exactly one
/// variant is produced per input, never partially filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    ApprovePayment(u32),
    RejectPayment(u32),
    ApproveExit(u32),
    RejectExit(u32),
    /// The bare number matched documents of both kinds; the caller must
    /// repeat the command with an explicit type keyword.
    Ambiguous(u32),
    /// The bare number matched no document of either kind.
    NotFound(u32),
    CreatePayment {
        amount: u64,
        payee: String,
        description: String,
        bank: Option<String>,
    },
    CreateExit {
        count: u32,
        item_name: String,
        recipient: String,
        driver: Option<String>,
        plate: Option<String>,
    },
    Report,
    Help,
    Unrecognized,
}

/// Read-only lookup of documents by display number, across both kinds.
/// Backing the generic-command rule: a number present in both kinds is
/// ambiguous and must not be routed silently.
pub trait DocumentIndex {
    fn has_payment(&self, number: u32) -> bool;
    fn has_exit(&self, number: u32) -> bool;
}
