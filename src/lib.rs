//! Payment-approval and logistics-tracking core
//!
//! Three tightly coupled pieces: a text-command intent interpreter, a
//! multi-stage approval state machine shared by payment orders and
//! cargo exit permits, and a gap-filling allocator for human-facing
//! document numbers. The chat channel and the web UI both drive the
//! same state machine and allocator through [`CommandExecutor`], so the
//! invariants (no duplicate numbers, no invalid stage transitions, no
//! silent routing of ambiguous numbers) hold regardless of entry point.
//!
//! The persistent store is sled with CBOR-encoded documents; the AI
//! fallback behind the parser is an OpenAI-compatible endpoint treated
//! strictly as a black box.

pub mod config;
pub mod document;
pub mod error;
pub mod executor;
pub mod fallback;
pub mod intent;
pub mod numbering;
pub mod parser;
pub mod store;
pub mod workflow;

pub use config::Config;
pub use document::{DocKind, ExitPermit, PaymentOrder, RejectionInfo, TimeStamp};
pub use error::{StoreError, ValidationError};
pub use executor::{CommandExecutor, Mutation, Reply};
pub use fallback::{FallbackIntent, IntentFallback, OpenAiFallback};
pub use intent::{DocumentIndex, Intent};
pub use numbering::next_number;
pub use parser::IntentParser;
pub use store::DocumentStore;
pub use workflow::{ExitStage, Outcome, PaymentStage, StageFlow};
