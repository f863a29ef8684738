//! Text-command intent interpreter
//!
//! Rules run as an ordered cascade; the first match wins and later
//! rules never see the text. Explicit-type commands sit above the
//! generic-number rule so an explicit keyword is never shadowed by the
//! ambiguity path, and the loose creation sentences sit below both so
//! "approve 1001" cannot be read as a creation attempt. The order is
//! pinned by the tests at the bottom of this file.

use super::fallback::IntentFallback;
use super::intent::{DocumentIndex, Intent};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::{debug, warn};

/// Commands starting with this marker never reach the AI fallback.
pub const RAW_COMMAND_MARKER: char = '/';

const DEFAULT_FALLBACK_TIMEOUT: Duration = Duration::from_secs(5);

static TYPED_ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(approve|confirm|ok|تایید|تأیید|reject|deny|رد)\s+(payment|pay|order|پرداخت|دستور|exit|permit|cargo|خروج|مجوز)\s+(\d+)$",
    )
    .expect("typed action pattern is valid")
});

static GENERIC_ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(approve|confirm|ok|تایید|تأیید|reject|deny|رد)\s+(\d+)$")
        .expect("generic action pattern is valid")
});

static CREATE_PAYMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:pay|payment)\s+(\d+)\s+to\s+(.+?)\s+for\s+(.+?)(?:\s+from\s+(.+?))?$")
        .expect("payment creation pattern is valid")
});

static CREATE_EXIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:exit|ship|send)\s+(\d+)\s+(.+?)\s+to\s+(.+?)(?:\s+driver\s+(.+?))?(?:\s+plate\s+(\S+))?$",
    )
    .expect("exit creation pattern is valid")
});

fn is_approve_word(word: &str) -> bool {
    matches!(
        word.to_lowercase().as_str(),
        "approve" | "confirm" | "ok" | "تایید" | "تأیید"
    )
}

fn is_payment_keyword(word: &str) -> bool {
    matches!(
        word.to_lowercase().as_str(),
        "payment" | "pay" | "order" | "پرداخت" | "دستور"
    )
}

/// Map Persian (U+06F0..) and Arabic-Indic (U+0660..) digit glyphs to
/// ASCII, leaving everything else untouched.
pub fn normalize_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '۰'..='۹' => char::from(b'0' + (c as u32 - '۰' as u32) as u8),
            '٠'..='٩' => char::from(b'0' + (c as u32 - '٠' as u32) as u8),
            other => other,
        })
        .collect()
}

pub struct IntentParser {
    fallback: Option<Arc<dyn IntentFallback>>,
    fallback_timeout: Duration,
}

impl Default for IntentParser {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentParser {
    /// Parser without an AI fallback; unmatched text is `Unrecognized`.
    pub fn new() -> Self {
        Self {
            fallback: None,
            fallback_timeout: DEFAULT_FALLBACK_TIMEOUT,
        }
    }

    pub fn with_fallback(fallback: Arc<dyn IntentFallback>, timeout: Duration) -> Self {
        Self {
            fallback: Some(fallback),
            fallback_timeout: timeout,
        }
    }

    /// Interpret one raw command. Never returns an error: anything the
    /// rules and the fallback cannot place comes back as
    /// [`Intent::Unrecognized`].
    pub async fn parse(&self, raw: &str, index: &dyn DocumentIndex) -> Intent {
        let text = normalize_digits(raw.trim());

        if let Some(intent) = self.apply_rules(&text, index) {
            debug!(?intent, "command matched a pattern rule");
            return intent;
        }

        if text.starts_with(RAW_COMMAND_MARKER) {
            debug!("raw command marker present, skipping fallback");
            return Intent::Unrecognized;
        }

        let Some(fallback) = &self.fallback else {
            return Intent::Unrecognized;
        };

        match tokio::time::timeout(self.fallback_timeout, fallback.interpret(&text)).await {
            Ok(Ok(payload)) => match payload.into_intent() {
                Some(intent) => {
                    debug!(?intent, "fallback interpreted the command");
                    intent
                }
                None => {
                    warn!("fallback returned a payload outside the allowed intent set");
                    Intent::Unrecognized
                }
            },
            Ok(Err(err)) => {
                warn!(error = %err, "fallback call failed");
                Intent::Unrecognized
            }
            Err(_) => {
                warn!(timeout = ?self.fallback_timeout, "fallback call timed out");
                Intent::Unrecognized
            }
        }
    }

    // The cascade proper. Rule order is load-bearing; see the module
    // header before moving anything.
    fn apply_rules(&self, text: &str, index: &dyn DocumentIndex) -> Option<Intent> {
        typed_action_rule(text)
            .or_else(|| generic_action_rule(text, index))
            .or_else(|| create_payment_rule(text))
            .or_else(|| create_exit_rule(text))
            .or_else(|| keyword_rule(text))
    }
}

/// `<action> <type-keyword> <number>` — the type is explicit, so no
/// ambiguity check is needed or wanted.
fn typed_action_rule(text: &str) -> Option<Intent> {
    let caps = TYPED_ACTION.captures(text)?;
    let approve = is_approve_word(&caps[1]);
    let payment = is_payment_keyword(&caps[2]);
    let number: u32 = caps[3].parse().ok()?;

    Some(match (approve, payment) {
        (true, true) => Intent::ApprovePayment(number),
        (false, true) => Intent::RejectPayment(number),
        (true, false) => Intent::ApproveExit(number),
        (false, false) => Intent::RejectExit(number),
    })
}

/// `<action> <number>` with no type keyword: the number is looked up in
/// both kinds and the command is only routed when exactly one matches.
fn generic_action_rule(text: &str, index: &dyn DocumentIndex) -> Option<Intent> {
    let caps = GENERIC_ACTION.captures(text)?;
    let approve = is_approve_word(&caps[1]);
    let number: u32 = caps[2].parse().ok()?;

    let in_payments = index.has_payment(number);
    let in_exits = index.has_exit(number);

    Some(match (in_payments, in_exits) {
        (true, true) => Intent::Ambiguous(number),
        (false, false) => Intent::NotFound(number),
        (true, false) if approve => Intent::ApprovePayment(number),
        (true, false) => Intent::RejectPayment(number),
        (false, true) if approve => Intent::ApproveExit(number),
        (false, true) => Intent::RejectExit(number),
    })
}

/// `pay <amount> to <payee> for <description> [from <bank>]`
fn create_payment_rule(text: &str) -> Option<Intent> {
    let caps = CREATE_PAYMENT.captures(text)?;
    Some(Intent::CreatePayment {
        amount: caps[1].parse().ok()?,
        payee: caps[2].trim().to_string(),
        description: caps[3].trim().to_string(),
        bank: caps.get(4).map(|m| m.as_str().trim().to_string()),
    })
}

/// `exit <count> <item> to <recipient> [driver <d>] [plate <p>]`
fn create_exit_rule(text: &str) -> Option<Intent> {
    let caps = CREATE_EXIT.captures(text)?;
    Some(Intent::CreateExit {
        count: caps[1].parse().ok()?,
        item_name: caps[2].trim().to_string(),
        recipient: caps[3].trim().to_string(),
        driver: caps.get(4).map(|m| m.as_str().trim().to_string()),
        plate: caps.get(5).map(|m| m.as_str().trim().to_string()),
    })
}

/// Bare keyword anywhere in the text; lowest priority of the rules.
fn keyword_rule(text: &str) -> Option<Intent> {
    let lower = text.to_lowercase();
    if ["report", "cartable", "کارتابل"].iter().any(|kw| lower.contains(kw)) {
        return Some(Intent::Report);
    }
    if ["help", "راهنما"].iter().any(|kw| lower.contains(kw)) {
        return Some(Intent::Help);
    }
    None
}
