//! Command orchestration: intent in, mutation plus reply text out
//!
//! Both entry points land here. The chat path goes through
//! [`CommandExecutor::handle_text`]; the web UI calls the explicit
//! approve/reject/create methods directly. They share the same
//! internals, the per-kind mutation locks included, so neither writer
//! is privileged over the other.

use super::document::{DocKind, ExitPermit, PaymentOrder};
use super::intent::Intent;
use super::numbering::{self, EXIT_NUMBER_BASELINE, PAYMENT_NUMBER_BASELINE};
use super::parser::IntentParser;
use super::store::DocumentStore;
use super::workflow::{Outcome, StageFlow};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// Reason recorded when a rejection arrives as a chat command; the chat
/// grammar carries no reason argument.
const CHAT_REJECT_REASON: &str = "rejected via chat command";

/// Upper bound on individual documents listed in the detailed report.
const REPORT_LIMIT: usize = 10;

const HELP_TEXT: &str = "💬 commands:\n\
  approve|reject payment <number>\n\
  approve|reject exit <number>\n\
  approve|reject <number>\n\
  pay <amount> to <payee> for <description> [from <bank>]\n\
  exit <count> <item> to <recipient> [driver <d>] [plate <p>]\n\
  report | help";

/// Document written by a command, if any, so the transport can render
/// it (PDF, image, UI card) without a second read.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    None,
    Payment(PaymentOrder),
    Exit(ExitPermit),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub mutation: Mutation,
}

impl Reply {
    fn plain(text: String) -> Self {
        Self {
            text,
            mutation: Mutation::None,
        }
    }

    fn not_found(kind: DocKind, number: u32) -> Self {
        Self::plain(format!("⚠️ no {} with number {number}", kind.label()))
    }

    fn already_terminal(kind: DocKind, number: u32, stage_label: &str) -> Self {
        Self::plain(format!(
            "ℹ️ {} {number} is already {stage_label}",
            kind.label()
        ))
    }
}

pub struct CommandExecutor {
    store: DocumentStore,
    parser: IntentParser,
    // Scoped exclusive regions for read-check-write sequences. Creation
    // needs the whole kind held across snapshot-allocate-persist, and
    // stage transitions reuse the same guard.
    payment_lock: Mutex<()>,
    exit_lock: Mutex<()>,
    // Partition for exit permits created from chat, where no company is
    // spelled out.
    default_company: String,
}

impl CommandExecutor {
    pub fn new(store: DocumentStore, parser: IntentParser, default_company: &str) -> Self {
        Self {
            store,
            parser,
            payment_lock: Mutex::new(()),
            exit_lock: Mutex::new(()),
            default_company: default_company.to_string(),
        }
    }

    // The guards carry no data, so a lock poisoned by a panicking
    // thread is still a valid exclusive region.
    fn lock_payments(&self) -> MutexGuard<'_, ()> {
        self.payment_lock
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn lock_exits(&self) -> MutexGuard<'_, ()> {
        self.exit_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Chat entry point: interpret the raw text, then execute.
    pub async fn handle_text(&self, text: &str, principal: &str) -> anyhow::Result<Reply> {
        let intent = self.parser.parse(text, &self.store).await;
        debug!(?intent, principal, "executing chat command");
        self.execute(intent, principal)
    }

    /// Execute one typed intent on behalf of `principal`. Authorization
    /// is the caller's concern; the principal is only recorded.
    pub fn execute(&self, intent: Intent, principal: &str) -> anyhow::Result<Reply> {
        match intent {
            Intent::ApprovePayment(number) => self.approve_payment(number, principal),
            Intent::RejectPayment(number) => {
                self.reject_payment(number, CHAT_REJECT_REASON, principal)
            }
            Intent::ApproveExit(number) => self.approve_exit(number, principal),
            Intent::RejectExit(number) => self.reject_exit(number, CHAT_REJECT_REASON, principal),
            Intent::Ambiguous(number) => Ok(Reply::plain(format!(
                "⚠️ number {number} matches both a payment order and an exit permit; \
                 repeat the command with 'payment' or 'exit'"
            ))),
            Intent::NotFound(number) => {
                Ok(Reply::plain(format!("⚠️ no document with number {number}")))
            }
            Intent::CreatePayment {
                amount,
                payee,
                description,
                bank,
            } => self.create_payment(amount, &payee, &description, bank, principal),
            Intent::CreateExit {
                count,
                item_name,
                recipient,
                driver,
                plate,
            } => {
                let company = self.default_company.clone();
                self.create_exit(&company, count, &item_name, &recipient, driver, plate, principal)
            }
            Intent::Report => self.report(),
            Intent::Help => Ok(Reply::plain(HELP_TEXT.to_string())),
            Intent::Unrecognized => Ok(Reply::plain("❓ command not understood".to_string())),
        }
    }

    // --- payment orders ---

    pub fn approve_payment(&self, number: u32, _principal: &str) -> anyhow::Result<Reply> {
        let _guard = self.lock_payments();
        let Some(mut order) = self.store.find_payment(number)? else {
            return Ok(Reply::not_found(DocKind::Payment, number));
        };

        let old = order.stage.label();
        match order.advance() {
            Outcome::Advanced => {
                self.store.upsert_payment(&order)?;
                info!(number, from = old, to = order.stage.label(), "payment order advanced");
                Ok(Reply {
                    text: format!(
                        "✅ payment order {number}: {old} → {}",
                        order.stage.label()
                    ),
                    mutation: Mutation::Payment(order),
                })
            }
            _ => Ok(Reply::already_terminal(
                DocKind::Payment,
                number,
                order.stage.label(),
            )),
        }
    }

    pub fn reject_payment(
        &self,
        number: u32,
        reason: &str,
        principal: &str,
    ) -> anyhow::Result<Reply> {
        let _guard = self.lock_payments();
        let Some(mut order) = self.store.find_payment(number)? else {
            return Ok(Reply::not_found(DocKind::Payment, number));
        };

        match order.reject(reason, principal) {
            Outcome::Rejected => {
                self.store.upsert_payment(&order)?;
                info!(number, reason, "payment order rejected");
                Ok(Reply {
                    text: format!("⛔ payment order {number} rejected"),
                    mutation: Mutation::Payment(order),
                })
            }
            _ => Ok(Reply::already_terminal(
                DocKind::Payment,
                number,
                order.stage.label(),
            )),
        }
    }

    pub fn create_payment(
        &self,
        amount: u64,
        payee: &str,
        description: &str,
        bank: Option<String>,
        principal: &str,
    ) -> anyhow::Result<Reply> {
        // hold the kind lock for the whole snapshot-allocate-persist
        // sequence; two concurrent creations would otherwise both find
        // the same lowest gap
        let _guard = self.lock_payments();
        let number = numbering::next_number(&self.store.payment_numbers()?, PAYMENT_NUMBER_BASELINE);

        let order = PaymentOrder::new(number, payee, amount, description, principal).set_bank(bank);
        order.validate()?;
        self.store.upsert_payment(&order)?;

        info!(number, payee, amount, "payment order created");
        Ok(Reply {
            text: format!("✅ payment order {number} created: {amount} to {payee}"),
            mutation: Mutation::Payment(order),
        })
    }

    // --- exit permits ---

    pub fn approve_exit(&self, number: u32, _principal: &str) -> anyhow::Result<Reply> {
        let _guard = self.lock_exits();
        let Some(mut permit) = self.store.find_exit(number)? else {
            return Ok(Reply::not_found(DocKind::Exit, number));
        };

        let old = permit.stage.label();
        match permit.advance() {
            Outcome::Advanced => {
                self.store.upsert_exit(&permit)?;
                info!(number, from = old, to = permit.stage.label(), "exit permit advanced");
                Ok(Reply {
                    text: format!("✅ exit permit {number}: {old} → {}", permit.stage.label()),
                    mutation: Mutation::Exit(permit),
                })
            }
            _ => Ok(Reply::already_terminal(
                DocKind::Exit,
                number,
                permit.stage.label(),
            )),
        }
    }

    pub fn reject_exit(&self, number: u32, reason: &str, principal: &str) -> anyhow::Result<Reply> {
        let _guard = self.lock_exits();
        let Some(mut permit) = self.store.find_exit(number)? else {
            return Ok(Reply::not_found(DocKind::Exit, number));
        };

        match permit.reject(reason, principal) {
            Outcome::Rejected => {
                self.store.upsert_exit(&permit)?;
                info!(number, reason, "exit permit rejected");
                Ok(Reply {
                    text: format!("⛔ exit permit {number} rejected"),
                    mutation: Mutation::Exit(permit),
                })
            }
            _ => Ok(Reply::already_terminal(
                DocKind::Exit,
                number,
                permit.stage.label(),
            )),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_exit(
        &self,
        company: &str,
        count: u32,
        item_name: &str,
        recipient: &str,
        driver: Option<String>,
        plate: Option<String>,
        principal: &str,
    ) -> anyhow::Result<Reply> {
        let _guard = self.lock_exits();
        let number =
            numbering::next_number(&self.store.exit_numbers(company)?, EXIT_NUMBER_BASELINE);

        let permit = ExitPermit::new(number, company, count, item_name, recipient, principal)
            .set_driver(driver)
            .set_plate(plate);
        permit.validate()?;
        self.store.upsert_exit(&permit)?;

        info!(number, company, item_name, "exit permit created");
        Ok(Reply {
            text: format!("✅ exit permit {number} created: {count} {item_name} to {recipient}"),
            mutation: Mutation::Exit(permit),
        })
    }

    // --- read-only ---

    /// Counts of open documents per kind plus a bounded listing. Never
    /// mutates anything.
    pub fn report(&self) -> anyhow::Result<Reply> {
        let payments = self.store.all_payments()?;
        let exits = self.store.all_exits()?;

        let open_payments: Vec<_> = payments.iter().filter(|p| !p.stage.is_terminal()).collect();
        let open_exits: Vec<_> = exits.iter().filter(|e| !e.stage.is_terminal()).collect();

        let mut text = format!(
            "📋 open payment orders: {}, open exit permits: {}",
            open_payments.len(),
            open_exits.len()
        );
        for order in open_payments.iter().take(REPORT_LIMIT) {
            text.push_str(&format!(
                "\n  payment {} — {} — {}",
                order.tracking_number,
                order.payee,
                order.stage.label()
            ));
        }
        for permit in open_exits.iter().take(REPORT_LIMIT) {
            text.push_str(&format!(
                "\n  exit {} — {} — {}",
                permit.permit_number,
                permit.recipient,
                permit.stage.label()
            ));
        }

        Ok(Reply::plain(text))
    }
}
