//! End-to-end scenarios through the executor against a real sled store.

use anyhow::Context;
use payment_approval::{
    CommandExecutor, DocumentStore, ExitPermit, ExitStage, Intent, IntentParser, Mutation,
    PaymentOrder, PaymentStage,
};
use std::sync::Arc;
use tempfile::tempdir;

// Sled uses file-based locking, so each test opens its own database on
// a temp directory for simplified cleanup. A second DocumentStore on
// the same db doubles as the "administrative" handle for deletions.
fn setup(name: &str) -> anyhow::Result<(tempfile::TempDir, CommandExecutor, DocumentStore)> {
    let temp_dir = tempdir()?;
    let db = Arc::new(sled::open(temp_dir.path().join(name))?);
    let admin = DocumentStore::open(&db)?;
    let executor = CommandExecutor::new(DocumentStore::open(&db)?, IntentParser::new(), "acme-co");
    Ok((temp_dir, executor, admin))
}

fn created_payment(reply: &payment_approval::Reply) -> PaymentOrder {
    match &reply.mutation {
        Mutation::Payment(order) => order.clone(),
        other => panic!("expected a payment mutation, got {other:?}"),
    }
}

fn created_exit(reply: &payment_approval::Reply) -> ExitPermit {
    match &reply.mutation {
        Mutation::Exit(permit) => permit.clone(),
        other => panic!("expected an exit mutation, got {other:?}"),
    }
}

#[test]
fn create_then_approve_payment_to_terminal() -> anyhow::Result<()> {
    let (_dir, executor, _admin) = setup("roundtrip.db")?;

    let reply = executor
        .execute(
            Intent::CreatePayment {
                amount: 500_000,
                payee: "Acme".to_string(),
                description: "rent".to_string(),
                bank: None,
            },
            "requester",
        )
        .context("creation failed")?;

    let order = created_payment(&reply);
    assert_eq!(order.tracking_number, 1001);
    assert_eq!(order.stage, PaymentStage::PendingFinance);

    // three approvals walk the full sequence
    let expected = [
        PaymentStage::ApprovedFinance,
        PaymentStage::ApprovedManager,
        PaymentStage::ApprovedCeo,
    ];
    for stage in expected {
        let reply = executor.execute(Intent::ApprovePayment(1001), "approver")?;
        assert_eq!(created_payment(&reply).stage, stage);
    }

    // the fourth is informational and mutates nothing
    let reply = executor.execute(Intent::ApprovePayment(1001), "approver")?;
    assert_eq!(reply.mutation, Mutation::None);
    assert!(reply.text.contains("already"));

    Ok(())
}

#[test]
fn deleted_number_is_reallocated_first() -> anyhow::Result<()> {
    let (_dir, executor, admin) = setup("gaps.db")?;

    let mut ids = Vec::new();
    for payee in ["a", "b", "c"] {
        let reply = executor.create_payment(100, payee, "supplies", None, "tester")?;
        ids.push(created_payment(&reply).id);
    }
    // numbers 1001..=1003 are now in use; free the middle one
    assert!(admin.delete_payment(&ids[1])?);

    let reply = executor.create_payment(100, "d", "supplies", None, "tester")?;
    assert_eq!(created_payment(&reply).tracking_number, 1002);

    // and the next creation appends past the end again
    let reply = executor.create_payment(100, "e", "supplies", None, "tester")?;
    assert_eq!(created_payment(&reply).tracking_number, 1004);

    Ok(())
}

#[test]
fn exit_numbers_allocate_per_company() -> anyhow::Result<()> {
    let (_dir, executor, _admin) = setup("partitions.db")?;

    let a = executor.create_exit("acme-co", 5, "widgets", "Depot A", None, None, "tester")?;
    let b = executor.create_exit("globex", 5, "widgets", "Depot B", None, None, "tester")?;

    // both partitions start from the same baseline independently
    assert_eq!(created_exit(&a).permit_number, 101);
    assert_eq!(created_exit(&b).permit_number, 101);

    let a2 = executor.create_exit("acme-co", 2, "rods", "Depot A", None, None, "tester")?;
    assert_eq!(created_exit(&a2).permit_number, 102);

    Ok(())
}

#[tokio::test]
async fn bare_number_in_both_kinds_is_ambiguous() -> anyhow::Result<()> {
    let (_dir, executor, admin) = setup("ambiguity.db")?;

    admin.upsert_payment(&PaymentOrder::new(500, "Acme", 100, "rent", "tester"))?;
    admin.upsert_exit(&ExitPermit::new(500, "acme-co", 1, "widgets", "Depot", "tester"))?;

    let reply = executor.handle_text("approve 500", "approver").await?;
    assert_eq!(reply.mutation, Mutation::None);
    assert!(reply.text.contains("both"));

    // the explicit keyword resolves it
    let reply = executor.handle_text("approve payment 500", "approver").await?;
    let order = created_payment(&reply);
    assert_eq!(order.stage, PaymentStage::ApprovedFinance);

    // and the permit was untouched
    assert_eq!(admin.find_exit(500)?.unwrap().stage, ExitStage::PendingCeo);

    Ok(())
}

#[tokio::test]
async fn chat_and_direct_paths_share_state() -> anyhow::Result<()> {
    let (_dir, executor, _admin) = setup("shared.db")?;

    // created from the "web UI" path
    let reply = executor.create_payment(250, "Initech", "toner", None, "ui-user")?;
    let number = created_payment(&reply).tracking_number;

    // advanced from the chat path
    let reply = executor
        .handle_text(&format!("approve payment {number}"), "chat-user")
        .await?;
    assert_eq!(created_payment(&reply).stage, PaymentStage::ApprovedFinance);

    Ok(())
}

#[tokio::test]
async fn unknown_number_yields_not_found_reply() -> anyhow::Result<()> {
    let (_dir, executor, _admin) = setup("notfound.db")?;

    let reply = executor.handle_text("approve 9999", "approver").await?;
    assert_eq!(reply.mutation, Mutation::None);
    assert!(reply.text.contains("9999"));

    Ok(())
}

#[test]
fn rejecting_records_reason_and_blocks_per_kind() -> anyhow::Result<()> {
    let (_dir, executor, admin) = setup("reject.db")?;

    let reply = executor.create_payment(100, "Acme", "rent", None, "tester")?;
    let number = created_payment(&reply).tracking_number;

    let reply = executor.reject_payment(number, "missing invoice", "finance")?;
    let order = created_payment(&reply);
    assert_eq!(order.stage, PaymentStage::Rejected);
    assert_eq!(order.rejection.as_ref().unwrap().reason, "missing invoice");
    assert_eq!(order.rejection.as_ref().unwrap().rejected_by, "finance");

    // a payment refuses reject only once fully approved
    let reply = executor.create_payment(100, "Globex", "rent", None, "tester")?;
    let number = created_payment(&reply).tracking_number;
    for _ in 0..3 {
        executor.approve_payment(number, "approver")?;
    }
    let reply = executor.reject_payment(number, "too late", "finance")?;
    assert_eq!(reply.mutation, Mutation::None);
    assert!(reply.text.contains("already"));

    // an exit permit refuses reject only once exited
    let reply = executor.create_exit("acme-co", 1, "widgets", "Depot", None, None, "tester")?;
    let number = created_exit(&reply).permit_number;
    executor.approve_exit(number, "ceo")?;
    executor.approve_exit(number, "factory")?;
    assert_eq!(admin.find_exit(number)?.unwrap().stage, ExitStage::Exited);

    let reply = executor.reject_exit(number, "cargo came back", "factory")?;
    assert_eq!(reply.mutation, Mutation::None);
    assert!(reply.text.contains("already"));

    Ok(())
}

#[test]
fn report_counts_open_documents_only() -> anyhow::Result<()> {
    let (_dir, executor, _admin) = setup("report.db")?;

    executor.create_payment(100, "Acme", "rent", None, "tester")?;
    let reply = executor.create_payment(100, "Globex", "rent", None, "tester")?;
    let rejected = created_payment(&reply).tracking_number;
    executor.reject_payment(rejected, "duplicate", "finance")?;

    executor.create_exit("acme-co", 1, "widgets", "Depot", None, None, "tester")?;

    let reply = executor.report()?;
    assert_eq!(reply.mutation, Mutation::None);
    assert!(reply.text.contains("open payment orders: 1"));
    assert!(reply.text.contains("open exit permits: 1"));
    assert!(reply.text.contains("Acme"));
    assert!(!reply.text.contains("Globex"));

    Ok(())
}

#[tokio::test]
async fn help_and_gibberish_never_mutate() -> anyhow::Result<()> {
    let (_dir, executor, admin) = setup("fixed.db")?;

    let reply = executor.handle_text("help", "someone").await?;
    assert_eq!(reply.mutation, Mutation::None);
    assert!(reply.text.contains("commands"));

    let reply = executor.handle_text("qwerty asdf", "someone").await?;
    assert_eq!(reply.mutation, Mutation::None);
    assert!(reply.text.contains("not understood"));

    assert!(admin.all_payments()?.is_empty());
    assert!(admin.all_exits()?.is_empty());

    Ok(())
}
