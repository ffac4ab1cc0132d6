//! Settlement pipeline tests: filter, correlate, settle

mod common;

use serde_json::json;

use common::*;

#[test]
fn test_settle_marks_paid_and_clears_cart() {
    let conn = setup_test_db();
    seed_cart_items(&conn, "u1", &["c1", "c2"]);
    let order = create_test_order(&conn, "u1", "plink_1", 500);

    let event = decode_event(&link_paid_event("u1", "plink_1", "pay_1", &["c1", "c2"]));
    let outcome = reconcile::reconcile_event(&conn, &event).unwrap();

    assert_eq!(
        outcome,
        WebhookOutcome::Settled {
            order_id: order.id.clone(),
            payment_id: "pay_1".to_string(),
        }
    );

    let settled = queries::get_order_by_id(&conn, &order.id).unwrap().unwrap();
    assert_eq!(settled.payment_status, PaymentStatus::Paid);
    assert_eq!(settled.payment_id.as_deref(), Some("pay_1"));
    assert!(settled.paid_at.is_some());
    assert!(queries::list_cart_items(&conn, "u1").unwrap().is_empty());
}

#[test]
fn test_replayed_event_is_a_noop() {
    let conn = setup_test_db();
    seed_cart_items(&conn, "u1", &["c1"]);
    let order = create_test_order(&conn, "u1", "plink_1", 500);

    let event = decode_event(&link_paid_event("u1", "plink_1", "pay_1", &["c1"]));

    let first = reconcile::reconcile_event(&conn, &event).unwrap();
    assert!(matches!(first, WebhookOutcome::Settled { .. }));

    let after_first = queries::get_order_by_id(&conn, &order.id).unwrap().unwrap();

    let second = reconcile::reconcile_event(&conn, &event).unwrap();
    assert_eq!(
        second,
        WebhookOutcome::AlreadySettled {
            order_id: order.id.clone(),
        }
    );

    let after_second = queries::get_order_by_id(&conn, &order.id).unwrap().unwrap();
    assert_eq!(after_second.paid_at, after_first.paid_at);
    assert_eq!(after_second.payment_id, after_first.payment_id);
}

#[test]
fn test_settles_only_the_matching_order() {
    let conn = setup_test_db();
    seed_cart_items(&conn, "u1", &["c1"]);
    seed_cart_items(&conn, "u2", &["c1"]);
    let target = create_test_order(&conn, "u1", "plink_a", 500);
    let bystander = create_test_order(&conn, "u2", "plink_b", 900);

    let event = decode_event(&link_paid_event("u1", "plink_a", "pay_1", &["c1"]));
    let outcome = reconcile::reconcile_event(&conn, &event).unwrap();
    assert!(matches!(outcome, WebhookOutcome::Settled { order_id, .. } if order_id == target.id));

    // u2's order and cart are untouched, even though the item id collides
    let other = queries::get_order_by_id(&conn, &bystander.id).unwrap().unwrap();
    assert_eq!(other.payment_status, PaymentStatus::Pending);
    assert!(queries::list_cart_items(&conn, "u1").unwrap().is_empty());
    assert_eq!(queries::list_cart_items(&conn, "u2").unwrap().len(), 1);
}

#[test]
fn test_unknown_event_type_is_ignored() {
    let conn = setup_test_db();
    seed_cart_items(&conn, "u1", &["c1"]);
    let order = create_test_order(&conn, "u1", "plink_1", 500);

    // Fully populated payload; only the event type disqualifies it
    let mut value = link_paid_event("u1", "plink_1", "pay_1", &["c1"]);
    value["event"] = json!("refund.created");
    let outcome = reconcile::reconcile_event(&conn, &decode_event(&value)).unwrap();

    assert_eq!(
        outcome,
        WebhookOutcome::Ignored(IgnoreReason::UnhandledEventType)
    );
    let unchanged = queries::get_order_by_id(&conn, &order.id).unwrap().unwrap();
    assert_eq!(unchanged.payment_status, PaymentStatus::Pending);
    assert_eq!(queries::list_cart_items(&conn, "u1").unwrap().len(), 1);
}

#[test]
fn test_event_without_payment_entity_is_ignored() {
    let conn = setup_test_db();
    create_test_order(&conn, "u1", "plink_1", 500);

    let value = json!({
        "event": "payment_link.paid",
        "payload": {
            "payment_link": {
                "entity": { "id": "plink_1", "notes": { "uid": "u1" } }
            }
        }
    });
    let outcome = reconcile::reconcile_event(&conn, &decode_event(&value)).unwrap();
    assert_eq!(
        outcome,
        WebhookOutcome::Ignored(IgnoreReason::MissingCorrelation)
    );
}

#[test]
fn test_event_without_notes_is_ignored() {
    let conn = setup_test_db();
    create_test_order(&conn, "u1", "plink_1", 500);

    let value = json!({
        "event": "payment_link.paid",
        "payload": {
            "payment_link": { "entity": { "id": "plink_1" } },
            "payment": { "entity": { "id": "pay_1" } }
        }
    });
    let outcome = reconcile::reconcile_event(&conn, &decode_event(&value)).unwrap();
    assert_eq!(
        outcome,
        WebhookOutcome::Ignored(IgnoreReason::MissingCorrelation)
    );
}

#[test]
fn test_malformed_cart_ids_settle_without_deletes() {
    let conn = setup_test_db();
    seed_cart_items(&conn, "u1", &["c1", "c2"]);
    let order = create_test_order(&conn, "u1", "plink_1", 500);

    let mut value = link_paid_event("u1", "plink_1", "pay_1", &[]);
    value["payload"]["payment"]["entity"]["notes"]["cartItemIds"] = json!("{{{{not json");
    value["payload"]["payment_link"]["entity"]["notes"]["cartItemIds"] = json!("{{{{not json");

    let outcome = reconcile::reconcile_event(&conn, &decode_event(&value)).unwrap();

    // The payment is real even if the note is junk: settle, delete nothing
    assert!(matches!(outcome, WebhookOutcome::Settled { order_id, .. } if order_id == order.id));
    assert_eq!(queries::list_cart_items(&conn, "u1").unwrap().len(), 2);
}

#[test]
fn test_plain_array_cart_ids_accepted() {
    let conn = setup_test_db();
    seed_cart_items(&conn, "u1", &["c1", "c2"]);
    let order = create_test_order(&conn, "u1", "plink_1", 500);

    let mut value = link_paid_event("u1", "plink_1", "pay_1", &[]);
    value["payload"]["payment"]["entity"]["notes"]["cartItemIds"] = json!(["c1", "c2"]);

    let outcome = reconcile::reconcile_event(&conn, &decode_event(&value)).unwrap();
    assert!(matches!(outcome, WebhookOutcome::Settled { order_id, .. } if order_id == order.id));
    assert!(queries::list_cart_items(&conn, "u1").unwrap().is_empty());
}

#[test]
fn test_no_matching_order_acknowledged() {
    let conn = setup_test_db();
    create_test_order(&conn, "u1", "plink_other", 500);

    let event = decode_event(&link_paid_event("u1", "plink_unknown", "pay_1", &["c1"]));
    let outcome = reconcile::reconcile_event(&conn, &event).unwrap();
    assert_eq!(outcome, WebhookOutcome::NoMatchingOrder);
}

#[test]
fn test_link_owned_by_someone_else_is_no_match() {
    let conn = setup_test_db();
    let order = create_test_order(&conn, "u2", "plink_1", 500);

    // Notes claim u1 but the stored order belongs to u2
    let event = decode_event(&link_paid_event("u1", "plink_1", "pay_1", &["c1"]));
    let outcome = reconcile::reconcile_event(&conn, &event).unwrap();

    assert_eq!(outcome, WebhookOutcome::NoMatchingOrder);
    let unchanged = queries::get_order_by_id(&conn, &order.id).unwrap().unwrap();
    assert_eq!(unchanged.payment_status, PaymentStatus::Pending);
}

#[test]
fn test_payment_captured_event_settles() {
    let conn = setup_test_db();
    seed_cart_items(&conn, "u1", &["c1"]);
    let order = create_test_order(&conn, "u1", "plink_1", 500);

    // No payment_link entity in the payload; the id rides on the payment
    let event = decode_event(&payment_captured_event("u1", "plink_1", "pay_1", &["c1"]));
    let outcome = reconcile::reconcile_event(&conn, &event).unwrap();

    assert!(matches!(outcome, WebhookOutcome::Settled { order_id, .. } if order_id == order.id));
    assert!(queries::list_cart_items(&conn, "u1").unwrap().is_empty());
}

#[test]
fn test_duplicate_link_ids_settle_the_newest_order() {
    let conn = setup_test_db();
    let older = create_test_order(&conn, "u1", "plink_dup", 500);
    let newer = create_test_order(&conn, "u1", "plink_dup", 500);

    let event = decode_event(&link_paid_event("u1", "plink_dup", "pay_1", &[]));
    let outcome = reconcile::reconcile_event(&conn, &event).unwrap();

    assert!(matches!(outcome, WebhookOutcome::Settled { order_id, .. } if order_id == newer.id));
    let stale = queries::get_order_by_id(&conn, &older.id).unwrap().unwrap();
    assert_eq!(stale.payment_status, PaymentStatus::Pending);
}

#[test]
fn test_payment_notes_win_over_link_notes() {
    let conn = setup_test_db();
    let order = create_test_order(&conn, "u1", "plink_1", 500);
    create_test_order(&conn, "u2", "plink_1", 500);

    let mut value = link_paid_event("u1", "plink_1", "pay_1", &[]);
    value["payload"]["payment_link"]["entity"]["notes"]["uid"] = json!("u2");

    let outcome = reconcile::reconcile_event(&conn, &decode_event(&value)).unwrap();
    assert!(matches!(outcome, WebhookOutcome::Settled { order_id, .. } if order_id == order.id));
}
