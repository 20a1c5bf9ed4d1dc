//! The result view handed back to callers.

mod test_utils;

use std::sync::Arc;

use sextant_pipeline::prelude::*;
use test_utils::{Trace, inputs, quiet_executor};

#[derive(Debug, thiserror::Error)]
#[error("amount must be positive")]
struct InvalidAmount;

fn checkout() -> Arc<ActionType> {
    ActionType::builder("Checkout")
        .declare(|d| {
            d.expects(Field::new("card").sensitive())
                .expects("amount")
                .exposes("order_id")
                .exposes(Field::new("token").sensitive())
                .exposes("receipt_url")
                .call(|action| {
                    let amount: u64 = action.input_as("amount")?;
                    if amount == 0 {
                        return Err(action.fail("nothing to charge"));
                    }
                    action.expose("order_id", 7)?;
                    action.expose("token", "tok_live_123")?;
                    action.expose("scratch", "internal state")
                })
                .success_message("Order placed");
        })
        .build()
}

fn charge(amount: u64) -> Fields {
    inputs(serde_json::json!({ "card": "4242424242424242", "amount": amount }))
}

// ═══════════════════════════════════════════════════════════════════════════════
// FIELD CONTRACT
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn result_exposes_exactly_declared_outputs() {
    let result = quiet_executor().run(&checkout(), charge(10));

    assert!(result.is_ok());
    assert_eq!(result.get_as::<u32>("order_id").unwrap(), 7);
    assert_eq!(result.get("receipt_url").unwrap(), &serde_json::Value::Null);
    assert_eq!(result.fields().len(), 3);
    assert!(matches!(
        result.get("scratch"),
        Err(ContractAccessError::Undeclared { action, field })
            if action == "Checkout" && field == "scratch"
    ));
}

#[test]
fn wrong_type_is_a_decode_error() {
    let result = quiet_executor().run(&checkout(), charge(10));

    assert!(matches!(
        result.get_as::<bool>("order_id"),
        Err(ContractAccessError::Decode { field, .. }) if field == "order_id"
    ));
}

#[test]
fn declared_outputs_are_present_on_failure() {
    let result = quiet_executor().run(&checkout(), charge(0));

    assert!(result.is_failure());
    assert_eq!(result.message(), "nothing to charge");
    assert_eq!(result.error(), Some("nothing to charge"));
    assert_eq!(result.success(), None);
    assert_eq!(result.get("order_id").unwrap(), &serde_json::Value::Null);
}

#[test]
fn running_twice_gives_equivalent_results() {
    let action_type = checkout();
    let executor = quiet_executor();

    let first = executor.run(&action_type, charge(10));
    let second = executor.run(&action_type, charge(10));

    assert_eq!(first.is_ok(), second.is_ok());
    assert_eq!(first.message(), second.message());
    assert_eq!(first.fields(), second.fields());
    assert_ne!(first.execution_id(), second.execution_id());
}

// ═══════════════════════════════════════════════════════════════════════════════
// REDACTION
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn display_and_debug_redact_sensitive_outputs() {
    let result = quiet_executor().run(&checkout(), charge(10));

    let display = result.to_string();
    let debug = format!("{result:?}");

    assert!(display.starts_with("Checkout [success] \"Order placed\""));
    for rendered in [&display, &debug] {
        assert!(rendered.contains(FILTERED), "{rendered}");
        assert!(!rendered.contains("tok_live_123"), "{rendered}");
        assert!(!rendered.contains("internal state"), "{rendered}");
    }
    assert_eq!(result.get_as::<String>("token").unwrap(), "tok_live_123");
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONVERSION
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn into_result_surfaces_the_exception() {
    let executor = quiet_executor();
    let action_type = checkout();

    let ok = executor.run(&action_type, charge(10)).into_result();
    let failed = executor.run(&action_type, charge(0)).into_result();

    assert!(ok.is_ok());
    let exception = failed.expect_err("failure converts to an error");
    assert!(exception.is_failure());
    assert_eq!(exception.message(), "nothing to charge");
}

// ═══════════════════════════════════════════════════════════════════════════════
// REJECTED INPUTS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn reject_resolves_message_without_running_anything() {
    let trace = Trace::new();
    let action_type = ActionType::builder("Refund")
        .declare(|d| {
            d.exposes("refund_id")
                .before(trace.step("before"))
                .call(trace.step("body"))
                .on_error(trace.handler("error"))
                .error_message(Handler::positional(|_, exception: Option<&Exception>| {
                    Ok(exception.map(|e| format!("Invalid request: {}", e.message())))
                }));
        })
        .build();

    let result = quiet_executor().reject(
        &action_type,
        inputs(serde_json::json!({ "amount": -5 })),
        Exception::new(InvalidAmount),
    );

    assert!(result.is_exception());
    assert_eq!(result.message(), "Invalid request: amount must be positive");
    assert_eq!(result.get("refund_id").unwrap(), &serde_json::Value::Null);
    assert!(trace.entries().is_empty());
}

#[test]
fn reject_with_failure_is_a_business_failure() {
    let action_type = ActionType::builder("Refund").build();

    let result = quiet_executor().reject(
        &action_type,
        Fields::new(),
        Exception::new(Failure::new("refund window closed")),
    );

    assert!(result.is_failure());
    assert_eq!(result.message(), "refund window closed");
}
