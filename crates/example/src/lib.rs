//! Example order checkout built with Sextant.
//!
//! Two action types share one base type:
//!
//! ```text
//! StoreAction          around: timed     error message for exceptions
//! │                    on_exception: log
//! └── Checkout         + Audited extension
//!                      expects sku, quantity, card (sensitive)
//!                      exposes order_id, remaining, payment_token (sensitive)
//! ```
//!
//! A checkout can end four ways:
//!
//! | Input | Outcome | Message |
//! |-------|---------|---------|
//! | in stock, good card | success | `Order #1001 placed for 2 x lamp` |
//! | `dry_run: true` | success (early completion) | `Dry run: 2 x lamp not ordered` |
//! | too many units, declined card | failure | `Checkout failed: ...` |
//! | gateway timeout, unknown SKU | exception | `We could not complete your request` |

mod inventory;

pub use inventory::{Inventory, InventoryError};

use std::sync::Arc;
use std::time::Instant;

use sextant_pipeline::prelude::*;

/// Card number prefix the fake gateway always declines.
pub const DECLINED_CARD_PREFIX: &str = "4000";

/// Card number the fake gateway never answers for.
pub const TIMEOUT_CARD: &str = "0000000000000000";

/// Errors raised by the fake payment gateway.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// The gateway did not answer in time.
    #[error("payment gateway timed out")]
    GatewayTimeout,
}

fn is_failure(_: &Action, exception: Option<&Exception>) -> bool {
    exception.is_some_and(Exception::is_failure)
}

/// The store's action types, bound to one inventory.
#[derive(Debug)]
pub struct Storefront {
    /// Base type every store action inherits from.
    pub base: Arc<ActionType>,
    /// Places an order.
    pub checkout: Arc<ActionType>,
    inventory: Arc<Inventory>,
}

impl Storefront {
    /// Declares the action types against `inventory`.
    #[must_use]
    pub fn new(inventory: Arc<Inventory>) -> Self {
        let base = store_action();
        let checkout = checkout(&base, &inventory);
        Self {
            base,
            checkout,
            inventory,
        }
    }

    /// Returns the backing inventory.
    #[must_use]
    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Runs a checkout.
    pub fn checkout(&self, executor: &ActionExecutor, inputs: Fields) -> ActionResult {
        executor.run(&self.checkout, inputs)
    }
}

/// An executor that reports unexpected errors through `tracing`.
#[must_use]
pub fn executor() -> ActionExecutor {
    ActionExecutor::with_config(ExecutorConfig::new().with_exception_hook(
        |exception, _, context| {
            tracing::error!(
                action = %context.action_name,
                execution_id = %context.execution_id,
                inputs = %serde_json::Value::Object(context.inputs.clone()),
                error = %exception,
                "unexpected error"
            );
            Ok(())
        },
    ))
}

fn audited() -> Extension {
    Extension::new("Audited", |d| {
        d.on_success(Handler::niladic(|action| {
            tracing::info!(action = %action.name(), outputs = action.outputs().len(), "audit");
            Ok(())
        }));
    })
}

fn store_action() -> Arc<ActionType> {
    ActionType::builder("StoreAction")
        .declare(|d| {
            d.method(
                "timed",
                Method::around(|action, next| {
                    let started = Instant::now();
                    let result = next.run(action);
                    tracing::debug!(
                        action = %action.name(),
                        elapsed_us = started.elapsed().as_micros(),
                        "pipeline timed"
                    );
                    result
                }),
            )
            .around_method("timed")
            .message(
                MessageEvent::Error,
                MessageEntry::new("We could not complete your request")
                    .when(Matcher::not(Matcher::when(is_failure))),
            )
            .on_exception(Handler::positional(|action, exception: Option<&Exception>| {
                if let Some(exception) = exception {
                    tracing::warn!(
                        action = %action.name(),
                        error_type = exception.type_name(),
                        "store action raised"
                    );
                }
                Ok(())
            }));
        })
        .build()
}

fn checkout(base: &Arc<ActionType>, inventory: &Arc<Inventory>) -> Arc<ActionType> {
    let stock = Arc::clone(inventory);
    let refunds = Arc::clone(inventory);

    ActionType::builder("Checkout")
        .parent(base)
        .extend(&audited())
        .declare(move |d| {
            d.expects("sku")
                .expects("quantity")
                .expects(Field::new("card").sensitive())
                .exposes("order_id")
                .exposes("remaining")
                .exposes(Field::new("payment_token").sensitive())
                .before(|action| {
                    let quantity: u32 = action.input_as("quantity")?;
                    if quantity == 0 {
                        return Err(action.fail("Quantity must be at least 1"));
                    }
                    if action.input_as::<bool>("dry_run").unwrap_or(false) {
                        let sku: String = action.input_as("sku")?;
                        return Err(Halt::complete_with(format!(
                            "Dry run: {quantity} x {sku} not ordered"
                        )));
                    }
                    Ok(())
                })
                .call(move |action| {
                    let sku: String = action.input_as("sku")?;
                    let quantity: u32 = action.input_as("quantity")?;
                    let card: String = action.input_as("card")?;

                    let remaining = match stock.reserve(&sku, quantity) {
                        Ok(remaining) => remaining,
                        Err(InventoryError::Insufficient { available, .. }) => {
                            return Err(action.fail(format!("Only {available} left")));
                        }
                        Err(err) => return Err(err.into()),
                    };
                    action.expose("remaining", remaining)?;

                    if card == TIMEOUT_CARD {
                        return Err(PaymentError::GatewayTimeout.into());
                    }
                    if card.starts_with(DECLINED_CARD_PREFIX) {
                        return Err(action.fail("Your card was declined"));
                    }

                    let order_id = stock.next_order();
                    action.expose("order_id", order_id)?;
                    action.expose("payment_token", format!("tok_{order_id}"))
                })
                .method(
                    "order_summary",
                    Method::niladic(|action| {
                        let order_id = action.output("order_id").cloned().unwrap_or_default();
                        let sku: String = action.input_as("sku")?;
                        let quantity: u32 = action.input_as("quantity")?;
                        Ok(format!("Order #{order_id} placed for {quantity} x {sku}"))
                    }),
                )
                .success_message(Handler::method("order_summary"))
                .message(
                    MessageEvent::Error,
                    MessageEntry::prefix_only("Checkout failed: ").when(Matcher::when(is_failure)),
                )
                .on_error(Handler::niladic(move |action| {
                    let Some(remaining) = action.output("remaining") else {
                        return Ok(());
                    };
                    tracing::debug!(%remaining, "releasing reserved stock");
                    let sku: String = action.input_as("sku")?;
                    let quantity: u32 = action.input_as("quantity")?;
                    refunds.release(&sku, quantity);
                    Ok(())
                }))
                .on_exception_when(
                    Matcher::error::<PaymentError>(),
                    Handler::niladic(|action| {
                        tracing::warn!(action = %action.name(), "payment gateway unavailable");
                        Ok(())
                    }),
                );
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn storefront() -> Storefront {
        Storefront::new(Arc::new(Inventory::with_stock([("lamp", 3)])))
    }

    fn order(sku: &str, quantity: u32, card: &str) -> Fields {
        match json!({ "sku": sku, "quantity": quantity, "card": card }) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn quiet() -> ActionExecutor {
        ActionExecutor::with_config(ExecutorConfig::new().without_logging())
    }

    #[test]
    fn successful_checkout() {
        let store = storefront();

        let result = store.checkout(&quiet(), order("lamp", 2, "4242424242424242"));

        assert!(result.is_ok());
        assert_eq!(result.message(), "Order #1001 placed for 2 x lamp");
        assert_eq!(result.get_as::<u32>("remaining").unwrap(), 1);
        assert!(!result.to_string().contains("tok_1001"));
    }

    #[test]
    fn dry_run_completes_early() {
        let store = storefront();
        let mut inputs = order("lamp", 2, "4242424242424242");
        inputs.insert("dry_run".to_owned(), json!(true));

        let result = store.checkout(&quiet(), inputs);

        assert!(result.is_ok());
        assert_eq!(result.message(), "Dry run: 2 x lamp not ordered");
        assert_eq!(store.inventory().available("lamp"), Some(3));
    }

    #[test]
    fn insufficient_stock_is_a_failure() {
        let store = storefront();

        let result = store.checkout(&quiet(), order("lamp", 5, "4242424242424242"));

        assert!(result.is_failure());
        assert_eq!(result.message(), "Checkout failed: Only 3 left");
    }

    #[test]
    fn declined_card_releases_stock() {
        let store = storefront();

        let result = store.checkout(&quiet(), order("lamp", 2, "4000000000000002"));

        assert!(result.is_failure());
        assert_eq!(result.message(), "Checkout failed: Your card was declined");
        assert_eq!(store.inventory().available("lamp"), Some(3));
    }

    #[test]
    fn gateway_timeout_is_an_exception_with_generic_message() {
        let store = storefront();

        let result = store.checkout(&quiet(), order("lamp", 1, TIMEOUT_CARD));

        assert!(result.is_exception());
        assert_eq!(result.message(), "We could not complete your request");
        assert!(result.exception().is_some_and(|e| e.is::<PaymentError>()));
        assert_eq!(store.inventory().available("lamp"), Some(3));
    }

    #[test]
    fn unknown_sku_is_an_exception() {
        let store = storefront();

        let result = store.checkout(&quiet(), order("ghost", 1, "4242424242424242"));

        assert!(result.is_exception());
        assert!(result.exception().is_some_and(|e| e.is::<InventoryError>()));
    }

    #[test]
    fn zero_quantity_is_rejected_before_the_body() {
        let store = storefront();

        let result = store.checkout(&quiet(), order("lamp", 0, "4242424242424242"));

        assert!(result.is_failure());
        assert_eq!(result.message(), "Checkout failed: Quantity must be at least 1");
        assert_eq!(store.inventory().available("lamp"), Some(3));
    }
}
