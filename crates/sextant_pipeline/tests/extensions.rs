//! Reusable extensions included into action types.

mod test_utils;

use sextant_pipeline::prelude::*;
use test_utils::{Trace, quiet_executor};

fn audited(trace: &Trace) -> Extension {
    Extension::new("Audited", |d| {
        d.around(trace.wrap("audit"))
            .on_success(trace.handler("audit logged"))
            .exposes("audited_at");
    })
}

#[test]
fn builder_extension_behaves_like_local_declarations() {
    let trace = Trace::new();
    let action_type = ActionType::builder("Archive")
        .extend(&audited(&trace))
        .declare(|d| {
            d.before(trace.step("b"))
                .call(|action| action.expose("audited_at", "2026-10-18"));
        })
        .build();

    let result = quiet_executor().run(&action_type, Fields::new());

    assert_eq!(trace.entries(), ["audit-pre", "b", "audit-post", "audit logged"]);
    assert_eq!(result.get_as::<String>("audited_at").unwrap(), "2026-10-18");
}

#[test]
fn extension_included_late_reaches_existing_subtypes() {
    let trace = Trace::new();
    let base = ActionType::builder("Base").build();
    let child = ActionType::builder("Child").parent(&base).build();

    base.declare(|d| {
        d.include(&audited(&trace));
    });
    let result = quiet_executor().run(&child, Fields::new());

    assert_eq!(trace.entries(), ["audit-pre", "audit-post", "audit logged"]);
    assert!(result.fields().contains_key("audited_at"));
}

#[test]
fn later_local_declarations_take_precedence_over_extension_messages() {
    let polite = Extension::new("Polite", |d| {
        d.success_message("Thanks!").error_message("Sorry about that");
    });
    let action_type = ActionType::builder("Greet")
        .extend(&polite)
        .declare(|d| {
            d.success_message("Hello");
        })
        .build();

    let result = quiet_executor().run(&action_type, Fields::new());

    assert_eq!(result.message(), "Hello");
}
