mod common;

use std::sync::{Arc, Mutex};

use common::{harness, harness_with, payment_model, SubmitReply, CANCEL_URL};
use payment_wizard::currency::Amount;
use payment_wizard::errors::PortalError;
use payment_wizard::model::{AccountSelection, PayMode};
use payment_wizard::services::{Services, SubmitResult};
use payment_wizard::wizard::{
    BlockReason, Command, Control, ControlFlags, DeleteOutcome, DispatchOutcome, EntryField,
    FieldEvent, IndicatorState, MessageKey, StepDefinition, StepRule, WizardController,
    WizardOptions,
};

const SUBMISSION_FAILED: &str = "Your payment could not be submitted. Please try again.";

fn entry(field: EntryField, value: &str) -> FieldEvent {
    FieldEvent::Entry {
        field,
        value: value.into(),
    }
}

async fn advance_to_verify(wizard: &mut WizardController) {
    assert_eq!(
        wizard.dispatch(Command::Next).await.unwrap(),
        DispatchOutcome::Moved { from: 1, to: 2 }
    );
    wizard.apply(FieldEvent::SelectAccount(5)).unwrap();
    assert_eq!(
        wizard.dispatch(Command::Next).await.unwrap(),
        DispatchOutcome::Moved { from: 2, to: 3 }
    );
}

fn enter_new_account(wizard: &mut WizardController, account: &str, routing_confirm: &str) {
    wizard.apply(FieldEvent::SelectAccount(0)).unwrap();
    for event in [
        entry(EntryField::BankName, "Second Bank"),
        entry(EntryField::AccountNumber, account),
        entry(EntryField::AccountNumberConfirm, account),
        entry(EntryField::RoutingNumber, "123456789"),
        entry(EntryField::RoutingNumberConfirm, routing_confirm),
    ] {
        wizard.apply(event).unwrap();
    }
}

#[tokio::test]
async fn start_shows_amount_step_with_full_amount() {
    let h = harness(SubmitReply::Reject);
    let wizard = &h.wizard;

    assert_eq!(wizard.session().current, 1);
    assert_eq!(wizard.view().page_title, "Make Payment | Portal");
    assert_eq!(wizard.view().banner_text.as_deref(), Some("Payment Amount"));
    assert_eq!(wizard.view().indicator(1), IndicatorState::Active);
    assert_eq!(wizard.view().indicator(2), IndicatorState::Normal);
    assert!(wizard.view().chrome_visible);
    assert_eq!(wizard.model().draft_amount, Amount::from_cents(12_000));
    assert_eq!(wizard.view().confirmed_draft_amount, "$ 120.00");

    let controls = wizard.controls();
    assert!(controls.is_active(Control::Next));
    assert!(controls.is_active(Control::Cancel));
    assert!(controls.is_active(Control::Clear));
    assert!(!controls.shown.back);
    assert!(!controls.shown.finish);
}

#[tokio::test]
async fn back_is_unavailable_on_first_step() {
    let mut h = harness(SubmitReply::Reject);
    let outcome = h.wizard.dispatch(Command::Back).await.unwrap();
    assert_eq!(
        outcome,
        DispatchOutcome::Blocked {
            command: Command::Back,
            reason: BlockReason::ControlUnavailable(Control::Back),
        }
    );
    assert_eq!(h.wizard.session().current, 1);
}

#[tokio::test]
async fn zero_partial_amount_blocks_next() {
    let mut h = harness(SubmitReply::Reject);
    h.wizard.apply(FieldEvent::PayMode(PayMode::Partial)).unwrap();

    assert_eq!(h.wizard.model().draft_amount, Amount::ZERO);
    assert!(h.wizard.view().has_message(MessageKey::AmountNotPositive));
    assert!(!h.wizard.controls().enabled.next);
    assert!(matches!(
        h.wizard.dispatch(Command::Next).await.unwrap(),
        DispatchOutcome::Blocked { .. }
    ));

    h.wizard
        .apply(FieldEvent::PolicyAmount {
            policy_id: 102,
            value: "15.25".into(),
        })
        .unwrap();
    assert_eq!(h.wizard.model().draft_amount, Amount::from_cents(1_525));
    assert!(h.wizard.controls().enabled.next);
    assert!(h.wizard.view().validation_messages.is_empty());
}

#[tokio::test]
async fn unknown_policy_is_an_error() {
    let mut h = harness(SubmitReply::Reject);
    let result = h.wizard.apply(FieldEvent::PolicyAmount {
        policy_id: 999,
        value: "1".into(),
    });
    assert!(matches!(result, Err(PortalError::UnknownPolicy(999))));
}

#[tokio::test]
async fn moving_between_steps_updates_indicators() {
    let mut h = harness(SubmitReply::Reject);
    h.wizard.dispatch(Command::Next).await.unwrap();

    let view = h.wizard.view();
    assert_eq!(view.indicator(1), IndicatorState::Visited);
    assert_eq!(view.indicator(2), IndicatorState::Active);
    assert_eq!(view.page_title, "ACH | Portal");
    assert_eq!(h.wizard.model().policy_payments[0].payment_amount, Amount::from_cents(7_000));
    // Nothing chosen yet.
    assert!(!h.wizard.controls().enabled.next);

    assert_eq!(
        h.wizard.dispatch(Command::Back).await.unwrap(),
        DispatchOutcome::Moved { from: 2, to: 1 }
    );
    assert_eq!(h.wizard.view().indicator(2), IndicatorState::Normal);
    assert_eq!(h.wizard.view().indicator(1), IndicatorState::Active);
    assert_eq!(h.wizard.session().previous, Some(2));
}

#[tokio::test]
async fn long_account_number_blocks_bank_step() {
    let mut h = harness(SubmitReply::Reject);
    h.wizard.dispatch(Command::Next).await.unwrap();
    enter_new_account(&mut h.wizard, "123456789012345", "123456789");

    assert!(h.wizard.view().panels.enter_new_account);
    assert!(!h.wizard.controls().enabled.next);
    assert!(h.wizard.view().has_message(MessageKey::AccountNumberLength));
    assert_eq!(
        h.wizard.view().field_messages.get(&EntryField::AccountNumber),
        Some(&MessageKey::AccountNumberLength)
    );
    assert!(matches!(
        h.wizard.dispatch(Command::Next).await.unwrap(),
        DispatchOutcome::Blocked { .. }
    ));
}

#[tokio::test]
async fn routing_mismatch_blocks_until_corrected() {
    let mut h = harness(SubmitReply::Reject);
    h.wizard.dispatch(Command::Next).await.unwrap();
    enter_new_account(&mut h.wizard, "00112233", "987654321");

    assert!(h.wizard.view().has_message(MessageKey::RoutingNumberMismatch));
    assert!(!h.wizard.controls().enabled.next);

    h.wizard
        .apply(entry(EntryField::RoutingNumberConfirm, "123456789"))
        .unwrap();
    assert!(h.wizard.controls().enabled.next);
    assert_eq!(
        h.wizard.model().ach_information.bank_account_name,
        "Second Bank - Checking - x2233"
    );

    assert_eq!(
        h.wizard.dispatch(Command::Next).await.unwrap(),
        DispatchOutcome::Moved { from: 2, to: 3 }
    );
    let record = &h.wizard.model().ach_information.selected_bank_account_info;
    assert_eq!(record.masked_account_number, "x2233");
    assert_eq!(record.routing_number, "123456789");
    assert_eq!(record.insured_id, 9);
}

#[tokio::test]
async fn verify_step_gates_finish_on_terms() {
    let mut h = harness(SubmitReply::Accept {
        transaction_id: "TX-1",
    });
    advance_to_verify(&mut h.wizard).await;

    let controls = h.wizard.controls();
    assert!(controls.shown.finish);
    assert!(!controls.enabled.finish);
    assert!(!controls.shown.clear);
    assert!(!controls.shown.next);
    assert!(matches!(
        h.wizard.dispatch(Command::Finish).await.unwrap(),
        DispatchOutcome::Blocked {
            reason: BlockReason::ControlUnavailable(Control::Finish),
            ..
        }
    ));

    h.wizard.apply(FieldEvent::TermsAccepted(true)).unwrap();
    assert!(h.wizard.controls().enabled.finish);
    assert!(h.wizard.view().terms_checked);
    h.wizard.apply(FieldEvent::TermsAccepted(false)).unwrap();
    assert!(!h.wizard.controls().enabled.finish);
    assert!(h.submitter.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn finish_reaches_terminal_step_and_hides_chrome() {
    let mut h = harness(SubmitReply::Accept {
        transaction_id: "TX-1",
    });
    advance_to_verify(&mut h.wizard).await;
    h.wizard.apply(FieldEvent::TermsAccepted(true)).unwrap();

    let outcome = h.wizard.dispatch(Command::Finish).await.unwrap();
    assert_eq!(
        outcome,
        DispatchOutcome::Finished {
            transaction_id: Some("TX-1".into())
        }
    );

    let view = h.wizard.view();
    assert_eq!(h.wizard.session().current, 4);
    assert_eq!(view.page_title, "Thank You | Portal");
    assert!(view.chrome_locked());
    assert!(!view.chrome_visible);
    assert!(!view.loading.is_active());
    assert_eq!(view.indicator(3), IndicatorState::Visited);
    assert_eq!(view.confirmed_draft_amount, "$ 120.00");
    assert!(Control::ALL
        .into_iter()
        .all(|control| !h.wizard.controls().shown.get(control)));

    let calls = h.submitter.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].terms_accepted);
    assert_eq!(calls[0].ach_information.selected_bank_account_info.bank_account_name, "Main");
}

#[tokio::test]
async fn rejected_submission_stays_on_verify() {
    let mut h = harness(SubmitReply::Reject);
    advance_to_verify(&mut h.wizard).await;
    h.wizard.apply(FieldEvent::TermsAccepted(true)).unwrap();

    let outcome = h.wizard.dispatch(Command::Finish).await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::NotSubmitted { .. }));
    assert_eq!(h.wizard.session().current, 3);
    assert!(!h.wizard.view().loading.is_active());
    assert!(h.wizard.controls().enabled.finish);

    let notifications = h.wizard.view_mut().take_notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].text, SUBMISSION_FAILED);
}

#[tokio::test]
async fn transport_failure_is_logged_without_notification() {
    let mut h = harness(SubmitReply::Transport);
    advance_to_verify(&mut h.wizard).await;
    h.wizard.apply(FieldEvent::TermsAccepted(true)).unwrap();
    h.wizard.view_mut().take_notifications();

    let outcome = h.wizard.dispatch(Command::Finish).await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::NotSubmitted { .. }));
    assert_eq!(h.wizard.session().current, 3);
    assert!(h.wizard.view().notifications.is_empty());
}

#[tokio::test]
async fn unusable_response_notifies() {
    let mut h = harness(SubmitReply::Unusable);
    advance_to_verify(&mut h.wizard).await;
    h.wizard.apply(FieldEvent::TermsAccepted(true)).unwrap();
    h.wizard.view_mut().take_notifications();

    h.wizard.dispatch(Command::Finish).await.unwrap();
    let texts: Vec<String> = h
        .wizard
        .view_mut()
        .take_notifications()
        .into_iter()
        .map(|notification| notification.text)
        .collect();
    assert_eq!(texts, vec![SUBMISSION_FAILED.to_string()]);
}

#[tokio::test]
async fn pending_request_blocks_second_finish() {
    let mut h = harness(SubmitReply::Accept {
        transaction_id: "TX-2",
    });
    advance_to_verify(&mut h.wizard).await;
    h.wizard.apply(FieldEvent::TermsAccepted(true)).unwrap();

    let guard = h.wizard.view().loading.begin().unwrap();
    assert!(matches!(
        h.wizard.dispatch(Command::Finish).await.unwrap(),
        DispatchOutcome::Blocked {
            reason: BlockReason::RequestPending,
            ..
        }
    ));
    drop(guard);
    assert!(matches!(
        h.wizard.dispatch(Command::Finish).await.unwrap(),
        DispatchOutcome::Finished { .. }
    ));
    assert_eq!(h.submitter.calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn finish_rechecks_amount_and_account() {
    let mut h = harness(SubmitReply::Accept {
        transaction_id: "TX-1",
    });
    advance_to_verify(&mut h.wizard).await;
    h.wizard.apply(FieldEvent::PayMode(PayMode::Partial)).unwrap();
    h.wizard.apply(FieldEvent::TermsAccepted(true)).unwrap();

    assert_eq!(
        h.wizard.dispatch(Command::Finish).await.unwrap(),
        DispatchOutcome::Blocked {
            command: Command::Finish,
            reason: BlockReason::IncompletePayment(StepRule::AmountSelection),
        }
    );

    h.wizard.apply(FieldEvent::PayMode(PayMode::Full)).unwrap();
    h.wizard.apply(FieldEvent::SelectAccount(-1)).unwrap();
    assert_eq!(
        h.wizard.dispatch(Command::Finish).await.unwrap(),
        DispatchOutcome::Blocked {
            command: Command::Finish,
            reason: BlockReason::IncompletePayment(StepRule::BankInfo),
        }
    );
    assert_eq!(h.wizard.session().current, 3);
    assert!(h.submitter.calls.lock().unwrap().is_empty());
    assert!(!h.wizard.view().loading.is_active());
}

#[tokio::test]
async fn finish_after_deleting_selected_account_is_blocked() {
    let mut h = harness(SubmitReply::Accept {
        transaction_id: "TX-1",
    });
    advance_to_verify(&mut h.wizard).await;
    assert!(h.wizard.request_delete_account());
    assert_eq!(
        h.wizard.confirm_delete_account().await.unwrap(),
        DeleteOutcome::Deleted(5)
    );
    h.wizard.apply(FieldEvent::TermsAccepted(true)).unwrap();

    assert_eq!(
        h.wizard.dispatch(Command::Finish).await.unwrap(),
        DispatchOutcome::Blocked {
            command: Command::Finish,
            reason: BlockReason::IncompletePayment(StepRule::BankInfo),
        }
    );
    assert!(h.submitter.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn cancel_exits_to_policy_holder_page() {
    let mut h = harness(SubmitReply::Reject);
    h.wizard.dispatch(Command::Next).await.unwrap();
    let outcome = h.wizard.dispatch(Command::Cancel).await.unwrap();
    assert_eq!(
        outcome,
        DispatchOutcome::Exited {
            url: CANCEL_URL.into()
        }
    );
    assert_eq!(h.wizard.view().exit_url.as_deref(), Some(CANCEL_URL));
}

#[tokio::test]
async fn clear_resets_the_active_step() {
    let mut h = harness(SubmitReply::Reject);
    h.wizard.apply(FieldEvent::PayMode(PayMode::Partial)).unwrap();
    h.wizard
        .apply(FieldEvent::PolicyAmount {
            policy_id: 101,
            value: "30".into(),
        })
        .unwrap();
    assert_eq!(
        h.wizard.dispatch(Command::Clear).await.unwrap(),
        DispatchOutcome::Cleared { step: 1 }
    );
    assert_eq!(h.wizard.model().draft_amount, Amount::ZERO);
    assert_eq!(h.wizard.model().policy_payments[0].entered_amount, "0.00");

    h.wizard.apply(FieldEvent::PayMode(PayMode::Full)).unwrap();
    h.wizard.dispatch(Command::Next).await.unwrap();
    enter_new_account(&mut h.wizard, "00112233", "123456789");
    h.wizard.dispatch(Command::Clear).await.unwrap();
    assert!(h.wizard.model().ach_information.entry_is_empty());
    assert_eq!(h.wizard.model().selection(), AccountSelection::NoneChosen);
    assert!(!h.wizard.controls().enabled.next);
}

#[tokio::test]
async fn deleting_saved_account_resets_selection() {
    let mut h = harness(SubmitReply::Reject);
    h.wizard.dispatch(Command::Next).await.unwrap();

    assert!(!h.wizard.request_delete_account());
    h.wizard.apply(FieldEvent::SelectAccount(5)).unwrap();
    assert!(h.wizard.request_delete_account());
    assert!(h.wizard.view().delete_modal_open);

    let outcome = h.wizard.confirm_delete_account().await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted(5));
    assert!(!h.wizard.view().delete_modal_open);
    assert!(h.wizard.model().ach_information.saved_bank_accounts.is_empty());
    assert_eq!(h.wizard.model().selection(), AccountSelection::NoneChosen);
    assert!(!h.wizard.controls().enabled.next);

    let sent = h.deleter.calls.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].bank_account_info_id, 5);
}

#[tokio::test]
async fn rejected_delete_keeps_account() {
    let mut h = harness_with(payment_model(), SubmitReply::Reject, false);
    h.wizard.dispatch(Command::Next).await.unwrap();
    h.wizard.apply(FieldEvent::SelectAccount(5)).unwrap();

    assert_eq!(
        h.wizard.confirm_delete_account().await.unwrap(),
        DeleteOutcome::NotRequested
    );
    h.wizard.request_delete_account();
    assert_eq!(
        h.wizard.confirm_delete_account().await.unwrap(),
        DeleteOutcome::Rejected
    );
    assert_eq!(h.wizard.model().ach_information.saved_bank_accounts.len(), 1);
    assert_eq!(h.wizard.model().selection(), AccountSelection::Saved(5));
    assert!(h
        .wizard
        .view()
        .notifications
        .iter()
        .any(|notification| notification.text == "The bank account could not be removed."));
}

fn recording_steps(log: &Arc<Mutex<Vec<String>>>) -> Vec<StepDefinition> {
    let record = |log: &Arc<Mutex<Vec<String>>>, label: &'static str| {
        let log = Arc::clone(log);
        move |ctx: &mut payment_wizard::wizard::StepContext| {
            log.lock()
                .unwrap()
                .push(format!("{label} (current {})", ctx.session.current));
        }
    };
    let flags = ControlFlags {
        back: true,
        next: true,
        ..ControlFlags::NONE
    };

    let enter_one = record(log, "enter 1");
    let leave_one = record(log, "leave 1");
    let enter_two = record(log, "enter 2");
    let leave_two = record(log, "leave 2");
    vec![
        StepDefinition::new(1, "One", StepRule::AmountSelection)
            .with_controls(flags)
            .on_enter(move |ctx, _| enter_one(ctx))
            .on_leave(move |ctx, _| leave_one(ctx))
            .on_leave_set_state(record(log, "leave state 1")),
        StepDefinition::new(2, "Two", StepRule::BankInfo)
            .with_controls(flags)
            .on_enter(move |ctx, change| {
                assert_eq!(change.from, Some(1));
                enter_two(ctx)
            })
            .on_enter_set_state(record(log, "enter state 2"))
            .on_leave(move |ctx, change| {
                assert_eq!(change.to, 1);
                leave_two(ctx)
            }),
        StepDefinition::new(3, "Done", StepRule::Terminal),
    ]
}

#[tokio::test]
async fn hooks_run_leave_then_enter_before_commit() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let h = harness(SubmitReply::Reject);
    let services = Services::new(h.submitter.clone(), h.deleter.clone());
    let mut wizard = WizardController::new(
        recording_steps(&log),
        payment_model(),
        services,
        WizardOptions::default(),
    )
    .unwrap();

    assert!(matches!(
        wizard.dispatch(Command::Next).await.unwrap(),
        DispatchOutcome::Blocked {
            reason: BlockReason::NotStarted,
            ..
        }
    ));
    wizard.start().unwrap();
    // Entering the first step on start is not part of this sequence.
    log.lock().unwrap().clear();
    wizard.dispatch(Command::Next).await.unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "leave 1 (current 1)",
            "leave state 1 (current 1)",
            "enter 2 (current 1)",
            "enter state 2 (current 1)",
        ]
    );
    assert_eq!(wizard.session().current, 2);
    // The last step is only reachable through finish.
    assert!(matches!(
        wizard.dispatch(Command::Next).await.unwrap(),
        DispatchOutcome::Blocked {
            reason: BlockReason::NoTargetStep,
            ..
        }
    ));
}

#[tokio::test]
async fn back_runs_leave_of_current_step_before_enter_of_previous() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let h = harness(SubmitReply::Reject);
    let services = Services::new(h.submitter.clone(), h.deleter.clone());
    let mut wizard = WizardController::new(
        recording_steps(&log),
        payment_model(),
        services,
        WizardOptions::default(),
    )
    .unwrap();
    wizard.start().unwrap();
    wizard.dispatch(Command::Next).await.unwrap();
    log.lock().unwrap().clear();

    assert_eq!(
        wizard.dispatch(Command::Back).await.unwrap(),
        DispatchOutcome::Moved { from: 2, to: 1 }
    );
    assert_eq!(
        *log.lock().unwrap(),
        vec!["leave 2 (current 2)", "enter 1 (current 2)"]
    );
    assert_eq!(wizard.session().current, 1);
    assert_eq!(wizard.view().indicator(2), IndicatorState::Normal);
    assert_eq!(wizard.view().indicator(1), IndicatorState::Active);
}

#[test]
fn steps_must_be_contiguous() {
    let h = harness(SubmitReply::Reject);
    let services = Services::new(h.submitter.clone(), h.deleter.clone());
    let steps = vec![
        StepDefinition::new(1, "One", StepRule::AmountSelection),
        StepDefinition::new(3, "Three", StepRule::Terminal),
    ];
    let result = WizardController::new(steps, payment_model(), services, WizardOptions::default());
    assert!(matches!(result, Err(PortalError::InvalidStepLayout(_))));
}

#[test]
fn accepted_result_carries_model() {
    let result = SubmitResult::accepted(payment_model());
    assert!(result.success);
    assert_eq!(result.updated_model.map(|model| model.submission_id), Some(77));
}
