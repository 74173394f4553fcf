//! Command handlers for the payment shell.

use std::path::Path;

use super::core::{report_delete, report_outcome, CommandError, CommandResult, ShellContext};
use super::output;
use super::registry::CommandEntry;
use crate::model::PayMode;
use crate::utils::{build_info, persistence::save_model_to_file};
use crate::wizard::{Command, EntryField, FieldEvent};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("status", "Show the current step and its values", "status", cmd_status),
        CommandEntry::new("next", "Advance to the next step", "next", cmd_next),
        CommandEntry::new("back", "Return to the previous step", "back", cmd_back),
        CommandEntry::new("clear", "Reset the values on this step", "clear", cmd_clear),
        CommandEntry::new("finish", "Submit the payment", "finish", cmd_finish),
        CommandEntry::new("cancel", "Leave the wizard without paying", "cancel", cmd_cancel),
        CommandEntry::new("pay", "Choose how much to pay", "pay <full|partial>", cmd_pay),
        CommandEntry::new(
            "amount",
            "Enter a partial amount for one policy",
            "amount <policy-id> <value>",
            cmd_amount,
        ),
        CommandEntry::new(
            "select",
            "Choose a saved account, 0 for a new one, or -1 for none",
            "select <account-id>",
            cmd_select,
        ),
        CommandEntry::new(
            "field",
            "Edit a bank entry field",
            "field <name> <value>",
            cmd_field,
        ),
        CommandEntry::new("terms", "Accept or decline the terms", "terms <on|off>", cmd_terms),
        CommandEntry::new("delete", "Ask to remove the selected saved account", "delete", cmd_delete),
        CommandEntry::new(
            "confirm-delete",
            "Remove the account pending deletion",
            "confirm-delete",
            cmd_confirm_delete,
        ),
        CommandEntry::new(
            "cancel-delete",
            "Keep the account pending deletion",
            "cancel-delete",
            cmd_cancel_delete,
        ),
        CommandEntry::new("save", "Write the payment snapshot to a file", "save <path>", cmd_save),
        CommandEntry::new("help", "Show available commands", "help [command]", cmd_help),
        CommandEntry::new("version", "Show build information", "version", cmd_version),
        CommandEntry::new("exit", "Exit the shell", "exit", cmd_exit),
    ]
}

fn cmd_status(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    context.print_status();
    Ok(())
}

fn run_command(context: &mut ShellContext, command: Command) -> CommandResult {
    let outcome = context.runtime.block_on(context.wizard.dispatch(command))?;
    if report_outcome(&context.wizard, &outcome) {
        return Err(CommandError::ExitRequested);
    }
    Ok(())
}

fn cmd_next(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    run_command(context, Command::Next)
}

fn cmd_back(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    run_command(context, Command::Back)
}

fn cmd_clear(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    run_command(context, Command::Clear)
}

fn cmd_finish(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    run_command(context, Command::Finish)
}

fn cmd_cancel(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    run_command(context, Command::Cancel)
}

fn cmd_pay(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let mode = match args.first().map(|arg| arg.to_ascii_lowercase()).as_deref() {
        Some("full") => PayMode::Full,
        Some("partial") => PayMode::Partial,
        _ => return Err(usage("pay <full|partial>")),
    };
    context.wizard.apply(FieldEvent::PayMode(mode))?;
    output::info(format!(
        "Draft amount: {}",
        context.wizard.model().draft_amount.format(true)
    ));
    Ok(())
}

fn cmd_amount(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [policy, value] = args else {
        return Err(usage("amount <policy-id> <value>"));
    };
    let policy_id = parse_id(policy)?;
    context.wizard.apply(FieldEvent::PolicyAmount {
        policy_id,
        value: (*value).to_string(),
    })?;
    output::info(format!(
        "Draft amount: {}",
        context.wizard.model().draft_amount.format(true)
    ));
    Ok(())
}

fn cmd_select(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [id] = args else {
        return Err(usage("select <account-id>"));
    };
    let id = parse_id(id)?;
    context.wizard.apply(FieldEvent::SelectAccount(id))?;
    output::info(format!(
        "Selection: {:?}",
        context.wizard.model().selection()
    ));
    Ok(())
}

fn cmd_field(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((name, rest)) = args.split_first() else {
        return Err(usage("field <name> <value>"));
    };
    let field = EntryField::parse(name).ok_or_else(|| {
        let names: Vec<&str> = EntryField::ALL.iter().map(|field| field.name()).collect();
        CommandError::InvalidArguments(format!(
            "Unknown field `{}`. Expected one of: {}",
            name,
            names.join(", ")
        ))
    })?;
    context.wizard.apply(FieldEvent::Entry {
        field,
        value: rest.join(" "),
    })?;
    if let Some(message) = context.wizard.view().field_messages.get(&field) {
        output::warning(message.text());
    }
    Ok(())
}

fn cmd_terms(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let accepted = match args.first().map(|arg| arg.to_ascii_lowercase()).as_deref() {
        Some("on" | "yes" | "accept") => true,
        Some("off" | "no" | "decline") => false,
        _ => return Err(usage("terms <on|off>")),
    };
    context.wizard.apply(FieldEvent::TermsAccepted(accepted))?;
    Ok(())
}

fn cmd_delete(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    if context.wizard.request_delete_account() {
        output::warning("Run `confirm-delete` to remove the selected account or `cancel-delete` to keep it.");
    } else {
        output::warning("Select a saved account before removing it.");
    }
    Ok(())
}

fn cmd_confirm_delete(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let outcome = context
        .runtime
        .block_on(context.wizard.confirm_delete_account())?;
    report_delete(outcome);
    Ok(())
}

fn cmd_cancel_delete(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    context.wizard.cancel_delete_account();
    output::info("Account kept.");
    Ok(())
}

fn cmd_save(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [path] = args else {
        return Err(usage("save <path>"));
    };
    save_model_to_file(context.wizard.model(), Path::new(path))?;
    output::success(format!("Snapshot written to {}", path));
    Ok(())
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first() {
        let name = name.to_ascii_lowercase();
        let Some(entry) = context.command(&name) else {
            context.suggest_command(&name);
            return Ok(());
        };
        output::section(entry.name);
        output::detail(entry.description);
        output::detail(format!("Usage: {}", entry.usage));
        return Ok(());
    }

    output::section("Commands");
    for entry in context.registry.list() {
        output::detail(format!("{:<15} {}", entry.name, entry.description));
    }
    Ok(())
}

fn cmd_version(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    output::info(build_info::current().summary());
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    output::info("Exiting shell.");
    Err(CommandError::ExitRequested)
}

fn usage(text: &str) -> CommandError {
    CommandError::InvalidArguments(format!("Usage: {}", text))
}

fn parse_id(raw: &str) -> Result<i64, CommandError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| CommandError::InvalidArguments(format!("`{}` is not a valid id", raw)))
}
