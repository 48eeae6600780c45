//! The one-shot subcommands.

use anyhow::Context;

use passgen::{Action, CharacterClass, Notice};

use crate::{CliApp, ProgError};

#[derive(clap::Args)]
pub(crate) struct GenerateArgs {
    /// Password length.
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(8..=32))]
    length: Option<u8>,
    /// Leave out uppercase letters.
    #[arg(long)]
    no_upper: bool,
    /// Leave out lowercase letters.
    #[arg(long)]
    no_lower: bool,
    /// Leave out digits.
    #[arg(long)]
    no_digits: bool,
    /// Leave out symbols.
    #[arg(long)]
    no_symbols: bool,
    /// Also copy the password to the clipboard.
    #[arg(short, long)]
    copy: bool,
}

impl GenerateArgs {
    fn excluded(&self) -> impl Iterator<Item = CharacterClass> {
        let flags = [
            (CharacterClass::Upper, self.no_upper),
            (CharacterClass::Lower, self.no_lower),
            (CharacterClass::Digits, self.no_digits),
            (CharacterClass::Symbols, self.no_symbols),
        ];
        flags
            .into_iter()
            .filter_map(|(class, excluded)| excluded.then_some(class))
    }
}

pub(crate) fn generate(app: &mut CliApp, args: GenerateArgs) -> Result<(), ProgError> {
    if let Some(length) = args.length {
        app.dispatch(Action::SetLength(length.into()));
    }
    for class in args.excluded() {
        if app.state().options.classes.contains(class) {
            app.dispatch(Action::ToggleClass(class));
        }
    }

    let (copied, copy_failure) = match app.dispatch(Action::Generate) {
        Some(Notice::Generated { copied }) => (copied, None),
        Some(failed @ Notice::GeneratedCopyFailed(_)) => (false, Some(failed)),
        Some(notice) if notice.is_problem() => return Err(ProgError::Notice(notice)),
        _ => (false, None),
    };
    let password = app
        .state()
        .current_password
        .as_ref()
        .context("no password was generated")?;
    println!("{}", password.as_str());

    // The password is printed and recorded either way; a clipboard problem is only reported.
    if copy_failure.is_some() {
        report(copy_failure);
    } else if copied {
        eprintln!("{}", Notice::Copied);
    } else if args.copy {
        report(app.dispatch(Action::CopyCurrent));
    }
    Ok(())
}

pub(crate) fn list_history(app: &CliApp) -> Result<(), ProgError> {
    if app.history().is_empty() {
        eprintln!("No passwords generated yet.");
        return Ok(());
    }
    crate::table::display_history(app.history(), std::io::stdout())
        .context("failed to output table")?;
    Ok(())
}

pub(crate) fn copy_from_history(app: &mut CliApp) -> Result<(), ProgError> {
    let id = crate::select::select_entry(app.history())?.id.clone();
    match app.dispatch(Action::CopyEntry(id)) {
        Some(notice) if notice.is_problem() => Err(ProgError::Notice(notice)),
        other => {
            report(other);
            Ok(())
        }
    }
}

pub(crate) fn clear_history(app: &mut CliApp, yes: bool) -> Result<(), ProgError> {
    if app.history().is_empty() {
        eprintln!("The history is already empty.");
        return Ok(());
    }
    if !yes {
        eprintln!(
            "This will delete all {} passwords from the history.",
            app.history().len()
        );
        let confirm_clear = dialoguer::Confirm::new()
            .with_prompt("Clear?")
            .default(false)
            .interact()
            .context("failed to prompt you, somehow")?;
        if !confirm_clear {
            return Err(ProgError::ClearAborted);
        }
    }
    match app.dispatch(Action::ClearHistory) {
        Some(notice) if notice.is_problem() => Err(ProgError::Notice(notice)),
        other => {
            report(other);
            Ok(())
        }
    }
}

fn report(notice: Option<Notice>) {
    if let Some(notice) = notice {
        eprintln!("{}", notice);
    }
}
