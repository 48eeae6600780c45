//! The generator and history screens, in a terminal.

use anyhow::Context;
use console::{style, Term};
use dialoguer::theme::ColorfulTheme;

use passgen::password_generation::{MAX_LENGTH, MIN_LENGTH};
use passgen::{Action, CharacterClass, Notice, Tab};

use crate::{CliApp, ProgError};

enum Choice {
    Dispatch(Action),
    PromptLength,
    PickEntryToCopy,
    ConfirmClear,
    Quit,
}

pub(crate) fn run(app: &mut CliApp) -> Result<(), ProgError> {
    let term = Term::stderr();
    let theme = ColorfulTheme::default();
    let mut last_notice: Option<Notice> = None;

    loop {
        term.clear_screen().context("failed to clear the terminal")?;
        let drawn = match app.state().active_tab {
            Tab::Generator => render_generator(&term, app),
            Tab::History => render_history(&term, app),
        };
        drawn.context("failed to draw the screen")?;
        if let Some(notice) = last_notice.take() {
            let line = if notice.is_problem() {
                style(notice.to_string()).red()
            } else {
                style(notice.to_string()).green()
            };
            term.write_line(&format!("\n{}", line))
                .context("failed to draw the screen")?;
        }

        let menu = match app.state().active_tab {
            Tab::Generator => generator_menu(app),
            Tab::History => history_menu(app),
        };
        let labels = menu.iter().map(|(label, _)| label.as_str()).collect::<Vec<_>>();
        let selection = dialoguer::Select::with_theme(&theme)
            .items(&labels)
            .default(0)
            .interact_on_opt(&term)
            .context("failed to query your selection")?;
        let choice = match selection {
            Some(index) => menu.into_iter().nth(index).map(|(_, choice)| choice),
            None => None,
        };

        let action = match choice.unwrap_or(Choice::Quit) {
            Choice::Quit => return Ok(()),
            Choice::Dispatch(action) => Some(action),
            Choice::PromptLength => {
                let length = dialoguer::Input::<usize>::with_theme(&theme)
                    .with_prompt(format!("Length ({}-{})", MIN_LENGTH, MAX_LENGTH))
                    .default(app.state().options.length)
                    .interact_text_on(&term)
                    .context("failed to read the length")?;
                Some(Action::SetLength(length))
            }
            Choice::PickEntryToCopy => match crate::select::select_entry(app.history()) {
                Ok(entry) => Some(Action::CopyEntry(entry.id.clone())),
                Err(ProgError::SelectionCancelled) => None,
                Err(err) => return Err(err),
            },
            Choice::ConfirmClear => {
                let confirm_clear = dialoguer::Confirm::with_theme(&theme)
                    .with_prompt("Delete every password in the history?")
                    .default(false)
                    .interact_on(&term)
                    .context("failed to prompt you, somehow")?;
                confirm_clear.then_some(Action::ClearHistory)
            }
        };
        if let Some(action) = action {
            last_notice = app.dispatch(action);
        }
    }
}

fn render_generator(term: &Term, app: &CliApp) -> std::io::Result<()> {
    let state = app.state();
    term.write_line(&style("Password Generator").bold().to_string())?;
    term.write_line(&style("Create secure passwords in seconds").dim().to_string())?;
    term.write_line("")?;
    match &state.current_password {
        Some(password) => term.write_line(&format!("  {}", style(password.as_str()).cyan()))?,
        None => term.write_line(&format!(
            "  {}",
            style("Your password will appear here").dim()
        ))?,
    }
    term.write_line("")?;
    term.write_line(&format!("Length: {}", state.options.length))?;
    Ok(())
}

fn render_history(term: &Term, app: &CliApp) -> std::io::Result<()> {
    term.write_line(&style("History").bold().to_string())?;
    term.write_line(&style("Your generated passwords").dim().to_string())?;
    term.write_line("")?;
    if app.history().is_empty() {
        term.write_line(&style("No passwords generated yet").dim().to_string())?;
    } else {
        crate::table::display_history(app.history(), term)?;
    }
    Ok(())
}

fn generator_menu(app: &CliApp) -> Vec<(String, Choice)> {
    let options = app.state().options;
    let mut menu = vec![
        ("Generate password".to_owned(), Choice::Dispatch(Action::Generate)),
        ("Copy password".to_owned(), Choice::Dispatch(Action::CopyCurrent)),
        (
            format!("Length + (max {})", MAX_LENGTH),
            Choice::Dispatch(Action::IncrementLength),
        ),
        (
            format!("Length - (min {})", MIN_LENGTH),
            Choice::Dispatch(Action::DecrementLength),
        ),
        ("Set length…".to_owned(), Choice::PromptLength),
    ];
    for class in CharacterClass::ALL {
        let mark = if options.classes.contains(class) { "x" } else { " " };
        menu.push((
            format!("[{}] {}", mark, class),
            Choice::Dispatch(Action::ToggleClass(class)),
        ));
    }
    menu.push((
        "History →".to_owned(),
        Choice::Dispatch(Action::SelectTab(Tab::History)),
    ));
    menu.push(("Quit".to_owned(), Choice::Quit));
    menu
}

fn history_menu(app: &CliApp) -> Vec<(String, Choice)> {
    let mut menu = Vec::new();
    if !app.history().is_empty() {
        menu.push(("Copy a password".to_owned(), Choice::PickEntryToCopy));
        menu.push(("Clear history".to_owned(), Choice::ConfirmClear));
    }
    menu.push((
        "← Generator".to_owned(),
        Choice::Dispatch(Action::SelectTab(Tab::Generator)),
    ));
    menu.push(("Quit".to_owned(), Choice::Quit));
    menu
}
