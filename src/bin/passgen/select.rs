use anyhow::Context;

use passgen::HistoryEntry;

pub(crate) fn select_entry(entries: &[HistoryEntry]) -> Result<&HistoryEntry, crate::ProgError> {
    if entries.is_empty() {
        return Err(crate::ProgError::Other(anyhow::anyhow!(
            "No passwords generated yet."
        )));
    }
    let items = entries
        .iter()
        .map(|entry| format!("{}  ({})", entry.password.as_str(), entry.created_at))
        .collect::<Vec<_>>();
    let selection = dialoguer::FuzzySelect::with_theme(&dialoguer::theme::ColorfulTheme::default())
        .with_prompt("Password to copy")
        .items(&items)
        .default(0)
        .interact_opt()
        .context("failed to query your selection")?
        .ok_or(crate::ProgError::SelectionCancelled)?;

    Ok(&entries[selection])
}
