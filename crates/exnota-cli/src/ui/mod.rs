use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, FuzzySelect, Password};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Print success message
pub fn success(msg: &str) {
    println!("{} {}", style("✔").green(), msg);
}

/// Print error message
pub fn error(msg: &str) {
    println!("{} {}", style("✖").red(), msg);
}

/// Print info message (indented)
pub fn info(msg: &str) {
    println!("  {}", msg);
}

/// Print a dimmed follow-up suggestion
pub fn hint(msg: &str) {
    println!("  {}", style(msg).dim());
}

/// Print a header/title
pub fn header(msg: &str) {
    println!();
    println!("  {}", style(msg).bold());
    println!();
}

/// Print numbered steps
pub fn steps(items: &[&str]) {
    for (i, item) in items.iter().enumerate() {
        println!("  {}. {}", i + 1, item);
    }
    println!();
}

/// Prompt for a token (masked input)
pub fn prompt_password(prompt: &str) -> anyhow::Result<String> {
    let value = Password::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .interact()?;
    Ok(value)
}

/// Prompt for a selection from a list
pub fn prompt_select(prompt: &str, items: &[String]) -> anyhow::Result<usize> {
    let selection = FuzzySelect::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .items(items)
        .default(0)
        .interact()?;
    Ok(selection)
}

/// Ask a yes/no question
pub fn prompt_confirm(prompt: &str, default: bool) -> anyhow::Result<bool> {
    let result = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(default)
        .interact()?;
    Ok(result)
}

/// Create a spinner for indeterminate progress
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(spinner_style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Keeps the first and last four characters. Short tokens are hidden entirely.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}
