use anyhow::Result;

use crate::client::Session;
use crate::commands::{report, token_arg};
use crate::ui;

/// Paste an internal integration token instead of going through OAuth.
pub async fn run(token: Option<String>) -> Result<()> {
    let session = Session::open()?;

    ui::header("Use a Notion integration token");
    ui::steps(&[
        "Open https://www.notion.so/my-integrations",
        "Create an internal integration and copy its secret",
        "Share the pages you want with that integration",
    ]);
    let token = token_arg(token)?;

    let spinner = ui::spinner("Verifying token with Notion...");
    let validation = session.client.validate_integration_token(&token).await;
    spinner.finish_and_clear();
    if let Err(err) = validation {
        return Err(report(err));
    }

    session.client.set_token(&token).await.map_err(report)?;
    ui::success(&format!("Saved Notion token {}", ui::mask_token(token.trim())));
    Ok(())
}
