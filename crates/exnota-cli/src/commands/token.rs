use anyhow::Result;

use crate::client::Session;
use crate::commands::report;
use crate::ui;

pub async fn run() -> Result<()> {
    let session = Session::open()?;
    match session.client.get_token().await {
        Ok(Some(token)) => {
            ui::success(&format!("Notion token stored: {}", ui::mask_token(&token)));
            Ok(())
        }
        Ok(None) => {
            ui::info("No Notion token stored.");
            ui::hint("Run `exnota connect` or `exnota set-token`.");
            Ok(())
        }
        Err(err) => Err(report(err)),
    }
}
