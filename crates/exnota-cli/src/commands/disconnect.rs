use anyhow::Result;

use crate::client::Session;
use crate::commands::report;
use crate::ui;

pub async fn run(yes: bool) -> Result<()> {
    let session = Session::open()?;

    if !yes && !ui::prompt_confirm("Forget the stored Notion token?", false)? {
        ui::info("Cancelled.");
        return Ok(());
    }

    session.client.clear_token().await.map_err(report)?;
    ui::success("Notion disconnected.");
    ui::hint("Pages stay shared with the integration until you remove them in Notion.");
    Ok(())
}
