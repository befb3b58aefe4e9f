use anyhow::Result;

use crate::client::Session;
use crate::commands::{report, token_arg};
use crate::ui;

pub async fn run(token: Option<String>) -> Result<()> {
    let session = Session::open()?;
    let token = token_arg(token)?;

    let spinner = ui::spinner("Checking token with Notion...");
    let result = session.client.validate_integration_token(&token).await;
    spinner.finish_and_clear();

    match result {
        Ok(()) => {
            ui::success("Notion accepted this token.");
            Ok(())
        }
        Err(err) => Err(report(err)),
    }
}
