use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::sync::watch;
use tracing::debug;

use exnota_auth_bridge::loopback_redirect_url;

use crate::authorizer::LoopbackAuthorizer;
use crate::client::Session;
use crate::flow::{ConnectFlow, FlowState, Screen};
use crate::{messages, ui};

pub async fn run() -> Result<()> {
    let session = Session::open()?;
    let oauth = &session.config.oauth;

    let authorizer = LoopbackAuthorizer::new(
        oauth.callback_port,
        Duration::from_secs(oauth.authorize_timeout_secs),
    );
    let flow = ConnectFlow::new(
        Arc::new(session.client.clone()),
        Arc::new(authorizer),
        session.config.notion.authorize_url.clone(),
        loopback_redirect_url(oauth.callback_port),
    );
    tokio::spawn(trace_screens(flow.subscribe()));

    flow.start()?;
    ui::header("Connect Notion");
    ui::steps(&[
        "Your browser opens Notion's authorization page",
        "Pick the pages Exnota may use and click Allow access",
        "Come back here to choose where notes go",
    ]);
    if !ui::prompt_confirm("Continue?", true)? {
        flow.reset();
        ui::info("Cancelled.");
        return Ok(());
    }
    flow.next()?;

    loop {
        let spinner = ui::spinner("Waiting for Notion authorization in your browser...");
        let outcome = flow.give_access().await;
        spinner.finish_and_clear();
        outcome?;

        match flow.snapshot().screen {
            Screen::ConnectSelectPage {
                granted_page_ids, ..
            } => {
                ui::success(&format!(
                    "Connected to Notion ({} pages shared)",
                    granted_page_ids.len()
                ));
                let choice = ui::prompt_select("Save notes to which page?", &granted_page_ids)?;
                flow.select_page(&granted_page_ids[choice])?;
                ui::info(&format!("Notes will go to page {}", granted_page_ids[choice]));
                return Ok(());
            }
            Screen::ConnectStep2 {
                error: Some(error), ..
            } => {
                ui::error(messages::step_error_message(&error));
                if !ui::prompt_confirm("Try again?", true)? {
                    flow.reset();
                    return Err(anyhow!("Notion was not connected ({})", error));
                }
            }
            other => return Err(anyhow!("connect flow stopped on {}", other.name())),
        }
    }
}

async fn trace_screens(mut screens: watch::Receiver<FlowState>) {
    while screens.changed().await.is_ok() {
        let state = screens.borrow_and_update().clone();
        debug!("Connect flow {} -> {}", state.instance, state.screen.name());
    }
}
