//! Console front-end: two coaching tabs driven by line commands.
//!
//! Commands: `macro` / `build` switch the active tab, `update [text]` runs a
//! fetch+advise turn, `send <text>` chats against the tab's history, `reset`
//! clears the active tab, `autoreset on|off` toggles post-update clearing,
//! `quit` exits.

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use rift_coach_core::agent::{BuildAgent, MacroAgent, extract_recommendation};
use rift_coach_core::builds::catalog::ItemCatalogClient;
use rift_coach_core::builds::{BuildDataClient, ItemCatalog};
use rift_coach_core::config::{API_KEY_ENV, Config, ConfigLoader};
use rift_coach_core::game::GameStateFetcher;
use rift_coach_core::llm::HttpModelClient;
use rift_coach_core::session::{CoachSession, SessionError, TabKind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config: Config = ConfigLoader::parse_from_file("coach.toml").unwrap_or_else(|err| {
        tracing::warn!(%err, "no config file found, using defaults");
        Config::default()
    });

    let api_key = HttpModelClient::api_key_from_env(API_KEY_ENV)
        .context("the model service credential must be set before startup")?;

    let fetcher = GameStateFetcher::from_config(&config.game);
    let model = Arc::new(HttpModelClient::from_config(&config.model, api_key));
    let builds = Arc::new(BuildDataClient::from_config(&config.builds));

    // Missing reference data degrades the build prompt, it never blocks startup.
    let catalog_client = ItemCatalogClient::from_config(&config.builds);
    let (patch, catalog) = match catalog_client.catalog(config.builds.patch.as_deref()).await {
        Ok((patch, catalog)) => {
            tracing::info!(%patch, items = catalog.non_consumable.len(), "item catalog ready");
            (patch, catalog)
        }
        Err(err) => {
            tracing::warn!(%err, "item catalog unavailable, continuing without it");
            (
                config.builds.patch.clone().unwrap_or_default(),
                ItemCatalog::default(),
            )
        }
    };

    let session = CoachSession::new(
        fetcher,
        model,
        Box::new(MacroAgent::from_config(&config.model)),
        Box::new(BuildAgent::from_config(
            &config.model,
            builds,
            catalog,
            patch,
        )),
    );

    println!(
        "rift-coach ready. Tabs: macro, build. Commands: update [text], send <text>, reset, autoreset on|off, quit."
    );

    let mut tab = TabKind::Macro;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_prompt(tab);
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = match line.split_once(' ') {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };

        match command {
            "" => {}
            "macro" => tab = TabKind::Macro,
            "build" => tab = TabKind::Build,
            "update" => {
                let user_text = (!rest.is_empty()).then_some(rest);
                report(tab, session.update(tab, user_text).await);
            }
            "send" => {
                if rest.is_empty() {
                    println!("usage: send <text>");
                } else {
                    report(tab, session.send(tab, rest).await);
                }
            }
            "reset" => {
                session.reset(tab).await;
                println!("[{tab}] history cleared");
            }
            "autoreset" => match rest {
                "on" => session.set_auto_reset(tab, true).await,
                "off" => session.set_auto_reset(tab, false).await,
                _ => println!("usage: autoreset on|off"),
            },
            "quit" | "exit" => break,
            other => println!("unknown command: {other}"),
        }
        print_prompt(tab);
    }

    Ok(())
}

fn print_prompt(tab: TabKind) {
    println!("[{tab}]>");
}

fn report(tab: TabKind, result: Result<rift_coach_core::session::SessionReply, SessionError>) {
    match result {
        Ok(reply) => {
            println!("[{tab}] {}", reply.text);
            if tab == TabKind::Build
                && let Some(recommendation) = extract_recommendation(&reply.text)
            {
                println!("[{tab}] >>> {recommendation}");
            }
        }
        // Every failure is scoped to this one action.
        Err(err) => println!("[{tab}] error: {err}"),
    }
}
