//! Telegram bot entry point for DNS Onboard
//!
//! Reads configuration from the environment, wires the onboarding services to the
//! Telegram transport, and long-polls for commands until Ctrl-C.
//!
//! Every incoming command runs on its own task, so one slow onboarding never
//! blocks other chats.

mod config;
mod telegram;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use config::BotConfig;
use dns_onboard_core::{
    CloudflareGatewayFactory, CommandRouter, CredentialContext, Notifier, ProvisioningService,
    ServiceContext,
};
use telegram::TelegramClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Pause after a failed `getUpdates` before polling again.
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let telegram = match TelegramClient::new(
        config.telegram_token.clone(),
        config.telegram_api_base.as_deref(),
    ) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::error!("Failed to create Telegram client: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let router = build_router(&config, Arc::clone(&telegram));

    tracing::info!(
        "DNS Onboard bot started (credential scope: {}, rule naming: {}, admin copies: {})",
        config.credential_scope,
        config.rule_naming,
        if config.admin_chat.is_some() { "on" } else { "off" }
    );

    poll(&telegram, &router).await;

    tracing::info!("DNS Onboard bot stopped");
    ExitCode::SUCCESS
}

fn build_router(config: &BotConfig, telegram: Arc<TelegramClient>) -> Arc<CommandRouter> {
    let credentials = Arc::new(CredentialContext::new(
        config.cloudflare_token.clone(),
        config.credential_scope,
    ));

    let mut factory = CloudflareGatewayFactory::new();
    if let Some(api_base) = &config.cloudflare_api_base {
        factory = factory.with_api_base(api_base.clone());
    }

    let notifier = Arc::new(Notifier::new(telegram, config.admin_chat.clone()));
    let ctx = Arc::new(ServiceContext::new(credentials, Arc::new(factory), notifier));
    let provisioning = Arc::new(ProvisioningService::new(
        Arc::clone(&ctx),
        config.onboarding_policy(),
    ));

    Arc::new(CommandRouter::new(ctx, provisioning))
}

/// Long-poll loop. Returns on Ctrl-C.
async fn poll(telegram: &TelegramClient, router: &Arc<CommandRouter>) {
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut offset = 0_i64;
    loop {
        let updates = tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutdown requested");
                return;
            }
            result = telegram.get_updates(offset) => result,
        };

        let updates = match updates {
            Ok(updates) => updates,
            Err(e) => {
                tracing::warn!("Polling failed: {e:#}");
                tokio::select! {
                    _ = &mut shutdown => return,
                    () = tokio::time::sleep(POLL_ERROR_BACKOFF) => continue,
                }
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let Some((session, text)) = update.text_message() else {
                continue;
            };
            let text = text.to_string();
            let router = Arc::clone(router);
            tokio::spawn(async move {
                // The router has already replied to the chat; errors only need a log line.
                if let Err(e) = router.handle(&session, &text).await {
                    tracing::debug!("Command from {session} ended with error: {e}");
                }
            });
        }
    }
}
