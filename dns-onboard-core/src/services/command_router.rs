//! 命令分发

use std::sync::Arc;

use dns_onboard_provider::{ApiToken, ZoneGateway};

use crate::error::{CoreError, CoreResult};
use crate::services::{CredentialScope, ProvisioningService, ServiceContext};
use crate::types::{Command, SessionId};

const WELCOME: &str = "Welcome! I onboard domains to Cloudflare.";

/// 命令路由
///
/// 把一条聊天消息解析为命令并执行，每个命令都会回复成功确认或 `Error: <cause>`。
pub struct CommandRouter {
    ctx: Arc<ServiceContext>,
    provisioning: Arc<ProvisioningService>,
}

impl CommandRouter {
    /// 创建命令路由实例
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>, provisioning: Arc<ProvisioningService>) -> Self {
        Self { ctx, provisioning }
    }

    /// 处理一条消息
    ///
    /// 非命令文本被忽略。返回的错误已经回复给会话，调用方只需记录。
    pub async fn handle(&self, session: &SessionId, text: &str) -> CoreResult<()> {
        let command = match Command::parse(text) {
            None => {
                log::trace!("Ignoring non-command message from {session}");
                return Ok(());
            }
            Some(Ok(command)) => command,
            Some(Err(e)) => {
                log::warn!("Rejected message from {session}: {e}");
                self.ctx.notifier.notify_error(session, &e).await;
                return Err(e);
            }
        };

        log::info!("Session {session} issued /{}", command.name());

        match command {
            Command::Start => {
                let text = format!("{WELCOME}\n\n{}", Command::USAGE);
                self.ctx.notifier.notify(session, &text).await;
                Ok(())
            }
            Command::SetToken(token) => self.set_token(session, token).await,
            Command::Add(domain) => self.provisioning.onboard(session, &domain).await.map(|_| ()),
            Command::Resume(domain) => self.provisioning.resume(session, &domain).await.map(|_| ()),
            Command::Status(domain) => self.status(session, &domain).await,
            Command::List => self.list(session).await,
            Command::Delete(domain) => self.delete(session, &domain).await,
        }
    }

    async fn set_token(&self, session: &SessionId, token: ApiToken) -> CoreResult<()> {
        if let Err(e) = self.ctx.credentials.set(session, token).await {
            self.ctx.notifier.notify_error(session, &e).await;
            return Err(e);
        }
        let reply = match self.ctx.credentials.scope() {
            CredentialScope::Shared => "Cloudflare API token set successfully!",
            CredentialScope::PerSession => "Cloudflare API token set successfully for this chat!",
        };
        self.ctx.notifier.notify(session, reply).await;
        Ok(())
    }

    async fn status(&self, session: &SessionId, domain: &str) -> CoreResult<()> {
        let result = async {
            let gateway = self.ctx.gateway_for(session).await?;
            gateway
                .resolve_zone(domain)
                .await
                .map_err(|e| CoreError::for_domain(e, domain))
        }
        .await;

        match result {
            Ok(zone) => {
                let text = format!("Status of {domain}: {}", zone.status);
                self.ctx.notifier.notify(session, &text).await;
                Ok(())
            }
            Err(e) => self.reply_error(session, "status", e).await,
        }
    }

    async fn list(&self, session: &SessionId) -> CoreResult<()> {
        let result = async {
            let gateway = self.ctx.gateway_for(session).await?;
            Ok::<_, CoreError>(gateway.list_zones().await?)
        }
        .await;

        match result {
            Ok(zones) if zones.is_empty() => {
                self.ctx.notifier.notify(session, "No domains found").await;
                Ok(())
            }
            Ok(zones) => {
                let text = format!("Your domains: {}", zones.join(", "));
                self.ctx.notifier.notify(session, &text).await;
                Ok(())
            }
            Err(e) => self.reply_error(session, "sites", e).await,
        }
    }

    async fn delete(&self, session: &SessionId, domain: &str) -> CoreResult<()> {
        let result = async {
            let gateway = self.ctx.gateway_for(session).await?;
            Self::delete_zone(gateway.as_ref(), domain).await
        }
        .await;

        match result {
            Ok(zone_id) => {
                log::info!("Deleted zone {zone_id} ({domain}) for session {session}");
                let text = format!("{domain} deleted successfully!");
                self.ctx.notifier.notify(session, &text).await;
                Ok(())
            }
            Err(e) => self.reply_error(session, "delete", e).await,
        }
    }

    /// 解析后删除；删除时 zone 已不存在则归为 `StaleZone`
    async fn delete_zone(gateway: &dyn ZoneGateway, domain: &str) -> CoreResult<String> {
        let zone = gateway
            .resolve_zone(domain)
            .await
            .map_err(|e| CoreError::for_domain(e, domain))?;
        gateway
            .delete_zone(&zone)
            .await
            .map_err(|e| CoreError::for_resolved_zone(e, domain, &zone.id))?;
        Ok(zone.id)
    }

    async fn reply_error(&self, session: &SessionId, command: &str, err: CoreError) -> CoreResult<()> {
        if err.is_expected() {
            log::warn!("/{command} failed for session {session}: {err}");
        } else {
            log::error!("/{command} failed for session {session}: {err}");
        }
        self.ctx.notifier.notify_error(session, &err).await;
        self.ctx.notifier.notify_admin(&err).await;
        Err(err)
    }
}
