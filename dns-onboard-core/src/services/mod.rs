//! 业务逻辑服务层

mod command_router;
mod credential_context;
mod notifier;
mod provisioning_service;
mod retry;

pub use command_router::CommandRouter;
pub use credential_context::{CredentialContext, CredentialScope};
pub use notifier::Notifier;
pub use provisioning_service::ProvisioningService;
pub use retry::run_with_retry;

use std::sync::Arc;

use dns_onboard_provider::ZoneGateway;

use crate::error::CoreResult;
use crate::traits::GatewayFactory;
use crate::types::SessionId;

/// 服务上下文 - 持有所有依赖
///
/// 平台层需要创建此上下文，并注入 gateway 工厂与消息通道。
pub struct ServiceContext {
    /// 凭证上下文
    pub credentials: Arc<CredentialContext>,
    /// Gateway 工厂
    pub gateway_factory: Arc<dyn GatewayFactory>,
    /// 通知服务
    pub notifier: Arc<Notifier>,
}

impl ServiceContext {
    /// 创建服务上下文
    #[must_use]
    pub fn new(
        credentials: Arc<CredentialContext>,
        gateway_factory: Arc<dyn GatewayFactory>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            credentials,
            gateway_factory,
            notifier,
        }
    }

    /// 取当前 token 快照，并构建绑定到该快照的 gateway
    pub async fn gateway_for(&self, session: &SessionId) -> CoreResult<Arc<dyn ZoneGateway>> {
        let token = self.credentials.get(session).await;
        self.gateway_factory.create(&token)
    }
}
