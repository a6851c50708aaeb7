//! 聊天命令解析

use dns_onboard_provider::ApiToken;

use crate::error::{CoreError, CoreResult};
use crate::utils::domain_name::validate_domain;

/// 一条已解析的命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start`, `/help`
    Start,
    /// `/settoken <token>`, `/set-token <token>`
    SetToken(ApiToken),
    /// `/add <domain>`
    Add(String),
    /// `/resume <domain>`
    Resume(String),
    /// `/status <domain>`, `/cfstatus <domain>`
    Status(String),
    /// `/sites`, `/list`
    List,
    /// `/delete <domain>`
    Delete(String),
}

impl Command {
    /// 命令列表，用于欢迎语和用法提示
    pub const USAGE: &'static str = "/settoken <token> - set the Cloudflare API token\n\
        /add <domain> - onboard a domain\n\
        /resume <domain> - retry a failed onboarding, skipping steps already applied\n\
        /status <domain> - show the zone status\n\
        /sites - list domains in the account\n\
        /delete <domain> - delete a domain";

    /// 解析一条消息
    ///
    /// 不以 `/` 开头的文本不是命令，返回 `None`。命令名可带 `@botname` 后缀。
    pub fn parse(text: &str) -> Option<CoreResult<Self>> {
        let text = text.trim();
        let body = text.strip_prefix('/')?;

        let (head, rest) = body
            .split_once(char::is_whitespace)
            .map_or((body, ""), |(h, r)| (h, r.trim()));
        let name = head
            .split_once('@')
            .map_or(head, |(name, _bot)| name)
            .to_ascii_lowercase();
        let argument = rest.split_whitespace().next();

        Some(Self::from_parts(&name, argument))
    }

    fn from_parts(name: &str, argument: Option<&str>) -> CoreResult<Self> {
        let domain = |usage: &str| -> CoreResult<String> {
            let arg = argument.ok_or_else(|| {
                CoreError::InvalidCommand(format!("missing domain. Usage: /{usage} <domain>"))
            })?;
            validate_domain(arg)
        };

        match name {
            "start" | "help" => Ok(Self::Start),
            "settoken" | "set-token" => {
                let token = argument.map(ApiToken::new).filter(|t| !t.is_empty());
                token.map(Self::SetToken).ok_or_else(|| {
                    CoreError::InvalidCommand("missing token. Usage: /settoken <token>".to_string())
                })
            }
            "add" => domain("add").map(Self::Add),
            "resume" => domain("resume").map(Self::Resume),
            "status" | "cfstatus" => domain("status").map(Self::Status),
            "sites" | "list" => Ok(Self::List),
            "delete" => domain("delete").map(Self::Delete),
            other => Err(CoreError::InvalidCommand(format!(
                "unknown command /{other}. Available commands:\n{}",
                Self::USAGE
            ))),
        }
    }

    /// 命令名（日志用，不含参数）
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::SetToken(_) => "settoken",
            Self::Add(_) => "add",
            Self::Resume(_) => "resume",
            Self::Status(_) => "status",
            Self::List => "sites",
            Self::Delete(_) => "delete",
        }
    }
}
