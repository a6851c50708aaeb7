//! 域名参数校验

use std::sync::LazyLock;

use regex::Regex;

use dns_onboard_provider::normalize_domain_name;

use crate::error::{CoreError, CoreResult};

/// 单个 label：字母数字开头结尾，中间可含连字符，最长 63
static LABEL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?$").ok());

const MAX_DOMAIN_LEN: usize = 253;

/// 规范化并校验域名参数，返回规范化后的域名
pub fn validate_domain(input: &str) -> CoreResult<String> {
    let domain = normalize_domain_name(input);

    if domain.is_empty() {
        return Err(CoreError::ValidationError("domain is empty".to_string()));
    }
    if domain.len() > MAX_DOMAIN_LEN {
        return Err(CoreError::ValidationError(format!(
            "domain is longer than {MAX_DOMAIN_LEN} characters"
        )));
    }
    if !domain.contains('.') {
        return Err(CoreError::ValidationError(format!(
            "'{domain}' is not a fully qualified domain name"
        )));
    }
    let is_valid_label = |label: &str| LABEL_RE.as_ref().is_some_and(|re| re.is_match(label));
    if let Some(label) = domain.split('.').find(|label| !is_valid_label(label)) {
        return Err(CoreError::ValidationError(format!(
            "'{domain}' has an invalid label '{label}'"
        )));
    }

    Ok(domain)
}
