// 提供商 HTTP 调用的公共部分：客户端构建与错误分类

use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::error;

use crate::modules::chat::ports::{ProviderError, ProviderErrorKind};

/// 按提供商配置的超时构建 HTTP 客户端
pub fn build_client(timeout_secs: u64) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()
        .map_err(|e| ProviderError::unknown(format!("Failed to build HTTP client: {}", e)))
}

/// 拼接 API URL
pub fn api_url(base_url: &str, endpoint: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), endpoint)
}

/// 发送阶段的错误分类
pub fn classify_send_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::timeout(e.to_string())
    } else if e.is_decode() {
        ProviderError::invalid_response(e.to_string())
    } else {
        ProviderError::unknown(e.to_string())
    }
}

/// 检查响应状态，非 2xx 转换为对应的错误类别
pub async fn ensure_success(provider: &str, response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let error_text = response.text().await.unwrap_or_default();

    error!("{} API error: {} - {}", provider, status, error_text);

    Err(classify_status(status, retry_after, error_text))
}

pub fn classify_status(
    status: StatusCode,
    retry_after: Option<u64>,
    body: String,
) -> ProviderError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited(retry_after),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            ProviderError::timeout(format!("{}: {}", status, body))
        }
        _ => ProviderError::new(ProviderErrorKind::Unknown, format!("{}: {}", status, body)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_trims_trailing_slash() {
        assert_eq!(
            api_url("https://api.openai.com/v1/", "chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_classify_status() {
        let err = classify_status(StatusCode::TOO_MANY_REQUESTS, Some(12), String::new());
        assert_eq!(err.kind, ProviderErrorKind::RateLimited);
        assert_eq!(err.retry_after_secs, Some(12));

        let err = classify_status(StatusCode::GATEWAY_TIMEOUT, None, "slow".to_string());
        assert_eq!(err.kind, ProviderErrorKind::Timeout);

        let err = classify_status(StatusCode::UNAUTHORIZED, None, "bad key".to_string());
        assert_eq!(err.kind, ProviderErrorKind::Unknown);
        assert!(err.message.contains("bad key"));
    }
}
