use midas_ports::SendError;
use midas_store::StoreError;
use midas_subscription::SubscriptionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("telegram api error {code}: {description}")]
    Api { code: i32, description: String },

    #[error("malformed api response: {0}")]
    Malformed(String),

    #[error(transparent)]
    Subscription(#[from] SubscriptionError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl GatewayError {
    /// Collapse a transport failure into the Messenger port's taxonomy.
    ///
    /// 403 means the user blocked the bot; a 400 about a missing or
    /// deactivated chat is equally unrecoverable. Everything else (rate
    /// limits, server errors, network failures) is worth a retry.
    pub fn into_send_error(self) -> SendError {
        match &self {
            GatewayError::Api { code: 403, .. } => SendError::Permanent(self.to_string()),
            GatewayError::Api { code: 400, description }
                if description.contains("chat not found")
                    || description.contains("user is deactivated") =>
            {
                SendError::Permanent(self.to_string())
            }
            _ => SendError::Transient(self.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_bot_is_permanent() {
        let err = GatewayError::Api {
            code: 403,
            description: "Forbidden: bot was blocked by the user".into(),
        };
        assert!(err.into_send_error().is_permanent());
    }

    #[test]
    fn missing_chat_is_permanent() {
        let err = GatewayError::Api {
            code: 400,
            description: "Bad Request: chat not found".into(),
        };
        assert!(err.into_send_error().is_permanent());
    }

    #[test]
    fn rate_limit_and_server_errors_are_transient() {
        let limited = GatewayError::Api {
            code: 429,
            description: "Too Many Requests: retry after 5".into(),
        };
        assert!(!limited.into_send_error().is_permanent());

        let flaky = GatewayError::Api {
            code: 502,
            description: "Bad Gateway".into(),
        };
        assert!(!flaky.into_send_error().is_permanent());
    }
}
