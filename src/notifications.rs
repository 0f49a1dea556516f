use rust_decimal::Decimal;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::errors::ServiceError;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: String,
    parse_mode: &'static str,
}

/// Best-effort Telegram notifications for newly placed orders.
///
/// Invoked from the event loop after an order has committed; failures here
/// must never turn a successful order into a reported failure.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    http: reqwest::Client,
    bot_token: String,
    chat_id: String,
    api_base: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            bot_token,
            chat_id,
            api_base: TELEGRAM_API_BASE.to_string(),
        }
    }

    #[cfg(test)]
    fn with_api_base(mut self, api_base: String) -> Self {
        self.api_base = api_base;
        self
    }

    pub async fn notify_order_placed(
        &self,
        order_id: Uuid,
        customer_name: &str,
        phone_number: &str,
        address: &str,
        total_price: Decimal,
    ) -> Result<(), ServiceError> {
        let text = format!(
            "\u{1F4E6} <b>New Order Received!</b>\n\
             Order ID: {order_id}\n\
             Customer: {customer_name}\n\
             Phone: {phone_number}\n\
             Address: {address}\n\
             Total: \u{20B9}{total_price}\n\
             Status: Pending"
        );

        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let body = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
            parse_mode: "HTML",
        };

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::InternalError(format!("Telegram request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ServiceError::InternalError(format!(
                "Telegram API returned status {}",
                response.status()
            )));
        }

        debug!(order_id = %order_id, "Order notification delivered");
        Ok(())
    }
}
