use serde_json::json;

use crate::config::TelegramConfig;
use crate::error::{AppError, AppResult};
use crate::models::{DeliveryType, Order, OrderItemSnapshot, PaymentMethod};

/// Chat-bot webhook for staff order notifications. Best-effort by design:
/// callers log failures and move on, a lost notification never blocks an
/// order.
pub struct TelegramNotifier {
    client: reqwest::Client,
    config: TelegramConfig,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config: config.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// POST the message to the bot API. A missing configuration is a no-op
    /// with a warning, matching the original storefront behavior.
    pub async fn send_message(&self, text: &str) -> AppResult<()> {
        let (Some(token), Some(chat_id)) = (&self.config.bot_token, &self.config.chat_id) else {
            tracing::warn!("Telegram bot token or chat id not configured, skipping notification");
            return Ok(());
        };

        let url = format!("{}/bot{}/sendMessage", self.config.api_base, token);
        let body = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Telegram request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Internal(format!(
                "Telegram API error {}: {}",
                status, detail
            )));
        }

        Ok(())
    }

    /// Render the HTML-flavored order summary posted to the staff chat
    pub fn format_order_message(order: &Order, items: &[OrderItemSnapshot]) -> String {
        let items_text = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let size = item
                    .size
                    .map(|s| format!(" ({})", s))
                    .unwrap_or_default();
                let extras = if item.ingredients.is_empty() {
                    String::new()
                } else {
                    format!(
                        "\n   🧂 Extras: {}",
                        escape_html(&item.ingredients.join(", "))
                    )
                };
                format!(
                    "{}. {}{} - {} pcs.{}",
                    index + 1,
                    escape_html(&item.product_name),
                    size,
                    item.quantity,
                    extras
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let delivery_text = match order.delivery_type_enum() {
            DeliveryType::Delivery => {
                let address = if order.address.trim().is_empty() {
                    "not provided".to_string()
                } else {
                    escape_html(&order.address)
                };
                format!("🚚 <b>DELIVERY</b>\n📍 <b>Address:</b> {}\n", address)
            }
            DeliveryType::Pickup => "🏪 <b>PICKUP</b>\n".to_string(),
        };

        let payment_text = match order.payment_method_enum() {
            PaymentMethod::Cash => "💵 <b>PAY ON RECEIPT</b>\n",
            PaymentMethod::Online => "💳 <b>ONLINE PAYMENT</b>\n",
        };

        let comment_text = match order.comment.as_deref().map(str::trim) {
            Some(comment) if !comment.is_empty() => {
                format!("💬 <b>Comment:</b>\n{}\n", escape_html(comment))
            }
            _ => "💬 <b>Comment:</b> none\n".to_string(),
        };

        let branch_name = order.branch_name.as_deref().unwrap_or("not specified");
        let delivery_label = match order.delivery_type_enum() {
            DeliveryType::Delivery => "Delivery",
            DeliveryType::Pickup => "Pickup",
        };
        let payment_label = match order.payment_method_enum() {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Online => "Online",
        };

        format!(
            "🆕 <b>NEW ORDER #{id}</b>\n\
             \n\
             👤 <b>CUSTOMER:</b> {name}\n\
             📞 <b>PHONE:</b> <code>{phone}</code>\n\
             🏙️ <b>BRANCH:</b> {branch}\n\
             \n\
             {delivery}{payment}{comment}\n\
             🛒 <b>ORDER ITEMS:</b>\n\
             {items}\n\
             \n\
             💰 <b>TOTAL:</b> <b>{total} ₽</b>\n\
             ⏰ <b>TIME:</b> {time}\n\
             ----------------------------\n\
             <b>Order id:</b> {id}\n\
             <b>Branch id:</b> {branch_id}\n\
             <b>Type:</b> {delivery_label}\n\
             <b>Payment:</b> {payment_label}",
            id = order.id,
            name = escape_html(&order.full_name),
            phone = escape_html(&order.phone),
            branch = escape_html(branch_name),
            delivery = delivery_text,
            payment = payment_text,
            comment = comment_text,
            items = items_text,
            total = order.total_amount,
            time = order.created_at.format("%d.%m.%Y %H:%M:%S"),
            branch_id = order.branch_id,
            delivery_label = delivery_label,
            payment_label = payment_label,
        )
    }
}

/// Minimal escaping for parse_mode=HTML payloads
fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn order(delivery: &str, payment: &str) -> Order {
        Order {
            id: 42,
            token: "tok".to_string(),
            full_name: "Anna".to_string(),
            email: None,
            phone: "+79990001122".to_string(),
            address: "Main st. 5".to_string(),
            branch_id: "branch-1".to_string(),
            branch_name: Some("Central".to_string()),
            comment: Some("ring twice".to_string()),
            delivery_type: delivery.to_string(),
            payment_method: payment.to_string(),
            total_amount: 1160,
            status: "succeeded".to_string(),
            items: "[]".to_string(),
            created_at: Utc::now(),
        }
    }

    fn items() -> Vec<OrderItemSnapshot> {
        vec![
            OrderItemSnapshot {
                product_name: "Pepperoni".to_string(),
                size: Some(30),
                quantity: 2,
                ingredients: vec!["cheese".to_string(), "bacon".to_string()],
                line_total: 960,
            },
            OrderItemSnapshot {
                product_name: "Cola".to_string(),
                size: None,
                quantity: 1,
                ingredients: vec![],
                line_total: 200,
            },
        ]
    }

    #[test]
    fn delivery_order_includes_address_block() {
        let message = TelegramNotifier::format_order_message(&order("delivery", "cash"), &items());

        assert!(message.contains("NEW ORDER #42"));
        assert!(message.contains("<code>+79990001122</code>"));
        assert!(message.contains("<b>DELIVERY</b>"));
        assert!(message.contains("Main st. 5"));
        assert!(message.contains("PAY ON RECEIPT"));
        assert!(message.contains("1. Pepperoni (30) - 2 pcs."));
        assert!(message.contains("🧂 Extras: cheese, bacon"));
        assert!(message.contains("2. Cola - 1 pcs."));
        assert!(message.contains("<b>1160 ₽</b>"));
    }

    #[test]
    fn pickup_order_skips_address() {
        let mut order = order("pickup", "online");
        order.address = String::new();

        let message = TelegramNotifier::format_order_message(&order, &items());

        assert!(message.contains("<b>PICKUP</b>"));
        assert!(!message.contains("<b>Address:</b>"));
        assert!(message.contains("ONLINE PAYMENT"));
    }

    #[test]
    fn empty_delivery_address_is_marked() {
        let mut order = order("delivery", "cash");
        order.address = String::new();

        let message = TelegramNotifier::format_order_message(&order, &[]);

        assert!(message.contains("<b>Address:</b> not provided"));
    }

    #[test]
    fn customer_text_is_html_escaped() {
        let mut order = order("delivery", "cash");
        order.full_name = "<script>".to_string();
        order.comment = Some("a & b".to_string());

        let message = TelegramNotifier::format_order_message(&order, &[]);

        assert!(message.contains("&lt;script&gt;"));
        assert!(message.contains("a &amp; b"));
        assert!(!message.contains("<script>"));
    }

    #[tokio::test]
    async fn unconfigured_notifier_is_a_no_op() {
        let notifier = TelegramNotifier::new(&TelegramConfig::default());

        assert!(!notifier.is_configured());
        assert!(notifier.send_message("hello").await.is_ok());
    }
}
