//! Outbound notifications: transactional email and Slack pings
//!
//! Message bodies are built by pure template functions here; delivery
//! lives in the email and slack clients. Notification failures are
//! reported to callers but never roll back the write they accompany.

pub mod email;
pub mod slack;

pub use email::EmailClient;
pub use slack::SlackNotifier;

use crate::db::schemas::MerchOrderDoc;

/// Customer-facing merch order confirmation body
pub fn merch_confirmation_email(order: &MerchOrderDoc) -> (String, String) {
    let subject = format!("Your Wilbe order {} is in", order.order_id);
    let html = format!(
        "<p>Hi {},</p>\
         <p>We've received your order for a <strong>{}</strong> (size {}). \
         It will ship to:</p>\
         <p>{}</p>\
         <p>We'll email you again when it's on its way.</p>\
         <p>— The Wilbe team</p>",
        order.name, order.item, order.size, order.address
    );
    (subject, html)
}

/// Internal merch order notification body
pub fn merch_team_email(order: &MerchOrderDoc) -> (String, String) {
    let subject = format!("New merch order: {} ({})", order.item, order.order_id);
    let html = format!(
        "<p>New order from {} &lt;{}&gt;</p>\
         <ul><li>Item: {}</li><li>Size: {}</li><li>Ship to: {}</li></ul>",
        order.name, order.email, order.item, order.size, order.address
    );
    (subject, html)
}

/// Slack line for a merch order
pub fn merch_slack_text(order: &MerchOrderDoc) -> String {
    format!(
        ":shirt: New merch order {} — {} ({}) for {}",
        order.order_id, order.item, order.size, order.name
    )
}

/// Internal notification body for a waitlist signup
pub fn waitlist_team_email(name: &str, email: &str, referred_by: Option<&str>) -> (String, String) {
    let subject = format!("New waitlist signup: {}", name);
    let referral = match referred_by {
        Some(code) => format!("<p>Referred by code {}</p>", code),
        None => String::new(),
    };
    let html = format!(
        "<p>{} &lt;{}&gt; joined the waitlist.</p>{}",
        name, email, referral
    );
    (subject, html)
}

/// Slack line for a waitlist signup
pub fn waitlist_slack_text(name: &str, email: &str, referred_by: Option<&str>) -> String {
    match referred_by {
        Some(code) => format!(
            ":wave: {} <{}> joined the waitlist (referred via {})",
            name, email, code
        ),
        None => format!(":wave: {} <{}> joined the waitlist", name, email),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> MerchOrderDoc {
        MerchOrderDoc {
            order_id: "ord-42".to_string(),
            member_id: "mem-1".to_string(),
            name: "Ada".to_string(),
            email: "ada@lab.org".to_string(),
            item: "hoodie".to_string(),
            size: "M".to_string(),
            address: "1 Lab Lane".to_string(),
            status: "received".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_confirmation_email_addresses_customer() {
        let (subject, html) = merch_confirmation_email(&order());
        assert!(subject.contains("ord-42"));
        assert!(html.contains("Ada"));
        assert!(html.contains("hoodie"));
        assert!(html.contains("1 Lab Lane"));
    }

    #[test]
    fn test_team_email_carries_contact_details() {
        let (_, html) = merch_team_email(&order());
        assert!(html.contains("ada@lab.org"));
        assert!(html.contains("size: M") || html.contains("Size: M"));
    }

    #[test]
    fn test_waitlist_email_mentions_referrer_only_when_present() {
        let (_, with) = waitlist_team_email("Ada", "ada@lab.org", Some("AB12CD34"));
        assert!(with.contains("AB12CD34"));

        let (_, without) = waitlist_team_email("Ada", "ada@lab.org", None);
        assert!(!without.contains("Referred"));
    }

    #[test]
    fn test_slack_text_is_single_line() {
        let text = merch_slack_text(&order());
        assert!(!text.contains('\n'));
        assert!(text.contains("ord-42"));
    }

    #[test]
    fn test_waitlist_slack_text_mentions_referrer_only_when_present() {
        let with = waitlist_slack_text("Ada", "ada@lab.org", Some("AB12CD34"));
        assert!(with.contains("AB12CD34"));
        assert!(!with.contains('\n'));

        let without = waitlist_slack_text("Ada", "ada@lab.org", None);
        assert!(!without.contains("referred"));
        assert!(without.contains("ada@lab.org"));
    }
}
