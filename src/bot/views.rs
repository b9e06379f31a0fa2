//! Bot UI texts and formatting
//!
//! Contains the static command replies and the HTML formatters for OTP
//! notifications and number listings.

use chrono::{DateTime, Utc};

use crate::provider::{PhoneNumber, SmsMessage};

// ─────────────────────────────────────────────────────────────────────────────
// Static replies
// ─────────────────────────────────────────────────────────────────────────────

/// Reply to the /start command
pub const WELCOME_TEXT: &str = "Welcome to OTP Receiver Bot! I will forward OTPs to the group.";

/// Reply to /numbers when the account has no listable numbers
pub const NO_NUMBERS_TEXT: &str = "No numbers found.";

/// Reply to /numbers when the provider request failed
pub const PROVIDER_UNAVAILABLE_TEXT: &str =
    "⚠️ The SMS provider is unreachable right now. Try again later.";

/// Placeholder for fields the provider did not set
const UNKNOWN: &str = "Unknown";

// ─────────────────────────────────────────────────────────────────────────────
// Formatters
// ─────────────────────────────────────────────────────────────────────────────

/// Format the /numbers reply.
///
/// Entries without a phone number are unusable for display and are
/// skipped; if nothing remains, the reply is [`NO_NUMBERS_TEXT`].
#[must_use]
pub fn render_numbers_list(numbers: &[PhoneNumber]) -> String {
    let mut text = String::from("📱 <b>Your Numbers:</b>\n\n");
    let mut rendered = 0;

    for number in numbers {
        let Some(phone) = number.phone_number.as_deref() else {
            continue;
        };
        let status = number.status.as_deref().unwrap_or(UNKNOWN);

        text.push_str(&format!(
            "Number: {}\nStatus: {}\n\n",
            html_escape::encode_text(phone),
            html_escape::encode_text(status)
        ));
        rendered += 1;
    }

    if rendered == 0 {
        return NO_NUMBERS_TEXT.to_string();
    }

    text.trim_end().to_string()
}

/// Format the group notification for one detected OTP.
#[must_use]
pub fn render_otp_notification(number: &PhoneNumber, sms: &SmsMessage, otp: &str) -> String {
    let phone = number.phone_number.as_deref().unwrap_or(UNKNOWN);
    let sender = sms.sender.as_deref().unwrap_or(UNKNOWN);
    let time = format_timestamp(sms.created_at.as_deref());

    format!(
        "🔐 <b>New OTP Received</b>\n\n\
         📱 Number: {}\n\
         📨 Service: {}\n\
         🔑 OTP: <code>{}</code>\n\
         💬 Text: {}\n\
         ⏰ Time: {}",
        html_escape::encode_text(phone),
        html_escape::encode_text(sender),
        html_escape::encode_text(otp),
        html_escape::encode_text(&sms.message),
        html_escape::encode_text(&time),
    )
}

/// Render a provider timestamp for humans. Unparseable values pass
/// through untouched; a missing value falls back to the current time.
fn format_timestamp(created_at: Option<&str>) -> String {
    match created_at {
        Some(raw) => DateTime::parse_from_rfc3339(raw).map_or_else(
            |_| raw.to_string(),
            |dt| {
                dt.with_timezone(&Utc)
                    .format("%Y-%m-%d %H:%M:%S UTC")
                    .to_string()
            },
        ),
        None => Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(id: &str, phone: Option<&str>, status: Option<&str>) -> PhoneNumber {
        PhoneNumber {
            id: id.to_string(),
            phone_number: phone.map(ToString::to_string),
            status: status.map(ToString::to_string),
        }
    }

    fn sms(message: &str, sender: Option<&str>, created_at: Option<&str>) -> SmsMessage {
        SmsMessage {
            message: message.to_string(),
            sender: sender.map(ToString::to_string),
            created_at: created_at.map(ToString::to_string),
        }
    }

    #[test]
    fn lists_numbers_with_status_fallback() {
        let numbers = vec![
            number("1", Some("+15550100"), Some("active")),
            number("2", Some("+15550101"), None),
        ];

        let text = render_numbers_list(&numbers);
        assert!(text.starts_with("📱 <b>Your Numbers:</b>"));
        assert!(text.contains("Number: +15550100\nStatus: active"));
        assert!(text.contains("Number: +15550101\nStatus: Unknown"));
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn empty_or_unusable_listings_fall_back_to_the_static_reply() {
        assert_eq!(render_numbers_list(&[]), NO_NUMBERS_TEXT);

        // Entries without a display number render nothing
        let numbers = vec![number("1", None, Some("active"))];
        assert_eq!(render_numbers_list(&numbers), NO_NUMBERS_TEXT);
    }

    #[test]
    fn number_fields_are_html_escaped() {
        let numbers = vec![number("1", Some("<b>+1555</b>"), Some("a&b"))];

        let text = render_numbers_list(&numbers);
        assert!(text.contains("&lt;b&gt;+1555&lt;/b&gt;"));
        assert!(text.contains("a&amp;b"));
    }

    #[test]
    fn notification_carries_every_field() {
        let num = number("1", Some("+15550100"), Some("active"));
        let msg = sms(
            "Your OTP is 4821, expires soon",
            Some("BankCo"),
            Some("2024-05-01T10:00:00Z"),
        );

        let text = render_otp_notification(&num, &msg, "4821");
        assert!(text.starts_with("🔐 <b>New OTP Received</b>"));
        assert!(text.contains("📱 Number: +15550100"));
        assert!(text.contains("📨 Service: BankCo"));
        assert!(text.contains("🔑 OTP: <code>4821</code>"));
        assert!(text.contains("💬 Text: Your OTP is 4821, expires soon"));
        assert!(text.contains("⏰ Time: 2024-05-01 10:00:00 UTC"));
    }

    #[test]
    fn notification_escapes_message_content() {
        let num = number("1", None, None);
        let msg = sms("<script>alert(1)</script> otp 9999", None, None);

        let text = render_otp_notification(&num, &msg, "9999");
        assert!(text.contains("&lt;script&gt;"));
        assert!(text.contains("📱 Number: Unknown"));
        assert!(text.contains("📨 Service: Unknown"));
    }

    #[test]
    fn unparseable_timestamps_pass_through() {
        assert_eq!(format_timestamp(Some("yesterday")), "yesterday");
        assert_eq!(
            format_timestamp(Some("2024-05-01T10:00:00+02:00")),
            "2024-05-01 08:00:00 UTC"
        );
        assert!(format_timestamp(None).ends_with("UTC"));
    }
}
