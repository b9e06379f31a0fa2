//! Fixed-interval OTP poll loop
//!
//! Each cycle lists the account's numbers, lists the stored messages per
//! number, filters for OTP-bearing bodies and pushes one group notification
//! per match. Nothing is remembered between cycles; a message the provider
//! keeps returning is announced again on the next cycle.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::bot::notify::Notifier;
use crate::bot::views;
use crate::config::PollMode;
use crate::otp::extract_otp;
use crate::provider::{PhoneNumber, SmsProvider};

/// Periodically scans provisioned numbers for OTP-bearing messages.
#[derive(Clone)]
pub struct OtpPoller {
    provider: Arc<dyn SmsProvider>,
    notifier: Arc<dyn Notifier>,
    period: Duration,
    mode: PollMode,
}

impl OtpPoller {
    /// Create a poller over the given provider and notifier.
    #[must_use]
    pub fn new(
        provider: Arc<dyn SmsProvider>,
        notifier: Arc<dyn Notifier>,
        period: Duration,
        mode: PollMode,
    ) -> Self {
        Self {
            provider,
            notifier,
            period,
            mode,
        }
    }

    /// Run the poll loop forever. The first cycle starts immediately.
    pub async fn run(self) {
        let mut ticker = interval(self.period);
        if self.mode == PollMode::Serialize {
            // An overrunning cycle delays later ticks; they never pile up.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        }

        info!(
            "Starting OTP poll loop (period: {}s, mode: {:?})",
            self.period.as_secs(),
            self.mode
        );

        loop {
            ticker.tick().await;

            match self.mode {
                PollMode::Serialize => self.run_cycle().await,
                PollMode::Overlap => {
                    let poller = self.clone();
                    tokio::spawn(async move { poller.run_cycle().await });
                }
            }
        }
    }

    /// Run one scan over every provisioned number.
    pub async fn run_cycle(&self) {
        if let Err(e) = self.provider.check_connection().await {
            warn!("Skipping poll cycle, provider unreachable: {e}");
            return;
        }

        let numbers = match self.provider.list_numbers().await {
            Ok(numbers) => numbers,
            Err(e) => {
                error!("Failed to fetch numbers: {e}");
                return;
            }
        };

        debug!("Fetched {} numbers", numbers.len());

        for number in &numbers {
            self.scan_number(number).await;
        }
    }

    /// Scan one number's stored messages; a failure here skips only this
    /// number, not the rest of the cycle.
    async fn scan_number(&self, number: &PhoneNumber) {
        let messages = match self.provider.list_messages(&number.id).await {
            Ok(messages) => messages,
            Err(e) => {
                error!("Failed to fetch messages for number {}: {e}", number.id);
                return;
            }
        };

        debug!(
            "Fetched {} messages for number {}",
            messages.len(),
            number.id
        );

        for sms in &messages {
            if sms.message.is_empty() {
                debug!("Skipping empty message for number {}", number.id);
                continue;
            }

            if !sms.message.to_lowercase().contains("otp") {
                continue;
            }

            let Some(otp) = extract_otp(&sms.message) else {
                continue;
            };

            let text = views::render_otp_notification(number, sms, otp);
            if let Err(e) = self.notifier.notify(&text).await {
                error!("Failed to send OTP notification: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::notify::MockNotifier;
    use crate::provider::{MockSmsProvider, ProviderError, SmsMessage};

    fn test_number(id: &str) -> PhoneNumber {
        PhoneNumber {
            id: id.to_string(),
            phone_number: Some(format!("+1555{id}")),
            status: Some("active".to_string()),
        }
    }

    fn test_sms(body: &str) -> SmsMessage {
        SmsMessage {
            message: body.to_string(),
            sender: Some("BankCo".to_string()),
            created_at: Some("2024-05-01T10:00:00Z".to_string()),
        }
    }

    fn poller(provider: MockSmsProvider, notifier: MockNotifier) -> OtpPoller {
        OtpPoller::new(
            Arc::new(provider),
            Arc::new(notifier),
            Duration::from_secs(30),
            PollMode::Serialize,
        )
    }

    #[tokio::test]
    async fn failed_probe_skips_the_whole_cycle() {
        let mut provider = MockSmsProvider::new();
        provider
            .expect_check_connection()
            .times(1)
            .returning(|| Err(ProviderError::Network("connection refused".to_string())));
        provider.expect_list_numbers().times(0);

        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(0);

        poller(provider, notifier).run_cycle().await;
    }

    #[tokio::test]
    async fn failed_number_fetch_produces_no_notifications() {
        let mut provider = MockSmsProvider::new();
        provider.expect_check_connection().returning(|| Ok(()));
        provider
            .expect_list_numbers()
            .times(1)
            .returning(|| Err(ProviderError::Api("502 Bad Gateway".to_string())));
        provider.expect_list_messages().times(0);

        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(0);

        poller(provider, notifier).run_cycle().await;
    }

    #[tokio::test]
    async fn otp_bearing_message_notifies_exactly_once() {
        let mut provider = MockSmsProvider::new();
        provider.expect_check_connection().returning(|| Ok(()));
        provider
            .expect_list_numbers()
            .returning(|| Ok(vec![test_number("n-1")]));
        provider
            .expect_list_messages()
            .withf(|id| id == "n-1")
            .returning(|_| {
                Ok(vec![
                    test_sms("Your OTP is 4821, expires soon"),
                    test_sms("Hello there"),
                ])
            });

        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|text| text.contains("<code>4821</code>"))
            .times(1)
            .returning(|_| Ok(()));

        poller(provider, notifier).run_cycle().await;
    }

    #[tokio::test]
    async fn a_failing_number_does_not_abort_the_cycle() {
        let mut provider = MockSmsProvider::new();
        provider.expect_check_connection().returning(|| Ok(()));
        provider
            .expect_list_numbers()
            .returning(|| Ok(vec![test_number("n-1"), test_number("n-2")]));
        provider
            .expect_list_messages()
            .withf(|id| id == "n-1")
            .returning(|_| Err(ProviderError::Network("timeout".to_string())));
        provider
            .expect_list_messages()
            .withf(|id| id == "n-2")
            .returning(|_| Ok(vec![test_sms("otp code 777123")]));

        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|text| text.contains("777123"))
            .times(1)
            .returning(|_| Ok(()));

        poller(provider, notifier).run_cycle().await;
    }

    #[tokio::test]
    async fn non_otp_and_empty_bodies_are_ignored() {
        let mut provider = MockSmsProvider::new();
        provider.expect_check_connection().returning(|| Ok(()));
        provider
            .expect_list_numbers()
            .returning(|| Ok(vec![test_number("n-1")]));
        provider.expect_list_messages().returning(|_| {
            Ok(vec![
                test_sms("Hello there, call 123456"),
                test_sms(""),
                test_sms("Your otp will arrive shortly"),
            ])
        });

        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(0);

        poller(provider, notifier).run_cycle().await;
    }

    #[tokio::test]
    async fn a_failed_notification_does_not_stop_the_scan() {
        let mut provider = MockSmsProvider::new();
        provider.expect_check_connection().returning(|| Ok(()));
        provider
            .expect_list_numbers()
            .returning(|| Ok(vec![test_number("n-1")]));
        provider.expect_list_messages().returning(|_| {
            Ok(vec![test_sms("otp 1111 first"), test_sms("otp 2222 second")])
        });

        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|text| text.contains("1111"))
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("telegram 502")));
        notifier
            .expect_notify()
            .withf(|text| text.contains("2222"))
            .times(1)
            .returning(|_| Ok(()));

        poller(provider, notifier).run_cycle().await;
    }
}
