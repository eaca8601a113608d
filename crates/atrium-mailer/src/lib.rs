pub mod template;

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use atrium_types::models::Appointment;

/// Outbound mail settings: one provider, one sender.
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// Base URL of the mail provider's HTTP API.
    pub api_url: String,
    pub api_token: String,
    pub from_address: String,
    pub from_name: String,
    pub reply_to: String,
}

/// Thin client over the mail provider's `POST /email` endpoint. The provider
/// itself is a black box; all we hand it is a rendered message.
pub struct Mailer {
    http: reqwest::Client,
    config: MailConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutgoingEmail<'a> {
    from: String,
    to: &'a str,
    reply_to: &'a str,
    subject: &'a str,
    html_body: &'a str,
}

impl Mailer {
    pub fn new(config: MailConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("building mail HTTP client")?;

        info!("Mailer ready (provider {}, sender {})", config.api_url, config.from_address);
        Ok(Self { http, config })
    }

    /// Send the confirmation message for a freshly confirmed appointment to
    /// the address the client submitted. Callers decide what a failure means;
    /// this method only reports it.
    pub async fn send_confirmation(
        &self,
        appointment: &Appointment,
        date: NaiveDate,
        time: &str,
    ) -> Result<()> {
        let subject = format!("Appointment Confirmed - {}", self.config.from_name);
        let html = template::confirmation_html(appointment, date, time, &self.config.from_name);
        self.send(&appointment.email, &subject, &html).await
    }

    /// Send a short probe message to the reply-to address so an admin can
    /// check the transport end to end.
    pub async fn send_probe(&self) -> Result<()> {
        let subject = format!("Mail transport test - {}", self.config.from_name);
        let html = template::probe_html(&self.config.from_name);
        self.send(&self.config.reply_to, &subject, &html).await
    }

    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()> {
        let url = format!("{}/email", self.config.api_url.trim_end_matches('/'));

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_token)
            .json(&OutgoingEmail {
                from: self.from_header(),
                to,
                reply_to: &self.config.reply_to,
                subject,
                html_body,
            })
            .send()
            .await
            .context("mail provider unreachable")?;

        response
            .error_for_status()
            .context("mail provider rejected the message")?;
        Ok(())
    }

    fn from_header(&self) -> String {
        format!("\"{}\" <{}>", self.config.from_name, self.config.from_address)
    }
}
