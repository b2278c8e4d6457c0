use super::sendmail::send_email;
use crate::config::Config;

pub async fn send_notification_email(
    config: &Config,
    to_email: &str,
    subject: &str,
    message: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let body = format!(
        "Hello,\n\n{}\n\nVisit {} for details.\n\n— FreelanceHub",
        message, config.app_url
    );

    send_email(config, to_email, subject, &body).await
}
