use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use log::info;

use super::{ics, AssignmentNotice, Notifier, NotifyError};
use crate::config::MailConfig;

const SUBJECT_PREVIEW_CHARS: usize = 30;

/// Delivers assignment mails with a calendar invitation attached.
#[derive(Debug, Clone)]
pub struct SmtpNotifier {
    host: String,
    port: u16,
    username: String,
    password: Option<String>,
    from_name: String,
}

impl SmtpNotifier {
    pub fn from_config(config: &MailConfig) -> Result<Self, NotifyError> {
        let username = config
            .username
            .clone()
            .ok_or_else(|| NotifyError::InvalidAddress("mail.username is not set".into()))?;
        Ok(Self {
            host: config.smtp_host.clone(),
            port: config.smtp_port,
            username,
            password: config.password.clone(),
            from_name: config.from_name.clone(),
        })
    }

    pub fn build_message(&self, notice: &AssignmentNotice) -> Result<Message, NotifyError> {
        let from = Mailbox::new(
            Some(self.from_name.clone()),
            self.username
                .parse()
                .map_err(|e| NotifyError::InvalidAddress(format!("{}: {e}", self.username)))?,
        );
        let to: Mailbox = notice
            .assigned_to
            .trim()
            .parse()
            .map_err(|e| NotifyError::InvalidAddress(format!("{}: {e}", notice.assigned_to)))?;

        let html = format!(
            "<p>Se te ha asignado una nueva tarea estratégica.</p>\
             <p><strong>Tarea:</strong> {}</p>\
             <p><strong>Fecha:</strong> {}</p>",
            notice.description, notice.due_date
        );
        let invite = ics::assignment_invite(notice)?;
        let calendar_type = ContentType::parse("text/calendar; charset=utf-8")
            .map_err(|e| NotifyError::Build(e.to_string()))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(subject(&notice.description))
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::html(html))
                    .singlepart(
                        Attachment::new(ics::ATTACHMENT_NAME.to_string())
                            .body(invite, calendar_type),
                    ),
            )
            .map_err(|e| NotifyError::Build(e.to_string()))
    }

    fn transport(&self) -> Result<SmtpTransport, NotifyError> {
        let builder = if self.port == 465 {
            SmtpTransport::relay(&self.host)
        } else {
            SmtpTransport::starttls_relay(&self.host)
        }
        .map_err(|e| NotifyError::Transport(format!("SMTP relay error: {e}")))?
        .port(self.port);

        Ok(match &self.password {
            Some(pass) => builder
                .credentials(Credentials::new(self.username.clone(), pass.clone()))
                .build(),
            None => builder.build(),
        })
    }
}

pub fn subject(description: &str) -> String {
    let preview: String = description.chars().take(SUBJECT_PREVIEW_CHARS).collect();
    if preview.len() < description.len() {
        format!("Nueva Tarea: {preview}...")
    } else {
        format!("Nueva Tarea: {preview}")
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(&self, notice: &AssignmentNotice) -> Result<(), NotifyError> {
        let email = self.build_message(notice)?;
        let mailer = self.transport()?;
        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?
            .map_err(|e| NotifyError::Transport(format!("Failed to send email: {e}")))?;
        info!("Assignment mail sent to {}", notice.assigned_to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier() -> SmtpNotifier {
        SmtpNotifier::from_config(&MailConfig {
            enabled: true,
            username: Some("info@x.com".into()),
            password: Some("secret".into()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_subject_preview() {
        assert_eq!(subject("Corto"), "Nueva Tarea: Corto");
        let long = "Revisar el presupuesto trimestral del área de operaciones";
        let s = subject(long);
        assert!(s.ends_with("..."));
        assert_eq!(s.chars().count(), "Nueva Tarea: ".len() + 30 + 3);
    }

    #[test]
    fn test_message_carries_invite() {
        let notice = AssignmentNotice {
            description: "Draft report".into(),
            due_date: "2024-05-01".into(),
            assigned_to: "alice@x.com".into(),
            assigned_by: "bob@x.com".into(),
            area: "Ops".into(),
            project: "Alpha".into(),
        };
        let message = notifier().build_message(&notice).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("invitacion.ics"));
        assert!(raw.contains("text/calendar"));
    }

    #[test]
    fn test_bad_recipient_is_rejected() {
        let notice = AssignmentNotice {
            description: "x".into(),
            due_date: "2024-05-01".into(),
            assigned_to: "not an address".into(),
            ..Default::default()
        };
        assert!(matches!(
            notifier().build_message(&notice),
            Err(NotifyError::InvalidAddress(_))
        ));
    }
}
