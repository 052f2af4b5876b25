use serde::{Deserialize, Serialize};

use crate::wizard::session::SessionId;

/// Top-level destinations. Each variant carries exactly what its page needs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "page", rename_all = "kebab-case")]
pub enum Route {
    Home,
    ContactUs,
    GetQuote,
    QuoteWizard {
        #[serde(rename = "sessionId")]
        session_id: SessionId,
    },
    QuoteThankYou,
    ContactUsThankYou,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::ContactUs => "/contact-us".to_string(),
            Self::GetQuote => "/get-quote".to_string(),
            Self::QuoteWizard { session_id } => format!("/get-quote/{session_id}"),
            Self::QuoteThankYou => "/thank-you".to_string(),
            Self::ContactUsThankYou => "/contact-us/thank-you".to_string(),
        }
    }

    pub fn parse(path: &str) -> Option<Self> {
        let trimmed = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = trimmed.trim_end_matches('/');
        match trimmed {
            "" => Some(Self::Home),
            "/contact-us" => Some(Self::ContactUs),
            "/get-quote" => Some(Self::GetQuote),
            "/thank-you" => Some(Self::QuoteThankYou),
            "/contact-us/thank-you" => Some(Self::ContactUsThankYou),
            other => other
                .strip_prefix("/get-quote/")
                .and_then(|id| id.parse::<SessionId>().ok())
                .map(|session_id| Self::QuoteWizard { session_id }),
        }
    }
}
