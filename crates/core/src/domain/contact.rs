use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// A contact-form message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactMessage {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(invalid("name", "Please enter your name"));
        }
        if !is_well_formed_email(&self.email) {
            return Err(invalid("email", "Please enter a valid email address"));
        }
        if self.message.trim().is_empty() {
            return Err(invalid("message", "Please enter a message"));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> DomainError {
    DomainError::InvalidField { field: field.to_string(), reason: reason.to_string() }
}

/// Shape check equivalent to an `<input type="email">`: one `@`, a non-empty
/// local part, and a dotted domain without empty labels or whitespace.
pub fn is_well_formed_email(raw: &str) -> bool {
    let email = raw.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return false;
    }
    domain.split('.').all(|label| !label.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{is_well_formed_email, ContactMessage};
    use crate::errors::DomainError;

    #[test]
    fn email_shape_check() {
        for ok in ["a@b.com", " planner@events.co.in ", "x+tag@mail.example.org"] {
            assert!(is_well_formed_email(ok), "`{ok}` should be accepted");
        }
        for bad in ["", "a@b", "@b.com", "a@@b.com", "a b@c.com", "a@b..com", "a@.com"] {
            assert!(!is_well_formed_email(bad), "`{bad}` should be rejected");
        }
    }

    #[test]
    fn contact_message_requires_every_field() {
        let message = ContactMessage {
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            message: String::new(),
        };
        let error = message.validate().expect_err("empty message must be rejected");
        assert!(matches!(error, DomainError::InvalidField { ref field, .. } if field == "message"));

        let complete = ContactMessage { message: "Need 30 rooms".to_string(), ..message };
        assert!(complete.validate().is_ok());
    }
}
