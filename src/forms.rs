use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::error::FormError;
use crate::models::NewCandidate;

lazy_static! {
    // 9 digits + V/v (old format) or 12 digits (new format)
    static ref NIC_PATTERN: Regex = Regex::new(r"^(?:\d{9}[Vv]|\d{12})$").unwrap();
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, FormError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(FormError::MissingField(field))
    } else {
        Ok(trimmed)
    }
}

pub fn validate_nic(nic: &str) -> Result<String, FormError> {
    let nic = required("NIC", nic)?;
    if NIC_PATTERN.is_match(nic) {
        Ok(nic.to_string())
    } else {
        Err(FormError::InvalidNic)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CandidateForm {
    pub name: String,
    pub party: String,
}

impl CandidateForm {
    pub fn validate(&self) -> Result<NewCandidate, FormError> {
        let name = required("Name", &self.name)?;
        let party = required("Party", &self.party)?;
        Ok(NewCandidate::new(name.to_string(), party.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<LoginRequest, FormError> {
        let email = required("Email", &self.email)?.to_string();
        // Passwords are sent as typed, no trimming
        if self.password.is_empty() {
            return Err(FormError::MissingField("Password"));
        }
        Ok(LoginRequest {
            email,
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub nic: String,
    pub email: String,
    pub role: String,
    pub password: String,
}

#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub full_name: String,
    pub nic: String,
    pub email: String,
    pub role: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<RegisterRequest, FormError> {
        let full_name = required("Full name", &self.full_name)?.to_string();
        let nic = validate_nic(&self.nic)?;
        let email = required("Email", &self.email)?.to_string();
        let role = required("Role", &self.role)?.to_string();
        if self.password.is_empty() {
            return Err(FormError::MissingField("Password"));
        }
        if self.password != self.confirm_password {
            return Err(FormError::PasswordMismatch);
        }
        Ok(RegisterRequest {
            full_name,
            nic,
            email,
            role,
            password: self.password.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nic_accepts_both_formats() {
        assert_eq!(validate_nic("972345678V"), Ok("972345678V".to_string()));
        assert_eq!(validate_nic(" 982233445v "), Ok("982233445v".to_string()));
        assert_eq!(validate_nic("199912345678"), Ok("199912345678".to_string()));
    }

    #[test]
    fn nic_rejects_everything_else() {
        assert_eq!(validate_nic("97234567V"), Err(FormError::InvalidNic));
        assert_eq!(validate_nic("972345678X1"), Err(FormError::InvalidNic));
        assert_eq!(validate_nic("1999123456789"), Err(FormError::InvalidNic));
        assert_eq!(validate_nic(""), Err(FormError::MissingField("NIC")));
    }

    #[test]
    fn candidate_form_requires_name_and_party() {
        let form = CandidateForm {
            name: "  ".into(),
            party: "Unity Front".into(),
        };
        assert_eq!(form.validate(), Err(FormError::MissingField("Name")));

        let form = CandidateForm {
            name: "Nimal Silva".into(),
            party: " Unity Front ".into(),
        };
        let new = form.validate().unwrap();
        assert_eq!(new.party, "Unity Front");
        assert!(!new.id.is_empty());
    }

    #[test]
    fn registration_checks_password_confirmation() {
        let mut form = RegistrationForm {
            full_name: "Kavindu Fernando".into(),
            nic: "990987654V".into(),
            email: "kavindu@example.com".into(),
            role: "admin".into(),
            password: "secret".into(),
            confirm_password: "secrat".into(),
        };
        assert_eq!(form.validate(), Err(FormError::PasswordMismatch));

        form.confirm_password = "secret".into();
        let req = form.validate().unwrap();
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["fullName"], "Kavindu Fernando");
        assert_eq!(json["nic"], "990987654V");
    }

    #[test]
    fn login_requires_both_fields() {
        let form = LoginForm {
            email: "admin@example.com".into(),
            password: String::new(),
        };
        assert_eq!(form.validate(), Err(FormError::MissingField("Password")));
    }
}
