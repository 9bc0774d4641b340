use crate::model::{Role, User};
use thiserror::Error;

pub const DOCTOR_PASSCODE: &str = "0000";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("Invalid access code. Please use the default staff password (0000).")]
    InvalidPasscode,
    #[error("unknown doctor profile: {0}")]
    UnknownDoctor(String),
}

pub fn doctors() -> Vec<User> {
    vec![
        doctor("d-rao", "Dr. Anjali Rao"),
        doctor("d-mehta", "Dr. Vikram Mehta"),
        doctor("d-khan", "Dr. Sara Khan"),
    ]
}

fn doctor(id: &str, name: &str) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        role: Role::Doctor,
    }
}

pub fn doctor_name(doctor_id: &str) -> Option<String> {
    doctors()
        .into_iter()
        .find(|doc| doc.id == doctor_id)
        .map(|doc| doc.name)
}

pub fn patient_identity(name: &str) -> Option<User> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let slug = name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");

    Some(User {
        id: format!("p-{slug}"),
        name: name.to_string(),
        role: Role::Patient,
    })
}

pub fn doctor_identity(doctor_id: &str, passcode: &str) -> Result<User, LoginError> {
    if passcode != DOCTOR_PASSCODE {
        return Err(LoginError::InvalidPasscode);
    }

    doctors()
        .into_iter()
        .find(|doc| doc.id == doctor_id)
        .ok_or_else(|| LoginError::UnknownDoctor(doctor_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patient_id_is_derived_from_the_lowercased_hyphenated_name() {
        let user = patient_identity("Asha Verma").expect("name should yield an identity");
        assert_eq!(user.id, "p-asha-verma");
        assert_eq!(user.name, "Asha Verma");
        assert_eq!(user.role, Role::Patient);
    }

    #[test]
    fn patient_name_is_trimmed_and_whitespace_runs_collapse() {
        let user = patient_identity("  Ravi   Kumar ").expect("name should yield an identity");
        assert_eq!(user.id, "p-ravi-kumar");
        assert_eq!(user.name, "Ravi Kumar");
    }

    #[test]
    fn blank_patient_names_are_rejected() {
        assert_eq!(patient_identity(""), None);
        assert_eq!(patient_identity("   "), None);
    }

    #[test]
    fn default_passcode_authenticates_a_roster_doctor() {
        let doc = doctor_identity("d-rao", "0000").expect("default passcode should authenticate");
        assert_eq!(doc.name, "Dr. Anjali Rao");
        assert_eq!(doc.role, Role::Doctor);
    }

    #[test]
    fn wrong_passcode_fails_with_the_inline_message() {
        let err = doctor_identity("d-rao", "1234").expect_err("wrong passcode should fail");
        assert_eq!(err, LoginError::InvalidPasscode);
        assert_eq!(
            err.to_string(),
            "Invalid access code. Please use the default staff password (0000)."
        );
    }

    #[test]
    fn unknown_roster_id_fails_even_with_the_right_passcode() {
        let err = doctor_identity("d-nobody", "0000").expect_err("unknown doctor should fail");
        assert_eq!(err, LoginError::UnknownDoctor("d-nobody".to_string()));
    }

    #[test]
    fn roster_lookup_resolves_names() {
        assert_eq!(doctor_name("d-mehta").as_deref(), Some("Dr. Vikram Mehta"));
        assert_eq!(doctor_name("d-nobody"), None);
    }
}
