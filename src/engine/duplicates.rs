//! Advisory duplicate detection over existing leads and customers.

use super::intake::normalize_phone;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Lead,
    Customer,
}

impl ContactKind {
    fn label(&self) -> &'static str {
        match self {
            ContactKind::Lead => "lead",
            ContactKind::Customer => "customer",
        }
    }
}

/// Contact fields of an existing lead or customer.
#[derive(Debug, Clone, PartialEq)]
pub struct KnownContact {
    pub kind: ContactKind,
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Returns a warning naming the first contact whose normalized phone or email matches.
///
/// Never blocks creation; callers decide whether to surface it.
pub fn find_duplicate(
    phone: Option<&str>,
    email: Option<&str>,
    known: &[KnownContact],
) -> Option<String> {
    let phone = phone.map(normalize_phone).filter(|p| !p.is_empty());
    let email = email.map(normalize_email).filter(|e| !e.is_empty());
    if phone.is_none() && email.is_none() {
        return None;
    }

    known.iter().find_map(|contact| {
        let phone_match = match (&phone, &contact.phone) {
            (Some(wanted), Some(existing)) => *wanted == normalize_phone(existing),
            _ => false,
        };
        let email_match = match (&email, &contact.email) {
            (Some(wanted), Some(existing)) => *wanted == normalize_email(existing),
            _ => false,
        };

        let field = match (phone_match, email_match) {
            (true, true) => "phone and email",
            (true, false) => "phone",
            (false, true) => "email",
            (false, false) => return None,
        };
        Some(format!(
            "Possible duplicate: {} matches existing {} {} ({})",
            field,
            contact.kind.label(),
            contact.name,
            contact.id
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known() -> Vec<KnownContact> {
        vec![
            KnownContact {
                kind: ContactKind::Lead,
                id: "lead-1".to_string(),
                name: "Sam Park".to_string(),
                phone: Some("(512) 555-0101".to_string()),
                email: None,
            },
            KnownContact {
                kind: ContactKind::Customer,
                id: "cust-1".to_string(),
                name: "Rita Gomez".to_string(),
                phone: None,
                email: Some("Rita@Example.com".to_string()),
            },
        ]
    }

    #[test]
    fn test_phone_match_after_normalization() {
        let warning = find_duplicate(Some("512.555.0101"), None, &known()).unwrap();
        assert!(warning.contains("phone"));
        assert!(warning.contains("lead Sam Park"));
    }

    #[test]
    fn test_email_match_is_case_insensitive() {
        let warning = find_duplicate(None, Some(" rita@example.COM "), &known()).unwrap();
        assert!(warning.contains("customer Rita Gomez"));
    }

    #[test]
    fn test_no_match_and_blank_inputs() {
        assert_eq!(find_duplicate(Some("5125550199"), None, &known()), None);
        assert_eq!(find_duplicate(Some("---"), Some("  "), &known()), None);
        assert_eq!(find_duplicate(None, None, &known()), None);
    }
}
