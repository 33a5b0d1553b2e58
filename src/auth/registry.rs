//! Registered client lookup.

use crate::config::ClientPolicy;

/// Read-only registry of configured clients.
#[derive(Debug, Clone, Default)]
pub struct ClientRegistry {
    clients: Vec<ClientPolicy>,
}

impl ClientRegistry {
    pub fn new(clients: Vec<ClientPolicy>) -> Self {
        Self { clients }
    }

    /// Credential match for token issuance; id and secret compare case-insensitively.
    pub fn find_by_credentials(&self, client_id: &str, client_secret: &str) -> Option<&ClientPolicy> {
        self.clients.iter().find(|c| {
            eq_ignore_case(&c.client_id, client_id) && eq_ignore_case(&c.client_secret, client_secret)
        })
    }

    /// Exact `(client_id, role)` match for authorization.
    pub fn find_by_subject_and_role(&self, client_id: &str, role: &str) -> Option<&ClientPolicy> {
        self.clients
            .iter()
            .find(|c| c.client_id == client_id && c.role == role)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

pub(crate) fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Case-insensitive `haystack.starts_with(prefix)`.
pub(crate) fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    let mut rest = haystack.chars().flat_map(char::to_lowercase);
    prefix
        .chars()
        .flat_map(char::to_lowercase)
        .all(|c| rest.next() == Some(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ClientRegistry {
        ClientRegistry::new(vec![
            ClientPolicy {
                client_id: "acme".into(),
                client_secret: "Secret1".into(),
                role: "user".into(),
                allowed: vec!["reports".into()],
            },
            ClientPolicy {
                client_id: "root".into(),
                client_secret: "toor".into(),
                role: "admin".into(),
                allowed: vec![],
            },
        ])
    }

    #[test]
    fn test_credentials_are_case_insensitive() {
        let registry = registry();
        assert_eq!(registry.find_by_credentials("ACME", "secret1").unwrap().role, "user");
        assert!(registry.find_by_credentials("acme", "secret2").is_none());
        assert!(registry.find_by_credentials("acm", "Secret1").is_none());
    }

    #[test]
    fn test_subject_and_role_are_exact() {
        let registry = registry();
        assert!(registry.find_by_subject_and_role("root", "admin").is_some());
        assert!(registry.find_by_subject_and_role("root", "user").is_none());
        assert!(registry.find_by_subject_and_role("ROOT", "admin").is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_starts_with_ignore_case() {
        assert!(starts_with_ignore_case("Reports/Summary", "reports"));
        assert!(starts_with_ignore_case("anything", ""));
        assert!(!starts_with_ignore_case("rep", "reports"));
        assert!(!starts_with_ignore_case("billing", "reports"));
    }
}
