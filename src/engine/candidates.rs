/// Candidacy state of one login, decided by its last non-ignored review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidacy {
    /// Seeded but not reviewed yet. Only the pull request author starts
    /// here: a sufficiently trusted author may self-certify.
    Pending,
    Approved,
    Revoked,
}

impl Candidacy {
    pub fn active(self) -> bool {
        matches!(self, Candidacy::Pending | Candidacy::Approved)
    }
}

/// Ordered association from login to candidacy, replayed deterministically
/// from the review sequence. Insertion order is preserved so permission
/// lookups (and therefore early termination) are reproducible.
#[derive(Debug, Default)]
pub struct CandidateSet {
    entries: Vec<(String, Candidacy)>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the login's candidacy, inserting it on first sight. Last write
    /// wins; the position of an existing login does not change.
    pub fn set(&mut self, login: &str, state: Candidacy) {
        match self.entries.iter_mut().find(|(name, _)| name == login) {
            Some((_, current)) => *current = state,
            None => self.entries.push((login.to_string(), state)),
        }
    }

    /// Logins with an active candidacy, in insertion order.
    pub fn active(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, state)| state.active())
            .map(|(login, _)| login.as_str())
    }

    #[cfg(test)]
    pub fn get(&self, login: &str) -> Option<Candidacy> {
        self.entries
            .iter()
            .find(|(name, _)| name == login)
            .map(|(_, state)| *state)
    }
}
