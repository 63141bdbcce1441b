/// Header naming the person performing a write; copied onto ledger rows.
pub const ACTOR_HEADER: &str = "x-galley-user";

/// Who is making the request, if they said so.
///
/// Informational only: it fills `performed_by` / `recorded_by` /
/// `received_by`. There is no authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Actor {
    name: Option<String>,
}

impl Actor {
    pub fn new(name: Option<String>) -> Self {
        Self {
            name: name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        }
    }

    pub fn name(&self) -> Option<String> {
        self.name.clone()
    }
}
