use serde::Serialize;
use std::fmt;

/// Who is performing an operation. Resolved above the core (authentication
/// is not our business) and passed down explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Actor {
    Staff(i64),
    Operator(String),
    System,
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::Staff(id) => write!(f, "staff:{id}"),
            Actor::Operator(name) => write!(f, "operator:{name}"),
            Actor::System => write!(f, "system"),
        }
    }
}

/// Pre-resolved tenant plus the acting user. Every query in `db` filters on
/// `tenant_id`.
#[derive(Debug, Clone)]
pub struct Scope {
    pub tenant_id: i64,
    pub actor: Actor,
}

impl Scope {
    pub fn new(tenant_id: i64, actor: Actor) -> Self {
        Self { tenant_id, actor }
    }

    pub fn system(tenant_id: i64) -> Self {
        Self::new(tenant_id, Actor::System)
    }
}
