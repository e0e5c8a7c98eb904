use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic category a scene node can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    MainDoor,
    InteriorDoor(u8),
    FrontGate,
    RearGate,
    FrontCurtain,
    RearCurtain,
    ExtraCurtain,
    Light(u8),
    Floor,
}

impl Role {
    pub fn is_light(self) -> bool {
        matches!(self, Role::Light(_))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::MainDoor => write!(f, "main door"),
            Role::InteriorDoor(slot) => write!(f, "interior door {}", slot + 1),
            Role::FrontGate => write!(f, "front gate"),
            Role::RearGate => write!(f, "rear gate"),
            Role::FrontCurtain => write!(f, "front curtain"),
            Role::RearCurtain => write!(f, "rear curtain"),
            Role::ExtraCurtain => write!(f, "extra curtain"),
            Role::Light(slot) => write!(f, "light {}", slot + 1),
            Role::Floor => write!(f, "floor"),
        }
    }
}
