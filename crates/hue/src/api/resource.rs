use std::fmt::{self, Debug, Display};

use serde::{Deserialize, Serialize};

#[derive(Copy, Debug, Default, Serialize, Deserialize, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RType {
    BridgeHome,
    Device,
    GroupedLight,
    Light,
    Room,
    Scene,
    Zone,
    /// Any resource type outside the handled subset
    #[default]
    #[serde(other)]
    Other,
}

/// The three keyed collections of the state store.
///
/// Every handled resource type belongs to exactly one of them.
#[derive(Copy, Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
    Group,
    Light,
    Scene,
}

impl RType {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "bridge_home" => Self::BridgeHome,
            "device" => Self::Device,
            "grouped_light" => Self::GroupedLight,
            "light" => Self::Light,
            "room" => Self::Room,
            "scene" => Self::Scene,
            "zone" => Self::Zone,
            _ => Self::Other,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BridgeHome => "bridge_home",
            Self::Device => "device",
            Self::GroupedLight => "grouped_light",
            Self::Light => "light",
            Self::Room => "room",
            Self::Scene => "scene",
            Self::Zone => "zone",
            Self::Other => "other",
        }
    }

    #[must_use]
    pub const fn category(self) -> Option<Category> {
        match self {
            Self::BridgeHome | Self::Room | Self::Zone => Some(Category::Group),
            Self::Light => Some(Category::Light),
            Self::Scene => Some(Category::Scene),
            Self::Device | Self::GroupedLight | Self::Other => None,
        }
    }

    #[must_use]
    pub fn link_to(self, rid: impl Into<String>) -> ResourceLink {
        ResourceLink {
            rid: rid.into(),
            rtype: self,
        }
    }
}

impl Display for RType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Hash, Serialize, Deserialize, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ResourceLink {
    pub rid: String,
    pub rtype: RType,
}

impl ResourceLink {
    /// Path of this resource below the bridge's `/clip/v2/resource` root
    #[must_use]
    pub fn path(&self) -> String {
        format!("{}/{}", self.rtype, self.rid)
    }
}

impl Debug for ResourceLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.rtype, self.rid)
    }
}
