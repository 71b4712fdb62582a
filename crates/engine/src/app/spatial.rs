use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{EntityId, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityTag {
    Damageable,
    Collectable,
    Interactable,
    Player,
}

impl CapabilityTag {
    pub const ALL: [CapabilityTag; 4] = [
        CapabilityTag::Damageable,
        CapabilityTag::Collectable,
        CapabilityTag::Interactable,
        CapabilityTag::Player,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            CapabilityTag::Damageable => "damageable",
            CapabilityTag::Collectable => "collectable",
            CapabilityTag::Interactable => "interactable",
            CapabilityTag::Player => "player",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            CapabilityTag::Damageable => 1 << 0,
            CapabilityTag::Collectable => 1 << 1,
            CapabilityTag::Interactable => 1 << 2,
            CapabilityTag::Player => 1 << 3,
        }
    }
}

impl fmt::Display for CapabilityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown capability tag '{0}'")]
pub struct UnknownCapabilityTag(pub String);

impl FromStr for CapabilityTag {
    type Err = UnknownCapabilityTag;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        CapabilityTag::ALL
            .into_iter()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownCapabilityTag(trimmed.to_string()))
    }
}

/// Small bitset of [`CapabilityTag`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    pub const EMPTY: Self = Self(0);

    pub fn from_tags(tags: &[CapabilityTag]) -> Self {
        let mut set = Self::EMPTY;
        for tag in tags {
            set.insert(*tag);
        }
        set
    }

    /// Parses a comma separated list such as `"damageable, player"`.
    /// Empty segments are ignored.
    pub fn parse_list(raw: &str) -> Result<Self, UnknownCapabilityTag> {
        let mut set = Self::EMPTY;
        for segment in raw.split(',') {
            if segment.trim().is_empty() {
                continue;
            }
            set.insert(segment.parse()?);
        }
        Ok(set)
    }

    pub fn contains(self, tag: CapabilityTag) -> bool {
        self.0 & tag.bit() != 0
    }

    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, tag: CapabilityTag) -> bool {
        let had = self.contains(tag);
        self.0 |= tag.bit();
        !had
    }

    pub fn remove(&mut self, tag: CapabilityTag) -> bool {
        let had = self.contains(tag);
        self.0 &= !tag.bit();
        had
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = CapabilityTag> {
        CapabilityTag::ALL
            .into_iter()
            .filter(move |tag| self.contains(*tag))
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for tag in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            f.write_str(tag.as_str())?;
            first = false;
        }
        Ok(())
    }
}

pub trait SpatialQuery {
    /// Active entities carrying `tag` whose distance to `center` is at most
    /// `radius`, in spawn order. Callers sort by distance when they need to.
    fn query_entities_with_capability(
        &self,
        tag: CapabilityTag,
        center: Vec3,
        radius: f32,
    ) -> Vec<EntityId>;
}
