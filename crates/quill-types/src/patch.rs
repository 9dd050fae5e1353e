use serde::{Deserialize, Deserializer};

/// Partial-update field wrapper distinguishing "field omitted, leave it
/// alone" from "field supplied, apply this value". Plain `Option` cannot
/// express the difference once serde has filled in defaults.
///
/// Use with `#[serde(default)]`: an absent JSON key deserializes to
/// `Patch::Absent`, a present key to `Patch::Value`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Absent,
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Patch::Absent => None,
            Patch::Value(v) => Some(v),
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Patch::Absent => None,
            Patch::Value(v) => Some(v),
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Patch::Value)
    }
}
