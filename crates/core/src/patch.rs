use serde::{Deserialize, Deserializer};

/// Field of a partial update.
///
/// Deserialize with `#[serde(default)]` so a missing key stays `Absent` while an
/// explicit JSON `null` becomes `Null`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    /// Key was not sent; leave the stored value unchanged.
    #[default]
    Absent,
    /// Key was sent as `null`; clear the stored value.
    Null,
    /// Key was sent with a value.
    Value(T),
}

impl<T> Patch<T> {
    /// Returns whether the key was present in the payload.
    #[must_use]
    pub fn is_present(&self) -> bool {
        !matches!(self, Self::Absent)
    }

    /// Converts each contained value, keeping presence.
    pub fn map<U>(self, transform: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Self::Absent => Patch::Absent,
            Self::Null => Patch::Null,
            Self::Value(value) => Patch::Value(transform(value)),
        }
    }

    /// Like [`Patch::map`] with a fallible conversion.
    pub fn try_map<U, E>(self, transform: impl FnOnce(T) -> Result<U, E>) -> Result<Patch<U>, E> {
        Ok(match self {
            Self::Absent => Patch::Absent,
            Self::Null => Patch::Null,
            Self::Value(value) => Patch::Value(transform(value)?),
        })
    }

    /// Applies the patch to a nullable stored value.
    pub fn apply_to(self, target: &mut Option<T>) {
        match self {
            Self::Absent => {}
            Self::Null => *target = None,
            Self::Value(value) => *target = Some(value),
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
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Self::Value(value),
            None => Self::Null,
        })
    }
}
