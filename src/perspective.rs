//! # Perspective Resolver
//!
//! An entity (song, headphone, or a song/headphone pairing) can carry several
//! alternative ratings: a preset baseline, an LLM analysis, a manual refinement,
//! one note per reviewer voice, and so on. [`PerspectiveSet`] keeps them in
//! insertion order together with the id of the one currently shown.
//!
//! Invariants, upheld by every operation:
//!
//! - the set is never empty;
//! - the default id always names a perspective in the set.
//!
//! All operations are pure: they return a new set and leave `self` untouched,
//! so a rejected operation can never leave a half-edited value behind.

use log::debug;

/// Something that can live in a [`PerspectiveSet`].
pub trait Perspective: Clone {
    /// Unique id within the owning set.
    fn perspective_id(&self) -> &str;

    /// Whether `other` replaces `self` on upsert. Defaults to id equality;
    /// voice-style perspectives match on their semantic key instead.
    fn same_identity(&self, other: &Self) -> bool {
        self.perspective_id() == other.perspective_id()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PerspectiveError {
    #[error("no perspective with id \"{0}\"")]
    NotFound(String),
    #[error("cannot delete the last remaining perspective")]
    LastPerspective,
    #[error("a signature needs at least one perspective")]
    Empty,
}

/// Non-empty, ordered perspectives plus the selected default.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveSet<P> {
    perspectives: Vec<P>,
    default_id: String,
}

impl<P: Perspective> PerspectiveSet<P> {
    /// A set holding one perspective, which becomes the default.
    pub fn new(first: P) -> Self {
        let default_id = first.perspective_id().to_string();
        Self { perspectives: vec![first], default_id }
    }

    /// Rebuild a set from stored parts. Repeated ids keep their first entry.
    /// A default id that no longer matches any perspective falls back to the
    /// first one.
    pub fn from_parts(perspectives: Vec<P>, default_id: Option<String>) -> Result<Self, PerspectiveError> {
        let mut unique: Vec<P> = Vec::with_capacity(perspectives.len());
        for perspective in perspectives {
            if unique.iter().any(|p| p.perspective_id() == perspective.perspective_id()) {
                debug!("Dropping repeated perspective \"{}\"", perspective.perspective_id());
            } else {
                unique.push(perspective);
            }
        }
        let perspectives = unique;
        let first_id = perspectives.first().ok_or(PerspectiveError::Empty)?.perspective_id().to_string();
        let default_id = match default_id {
            Some(id) if perspectives.iter().any(|p| p.perspective_id() == id) => id,
            Some(id) => {
                debug!("Stored default perspective \"{id}\" is gone, using \"{first_id}\"");
                first_id
            }
            None => first_id,
        };
        Ok(Self { perspectives, default_id })
    }

    #[must_use]
    pub fn perspectives(&self) -> &[P] {
        &self.perspectives
    }

    #[must_use]
    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.perspectives.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.perspectives.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&P> {
        self.perspectives.iter().find(|p| p.perspective_id() == id)
    }

    /// The default perspective.
    #[must_use]
    pub fn active(&self) -> &P {
        // Non-empty by construction.
        self.get(&self.default_id).unwrap_or(&self.perspectives[0])
    }

    /// Switch the default. Fails if `id` is not in the set.
    pub fn set_default(&self, id: &str) -> Result<Self, PerspectiveError> {
        if self.get(id).is_none() {
            return Err(PerspectiveError::NotFound(id.to_string()));
        }
        Ok(Self { perspectives: self.perspectives.clone(), default_id: id.to_string() })
    }

    /// Replace the perspective with the same identity in place, or append.
    ///
    /// Further entries sharing the identity or id are dropped, so ids stay
    /// unique.
    /// The default is kept unless it was the replaced perspective and its id
    /// disappeared, in which case the first perspective becomes default.
    #[must_use]
    pub fn upsert(&self, perspective: P) -> Self {
        let replaced: Vec<bool> = self
            .perspectives
            .iter()
            .map(|p| p.same_identity(&perspective) || p.perspective_id() == perspective.perspective_id())
            .collect();

        let mut perspectives: Vec<P> = Vec::with_capacity(self.perspectives.len() + 1);
        let mut incoming = Some(perspective);
        for (existing, replaced) in self.perspectives.iter().zip(replaced) {
            if replaced {
                perspectives.extend(incoming.take());
            } else {
                perspectives.push(existing.clone());
            }
        }
        perspectives.extend(incoming);
        let default_id = resolve_default(&perspectives, &self.default_id);
        Self { perspectives, default_id }
    }

    /// Upsert and make the upserted perspective the default.
    #[must_use]
    pub fn upsert_as_default(&self, perspective: P) -> Self {
        let default_id = perspective.perspective_id().to_string();
        Self { default_id, ..self.upsert(perspective) }
    }

    /// Remove a perspective. Refuses to remove the last one.
    pub fn delete(&self, id: &str) -> Result<Self, PerspectiveError> {
        if self.get(id).is_none() {
            return Err(PerspectiveError::NotFound(id.to_string()));
        }
        let perspectives: Vec<P> = self.perspectives.iter().filter(|p| p.perspective_id() != id).cloned().collect();
        if perspectives.is_empty() {
            return Err(PerspectiveError::LastPerspective);
        }
        let default_id = resolve_default(&perspectives, &self.default_id);
        Ok(Self { perspectives, default_id })
    }

    /// Keep only the perspectives matching `keep`; `None` if that would
    /// leave the set empty.
    #[must_use]
    pub fn retain(&self, keep: impl Fn(&P) -> bool) -> Option<Self> {
        let perspectives: Vec<P> = self.perspectives.iter().filter(|p| keep(*p)).cloned().collect();
        if perspectives.is_empty() {
            return None;
        }
        let default_id = resolve_default(&perspectives, &self.default_id);
        Some(Self { perspectives, default_id })
    }

    pub fn into_parts(self) -> (Vec<P>, String) {
        (self.perspectives, self.default_id)
    }
}

/// Current default if it survived, otherwise the first perspective's id.
fn resolve_default<P: Perspective>(perspectives: &[P], current: &str) -> String {
    if perspectives.iter().any(|p| p.perspective_id() == current) {
        current.to_string()
    } else {
        perspectives.first().map(|p| p.perspective_id().to_string()).unwrap_or_default()
    }
}
