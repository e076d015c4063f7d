//! Access declaration trees.
//!
//! An [`AccessNode`] is the declarative read/write contract a call holds
//! over the state tree: a [`Whole`](AccessNode::Whole) marker (entire
//! state, no path walking), a [`Leaf`](AccessNode::Leaf) access code at a
//! terminal key, or a [`Branch`](AccessNode::Branch) of nested
//! declarations. The closed variant set lets the slicer and merger
//! dispatch exhaustively instead of probing value shapes.

use indexmap::IndexMap;
use smallvec::SmallVec;
use std::fmt;

/// What a declaration at a terminal key grants or requires.
///
/// The first four codes are input-side; the last two are output-side.
/// Slicing rejects output codes in an input spec; merging does not
/// interpret input codes at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessCode {
    /// The key must be present. Contributes nothing to the slice.
    Exists,
    /// The key must be absent. Contributes nothing to the slice.
    NotExists,
    /// The key must be present; its value is copied into the slice.
    Read,
    /// The value is copied into the slice if present; no requirement
    /// otherwise.
    ReadMaybe,
    /// The key is overwritten from the call's output. An absent output
    /// is an explicit absence: it clears the key.
    Write,
    /// The key is overwritten only when the call's output carries a
    /// concrete value for it.
    WriteMaybe,
}

impl AccessCode {
    /// Whether this code belongs in an input spec.
    pub fn is_input(self) -> bool {
        matches!(
            self,
            Self::Exists | Self::NotExists | Self::Read | Self::ReadMaybe
        )
    }

    /// Whether this code belongs in an output spec.
    pub fn is_output(self) -> bool {
        !self.is_input()
    }
}

impl fmt::Display for AccessCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Exists => "exists",
            Self::NotExists => "not-exists",
            Self::Read => "read",
            Self::ReadMaybe => "read-maybe",
            Self::Write => "write",
            Self::WriteMaybe => "write-maybe",
        };
        write!(f, "{name}")
    }
}

/// A path through nested state: one key, or a sequence of keys.
///
/// Inline storage for up to four segments covers realistic declaration
/// depth without heap allocation; deeper paths spill transparently.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path(SmallVec<[String; 4]>);

impl Path {
    /// The path's key segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for Path {
    fn from(key: &str) -> Self {
        Self(SmallVec::from_iter([key.to_string()]))
    }
}

impl From<String> for Path {
    fn from(key: String) -> Self {
        Self(SmallVec::from_iter([key]))
    }
}

impl<const N: usize> From<[&str; N]> for Path {
    fn from(keys: [&str; N]) -> Self {
        Self(keys.iter().map(|k| (*k).to_string()).collect())
    }
}

impl From<&[&str]> for Path {
    fn from(keys: &[&str]) -> Self {
        Self(keys.iter().map(|k| (*k).to_string()).collect())
    }
}

impl From<Vec<String>> for Path {
    fn from(keys: Vec<String>) -> Self {
        Self(keys.into_iter().collect())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

/// A declarative access contract over the state tree.
#[derive(Clone, Debug, PartialEq)]
pub enum AccessNode {
    /// The entire state, with no path walking. The default input spec of
    /// a call that declares nothing.
    Whole,
    /// An access code at a terminal key.
    Leaf(AccessCode),
    /// Nested declarations, one per key. Iteration follows declaration
    /// order.
    Branch(IndexMap<String, AccessNode>),
}

impl AccessNode {
    /// An empty branch — the default output spec of a call that declares
    /// no writes.
    pub fn branch() -> Self {
        Self::Branch(IndexMap::new())
    }

    /// Whether this node is a branch with no entries.
    pub fn is_empty_branch(&self) -> bool {
        matches!(self, Self::Branch(entries) if entries.is_empty())
    }

    /// Declare `code` at the end of `path`, creating branch nodes along
    /// the way.
    ///
    /// An intermediate Leaf on the walk is widened into a Branch. The
    /// terminal key is set to `Leaf(code)` only if that position is not
    /// already a Branch, so a later, narrower declaration can add a leaf
    /// under an existing branch without destroying siblings declared
    /// through the same prefix.
    ///
    /// Declaring on a `Whole` node converts it into a branch first; the
    /// callers that start from `Whole` (input specs with no declarations
    /// yet) rely on this.
    pub fn declare(&mut self, path: &Path, code: AccessCode) {
        self.declare_at(path.segments(), code);
    }

    fn declare_at(&mut self, segments: &[String], code: AccessCode) {
        let Some((key, rest)) = segments.split_first() else {
            return;
        };
        if !matches!(self, Self::Branch(_)) {
            *self = Self::branch();
        }
        let Self::Branch(entries) = self else {
            return;
        };
        if rest.is_empty() {
            match entries.get(key) {
                Some(Self::Branch(_)) => {}
                _ => {
                    entries.insert(key.clone(), Self::Leaf(code));
                }
            }
        } else {
            entries
                .entry(key.clone())
                .or_insert_with(Self::branch)
                .declare_at(rest, code);
        }
    }
}
