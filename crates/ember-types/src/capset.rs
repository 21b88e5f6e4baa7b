//! Capability-set abstractions used for typeparam constraints (root spec
//! §3.5): `#read`, `#send`, `#share`, `#alias`, `#any`.

use ember_ast::{NodeArena, NodeId, TokenKind};
use ember_base::Interner;

use crate::cap::Cap;

/// A set of capabilities, represented densely since there are only six.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapSet(u8);

impl CapSet {
    pub const EMPTY: CapSet = CapSet(0);

    fn bit(cap: Cap) -> u8 {
        1 << match cap {
            Cap::Iso => 0,
            Cap::Trn => 1,
            Cap::Ref => 2,
            Cap::Val => 3,
            Cap::Box => 4,
            Cap::Tag => 5,
        }
    }

    pub fn single(cap: Cap) -> CapSet {
        CapSet(Self::bit(cap))
    }

    pub fn from_caps(caps: impl IntoIterator<Item = Cap>) -> CapSet {
        caps.into_iter().fold(CapSet::EMPTY, |acc, c| acc.union(Self::single(c)))
    }

    pub fn contains(self, cap: Cap) -> bool {
        self.0 & Self::bit(cap) != 0
    }

    pub fn union(self, other: CapSet) -> CapSet {
        CapSet(self.0 | other.0)
    }

    pub fn intersect(self, other: CapSet) -> CapSet {
        CapSet(self.0 & other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// `#read = {ref, val, box}`.
    pub fn read() -> CapSet {
        CapSet::from_caps([Cap::Ref, Cap::Val, Cap::Box])
    }

    /// `#send = {iso, val, tag}`.
    pub fn send() -> CapSet {
        CapSet::from_caps([Cap::Iso, Cap::Val, Cap::Tag])
    }

    /// `#share = {val, tag}`.
    pub fn share() -> CapSet {
        CapSet::from_caps([Cap::Val, Cap::Tag])
    }

    /// `#alias = {ref, val, box, tag}`.
    pub fn alias() -> CapSet {
        CapSet::from_caps([Cap::Ref, Cap::Val, Cap::Box, Cap::Tag])
    }

    /// `#any` — all six.
    pub fn any() -> CapSet {
        CapSet::from_caps(Cap::ALL)
    }

    pub fn iter(self) -> impl Iterator<Item = Cap> {
        Cap::ALL.into_iter().filter(move |&c| self.contains(c))
    }

    /// Maps a `#name` constraint tag's bare name (`"read"`, `"send"`,
    /// `"share"`, `"alias"`, `"any"`) to its set, or `None` for anything
    /// else (a typo, the caller's `ConstraintViolation`/`BadTypeArg`).
    pub fn from_name(name: &str) -> Option<CapSet> {
        match name {
            "read" => Some(CapSet::read()),
            "send" => Some(CapSet::send()),
            "share" => Some(CapSet::share()),
            "alias" => Some(CapSet::alias()),
            "any" => Some(CapSet::any()),
            _ => None,
        }
    }
}

/// `true` if `node` is a `@name` capability-set constraint tag (root spec
/// §3.5) rather than an ordinary type. The parser (`ember-parser`'s
/// `parse_constraint`) builds this shape as an `At` node wrapping the
/// bare identifier, reusing the `@` punctuation token as the node kind —
/// the same "one enum, two jobs" convention the cap keywords already use.
pub fn is_capset_constraint(arena: &NodeArena, node: NodeId) -> bool {
    arena.kind(node) == TokenKind::At
}

/// Resolves a `@name` constraint node to its `CapSet`. `None` either
/// because `node` isn't a capset tag at all, or because its name doesn't
/// match one of the five recognized tags.
pub fn capset_constraint(arena: &NodeArena, interner: &Interner, node: NodeId) -> Option<CapSet> {
    if !is_capset_constraint(arena, node) {
        return None;
    }
    let name_node = arena.child(node, 0);
    match arena.kind(name_node) {
        TokenKind::Identifier(sym) => CapSet::from_name(interner.resolve(sym)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_sets_match_spec_membership() {
        assert!(CapSet::read().contains(Cap::Ref));
        assert!(CapSet::read().contains(Cap::Val));
        assert!(CapSet::read().contains(Cap::Box));
        assert!(!CapSet::read().contains(Cap::Iso));

        assert!(CapSet::send().contains(Cap::Iso));
        assert!(CapSet::send().contains(Cap::Val));
        assert!(CapSet::send().contains(Cap::Tag));
        assert!(!CapSet::send().contains(Cap::Ref));

        assert!(CapSet::share().contains(Cap::Val));
        assert!(CapSet::share().contains(Cap::Tag));
        assert!(!CapSet::share().contains(Cap::Box));

        assert!(CapSet::alias().contains(Cap::Box));
        assert!(!CapSet::alias().contains(Cap::Iso));
    }

    #[test]
    fn any_contains_every_cap() {
        for c in Cap::ALL {
            assert!(CapSet::any().contains(c));
        }
    }

    #[test]
    fn union_and_intersect() {
        let a = CapSet::single(Cap::Iso);
        let b = CapSet::single(Cap::Val);
        let u = a.union(b);
        assert!(u.contains(Cap::Iso) && u.contains(Cap::Val));
        assert!(a.intersect(b).is_empty());
    }

    #[test]
    fn from_name_matches_the_five_recognized_tags() {
        assert_eq!(CapSet::from_name("read"), Some(CapSet::read()));
        assert_eq!(CapSet::from_name("send"), Some(CapSet::send()));
        assert_eq!(CapSet::from_name("share"), Some(CapSet::share()));
        assert_eq!(CapSet::from_name("alias"), Some(CapSet::alias()));
        assert_eq!(CapSet::from_name("any"), Some(CapSet::any()));
        assert_eq!(CapSet::from_name("bogus"), None);
    }

    #[test]
    fn capset_constraint_resolves_a_tag_node() {
        use ember_base::Span;

        let mut arena = NodeArena::new();
        let mut interner = Interner::new();
        let sym = interner.intern("send");
        let name = arena.alloc(TokenKind::Identifier(sym), Span::default());
        let tag = arena.alloc(TokenKind::At, Span::default());
        arena.set_children(tag, vec![name]);

        assert!(is_capset_constraint(&arena, tag));
        assert_eq!(capset_constraint(&arena, &interner, tag), Some(CapSet::send()));
    }

    #[test]
    fn capset_constraint_is_none_for_an_ordinary_type_node() {
        use ember_base::Span;

        let mut arena = NodeArena::new();
        let interner = Interner::new();
        let ty = arena.alloc(TokenKind::InferType, Span::default());
        assert!(!is_capset_constraint(&arena, ty));
        assert_eq!(capset_constraint(&arena, &interner, ty), None);
    }
}
