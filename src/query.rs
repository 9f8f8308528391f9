/// Atom query expression produced by molfile atom lists and hydrogen-count
/// query fields.
///
/// The molfile format never nests expressions deeper than a negated list or
/// an element paired with a hydrogen count, but the tree is kept general so
/// that callers can combine expressions themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AtomExpr {
    /// Matches every atom.
    True,
    /// Matches atoms with this atomic number.
    Element(u8),
    /// Matches atoms carrying exactly this many implicit hydrogens.
    ImplicitHCount(u8),
    And(Vec<AtomExpr>),
    Or(Vec<AtomExpr>),
    Not(Box<AtomExpr>),
}

impl AtomExpr {
    /// Disjunction over a list of atomic numbers. An empty list matches
    /// anything and a single entry collapses to a plain element test.
    pub fn any_of(atomic_nums: &[u8]) -> AtomExpr {
        match atomic_nums {
            [] => AtomExpr::True,
            [z] => AtomExpr::Element(*z),
            _ => AtomExpr::Or(atomic_nums.iter().map(|&z| AtomExpr::Element(z)).collect()),
        }
    }

    pub fn negate(self) -> AtomExpr {
        match self {
            AtomExpr::Not(inner) => *inner,
            other => AtomExpr::Not(Box::new(other)),
        }
    }

    pub fn matches(&self, atomic_num: u8, implicit_hydrogens: u8) -> bool {
        match self {
            AtomExpr::True => true,
            AtomExpr::Element(z) => *z == atomic_num,
            AtomExpr::ImplicitHCount(h) => *h == implicit_hydrogens,
            AtomExpr::And(terms) => terms.iter().all(|t| t.matches(atomic_num, implicit_hydrogens)),
            AtomExpr::Or(terms) => terms.iter().any(|t| t.matches(atomic_num, implicit_hydrogens)),
            AtomExpr::Not(inner) => !inner.matches(atomic_num, implicit_hydrogens),
        }
    }

    /// Atomic numbers named by the expression, in the order they appear.
    pub fn elements(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.collect_elements(&mut out);
        out
    }

    fn collect_elements(&self, out: &mut Vec<u8>) {
        match self {
            AtomExpr::Element(z) => out.push(*z),
            AtomExpr::And(terms) | AtomExpr::Or(terms) => {
                for t in terms {
                    t.collect_elements(out);
                }
            }
            AtomExpr::Not(inner) => inner.collect_elements(out),
            AtomExpr::True | AtomExpr::ImplicitHCount(_) => {}
        }
    }
}

/// Bond query produced by molfile bond types 5 to 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondExpr {
    SingleOrDouble,
    SingleOrAromatic,
    DoubleOrAromatic,
    Any,
}

impl BondExpr {
    /// Molfile bond type code for this query.
    pub fn mdl_type(self) -> u8 {
        match self {
            BondExpr::SingleOrDouble => 5,
            BondExpr::SingleOrAromatic => 6,
            BondExpr::DoubleOrAromatic => 7,
            BondExpr::Any => 8,
        }
    }

    /// `order` is the numeric bond order; aromatic bonds pass `aromatic = true`.
    pub fn matches(self, order: u8, aromatic: bool) -> bool {
        match self {
            BondExpr::SingleOrDouble => !aromatic && (order == 1 || order == 2),
            BondExpr::SingleOrAromatic => aromatic || order == 1,
            BondExpr::DoubleOrAromatic => aromatic || order == 2,
            BondExpr::Any => true,
        }
    }
}
