use crate::query::BondExpr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
    /// Molfile type 4. The order is left unset; the aromatic flag carries
    /// the information.
    Aromatic,
    Query(BondExpr),
}

impl BondOrder {
    /// Numeric order for concrete single, double and triple bonds.
    pub fn numeric(self) -> Option<u8> {
        match self {
            BondOrder::Single => Some(1),
            BondOrder::Double => Some(2),
            BondOrder::Triple => Some(3),
            BondOrder::Aromatic | BondOrder::Query(_) => None,
        }
    }

    pub fn is_query(self) -> bool {
        matches!(self, BondOrder::Query(_))
    }
}

/// Molfile bond stereo flag after validation against the bond type.
///
/// Wedges (`Up`, `Down`, `UpOrDown`) point from the bond's first atom, which
/// is always the first atom of the bond line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondStereo {
    #[default]
    None,
    Up,
    Down,
    UpOrDown,
    /// Crossed double bond: configuration explicitly unknown.
    EOrZ,
    /// Plain double bond: configuration follows from the coordinates.
    EZByCoordinates,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bond {
    pub order: BondOrder,
    pub stereo: BondStereo,
    pub is_aromatic: bool,
}

impl Bond {
    pub fn new(order: BondOrder) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }
}

impl crate::traits::HasBondOrder for Bond {
    fn bond_order(&self) -> BondOrder {
        self.order
    }
}

impl crate::traits::HasBondStereo for Bond {
    fn bond_stereo(&self) -> BondStereo {
        self.stereo
    }
}
