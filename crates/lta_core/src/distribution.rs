//! Engine output: per-partial allocations of unit fragments.
//!
//! Everything here is produced fresh by each allocation call; nothing is
//! user-edited in place.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a portion came to be. Replaces loose flag combinations
/// (split / exception portion / adjusted) with one tag.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum PortionRole {
    Normal,
    SplitContinuation,
    ExceptionPortion,
    ExceptionAdjusted,
}

impl PortionRole {
    pub fn as_str(self) -> &'static str {
        match self {
            PortionRole::Normal => "NORMAL",
            PortionRole::SplitContinuation => "SPLIT_CONTINUATION",
            PortionRole::ExceptionPortion => "EXCEPTION_PORTION",
            PortionRole::ExceptionAdjusted => "EXCEPTION_ADJUSTED",
        }
    }
}

/// One unit (or fragment of a unit) assigned to a partial.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UnitPortion {
    pub unit_number: u32,
    pub weight: f64,
    pub positions: u32,
    pub is_split: bool,
    /// `"<unit>/<partial-index>"`, present iff `is_split`.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub split_label: Option<String>,
    pub role: PortionRole,
}

impl UnitPortion {
    /// A portion that is not a fragment of a split unit.
    pub fn whole(unit_number: u32, weight: f64, positions: u32, role: PortionRole) -> Self {
        Self { unit_number, weight, positions, is_split: false, split_label: None, role }
    }

    /// A fragment of a unit shared with another partial; labelled `<unit>/<partial>`.
    pub fn fragment(
        unit_number: u32,
        partial_index: u32,
        weight: f64,
        positions: u32,
        role: PortionRole,
    ) -> Self {
        Self {
            unit_number,
            weight,
            positions,
            is_split: true,
            split_label: Some(split_label(unit_number, partial_index)),
            role,
        }
    }
}

pub fn split_label(unit_number: u32, partial_index: u32) -> String {
    format!("{unit_number}/{partial_index}")
}

/// Allocation for one physical partial flight, in request order.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PartialAllocation {
    /// 1-based.
    pub partial_index: u32,
    pub target_weight: f64,
    /// Authoritative position count for the partial (not the sum of portions).
    pub computed_positions: u32,
    pub portions: Vec<UnitPortion>,
    pub requires_customs_depot_statement: bool,
}

impl PartialAllocation {
    /// Placeholder allocation: no portions, zero positions.
    pub fn empty(partial_index: u32, target_weight: f64) -> Self {
        Self {
            partial_index,
            target_weight,
            computed_positions: 0,
            portions: Vec::new(),
            requires_customs_depot_statement: true,
        }
    }

    pub fn portion_weight(&self) -> f64 {
        self.portions.iter().map(|p| p.weight).sum()
    }

    pub fn portion_positions(&self) -> u64 {
        self.portions.iter().map(|p| u64::from(p.positions)).sum()
    }
}

/// Where the smallest partial's position count came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PositionsSource {
    /// Entered by the operator from the airport clearance.
    Supplied,
    /// Weight-proportional fallback; needs manual confirmation before persisting.
    Proportional,
}

/// Out-of-band values only the operator knows in the exception case.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExceptionInput {
    #[cfg_attr(feature = "serde", serde(default))]
    pub smallest_partial_positions: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub airport_reference: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExceptionMetadata {
    /// 1-based index of the airport-cleared partial.
    pub smallest_partial_index: u32,
    pub smallest_partial_positions: u32,
    pub positions_source: PositionsSource,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub airport_reference: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Distribution {
    pub allocations: Vec<PartialAllocation>,
    pub is_exception_case: bool,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub exception_metadata: Option<ExceptionMetadata>,
}

impl Distribution {
    /// True when the smallest partial's positions are the proportional fallback.
    pub fn is_provisional(&self) -> bool {
        self.exception_metadata
            .as_ref()
            .is_some_and(|m| m.positions_source == PositionsSource::Proportional)
    }

    pub fn total_target_weight(&self) -> f64 {
        self.allocations.iter().map(|a| a.target_weight).sum()
    }

    pub fn total_computed_positions(&self) -> u64 {
        self.allocations.iter().map(|a| u64::from(a.computed_positions)).sum()
    }

    /// All portions of a given unit across partials, in partial order.
    pub fn portions_of_unit(&self, unit_number: u32) -> impl Iterator<Item = &UnitPortion> + '_ {
        self.allocations
            .iter()
            .flat_map(|a| a.portions.iter())
            .filter(move |p| p.unit_number == unit_number)
    }
}
