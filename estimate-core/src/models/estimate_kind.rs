use std::fmt;

use serde::{Deserialize, Serialize};

/// The four estimate panels shown on a client card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EstimateKind {
    Consumables,
    Floor,
    Partition,
    Roof,
}

impl EstimateKind {
    pub fn all() -> &'static [EstimateKind] {
        &[
            EstimateKind::Consumables,
            EstimateKind::Floor,
            EstimateKind::Partition,
            EstimateKind::Roof,
        ]
    }

    /// Short name used on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Consumables => "consumables",
            Self::Floor => "floor",
            Self::Partition => "partition",
            Self::Roof => "roof",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "consumables" => Some(Self::Consumables),
            "floor" => Some(Self::Floor),
            "partition" => Some(Self::Partition),
            "roof" => Some(Self::Roof),
            _ => None,
        }
    }

    /// Document collection holding one estimate per client.
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Consumables => "consumablesEstimates",
            Self::Floor => "floorEstimates",
            Self::Partition => "partitionEstimates",
            Self::Roof => "roofEstimates",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Consumables => "Расходные материалы",
            Self::Floor => "Перекрытие",
            Self::Partition => "Перегородки",
            Self::Roof => "Крыша+навес",
        }
    }
}

impl fmt::Display for EstimateKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_round_trips_every_kind() {
        for kind in EstimateKind::all() {
            assert_eq!(EstimateKind::parse(kind.as_str()), Some(*kind));
        }
        assert_eq!(EstimateKind::parse("walls"), None);
    }

    #[test]
    fn collections_are_distinct() {
        let mut names: Vec<_> = EstimateKind::all().iter().map(|k| k.collection()).collect();
        names.sort_unstable();
        names.dedup();

        assert_eq!(names.len(), 4);
    }
}
