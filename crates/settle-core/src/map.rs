//! Map configuration: grid size and the resource nodes placed at startup.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::grid::Position;
use crate::resource::{ResourceNodeKind, Tier};
use crate::rng::SimRng;

/// One resource node to create at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSeed {
    pub kind: ResourceNodeKind,
    pub position: Position,
    pub tier: Tier,
}

/// Grid dimensions plus the resource node layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapConfig {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub nodes: Vec<NodeSeed>,
}

/// How many nodes of each kind a generated map receives.
const GENERATED_COUNTS: [(ResourceNodeKind, usize); 4] = [
    (ResourceNodeKind::WaterSource, 5),
    (ResourceNodeKind::IronOreDeposit, 4),
    (ResourceNodeKind::CoalDeposit, 4),
    (ResourceNodeKind::StoneQuarry, 3),
];

/// Tier 1 / 2 / 3 weights for generated nodes.
const TIER_WEIGHTS: [u32; 3] = [50, 35, 15];

impl MapConfig {
    /// An empty map with no resource nodes.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            nodes: Vec::new(),
        }
    }

    /// Reject zero-sized grids, nodes off the grid, and two nodes on one tile.
    pub fn validate(&self) -> Result<(), MapConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(MapConfigError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }
        let mut seen = BTreeSet::new();
        for node in &self.nodes {
            let p = node.position;
            if p.x < 0 || p.y < 0 || p.x as u32 >= self.width || p.y as u32 >= self.height {
                return Err(MapConfigError::OutOfBounds(p));
            }
            if !seen.insert(p) {
                return Err(MapConfigError::DuplicatePosition(p));
            }
        }
        Ok(())
    }

    /// A random layout with 5 water sources, 4 iron ore deposits, 4 coal
    /// deposits and 3 stone quarries on distinct tiles.
    pub fn generate(width: u32, height: u32, seed: u64) -> Result<Self, MapConfigError> {
        let needed: usize = GENERATED_COUNTS.iter().map(|(_, n)| n).sum();
        let cells = width as u64 * height as u64;
        if cells < needed as u64 {
            return Err(MapConfigError::TooSmall {
                width,
                height,
                needed,
            });
        }

        let mut rng = SimRng::new(seed);
        let mut taken = BTreeSet::new();
        let mut nodes = Vec::with_capacity(needed);
        for (kind, count) in GENERATED_COUNTS {
            for _ in 0..count {
                let position = loop {
                    let candidate = Position::new(
                        rng.next_below(width) as i32,
                        rng.next_below(height) as i32,
                    );
                    if taken.insert(candidate) {
                        break candidate;
                    }
                };
                let tier = rng
                    .weighted_index(&TIER_WEIGHTS)
                    .and_then(|i| Tier::new(i as u8 + 1))
                    .ok_or(MapConfigError::TierRoll)?;
                nodes.push(NodeSeed {
                    kind,
                    position,
                    tier,
                });
            }
        }

        Ok(Self {
            width,
            height,
            nodes,
        })
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MapConfigError {
    #[error("grid must be non-empty, got {width}x{height}")]
    EmptyGrid { width: u32, height: u32 },
    #[error("resource node at {0} lies outside the grid")]
    OutOfBounds(Position),
    #[error("two resource nodes at {0}")]
    DuplicatePosition(Position),
    #[error("{width}x{height} grid cannot hold {needed} resource nodes")]
    TooSmall {
        width: u32,
        height: u32,
        needed: usize,
    },
    #[error("tier roll produced no tier")]
    TierRoll,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(kind: ResourceNodeKind, x: i32, y: i32, tier: u8) -> NodeSeed {
        NodeSeed {
            kind,
            position: Position::new(x, y),
            tier: Tier::new(tier).unwrap(),
        }
    }

    #[test]
    fn empty_map_validates() {
        assert!(MapConfig::empty(5, 5).validate().is_ok());
    }

    #[test]
    fn zero_size_rejected() {
        assert_eq!(
            MapConfig::empty(0, 4).validate(),
            Err(MapConfigError::EmptyGrid {
                width: 0,
                height: 4
            })
        );
    }

    #[test]
    fn out_of_bounds_node_rejected() {
        let mut map = MapConfig::empty(3, 3);
        map.nodes.push(seed(ResourceNodeKind::StoneQuarry, 3, 0, 1));
        assert_eq!(
            map.validate(),
            Err(MapConfigError::OutOfBounds(Position::new(3, 0)))
        );
    }

    #[test]
    fn stacked_nodes_rejected() {
        let mut map = MapConfig::empty(3, 3);
        map.nodes.push(seed(ResourceNodeKind::StoneQuarry, 1, 1, 1));
        map.nodes.push(seed(ResourceNodeKind::CoalDeposit, 1, 1, 2));
        assert_eq!(
            map.validate(),
            Err(MapConfigError::DuplicatePosition(Position::new(1, 1)))
        );
    }

    #[test]
    fn generate_produces_valid_distinct_layout() {
        let map = MapConfig::generate(30, 20, 9).unwrap();
        assert_eq!(map.nodes.len(), 16);
        assert!(map.validate().is_ok());
        let water = map
            .nodes
            .iter()
            .filter(|n| n.kind == ResourceNodeKind::WaterSource)
            .count();
        assert_eq!(water, 5);
    }

    #[test]
    fn generate_is_seeded() {
        assert_eq!(
            MapConfig::generate(30, 20, 4).unwrap(),
            MapConfig::generate(30, 20, 4).unwrap()
        );
        assert_ne!(
            MapConfig::generate(30, 20, 4).unwrap(),
            MapConfig::generate(30, 20, 5).unwrap()
        );
    }

    #[test]
    fn generate_fills_exact_fit_grid() {
        let map = MapConfig::generate(4, 4, 0).unwrap();
        assert!(map.validate().is_ok());
    }

    #[test]
    fn generate_rejects_tiny_grid() {
        assert!(matches!(
            MapConfig::generate(3, 3, 0),
            Err(MapConfigError::TooSmall { needed: 16, .. })
        ));
    }

    #[test]
    fn tier_outside_range_fails_to_parse() {
        let json = r#"{"kind":"water_source","position":{"x":0,"y":0},"tier":4}"#;
        assert!(serde_json::from_str::<NodeSeed>(json).is_err());
    }
}
