//! Netlist Text Format
//!
//! One line per component: `<label> <nodeID> <nodeID> ...`, whitespace
//! separated, no header. Node numbering is local to one netlist; two
//! netlists can only be compared through [`crate::verify`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use crate::core::CircuitNetError;

/// A component and the nodes it touches
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetlistEntry {
    pub label: String,
    pub nodes: Vec<u32>,
}

impl NetlistEntry {
    pub fn new(label: impl Into<String>, nodes: Vec<u32>) -> Self {
        Self {
            label: label.into(),
            nodes,
        }
    }

    /// Component type: the label up to the first `_` (`R_1` -> `R`)
    pub fn component_type(&self) -> &str {
        self.label.split('_').next().unwrap_or(&self.label)
    }

    /// Nodes as an order-insensitive set
    pub fn node_set(&self) -> BTreeSet<u32> {
        self.nodes.iter().copied().collect()
    }
}

impl fmt::Display for NetlistEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)?;
        for node in &self.nodes {
            write!(f, " {}", node)?;
        }
        Ok(())
    }
}

/// Ordered list of netlist entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Netlist {
    pub entries: Vec<NetlistEntry>,
}

impl Netlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<NetlistEntry>) -> Self {
        Self { entries }
    }

    pub fn push(&mut self, label: impl Into<String>, nodes: Vec<u32>) {
        self.entries.push(NetlistEntry::new(label, nodes));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NetlistEntry> {
        self.entries.iter()
    }

    /// Every distinct node ID referenced by the netlist
    pub fn node_ids(&self) -> BTreeSet<u32> {
        self.entries
            .iter()
            .flat_map(|e| e.nodes.iter().copied())
            .collect()
    }

    pub fn get(&self, label: &str) -> Option<&NetlistEntry> {
        self.entries.iter().find(|e| e.label == label)
    }

    /// Parse netlist text. Blank lines are ignored.
    pub fn parse(content: &str) -> Result<Self, CircuitNetError> {
        let mut entries = Vec::new();

        for (idx, line) in content.lines().enumerate() {
            let mut parts = line.split_whitespace();
            let Some(label) = parts.next() else {
                continue;
            };

            let nodes = parts
                .map(|token| {
                    token.parse::<u32>().map_err(|_| CircuitNetError::Parse {
                        line: idx + 1,
                        message: format!("invalid node id '{}' for {}", token, label),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            entries.push(NetlistEntry::new(label, nodes));
        }

        Ok(Self { entries })
    }

    pub fn read(path: &Path) -> Result<Self, CircuitNetError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn write(&self, path: &Path) -> Result<(), CircuitNetError> {
        std::fs::write(path, self.to_string())?;
        Ok(())
    }
}

impl fmt::Display for Netlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}", entry)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Netlist {
    type Item = &'a NetlistEntry;
    type IntoIter = std::slice::Iter<'a, NetlistEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<NetlistEntry> for Netlist {
    fn from_iter<I: IntoIterator<Item = NetlistEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
