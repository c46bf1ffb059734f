//! # Node Tags — Metadata Encoded in Asset Node Names
//!
//! Part assets are authored in ordinary 3D tools, so the only metadata that
//! reliably survives export is the node name. Annotated names look like:
//!
//! ```text
//!   flags : name . suffix
//!   ─────   ────   ──────
//!   rc"case"             : case          root of a case component
//!   mount_point,c"fan,120": fan1_mp.001  one location of mount point fan1_mp
//!   toggle,d"drive_cage" : side_panel    toggle member; hiding it hides drive_cage
//!   anim"rotate"         : rotor         spin this node
//! ```
//!
//! Flags are split on commas outside double quotes. The record name is the
//! part of the name before the first `.`, so exporter suffixes (`.001`) merge
//! several nodes into one record: all locations of one mount point, or all
//! members of one toggle group. Names without `:` carry no record.
//!
//! [`Decoder`] collects records node by node; [`Decoder::resolve`] then turns
//! constraint names into the member nodes of the records they name.

use std::collections::HashMap;

use crate::compat::{split_top_level, Compatibility};
use crate::scene::NodeId;

/// The annotations carried by one node name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeTags {
    pub name: String,
    /// `rc"..."`: this node is a component root.
    pub root: Option<Compatibility>,
    /// `c"..."`: compatibility required by a mount location.
    pub location: Option<Compatibility>,
    pub mount_point: bool,
    pub toggle: bool,
    /// `d"a,b"`: records hidden while this one is hidden.
    pub constraints: Vec<String>,
    pub animation: Option<String>,
}

impl NodeTags {
    /// Parse an annotated node name. `None` for plain names.
    pub fn parse(node_name: &str) -> Option<Self> {
        let mut sections = node_name.split(':');
        let flags = sections.next()?;
        let name = sections.next()?;
        let mut tags = NodeTags {
            name: name.split('.').next().unwrap_or(name).trim().to_string(),
            ..Default::default()
        };

        for flag in split_top_level(flags) {
            let mut pieces = flag.split('"');
            let kind = pieces.next().unwrap_or("").trim();
            let value = pieces.next().unwrap_or("");
            match kind {
                "rc" => tags.root = parse_descriptor(value, node_name),
                "c" => tags.location = parse_descriptor(value, node_name),
                "d" => {
                    tags.constraints = split_top_level(value)
                        .into_iter()
                        .map(str::trim)
                        .filter(|name| !name.is_empty())
                        .map(str::to_string)
                        .collect();
                }
                "toggle" => tags.toggle = true,
                "mount_point" => tags.mount_point = true,
                "anim" => tags.animation = Some(value.to_string()),
                "" => {}
                other => log::debug!("Ignoring flag `{other}` on node `{node_name}`"),
            }
        }
        Some(tags)
    }
}

fn parse_descriptor(value: &str, node_name: &str) -> Option<Compatibility> {
    let parsed = Compatibility::parse(value);
    if parsed.is_none() {
        log::warn!("Unrecognized compatibility `{value}` on node `{node_name}`");
    }
    parsed
}

/// Everything known about one named record after decoding.
#[derive(Debug, Clone, Default)]
pub struct Record {
    pub name: String,
    pub root: Option<Compatibility>,
    /// Toggle group members, in node order.
    pub members: Vec<NodeId>,
    /// Mount locations with their required compatibility.
    pub locations: Vec<(NodeId, Compatibility)>,
    constraint_names: Vec<String>,
    /// Nodes hidden while a member of this record is hidden. Filled in by
    /// [`Decoder::resolve`].
    pub constraints: Vec<NodeId>,
    /// Spin target and animation name.
    pub animation: Option<(NodeId, String)>,
}

/// Result of decoding one asset.
#[derive(Debug, Default)]
pub struct Decoded {
    pub records: Vec<Record>,
    /// Annotated nodes and the index of their record.
    pub tags: Vec<(NodeId, usize)>,
}

impl Decoded {
    /// Linear in the number of annotated nodes; for one-off lookups.
    pub fn record_of(&self, node: NodeId) -> Option<&Record> {
        self.tags
            .iter()
            .find(|(tagged, _)| *tagged == node)
            .and_then(|&(_, index)| self.records.get(index))
    }
}

/// Accumulates records from annotated nodes.
#[derive(Debug, Default)]
pub struct Decoder {
    records: Vec<Record>,
    by_name: HashMap<String, usize>,
    tags: Vec<(NodeId, usize)>,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one node. Returns the index of the record it joined.
    pub fn add_node(&mut self, node: NodeId, node_name: &str) -> Option<usize> {
        let tags = NodeTags::parse(node_name)?;
        let index = match self.by_name.get(&tags.name) {
            Some(&index) => index,
            None => {
                self.records.push(Record {
                    name: tags.name.clone(),
                    ..Default::default()
                });
                self.by_name.insert(tags.name.clone(), self.records.len() - 1);
                self.records.len() - 1
            }
        };
        let record = &mut self.records[index];

        if tags.root.is_some() {
            record.root = tags.root;
        }
        if tags.toggle {
            record.members.push(node);
        }
        record.constraint_names.extend(tags.constraints);
        if tags.mount_point {
            match tags.location {
                Some(compat) => record.locations.push((node, compat)),
                None => log::warn!("Mount point node `{node_name}` has no compatibility"),
            }
        }
        match tags.animation.as_deref() {
            Some("rotate") => record.animation = Some((node, format!("{}_rotate", tags.name))),
            Some(other) => log::warn!("Unsupported animation `{other}` on node `{node_name}`"),
            None => {}
        }

        self.tags.push((node, index));
        Some(index)
    }

    /// Resolve constraint names into member nodes and hand out the records.
    pub fn resolve(mut self) -> Decoded {
        let resolved: Vec<Vec<NodeId>> = self
            .records
            .iter()
            .map(|record| {
                let mut nodes = Vec::new();
                let mut seen = Vec::new();
                for name in &record.constraint_names {
                    if seen.contains(&name) {
                        continue;
                    }
                    seen.push(name);
                    let Some(&target) = self.by_name.get(name) else {
                        log::debug!("Constraint `{name}` of `{}` names no record", record.name);
                        continue;
                    };
                    nodes.extend(self.records[target].members.iter().copied());
                }
                nodes
            })
            .collect();

        for (record, constraints) in self.records.iter_mut().zip(resolved) {
            record.constraints = constraints;
        }
        Decoded {
            records: self.records,
            tags: self.tags,
        }
    }
}
