/* Copyright (C) 2022 Antmicro
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     https://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use serde::Serialize;

use crate::arch::{ArchDb, ArchError, PipIndex};
use crate::common::Coord;

pub mod catalog;
pub mod nodes;
pub mod classify;
pub mod tracks;
pub mod constants;
pub mod serialize;


#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct TileId(pub usize);

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct WireId(pub usize);

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct NodeId(pub usize);

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct TrackId(pub usize);

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct SegmentId(pub usize);

/// Index into the flattened, fabric-wide PIP-type table (all tile types'
/// PIP lists concatenated in tile-type order).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct PipTypeId(pub usize);

/// One placed occurrence of a tile type.
#[derive(Debug)]
pub struct TileInst {
    pub name: String,
    pub tile_type: u32,
    pub pos: Coord,
}

/// A wire belonging to one tile instance. `wire_in_tile` indexes the wire
/// template list of the tile's tile type.
#[derive(Debug)]
pub struct WireInstance {
    pub tile: TileId,
    pub wire_in_tile: u32,
    /// Assigned once by the node former.
    pub node: Option<NodeId>,
    /// Assigned once by the track former, only for wires of channel nodes.
    pub segment: Option<SegmentId>,
}

/// Topological role of a node within the routing fabric.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeClass {
    /// An unconnected or dead-end node.
    Null,
    /// A pure routing node.
    Channel,
    /// A direct edge between two site pins with no intervening channel.
    EdgeWithMux,
    /// An edge between a site pin and a channel.
    EdgesToChannel,
}

/// An equivalence class of wire instances that are always electrically
/// identical given the fabric's fixed inter-tile wiring.
#[derive(Debug)]
pub struct Node {
    pub class: NodeClass,
    /// Directional non-pseudo PIPs incident on any member wire, counted once
    /// per (tile instance, PIP type) occurrence.
    pub number_pips: u32,
    /// The unique site-pin-bearing member wire, if any.
    pub site_wire: Option<WireId>,
    pub track: Option<TrackId>,
}

/// A direct two-node connection between two site-pin wires through exactly
/// one PIP, oriented by the PIP's declared source/destination.
#[derive(Copy, Clone, Debug)]
pub struct EdgeWithMux {
    pub src_wire: WireId,
    pub dest_wire: WireId,
    pub pip: PipTypeId,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SegmentDir {
    Horizontal,
    Vertical,
}

#[derive(Debug)]
pub struct Track {
    pub segments: Vec<SegmentId>,
}

/// An addressable routing-graph vertex spanning a bounding box of grid
/// positions.
#[derive(Debug)]
pub struct TrackSegment {
    pub track: TrackId,
    pub dir: SegmentDir,
    pub x_low: i32,
    pub x_high: i32,
    pub y_low: i32,
    pub y_high: i32,
    pub capacity: u32,
}

impl TrackSegment {
    pub fn contains(&self, pos: Coord) -> bool {
        pos.x >= self.x_low && pos.x <= self.x_high
            && pos.y >= self.y_low && pos.y <= self.y_high
    }
}

/// A zero-resistance connection between two segments of the same track.
/// Always inserted as a bidirectional pair.
#[derive(Debug)]
pub struct TrackEdge {
    pub src: SegmentId,
    pub dest: SegmentId,
}

#[derive(Copy, Clone, Debug, Serialize)]
pub struct ConstantSources {
    pub power_track: TrackId,
    pub ground_track: TrackId,
}

/// A fatal inconsistency in the input architecture description. There is no
/// recovery: the output graph is only meaningful as a complete, internally
/// consistent whole.
#[derive(Debug, Clone)]
pub enum SchemaError {
    MultipleSiteWires {
        node: NodeId,
        first: WireId,
        second: WireId,
    },
    UnassignedWire {
        wire: WireId,
    },
    AmbiguousTraversal {
        node: NodeId,
        found: usize,
    },
    MissingNeighbor {
        node: NodeId,
        wire: WireId,
    },
    UnmappedWire {
        node: NodeId,
        wire: WireId,
    },
    NoTieoffSiteType {
        site_type: String,
    },
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MultipleSiteWires { node, first, second } => write!(
                f,
                "node {:?} owns more than one site-pin wire ({:?}, {:?})",
                node, first, second
            ),
            Self::UnassignedWire { wire } => write!(
                f,
                "wire {:?} was not assigned to any node",
                wire
            ),
            Self::AmbiguousTraversal { node, found } => write!(
                f,
                "node {:?} with pip count 1 has {} incident pip occurrences",
                node, found
            ),
            Self::MissingNeighbor { node, wire } => write!(
                f,
                "no node found across the single pip of node {:?} (far wire {:?})",
                node, wire
            ),
            Self::UnmappedWire { node, wire } => write!(
                f,
                "wire {:?} of channel node {:?} is covered by no track segment",
                wire, node
            ),
            Self::NoTieoffSiteType { site_type } => write!(
                f,
                "tie-off site type {} does not exist in the architecture",
                site_type
            ),
        }
    }
}

impl std::error::Error for SchemaError {}

#[derive(Debug)]
pub enum PipelineError {
    Arch(ArchError),
    Schema(SchemaError),
}

impl From<ArchError> for PipelineError {
    fn from(e: ArchError) -> Self {
        Self::Arch(e)
    }
}

impl From<SchemaError> for PipelineError {
    fn from(e: SchemaError) -> Self {
        Self::Schema(e)
    }
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Arch(e) => e.fmt(f),
            Self::Schema(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for PipelineError {}

/// The routing-resource graph under construction. Wires are owned by the
/// catalog for the whole run; nodes refer back to wires by id.
#[derive(Debug)]
pub struct ChannelDb {
    pub tiles: Vec<TileInst>,
    pub wires: Vec<WireInstance>,
    /// First WireId of each tile; a tile's wires are contiguous and follow
    /// its tile type's template order.
    wire_base: Vec<usize>,
    /// First PipTypeId of each tile type in the flattened PIP-type table.
    pip_base: Vec<usize>,
    pub nodes: Vec<Node>,
    /// Member wires per node, aligned with `nodes`.
    pub node_wires: Vec<Vec<WireId>>,
    pub edges_with_mux: Vec<EdgeWithMux>,
    pub tracks: Vec<Track>,
    pub segments: Vec<TrackSegment>,
    pub track_edges: Vec<TrackEdge>,
    pub constant_sources: Option<ConstantSources>,
}

impl ChannelDb {
    pub fn tile(&self, id: TileId) -> &TileInst {
        &self.tiles[id.0]
    }

    pub fn wire(&self, id: WireId) -> &WireInstance {
        &self.wires[id.0]
    }

    /// The wire instantiated by `tile` for template index `wire_in_tile`.
    pub fn wire_at(&self, tile: TileId, wire_in_tile: u32) -> WireId {
        WireId(self.wire_base[tile.0] + wire_in_tile as usize)
    }

    pub fn wire_pos(&self, id: WireId) -> Coord {
        self.tiles[self.wires[id.0].tile.0].pos
    }

    pub fn wire_tile_type(&self, id: WireId) -> u32 {
        self.tiles[self.wires[id.0].tile.0].tile_type
    }

    pub fn pip_type_id(&self, tile_type: u32, pip: u32) -> PipTypeId {
        PipTypeId(self.pip_base[tile_type as usize] + pip as usize)
    }

    pub fn node_of_wire(&self, id: WireId) -> Result<NodeId, SchemaError> {
        self.wires[id.0].node.ok_or(SchemaError::UnassignedWire { wire: id })
    }

    pub fn node_count_of_class(&self, class: NodeClass) -> usize {
        self.nodes.iter().filter(|n| n.class == class).count()
    }
}

/// Runs the whole channel-forming pipeline. Each stage is a full pass over
/// the previous stage's output; the classifier in particular needs the node
/// set fully formed and annotated before it may inspect neighbor nodes.
pub fn form_channel_graph(
    arch: &ArchDb,
    pips: &PipIndex,
    consts: &constants::ConstantsCfg,
    threads: usize,
) -> Result<ChannelDb, PipelineError> {
    let mut db = catalog::build_catalog(arch)?;
    nodes::form_nodes(&mut db, arch)?;
    nodes::annotate_nodes(&mut db, arch, pips)?;
    classify::classify_nodes(&mut db, pips, threads)?;
    tracks::form_tracks(&mut db)?;
    constants::build_constant_network(&mut db, arch, consts)?;
    Ok(db)
}
