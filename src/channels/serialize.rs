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

use serde::{Serialize, Serializer, ser::SerializeStruct};

use crate::arch::ArchDb;

use super::*;

/// The persisted routing-resource graph, row for row the schema consumed by
/// the downstream placement-and-routing tool. All `*_ref` fields are row
/// indices into the sibling tables.
#[derive(Serialize)]
pub struct GraphFile<'d> {
    pub name: &'d str,
    pub wires: Vec<WireRow<'d>>,
    pub pip_types: Vec<PipTypeRow<'d>>,
    pub nodes: Vec<NodeRow>,
    pub edges_with_mux: Vec<EdgeWithMuxRow>,
    pub tracks: Vec<TrackRow>,
    pub track_segments: Vec<TrackSegmentRow>,
    pub track_edges: Vec<TrackEdgeRow>,
    pub constant_sources: Option<ConstantSources>,
}

#[derive(Serialize)]
pub struct WireRow<'d> {
    pub tile: &'d str,
    pub wire_type: &'d str,
    pub node: Option<NodeId>,
    pub track_segment: Option<SegmentId>,
}

#[derive(Serialize)]
pub struct PipTypeRow<'d> {
    pub tile_type: &'d str,
    pub name: &'d str,
    pub src_wire_type: &'d str,
    pub dest_wire_type: &'d str,
    pub directional: bool,
    pub pseudo: bool,
    pub invertible: bool,
}

#[derive(Serialize)]
pub struct NodeRow {
    pub classification: NodeClass,
    pub number_pips: u32,
    pub site_wire: Option<WireId>,
    pub track: Option<TrackId>,
}

#[derive(Serialize)]
pub struct EdgeWithMuxRow {
    pub src_wire: WireId,
    pub dest_wire: WireId,
    pub pip: PipTypeId,
}

#[derive(Serialize)]
pub struct TrackRow {
    pub segments: Vec<SegmentId>,
}

#[derive(Serialize)]
pub struct TrackSegmentRow {
    pub track: TrackId,
    pub direction: SegmentDir,
    pub x_low: i32,
    pub x_high: i32,
    pub y_low: i32,
    pub y_high: i32,
    pub capacity: u32,
}

pub struct TrackEdgeRow {
    pub src_segment: SegmentId,
    pub dest_segment: SegmentId,
}

/* The switch kind is fixed for intra-track edges; serialize it explicitly so
 * the consumer doesn't need to special-case the table. */
impl Serialize for TrackEdgeRow {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error> where
        S: Serializer
    {
        let mut s = serializer.serialize_struct("TrackEdgeRow", 3)?;
        s.serialize_field("src_segment", &self.src_segment)?;
        s.serialize_field("dest_segment", &self.dest_segment)?;
        s.serialize_field("switch", "short")?;
        s.end()
    }
}

pub fn wire_rows<'d>(db: &ChannelDb, arch: &'d ArchDb) -> Vec<WireRow<'d>> {
    db.wires.iter()
        .map(|wire| {
            let tile = &db.tiles[wire.tile.0];
            let tt = &arch.tile_types[tile.tile_type as usize];
            WireRow {
                tile: &arch.grid[wire.tile.0].name,
                wire_type: &tt.wires[wire.wire_in_tile as usize].name,
                node: wire.node,
                track_segment: wire.segment,
            }
        })
        .collect()
}

pub fn pip_type_rows<'d>(arch: &'d ArchDb) -> Vec<PipTypeRow<'d>> {
    arch.tile_types.iter()
        .flat_map(|tt| {
            tt.pips.iter().map(move |pip| PipTypeRow {
                tile_type: &tt.name,
                name: &pip.name,
                src_wire_type: &pip.src_wire,
                dest_wire_type: &pip.dest_wire,
                directional: pip.is_directional,
                pseudo: pip.is_pseudo,
                invertible: pip.can_invert,
            })
        })
        .collect()
}

pub fn node_rows(db: &ChannelDb) -> Vec<NodeRow> {
    db.nodes.iter()
        .map(|node| NodeRow {
            classification: node.class,
            number_pips: node.number_pips,
            site_wire: node.site_wire,
            track: node.track,
        })
        .collect()
}

pub fn track_rows(db: &ChannelDb) -> Vec<TrackRow> {
    db.tracks.iter()
        .map(|track| TrackRow {
            segments: track.segments.clone(),
        })
        .collect()
}

pub fn segment_rows(db: &ChannelDb) -> Vec<TrackSegmentRow> {
    db.segments.iter()
        .map(|seg| TrackSegmentRow {
            track: seg.track,
            direction: seg.dir,
            x_low: seg.x_low,
            x_high: seg.x_high,
            y_low: seg.y_low,
            y_high: seg.y_high,
            capacity: seg.capacity,
        })
        .collect()
}

pub fn track_edge_rows(db: &ChannelDb) -> Vec<TrackEdgeRow> {
    db.track_edges.iter()
        .map(|edge| TrackEdgeRow {
            src_segment: edge.src,
            dest_segment: edge.dest,
        })
        .collect()
}

pub fn graph_file<'d>(db: &'d ChannelDb, arch: &'d ArchDb) -> GraphFile<'d> {
    GraphFile {
        name: &arch.name,
        wires: wire_rows(db, arch),
        pip_types: pip_type_rows(arch),
        nodes: node_rows(db),
        edges_with_mux: db.edges_with_mux.iter()
            .map(|edge| EdgeWithMuxRow {
                src_wire: edge.src_wire,
                dest_wire: edge.dest_wire,
                pip: edge.pip,
            })
            .collect(),
        tracks: track_rows(db),
        track_segments: segment_rows(db),
        track_edges: track_edge_rows(db),
        constant_sources: db.constant_sources,
    }
}
