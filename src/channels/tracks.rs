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

use std::collections::BTreeSet;

use crate::common::{Coord, DisjointSets};
#[allow(unused)]
use crate::log::*;

use super::*;

/// A track segment before it is assigned a track and global id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentProto {
    pub dir: SegmentDir,
    pub x_low: i32,
    pub x_high: i32,
    pub y_low: i32,
    pub y_high: i32,
}

impl SegmentProto {
    pub fn contains(&self, pos: Coord) -> bool {
        pos.x >= self.x_low && pos.x <= self.x_high
            && pos.y >= self.y_low && pos.y <= self.y_high
    }

    /* Minimal manhattan distance between two axis-aligned boxes; 0 means
     * overlap, 1 means abutting at a branch point. */
    fn touches(&self, other: &SegmentProto) -> bool {
        let dx = (other.x_low - self.x_high).max(self.x_low - other.x_high).max(0);
        let dy = (other.y_low - self.y_high).max(self.y_low - other.y_high).max(0);
        dx + dy <= 1
    }
}

/// Decomposes a set of grid positions into directional collinear spans plus
/// the list of span pairs that must be shorted together to reproduce the
/// node's shape.
///
/// Horizontal runs of length > 1 are extracted first, the remaining
/// positions form vertical runs, and what is left over becomes single-point
/// segments. An empty or single-point set still yields one valid segment.
pub fn decompose_positions(
    positions: &BTreeSet<Coord>,
) -> (Vec<SegmentProto>, Vec<(usize, usize)>) {
    if positions.is_empty() {
        let degenerate = SegmentProto {
            dir: SegmentDir::Horizontal,
            x_low: 0,
            x_high: 0,
            y_low: 0,
            y_high: 0,
        };
        return (vec![degenerate], Vec::new());
    }

    let mut segments = Vec::new();
    let mut remaining: BTreeSet<Coord> = positions.clone();

    /* Maximal horizontal runs */
    let mut by_row: Vec<Coord> = positions.iter().copied().collect();
    by_row.sort_by_key(|c| (c.y, c.x));
    let mut run_start = 0;
    for idx in 1 ..= by_row.len() {
        let run_broken = idx == by_row.len()
            || by_row[idx].y != by_row[run_start].y
            || by_row[idx].x != by_row[idx - 1].x + 1;
        if !run_broken {
            continue;
        }
        if idx - run_start > 1 {
            segments.push(SegmentProto {
                dir: SegmentDir::Horizontal,
                x_low: by_row[run_start].x,
                x_high: by_row[idx - 1].x,
                y_low: by_row[run_start].y,
                y_high: by_row[run_start].y,
            });
            for pos in &by_row[run_start .. idx] {
                remaining.remove(pos);
            }
        }
        run_start = idx;
    }

    /* Maximal vertical runs over what the horizontal pass left behind */
    let mut by_col: Vec<Coord> = remaining.iter().copied().collect();
    by_col.sort_by_key(|c| (c.x, c.y));
    let mut run_start = 0;
    for idx in 1 ..= by_col.len() {
        let run_broken = idx == by_col.len()
            || by_col[idx].x != by_col[run_start].x
            || by_col[idx].y != by_col[idx - 1].y + 1;
        if !run_broken {
            continue;
        }
        if idx - run_start > 1 {
            segments.push(SegmentProto {
                dir: SegmentDir::Vertical,
                x_low: by_col[run_start].x,
                x_high: by_col[run_start].x,
                y_low: by_col[run_start].y,
                y_high: by_col[idx - 1].y,
            });
            for pos in &by_col[run_start .. idx] {
                remaining.remove(pos);
            }
        }
        run_start = idx;
    }

    /* Leftover single points. A point sitting on top of or below an already
     * emitted segment is a vertical stub of a branch; anything else defaults
     * to horizontal. */
    for pos in &remaining {
        let above = Coord::new(pos.x, pos.y + 1);
        let below = Coord::new(pos.x, pos.y - 1);
        let dir = if segments.iter().any(|s: &SegmentProto| {
            s.contains(above) || s.contains(below)
        }) {
            SegmentDir::Vertical
        } else {
            SegmentDir::Horizontal
        };
        segments.push(SegmentProto {
            dir,
            x_low: pos.x,
            x_high: pos.x,
            y_low: pos.y,
            y_high: pos.y,
        });
    }

    /* Short together spans that overlap or abut at a branch point */
    let mut connections = Vec::new();
    for a in 0 .. segments.len() {
        for b in a + 1 .. segments.len() {
            if segments[a].touches(&segments[b]) {
                connections.push((a, b));
            }
        }
    }

    /* A node's position set may be non-contiguous; the track is still one
     * electrical net, so chain the remaining components together in
     * canonical order. */
    let mut components = DisjointSets::new(segments.len());
    for &(a, b) in &connections {
        components.union(a, b);
    }
    let mut previous_root = None;
    for seg in 0 .. segments.len() {
        let root = components.find(seg);
        if root != seg {
            continue;
        }
        if let Some(prev) = previous_root {
            connections.push((prev, seg));
            components.union(prev, seg);
        }
        previous_root = Some(root);
    }

    (segments, connections)
}

/// Materializes one track from a position set: segments, bidirectional short
/// edges and the node's track reference.
pub(super) fn insert_track(
    db: &mut ChannelDb,
    node: NodeId,
    positions: &BTreeSet<Coord>,
) -> TrackId {
    let (protos, connections) = decompose_positions(positions);

    let track_id = TrackId(db.tracks.len());
    let mut segment_ids = Vec::with_capacity(protos.len());
    for proto in protos {
        segment_ids.push(SegmentId(db.segments.len()));
        db.segments.push(TrackSegment {
            track: track_id,
            dir: proto.dir,
            x_low: proto.x_low,
            x_high: proto.x_high,
            y_low: proto.y_low,
            y_high: proto.y_high,
            capacity: 1,
        });
    }

    for (a, b) in connections {
        db.track_edges.push(TrackEdge {
            src: segment_ids[a],
            dest: segment_ids[b],
        });
        db.track_edges.push(TrackEdge {
            src: segment_ids[b],
            dest: segment_ids[a],
        });
    }

    db.tracks.push(Track {
        segments: segment_ids,
    });
    db.nodes[node.0].track = Some(track_id);
    track_id
}

/// Decomposes every channel node into a track and maps each member wire to
/// the first segment covering the wire's grid position.
pub fn form_tracks(db: &mut ChannelDb) -> Result<(), SchemaError> {
    let channel_nodes: Vec<NodeId> = db.nodes.iter()
        .enumerate()
        .filter(|(_, node)| node.class == NodeClass::Channel)
        .map(|(idx, _)| NodeId(idx))
        .collect();

    dbg_log!(DBG_INFO, "Forming tracks for {} channel nodes", channel_nodes.len());

    for node in channel_nodes {
        let positions: BTreeSet<Coord> = db.node_wires[node.0].iter()
            .map(|&wire| db.wire_pos(wire))
            .collect();

        let track = insert_track(db, node, &positions);

        for wire_idx in 0 .. db.node_wires[node.0].len() {
            let wire = db.node_wires[node.0][wire_idx];
            let pos = db.wire_pos(wire);
            let segment = db.tracks[track.0].segments.iter()
                .find(|&&seg| db.segments[seg.0].contains(pos))
                .copied()
                .ok_or(SchemaError::UnmappedWire { node, wire })?;
            db.wires[wire.0].segment = Some(segment);
        }
    }

    Ok(())
}
