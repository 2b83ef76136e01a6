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

use std::collections::HashSet;
use std::thread;

use crate::arch::PipIndex;
use crate::common::split_range_nicely;
#[allow(unused)]
use crate::log::*;

use super::*;

/// Outcome of resolving one ambiguous (single PIP, site-pin-bearing) node
/// against its neighbor across that PIP.
enum Resolution {
    /// Both endpoints are single-PIP site-pin nodes: a direct mux edge.
    MuxPair {
        other: NodeId,
        src_wire: WireId,
        dest_wire: WireId,
        pip: PipTypeId,
    },
    /// The neighbor is itself dead: a stub pair with no useful connectivity.
    StubPair {
        other: NodeId,
    },
    /// The neighbor has real fanout: this node feeds a channel.
    ToChannel,
}

/// Classifies every node. Provisional classes are a pure function of the
/// frozen annotation facts; the ambiguous single-PIP/site-pin cases are
/// resolved by inspecting the neighbor node across the PIP and the resulting
/// decisions are committed in a single batch afterwards, so the decision pass
/// never observes a partially reclassified node set. With `threads > 1` the
/// decision pass runs on disjoint slices of the ambiguous node list.
pub fn classify_nodes(
    db: &mut ChannelDb,
    pips: &PipIndex,
    threads: usize,
) -> Result<(), SchemaError> {
    let mut finals: Vec<NodeClass> = Vec::with_capacity(db.nodes.len());
    let mut ambiguous: Vec<(NodeId, WireId)> = Vec::new();

    for (node_idx, node) in db.nodes.iter().enumerate() {
        let class = match (node.site_wire, node.number_pips) {
            (None, pip_count) if pip_count <= 1 => NodeClass::Null,
            (Some(_), 0) => NodeClass::Null,
            (None, _) => NodeClass::Channel,
            (Some(site_wire), 1) => {
                ambiguous.push((NodeId(node_idx), site_wire));
                /* Placeholder; overwritten by the commit pass below */
                NodeClass::Null
            }
            (Some(_), _) => NodeClass::EdgesToChannel,
        };
        finals.push(class);
    }

    dbg_log!(
        DBG_INFO,
        "Classifying {} nodes ({} ambiguous)",
        db.nodes.len(),
        ambiguous.len()
    );

    let resolutions = if threads <= 1 {
        ambiguous.iter()
            .map(|&(node, site_wire)| resolve_ambiguous(db, pips, node, site_wire))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        let snapshot: &ChannelDb = db;
        thread::scope(|scope| {
            let mut handles = Vec::new();
            for range in split_range_nicely(0 .. ambiguous.len(), threads) {
                let items = &ambiguous[range];
                handles.push(scope.spawn(move || {
                    items.iter()
                        .map(|&(node, site_wire)| {
                            resolve_ambiguous(snapshot, pips, node, site_wire)
                        })
                        .collect::<Result<Vec<_>, _>>()
                }));
            }
            let mut all = Vec::with_capacity(ambiguous.len());
            for handle in handles {
                all.extend(handle.join().unwrap()?);
            }
            Ok(all)
        })?
    };

    /* Commit: batch-apply all decisions at once */
    let mut recorded_pairs: HashSet<(NodeId, NodeId)> = HashSet::new();
    for (node, resolution) in resolutions {
        match resolution {
            Resolution::MuxPair { other, src_wire, dest_wire, pip } => {
                finals[node.0] = NodeClass::EdgeWithMux;
                finals[other.0] = NodeClass::EdgeWithMux;
                /* Both endpoints resolve the same pair; record it once */
                let key = (node.min(other), node.max(other));
                if recorded_pairs.insert(key) {
                    db.edges_with_mux.push(EdgeWithMux { src_wire, dest_wire, pip });
                }
            }
            Resolution::StubPair { other } => {
                finals[node.0] = NodeClass::Null;
                finals[other.0] = NodeClass::Null;
            }
            Resolution::ToChannel => {
                finals[node.0] = NodeClass::EdgesToChannel;
            }
        }
    }

    for (node, class) in db.nodes.iter_mut().zip(finals) {
        node.class = class;
    }

    dbg_log!(
        DBG_INFO,
        "Classified: {} CHANNEL, {} EDGE_WITH_MUX, {} EDGES_TO_CHANNEL, {} NULL",
        db.node_count_of_class(NodeClass::Channel),
        db.node_count_of_class(NodeClass::EdgeWithMux),
        db.node_count_of_class(NodeClass::EdgesToChannel),
        db.node_count_of_class(NodeClass::Null)
    );

    Ok(())
}

/// Traverses the single incident PIP of an ambiguous node and decides its
/// final class from the neighbor's frozen facts. Finding zero or multiple
/// incident PIP occurrences is a fatal inconsistency of the input.
fn resolve_ambiguous(
    db: &ChannelDb,
    pips: &PipIndex,
    node: NodeId,
    site_wire: WireId,
) -> Result<(NodeId, Resolution), SchemaError> {
    let mut occurrences: HashSet<(TileId, u32)> = HashSet::new();
    let mut carrier: Option<(TileId, u32, u32)> = None;

    for &wire_id in &db.node_wires[node.0] {
        let wire = db.wire(wire_id);
        let tile_type = db.wire_tile_type(wire_id);
        for &pip in pips.pips_on_wire(tile_type, wire.wire_in_tile) {
            if occurrences.insert((wire.tile, pip)) {
                carrier = Some((wire.tile, pip, wire.wire_in_tile));
            }
        }
    }

    if occurrences.len() != 1 {
        return Err(SchemaError::AmbiguousTraversal {
            node,
            found: occurrences.len(),
        });
    }
    /* `occurrences` is non-empty here */
    let (tile, pip, wire_in_tile) = carrier.unwrap();

    let tile_type = db.tile(tile).tile_type;
    let endpoints = pips.pip_endpoints(tile_type, pip);
    let node_is_src = endpoints.src == wire_in_tile;
    let far_wire_in_tile = if node_is_src { endpoints.dest } else { endpoints.src };

    let far_wire = db.wire_at(tile, far_wire_in_tile);
    let neighbor = db.wire(far_wire).node
        .ok_or(SchemaError::MissingNeighbor { node, wire: far_wire })?;
    let neighbor_facts = &db.nodes[neighbor.0];

    let resolution = match (neighbor_facts.site_wire, neighbor_facts.number_pips) {
        (Some(neighbor_site_wire), 1) => {
            let (src_wire, dest_wire) = if node_is_src {
                (site_wire, neighbor_site_wire)
            } else {
                (neighbor_site_wire, site_wire)
            };
            Resolution::MuxPair {
                other: neighbor,
                src_wire,
                dest_wire,
                pip: db.pip_type_id(tile_type, pip),
            }
        }
        (None, pip_count) if pip_count <= 1 => Resolution::StubPair { other: neighbor },
        _ => Resolution::ToChannel,
    };

    Ok((node, resolution))
}
