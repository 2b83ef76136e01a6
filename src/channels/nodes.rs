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

use std::collections::{HashMap, HashSet};

use crate::arch::{ArchDb, ArchError, PipIndex};
use crate::common::DisjointSets;
#[allow(unused)]
use crate::log::*;

use super::*;

/// Merges wire instances into nodes. Every inter-tile connection unions the
/// sets containing its two endpoint wires; each surviving set becomes one
/// node. Wires that no connection touches become single-member nodes.
pub fn form_nodes(db: &mut ChannelDb, arch: &ArchDb) -> Result<(), PipelineError> {
    let tile_by_name: HashMap<&str, TileId> = db.tiles.iter()
        .enumerate()
        .map(|(idx, tile)| (tile.name.as_str(), TileId(idx)))
        .collect();

    let wire_idx_by_name: Vec<HashMap<&str, u32>> = arch.tile_types.iter()
        .map(|tt| {
            tt.wires.iter()
                .enumerate()
                .map(|(idx, w)| (w.name.as_str(), idx as u32))
                .collect()
        })
        .collect();

    let lookup = |endpoint: &crate::arch::WireEndpoint| -> Result<WireId, ArchError> {
        let tile = tile_by_name.get(endpoint.tile.as_str())
            .ok_or_else(|| ArchError::MalformedInput(format!(
                "connection references unknown tile {}",
                endpoint.tile
            )))?;
        let tile_type = db.tiles[tile.0].tile_type;
        let wire_in_tile = wire_idx_by_name[tile_type as usize]
            .get(endpoint.wire.as_str())
            .ok_or_else(|| ArchError::MalformedInput(format!(
                "connection references unknown wire {}/{}",
                endpoint.tile, endpoint.wire
            )))?;
        Ok(db.wire_at(*tile, *wire_in_tile))
    };

    let mut sets = DisjointSets::new(db.wires.len());
    for conn in &arch.connections {
        let a = lookup(&conn.wire_a)?;
        let b = lookup(&conn.wire_b)?;
        sets.union(a.0, b.0);
    }

    /* Compact set roots into node ids, in first-seen wire order */
    let mut root_to_node: HashMap<usize, NodeId> = HashMap::new();
    let mut node_wires: Vec<Vec<WireId>> = Vec::new();

    for wire_idx in 0 .. db.wires.len() {
        let root = sets.find(wire_idx);
        let node = *root_to_node.entry(root).or_insert_with(|| {
            node_wires.push(Vec::new());
            NodeId(node_wires.len() - 1)
        });
        node_wires[node.0].push(WireId(wire_idx));
        db.wires[wire_idx].node = Some(node);
    }

    db.nodes = (0 .. node_wires.len())
        .map(|_| Node {
            class: NodeClass::Null,
            number_pips: 0,
            site_wire: None,
            track: None,
        })
        .collect();
    db.node_wires = node_wires;

    /* Partition check: the merge must leave no wire behind */
    for (wire_idx, wire) in db.wires.iter().enumerate() {
        if wire.node.is_none() {
            return Err(SchemaError::UnassignedWire { wire: WireId(wire_idx) }.into());
        }
    }

    dbg_log!(
        DBG_INFO,
        "Formed {} nodes from {} wires",
        db.nodes.len(),
        db.wires.len()
    );

    Ok(())
}

/// Annotates every node with its incident PIP count and its unique site-pin
/// wire. A node owning two site-pin wires is a fatal schema violation.
pub fn annotate_nodes(
    db: &mut ChannelDb,
    arch: &ArchDb,
    pips: &PipIndex,
) -> Result<(), SchemaError> {
    for node_idx in 0 .. db.nodes.len() {
        let mut occurrences: HashSet<(TileId, u32)> = HashSet::new();
        let mut site_wire = None;

        for &wire_id in &db.node_wires[node_idx] {
            let wire = &db.wires[wire_id.0];
            let tile = &db.tiles[wire.tile.0];

            for &pip in pips.pips_on_wire(tile.tile_type, wire.wire_in_tile) {
                occurrences.insert((wire.tile, pip));
            }

            let template = &arch.tile_types[tile.tile_type as usize]
                .wires[wire.wire_in_tile as usize];
            if template.site_pin.is_some() {
                match site_wire {
                    None => site_wire = Some(wire_id),
                    Some(first) => {
                        return Err(SchemaError::MultipleSiteWires {
                            node: NodeId(node_idx),
                            first,
                            second: wire_id,
                        });
                    }
                }
            }
        }

        let node = &mut db.nodes[node_idx];
        node.number_pips = occurrences.len() as u32;
        node.site_wire = site_wire;
    }

    Ok(())
}
