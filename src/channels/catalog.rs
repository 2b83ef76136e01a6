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

use crate::arch::{ArchDb, ArchError};
use crate::common::Coord;
#[allow(unused)]
use crate::log::*;

use super::*;

/// Instantiates the wire catalog: one tile per grid entry and one wire
/// instance per (tile, wire template) pair. Also flattens the per-tile-type
/// PIP lists into the fabric-wide PIP-type table used for PIP references.
pub fn build_catalog(arch: &ArchDb) -> Result<ChannelDb, ArchError> {
    let mut tiles = Vec::with_capacity(arch.grid.len());
    let mut wires = Vec::new();
    let mut wire_base = Vec::with_capacity(arch.grid.len());

    for grid_tile in &arch.grid {
        /* Dangling tile type names were rejected by `ArchDb::validate` */
        let tile_type = arch.tile_type_idx(&grid_tile.tile_type)
            .ok_or_else(|| ArchError::MalformedInput(format!(
                "grid tile {} has unknown tile type {}",
                grid_tile.name, grid_tile.tile_type
            )))?;

        let tile_id = TileId(tiles.len());
        wire_base.push(wires.len());

        for wire_in_tile in 0 .. arch.tile_types[tile_type as usize].wires.len() {
            wires.push(WireInstance {
                tile: tile_id,
                wire_in_tile: wire_in_tile as u32,
                node: None,
                segment: None,
            });
        }

        tiles.push(TileInst {
            name: grid_tile.name.clone(),
            tile_type,
            pos: Coord::new(grid_tile.grid_x, grid_tile.grid_y),
        });
    }

    let mut pip_base = Vec::with_capacity(arch.tile_types.len());
    let mut pip_rows = 0;
    for tt in &arch.tile_types {
        pip_base.push(pip_rows);
        pip_rows += tt.pips.len();
    }

    dbg_log!(
        DBG_INFO,
        "Instantiated {} wires over {} tiles",
        wires.len(),
        tiles.len()
    );

    Ok(ChannelDb {
        tiles,
        wires,
        wire_base,
        pip_base,
        nodes: Vec::new(),
        node_wires: Vec::new(),
        edges_with_mux: Vec::new(),
        tracks: Vec::new(),
        segments: Vec::new(),
        track_edges: Vec::new(),
        constant_sources: None,
    })
}
