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
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::arch::{ArchDb, ArchError};
use crate::common::Coord;
#[allow(unused)]
use crate::log::*;

use super::tracks::insert_track;
use super::*;

/// Names of the tie-off site type and its fixed-value pins. The defaults
/// match the 7-series fabric.
#[derive(Clone, Debug, Deserialize)]
pub struct ConstantsCfg {
    #[serde(default = "default_tieoff")]
    pub tieoff_site_type: String,
    #[serde(default = "default_power_pin")]
    pub power_pin: String,
    #[serde(default = "default_ground_pin")]
    pub ground_pin: String,
}

fn default_tieoff() -> String {
    "TIEOFF".into()
}

fn default_power_pin() -> String {
    "HARD1".into()
}

fn default_ground_pin() -> String {
    "HARD0".into()
}

impl Default for ConstantsCfg {
    fn default() -> Self {
        Self {
            tieoff_site_type: default_tieoff(),
            power_pin: default_power_pin(),
            ground_pin: default_ground_pin(),
        }
    }
}

impl ConstantsCfg {
    pub fn load<P>(path: P) -> Result<Self, ArchError> where
        P: AsRef<Path>
    {
        let file = File::open(path)
            .map_err(|e| ArchError::CantOpenFile(format!("{:?}", e)))?;
        serde_yaml::from_reader(BufReader::new(file))
            .map_err(|e| ArchError::MalformedInput(format!("constants config: {}", e)))
    }
}

/// Synthesizes the whole-fabric power and ground tracks and retargets every
/// fixed-value tie-off wire at them.
///
/// The two constant nodes have no backing wires; their tracks span every
/// grid position except the outer border row/column, which carries no usable
/// sites. Rewiring only changes which track a node is considered to feed,
/// never wire-to-node membership.
pub fn build_constant_network(
    db: &mut ChannelDb,
    arch: &ArchDb,
    cfg: &ConstantsCfg,
) -> Result<(), SchemaError> {
    let positions: BTreeSet<Coord> = db.tiles.iter()
        .map(|tile| tile.pos)
        .filter(|pos| pos.x > 0 && pos.y > 0)
        .collect();

    let power_track = insert_constant_node(db, &positions);
    let ground_track = insert_constant_node(db, &positions);
    db.constant_sources = Some(ConstantSources {
        power_track,
        ground_track,
    });

    if arch.site_type(&cfg.tieoff_site_type).is_none() {
        return Err(SchemaError::NoTieoffSiteType {
            site_type: cfg.tieoff_site_type.clone(),
        });
    }

    let mut rewired = 0usize;
    for (tt_idx, tt) in arch.tile_types.iter().enumerate() {
        /* Wire templates bound to a fixed-value pin of a tie-off site */
        let mut constant_templates: Vec<(u32, TrackId)> = Vec::new();
        for (wire_idx, wire) in tt.wires.iter().enumerate() {
            let binding = match &wire.site_pin {
                Some(binding) => binding,
                None => continue,
            };
            let site = match tt.sites.iter().find(|s| s.name == binding.site) {
                Some(site) => site,
                None => continue,
            };
            if site.site_type != cfg.tieoff_site_type {
                continue;
            }
            if binding.pin == cfg.power_pin {
                constant_templates.push((wire_idx as u32, power_track));
            } else if binding.pin == cfg.ground_pin {
                constant_templates.push((wire_idx as u32, ground_track));
            }
        }
        if constant_templates.is_empty() {
            continue;
        }

        for tile_idx in 0 .. db.tiles.len() {
            if db.tiles[tile_idx].tile_type != tt_idx as u32 {
                continue;
            }
            for &(wire_in_tile, track) in &constant_templates {
                let wire = db.wire_at(TileId(tile_idx), wire_in_tile);
                let node = db.node_of_wire(wire)?;
                db.nodes[node.0].track = Some(track);
                rewired += 1;
            }
        }
    }

    dbg_log!(DBG_INFO, "Rewired {} tie-off wires to the constant network", rewired);

    Ok(())
}

fn insert_constant_node(db: &mut ChannelDb, positions: &BTreeSet<Coord>) -> TrackId {
    let node = NodeId(db.nodes.len());
    db.nodes.push(Node {
        class: NodeClass::Channel,
        number_pips: 0,
        site_wire: None,
        track: None,
    });
    db.node_wires.push(Vec::new());
    insert_track(db, node, positions)
}
