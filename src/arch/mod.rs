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

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use flate2::read::GzDecoder;
use serde::Deserialize;

#[cfg(test)]
mod tests;

#[derive(Debug, Clone)]
pub enum ArchError {
    CantOpenFile(String),
    MalformedInput(String),
}

impl std::fmt::Display for ArchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CantOpenFile(msg) => write!(f, "can't open fabric file: {}", msg),
            Self::MalformedInput(msg) => write!(f, "malformed fabric description: {}", msg),
        }
    }
}

impl std::error::Error for ArchError {}

pub struct OpenOpts {
    pub raw: bool,
}

impl Default for OpenOpts {
    fn default() -> Self {
        Self {
            raw: false
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Deserialize)]
pub enum PinDirection {
    Input,
    Output,
    Inout,
}

/// A pin of a site type, as declared by the architecture.
#[derive(Clone, Debug, Deserialize)]
pub struct SitePinDef {
    pub name: String,
    pub direction: PinDirection,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SiteTypeDef {
    pub name: String,
    pub pins: Vec<SitePinDef>,
}

/// Binding of a tile-type wire to a pin of one of the tile type's sites.
#[derive(Clone, Debug, Deserialize)]
pub struct SitePinBinding {
    /// Name of the site instance within the tile type.
    pub site: String,
    /// Name of the pin within the site's site type.
    pub pin: String,
}

/// A wire template. Each tile instance of the owning tile type instantiates
/// one wire per template.
#[derive(Clone, Debug, Deserialize)]
pub struct WireDef {
    pub name: String,
    #[serde(default)]
    pub site_pin: Option<SitePinBinding>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PipDef {
    pub name: String,
    pub src_wire: String,
    pub dest_wire: String,
    #[serde(default = "default_true")]
    pub is_directional: bool,
    #[serde(default)]
    pub is_pseudo: bool,
    #[serde(default)]
    pub can_invert: bool,
}

fn default_true() -> bool {
    true
}

/// A site instance placed within a tile type.
#[derive(Clone, Debug, Deserialize)]
pub struct SiteDef {
    pub name: String,
    pub site_type: String,
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TileTypeDef {
    pub name: String,
    #[serde(default)]
    pub wires: Vec<WireDef>,
    #[serde(default)]
    pub pips: Vec<PipDef>,
    #[serde(default)]
    pub sites: Vec<SiteDef>,
}

/// One placed tile of the fabric grid.
#[derive(Clone, Debug, Deserialize)]
pub struct GridTile {
    pub name: String,
    pub tile_type: String,
    pub grid_x: i32,
    pub grid_y: i32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WireEndpoint {
    pub tile: String,
    pub wire: String,
}

/// A fixed inter-tile connection: the two endpoint wires are always
/// electrically identical.
#[derive(Clone, Debug, Deserialize)]
pub struct WireConnection {
    pub wire_a: WireEndpoint,
    pub wire_b: WireEndpoint,
}

/// The architecture database consumed by the channel-forming pipeline:
/// tile-type templates, site types, the placed grid and the global list of
/// inter-tile wire connections.
#[derive(Clone, Debug, Deserialize)]
pub struct ArchDb {
    pub name: String,
    pub tile_types: Vec<TileTypeDef>,
    pub site_types: Vec<SiteTypeDef>,
    pub grid: Vec<GridTile>,
    #[serde(default)]
    pub connections: Vec<WireConnection>,
}

impl ArchDb {
    /// Opens a fabric description file. The file is expected to be a gzipped
    /// JSON document unless `opts.raw` is set.
    pub fn open<P>(path: P, opts: OpenOpts) -> Result<Self, ArchError> where
        P: AsRef<Path>
    {
        let file = File::open(path)
            .map_err(|e| ArchError::CantOpenFile(format!("{:?}", e)))?;

        let db: ArchDb = if opts.raw {
            serde_json::from_reader(BufReader::new(file))
                .map_err(|e| ArchError::MalformedInput(format!("{}", e)))?
        } else {
            serde_json::from_reader(BufReader::new(GzDecoder::new(file)))
                .map_err(|e| ArchError::MalformedInput(format!("{}", e)))?
        };

        db.validate()?;
        Ok(db)
    }

    /// Parses a fabric description from an uncompressed JSON byte stream.
    pub fn from_reader<R>(reader: R) -> Result<Self, ArchError> where
        R: std::io::Read
    {
        let db: ArchDb = serde_json::from_reader(reader)
            .map_err(|e| ArchError::MalformedInput(format!("{}", e)))?;
        db.validate()?;
        Ok(db)
    }

    pub fn tile_type_idx(&self, name: &str) -> Option<u32> {
        self.tile_types.iter()
            .position(|tt| tt.name == name)
            .map(|idx| idx as u32)
    }

    pub fn site_type(&self, name: &str) -> Option<&SiteTypeDef> {
        self.site_types.iter().find(|st| st.name == name)
    }

    /// Cross-checks all by-name references of the description. Any dangling
    /// reference means a corrupt or incompatible database and is fatal.
    fn validate(&self) -> Result<(), ArchError> {
        for tt in &self.tile_types {
            let wire_names: HashMap<&str, ()> = tt.wires.iter()
                .map(|w| (w.name.as_str(), ()))
                .collect();
            if wire_names.len() != tt.wires.len() {
                return Err(ArchError::MalformedInput(
                    format!("tile type {} has duplicate wire names", tt.name)
                ));
            }

            for pip in &tt.pips {
                for wire in [&pip.src_wire, &pip.dest_wire] {
                    if !wire_names.contains_key(wire.as_str()) {
                        return Err(ArchError::MalformedInput(format!(
                            "pip {}/{} references unknown wire {}",
                            tt.name, pip.name, wire
                        )));
                    }
                }
            }

            for site in &tt.sites {
                if self.site_type(&site.site_type).is_none() {
                    return Err(ArchError::MalformedInput(format!(
                        "site {}/{} has unknown site type {}",
                        tt.name, site.name, site.site_type
                    )));
                }
            }

            for wire in &tt.wires {
                if let Some(binding) = &wire.site_pin {
                    let site = tt.sites.iter()
                        .find(|s| s.name == binding.site)
                        .ok_or_else(|| ArchError::MalformedInput(format!(
                            "wire {}/{} is bound to unknown site {}",
                            tt.name, wire.name, binding.site
                        )))?;
                    /* Site type presence was checked above */
                    let st = self.site_type(&site.site_type).unwrap();
                    if !st.pins.iter().any(|pin| pin.name == binding.pin) {
                        return Err(ArchError::MalformedInput(format!(
                            "wire {}/{} is bound to unknown pin {}.{}",
                            tt.name, wire.name, site.site_type, binding.pin
                        )));
                    }
                }
            }
        }

        for tile in &self.grid {
            if self.tile_type_idx(&tile.tile_type).is_none() {
                return Err(ArchError::MalformedInput(format!(
                    "grid tile {} has unknown tile type {}",
                    tile.name, tile.tile_type
                )));
            }
        }

        Ok(())
    }
}

/// Endpoints of one PIP resolved to wire template indices of its tile type.
#[derive(Copy, Clone, Debug)]
pub struct ResolvedPip {
    pub src: u32,
    pub dest: u32,
}

/// Precomputed wire-level PIP adjacency, built once per run. Maps every wire
/// template of every tile type to the directional, non-pseudo PIPs that have
/// the wire as one of their endpoints.
pub struct PipIndex {
    /* Indexed by tile type, then aligned with the tile type's pip list */
    endpoints: Vec<Vec<ResolvedPip>>,
    /* Indexed by tile type, then by wire template index */
    on_wire: Vec<Vec<Vec<u32>>>,
}

impl PipIndex {
    pub fn build(db: &ArchDb) -> Self {
        let mut endpoints = Vec::with_capacity(db.tile_types.len());
        let mut on_wire = Vec::with_capacity(db.tile_types.len());

        for tt in &db.tile_types {
            let wire_idx: HashMap<&str, u32> = tt.wires.iter()
                .enumerate()
                .map(|(idx, w)| (w.name.as_str(), idx as u32))
                .collect();

            /* Wire names were validated by `ArchDb::validate` */
            let resolved: Vec<ResolvedPip> = tt.pips.iter()
                .map(|pip| ResolvedPip {
                    src: wire_idx[pip.src_wire.as_str()],
                    dest: wire_idx[pip.dest_wire.as_str()],
                })
                .collect();

            let mut per_wire = vec![Vec::new(); tt.wires.len()];
            for (pip_idx, (pip, res)) in tt.pips.iter().zip(resolved.iter()).enumerate() {
                if !pip.is_directional || pip.is_pseudo {
                    continue;
                }
                per_wire[res.src as usize].push(pip_idx as u32);
                if res.src != res.dest {
                    per_wire[res.dest as usize].push(pip_idx as u32);
                }
            }

            endpoints.push(resolved);
            on_wire.push(per_wire);
        }

        Self { endpoints, on_wire }
    }

    /// Directional non-pseudo PIPs incident on a wire template.
    pub fn pips_on_wire(&self, tile_type: u32, wire: u32) -> &[u32] {
        &self.on_wire[tile_type as usize][wire as usize]
    }

    pub fn pip_endpoints(&self, tile_type: u32, pip: u32) -> ResolvedPip {
        self.endpoints[tile_type as usize][pip as usize]
    }
}
