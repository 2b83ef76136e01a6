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

use serde_json::json;

use super::*;

fn base_fixture() -> serde_json::Value {
    json!({
        "name": "fixture",
        "tile_types": [{
            "name": "CLB",
            "wires": [
                {"name": "CLB_I", "site_pin": {"site": "SLICE0", "pin": "I"}},
                {"name": "CLB_O"}
            ],
            "pips": [
                {"name": "FB", "src_wire": "CLB_O", "dest_wire": "CLB_I"}
            ],
            "sites": [
                {"name": "SLICE0", "site_type": "SLICE", "x": 0, "y": 0}
            ]
        }],
        "site_types": [
            {"name": "SLICE", "pins": [{"name": "I", "direction": "Input"}]}
        ],
        "grid": [
            {"name": "CLB_X1Y1", "tile_type": "CLB", "grid_x": 1, "grid_y": 1}
        ],
        "connections": []
    })
}

fn parse(value: &serde_json::Value) -> Result<ArchDb, ArchError> {
    let text = value.to_string();
    ArchDb::from_reader(text.as_bytes())
}

#[test]
fn parses_minimal_description() {
    let arch = parse(&base_fixture()).unwrap();
    assert_eq!(arch.name, "fixture");
    assert_eq!(arch.tile_types.len(), 1);
    assert_eq!(arch.grid.len(), 1);

    let tt = &arch.tile_types[0];
    assert!(tt.wires[0].site_pin.is_some());
    assert!(tt.wires[1].site_pin.is_none());

    /* Omitted pip flags take their defaults */
    let pip = &tt.pips[0];
    assert!(pip.is_directional);
    assert!(!pip.is_pseudo);
    assert!(!pip.can_invert);

    let st = arch.site_type("SLICE").unwrap();
    assert_eq!(st.pins[0].direction, PinDirection::Input);
}

#[test]
fn rejects_duplicate_wire_names() {
    let mut fixture = base_fixture();
    fixture["tile_types"][0]["wires"][1]["name"] = json!("CLB_I");
    assert!(matches!(parse(&fixture), Err(ArchError::MalformedInput(_))));
}

#[test]
fn rejects_pip_with_unknown_wire() {
    let mut fixture = base_fixture();
    fixture["tile_types"][0]["pips"][0]["src_wire"] = json!("NO_SUCH_WIRE");
    assert!(matches!(parse(&fixture), Err(ArchError::MalformedInput(_))));
}

#[test]
fn rejects_unknown_site_type() {
    let mut fixture = base_fixture();
    fixture["tile_types"][0]["sites"][0]["site_type"] = json!("NO_SUCH_SITE_TYPE");
    assert!(matches!(parse(&fixture), Err(ArchError::MalformedInput(_))));
}

#[test]
fn rejects_binding_to_unknown_site() {
    let mut fixture = base_fixture();
    fixture["tile_types"][0]["wires"][0]["site_pin"]["site"] = json!("NO_SUCH_SITE");
    assert!(matches!(parse(&fixture), Err(ArchError::MalformedInput(_))));
}

#[test]
fn rejects_binding_to_unknown_pin() {
    let mut fixture = base_fixture();
    fixture["tile_types"][0]["wires"][0]["site_pin"]["pin"] = json!("NO_SUCH_PIN");
    assert!(matches!(parse(&fixture), Err(ArchError::MalformedInput(_))));
}

#[test]
fn rejects_grid_tile_with_unknown_tile_type() {
    let mut fixture = base_fixture();
    fixture["grid"][0]["tile_type"] = json!("NO_SUCH_TILE_TYPE");
    assert!(matches!(parse(&fixture), Err(ArchError::MalformedInput(_))));
}

#[test]
fn opens_gzipped_file() {
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write;

    let path = std::env::temp_dir().join("fcp_arch_fixture.json.gz");
    let file = std::fs::File::create(&path).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(base_fixture().to_string().as_bytes()).unwrap();
    encoder.finish().unwrap();

    let arch = ArchDb::open(&path, OpenOpts::default()).unwrap();
    assert_eq!(arch.name, "fixture");
}

#[test]
fn opens_raw_file() {
    use std::io::Write;

    let path = std::env::temp_dir().join("fcp_arch_fixture.json");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(base_fixture().to_string().as_bytes()).unwrap();

    let arch = ArchDb::open(&path, OpenOpts { raw: true }).unwrap();
    assert_eq!(arch.name, "fixture");
}

#[test]
fn missing_file_is_reported() {
    let result = ArchDb::open("/no/such/fabric.json.gz", OpenOpts::default());
    assert!(matches!(result, Err(ArchError::CantOpenFile(_))));
}

#[test]
fn pip_index_registers_both_endpoints() {
    let arch = parse(&base_fixture()).unwrap();
    let pips = PipIndex::build(&arch);

    /* CLB_I is wire 0 (dest), CLB_O is wire 1 (src) */
    assert_eq!(pips.pips_on_wire(0, 0), &[0]);
    assert_eq!(pips.pips_on_wire(0, 1), &[0]);

    let endpoints = pips.pip_endpoints(0, 0);
    assert_eq!((endpoints.src, endpoints.dest), (1, 0));
}

#[test]
fn pip_index_skips_pseudo_and_nondirectional_pips() {
    let mut fixture = base_fixture();
    fixture["tile_types"][0]["pips"] = json!([
        {"name": "FB", "src_wire": "CLB_O", "dest_wire": "CLB_I"},
        {"name": "PS", "src_wire": "CLB_O", "dest_wire": "CLB_I", "is_pseudo": true},
        {"name": "BI", "src_wire": "CLB_O", "dest_wire": "CLB_I", "is_directional": false}
    ]);
    let arch = parse(&fixture).unwrap();
    let pips = PipIndex::build(&arch);

    assert_eq!(pips.pips_on_wire(0, 0), &[0]);
    assert_eq!(pips.pips_on_wire(0, 1), &[0]);
}

#[test]
fn pip_index_counts_a_self_loop_once() {
    let mut fixture = base_fixture();
    fixture["tile_types"][0]["pips"] = json!([
        {"name": "LOOP", "src_wire": "CLB_O", "dest_wire": "CLB_O"}
    ]);
    let arch = parse(&fixture).unwrap();
    let pips = PipIndex::build(&arch);

    assert_eq!(pips.pips_on_wire(0, 1), &[0]);
    assert!(pips.pips_on_wire(0, 0).is_empty());
}
