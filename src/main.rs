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

use clap::Parser;
use std::path::Path;

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate serde;

#[macro_use]
pub mod log;
pub mod common;
pub mod arch;
pub mod channels;
pub mod exporter;

use crate::arch::{ArchDb, OpenOpts, PipIndex};
use crate::channels::constants::ConstantsCfg;
use crate::channels::serialize::*;
use crate::channels::*;
use crate::exporter::*;
#[allow(unused)]
use crate::log::*;

#[derive(Parser, Debug)]
#[clap(
    author = "Antmicro",
    version = "0.1.0",
    about = "FCP - Fabric Channel Preprocessor",
    long_about = None
)]
struct Args {
    #[clap(help = "Fabric description file (gzipped JSON)")]
    fabric: String,
    #[clap(help = "Routing graph output file")]
    graph: String,
    #[clap(long, help = "Use raw (uncompressed) fabric description file")]
    raw: bool,
    #[clap(
        long,
        default_value = "1",
        help = "Number of threads to be used during node classification"
    )]
    threads: usize,
    #[clap(long, help = "Pretty-print the routing graph output")]
    pretty: bool,
    #[clap(long, help = "Constant-network configuration file (YAML)")]
    constants: Option<String>,
    #[clap(
        long,
        help = "Pipeline stages to have their intermediate state exported to JSON format"
    )]
    dump: Option<Vec<String>>,
    #[clap(long, default_value = "", help = "Directory for saving stage dumps")]
    dump_prefix: String,
}

fn main() {
    let args = Args::parse();

    assert!(args.threads != 0);

    let arch = ArchDb::open(
        Path::new(&args.fabric),
        OpenOpts { raw: args.raw }
    ).expect("Couldn't open fabric description");

    let pips = PipIndex::build(&arch);

    let consts = match &args.constants {
        Some(path) => ConstantsCfg::load(path)
            .expect("Couldn't read constant-network configuration"),
        None => ConstantsCfg::default(),
    };

    let mut dump_exporter =
        MultiFileExporter::new(&args.dump, args.dump_prefix.clone(), ".json".into());

    let mut db = channels::catalog::build_catalog(&arch)
        .expect("Couldn't instantiate the wire catalog");
    dump_exporter.ignore_or_export("catalog", || wire_rows(&db, &arch)).unwrap();

    channels::nodes::form_nodes(&mut db, &arch)
        .expect("Couldn't merge wires into nodes");
    channels::nodes::annotate_nodes(&mut db, &arch, &pips)
        .expect("Couldn't annotate nodes");
    dump_exporter.ignore_or_export("nodes", || node_rows(&db)).unwrap();

    channels::classify::classify_nodes(&mut db, &pips, args.threads)
        .expect("Couldn't classify nodes");
    dump_exporter.ignore_or_export("classified", || node_rows(&db)).unwrap();

    channels::tracks::form_tracks(&mut db)
        .expect("Couldn't decompose channel nodes into tracks");
    dump_exporter.ignore_or_export("tracks", || segment_rows(&db)).unwrap();

    channels::constants::build_constant_network(&mut db, &arch, &consts)
        .expect("Couldn't build the constant network");

    println!(concat!(
        "Fabric {}:\n",
        "    No. of CHANNEL nodes:          {}\n",
        "    No. of EDGE_WITH_MUX nodes:    {}\n",
        "    No. of EDGES_TO_CHANNEL nodes: {}\n",
        "    No. of NULL nodes:             {}\n",
        "    No. of tracks:                 {}\n",
        "    No. of track segments:         {}\n",
        "    No. of track edges:            {}"
        ),
        arch.name,
        db.node_count_of_class(NodeClass::Channel),
        db.node_count_of_class(NodeClass::EdgeWithMux),
        db.node_count_of_class(NodeClass::EdgesToChannel),
        db.node_count_of_class(NodeClass::Null),
        db.tracks.len(),
        db.segments.len(),
        db.track_edges.len()
    );

    <MultiFileExporter as Exporter<Vec<NodeRow>>>::flush(&mut dump_exporter).unwrap();

    write_json(&args.graph, &graph_file(&db, &arch), args.pretty)
        .expect("Couldn't write the routing graph");
}
