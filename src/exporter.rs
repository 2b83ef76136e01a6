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
use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

#[derive(Default)]
struct ExportChecker {
    export: HashSet<String>,
    export_all: bool,
}

impl ExportChecker {
    fn new(arg_list: &Option<Vec<String>>) -> Self {
        let mut export_all = false;
        let mut export = HashSet::new();
        if let Some(args) = arg_list {
            for arg in args {
                if arg == ":all" {
                    export_all = true;
                } else {
                    export.insert(arg.clone());
                }
            }
        }
        Self { export, export_all }
    }

    fn should_export(&self, name: &str) -> bool {
        if self.export_all || self.export.contains(name) {
            return true;
        }
        false
    }
}

pub trait Exporter<D> {
    fn ignore_or_export<'s, F>(&'s mut self, name: &str, exporter: F)
        -> std::io::Result<()>
    where
        F: FnOnce() -> D + 's;

    fn flush(&mut self) -> std::io::Result<()>;
}

/// Writes selected named snapshots to `<prefix>/<name><suffix>` as JSON.
/// Which names get exported is driven by a CLI argument list; `:all` exports
/// everything.
pub struct MultiFileExporter {
    prefix: String,
    suffix: String,
    checker: ExportChecker,
}

impl MultiFileExporter {
    pub fn new(arg_list: &Option<Vec<String>>, prefix: String, suffix: String) -> Self {
        Self {
            prefix,
            suffix,
            checker: ExportChecker::new(arg_list),
        }
    }
}

impl<D> Exporter<D> for MultiFileExporter where D: Serialize {
    fn ignore_or_export<'s, F>(&'s mut self, name: &str, exporter: F)
        -> std::io::Result<()>
    where
        F: FnOnce() -> D + 's
    {
        if self.checker.should_export(name) {
            let data = exporter();
            let json = serde_json::to_string_pretty(&data).unwrap();
            let path = Path::new(&self.prefix)
                .join(Path::new(&(name.to_string() + &self.suffix)));
            let mut file = File::create(path)?;
            return file.write(json.as_bytes()).map(|_| ());
        }
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Writes the final routing graph to a single JSON file.
pub fn write_json<D, P>(path: P, data: &D, pretty: bool) -> std::io::Result<()> where
    D: Serialize,
    P: AsRef<Path>,
{
    let json = if pretty {
        serde_json::to_string_pretty(data).unwrap()
    } else {
        serde_json::to_string(data).unwrap()
    };
    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_checker_honors_the_wildcard() {
        let checker = ExportChecker::new(&Some(vec![":all".into()]));
        assert!(checker.should_export("anything"));
        assert!(checker.should_export("catalog"));
    }

    #[test]
    fn export_checker_gates_by_name() {
        let checker = ExportChecker::new(&Some(vec!["catalog".into()]));
        assert!(checker.should_export("catalog"));
        assert!(!checker.should_export("nodes"));
    }

    #[test]
    fn export_checker_defaults_to_nothing() {
        let checker = ExportChecker::new(&None);
        assert!(!checker.should_export("catalog"));
    }
}
