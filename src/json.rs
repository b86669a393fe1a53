use serde_json::{Map, Value, to_string_pretty};

use crate::{analysers::Analyser, error::Result, output};

pub fn collect_json(analysers: &[Box<dyn Analyser>]) -> Map<String, Value> {
    let mut json_output = Map::new();

    for analyser in analysers.iter() {
        if let Some((key, value)) = analyser.json() {
            json_output.insert(key, value);
        }
    }

    json_output
}

pub fn write_json(path: &str, analysers: &[Box<dyn Analyser>]) -> Result<()> {
    let json_output = collect_json(analysers);
    if json_output.is_empty() {
        return Ok(());
    }

    std::fs::write(path, to_string_pretty(&Value::Object(json_output))?)?;

    output!("Wrote JSON output to {}", path);
    Ok(())
}
