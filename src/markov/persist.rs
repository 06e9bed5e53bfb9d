//! JSON model files
//!
//! Layout: `{"order": k, "default_weights": {name: w}, "models": {name:
//! {context_key: {symbol: count}}}}` where a context key is a JSON array of
//! symbol strings.

use crate::error::{Error, Result};
use crate::markov::fusion::{FusionWeights, MarkovFusion};
use crate::markov::symbol::{Context, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

type CountMap = BTreeMap<String, u64>;

#[derive(Serialize, Deserialize)]
struct MarkovRecord {
    order: usize,
    #[serde(default)]
    default_weights: FusionWeights,
    models: BTreeMap<String, BTreeMap<String, CountMap>>,
}

impl MarkovRecord {
    fn from_model(model: &MarkovFusion) -> Result<Self> {
        let mut models = BTreeMap::new();
        for (name, table) in model.corpora() {
            let mut contexts = BTreeMap::new();
            for (context, successors) in table.contexts() {
                let counts: CountMap = successors
                    .iter()
                    .map(|(symbol, count)| (symbol.to_string(), count))
                    .collect();
                contexts.insert(context.to_key()?, counts);
            }
            models.insert(name.to_string(), contexts);
        }

        Ok(MarkovRecord {
            order: model.order(),
            default_weights: model.default_weights().clone(),
            models,
        })
    }

    fn into_model(self) -> Result<MarkovFusion> {
        let mut model = MarkovFusion::with_default_weights(self.order, self.default_weights);
        for (name, contexts) in self.models {
            let table = model.table_mut(&name);
            for (key, counts) in contexts {
                let context = Context::from_key(&key)?;
                if context.len() != self.order {
                    return Err(Error::Format(format!(
                        "context {} in {:?} has {} symbols, order is {}",
                        key,
                        name,
                        context.len(),
                        self.order
                    )));
                }
                for (symbol, count) in counts {
                    let symbol: Symbol = symbol.parse()?;
                    if symbol == Symbol::Start {
                        return Err(Error::Format(format!(
                            "context {} in {:?} lists {} as a successor",
                            key, name, symbol
                        )));
                    }
                    table.add(context.as_slice(), symbol, count);
                }
            }
        }
        Ok(model)
    }
}

impl MarkovFusion {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&MarkovRecord::from_model(self)?)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let record: MarkovRecord = serde_json::from_str(json)?;
        record.into_model()
    }

    /// Write the model atomically: a temp file in the target directory is
    /// renamed over `path` once fully written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent_dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent_dir)?;

        let record = MarkovRecord::from_model(self)?;
        let mut temp_file = NamedTempFile::new_in(parent_dir)?;
        {
            let mut writer = BufWriter::new(temp_file.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, &record)?;
            writer.flush()?;
        }
        temp_file.persist(path).map_err(|e| e.error)?;

        tracing::info!(?path, corpora = record.models.len(), "exported markov model");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let record: MarkovRecord = serde_json::from_reader(reader)?;
        let model = record.into_model()?;
        tracing::debug!(?path, order = model.order(), "loaded markov model");
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_round_trip_is_identical() {
        let mut model =
            MarkovFusion::with_default_weights(2, FusionWeights::new().with("pokemon", 0.85));
        model.train("pokemon", ["pikachu", "eevee"]);
        model.train("english", ["peach", "eve"]);

        let restored = MarkovFusion::from_json(&model.to_json().unwrap()).unwrap();
        assert_eq!(restored, model);
    }

    #[test]
    fn test_reads_spaced_keys_and_missing_weights() {
        let json = r#"{
            "order": 1,
            "models": {"a": {"[\"<START>\"]": {"x": 2, "<END>": 1}}}
        }"#;
        let model = MarkovFusion::from_json(json).unwrap();
        assert!(model.default_weights().is_empty());
        let start = model.table("a").unwrap().successors(&[Symbol::Start]).unwrap();
        assert_eq!(start.count(Symbol::Char('x')), 2);
        assert_eq!(start.total(), 3);
    }

    #[test]
    fn test_rejects_wrong_context_length() {
        let json = r#"{"order": 2, "models": {"a": {"[\"<START>\"]": {"x": 1}}}}"#;
        assert!(matches!(MarkovFusion::from_json(json), Err(Error::Format(_))));
    }

    #[test]
    fn test_rejects_start_successor() {
        let json = r#"{"order": 1, "models": {"a": {"[\"<START>\"]": {"<START>": 1}}}}"#;
        assert!(matches!(MarkovFusion::from_json(json), Err(Error::Format(_))));
    }

    #[test]
    fn test_restores_exact_default_weights() {
        let weights = FusionWeights::new()
            .with("a", 2.9590210488846918)
            .with("b", 1.9794434271445498);
        let mut model = MarkovFusion::with_default_weights(1, weights);
        model.train("a", ["ab"]);

        let restored = MarkovFusion::from_json(&model.to_json().unwrap()).unwrap();
        assert_eq!(restored.default_weights(), model.default_weights());
    }

    #[test]
    fn test_save_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("markov_phonemes.json");
        let mut model = MarkovFusion::new(2);
        model.train("english", ["kæt", "dɔɡ"]);

        model.save(&path).unwrap();
        assert_eq!(MarkovFusion::load(&path).unwrap(), model);
    }
}
