//! Pronunciation dictionaries: `word<TAB>ipa[,ipa...]` lines
//!
//! Every comma-separated IPA variant becomes its own pair. Lines without
//! exactly two tab-separated fields are skipped.

use crate::error::Result;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pronunciation {
    pub word: String,
    pub ipa: String,
}

/// Parse one line into zero or more pairs
pub fn parse_line(line: &str) -> Vec<Pronunciation> {
    let parts: Vec<&str> = line.trim().split('\t').collect();
    let [word, ipa_field] = parts.as_slice() else {
        return Vec::new();
    };

    let word = word.to_lowercase().trim().to_string();
    ipa_field
        .split(',')
        .map(|variant| variant.replace(['/', ' '], "").trim().to_string())
        .filter(|ipa| !ipa.is_empty())
        .map(|ipa| Pronunciation {
            word: word.clone(),
            ipa,
        })
        .collect()
}

pub fn parse_pronunciations<R: BufRead>(reader: R) -> Result<Vec<Pronunciation>> {
    let mut pairs = Vec::new();
    for line in reader.lines() {
        pairs.extend(parse_line(&line?));
    }
    Ok(pairs)
}

pub fn load_pronunciations(path: &Path) -> Result<Vec<Pronunciation>> {
    let pairs = parse_pronunciations(BufReader::new(File::open(path)?))?;
    tracing::info!(?path, pairs = pairs.len(), "loaded pronunciations");
    Ok(pairs)
}

/// Split pairs into parallel word and IPA lists
pub fn split(pairs: &[Pronunciation]) -> (Vec<String>, Vec<String>) {
    pairs
        .iter()
        .map(|p| (p.word.clone(), p.ipa.clone()))
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variants_become_pairs() {
        let pairs = parse_line("Pikachu\t/ˈpiːkətʃuː/, /ˈpɪkətʃuː/\n");
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].word, "pikachu");
        assert_eq!(pairs[0].ipa, "ˈpiːkətʃuː");
        assert_eq!(pairs[1].ipa, "ˈpɪkətʃuː");
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let text = "onlyword\nthree\tfields\there\n\ngood\t/ɡʊd/\nempty\t/ /\n";
        let pairs = parse_pronunciations(text.as_bytes()).unwrap();
        assert_eq!(
            pairs,
            vec![Pronunciation {
                word: "good".into(),
                ipa: "ɡʊd".into()
            }]
        );
    }

    #[test]
    fn test_split() {
        let pairs = parse_line("cat\tkæt,kat");
        let (words, ipas) = split(&pairs);
        assert_eq!(words, vec!["cat", "cat"]);
        assert_eq!(ipas, vec!["kæt", "kat"]);
    }
}
