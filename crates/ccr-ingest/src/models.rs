//! CCR record models
//!
//! A CCR line becomes a [`VariantRecord`] holding one [`ScoreEntry`], either
//! inlined (flat schema) or wrapped in a `scores` list (nested schema). The
//! record is stored in a [`CcrDocument`] under the configured source key.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Token that marks a varflag as true. Compared by full string equality.
pub const VARFLAG_TRUE: &str = "VARTRUE";

/// Variant flag as stored in a score entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum VarFlag {
    Single(bool),
    /// One flag per comma-separated token, in source order
    Multi(Vec<bool>),
}

impl VarFlag {
    /// Whole field compared against [`VARFLAG_TRUE`]
    pub fn single(raw: &str) -> Self {
        VarFlag::Single(is_var_true(raw))
    }

    /// Field split on commas, each token compared against [`VARFLAG_TRUE`]
    pub fn multi(raw: &str) -> Self {
        VarFlag::Multi(raw.split(',').map(is_var_true).collect())
    }
}

/// `true` only for the exact token `VARTRUE`.
pub fn is_var_true(token: &str) -> bool {
    token == VARFLAG_TRUE
}

/// Constraint scores of one coding region
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreEntry {
    /// CCR percentile
    pub ccr_pct: f64,

    /// Gene symbol, kept verbatim even when comma-joined
    pub gene: String,

    /// Sub-ranges making up the region, in source order
    pub ranges: Vec<String>,

    pub varflag: VarFlag,
    pub syn_density: f64,
    pub cpg: f64,
    pub cov_score: f64,
    pub resid: f64,
    pub resid_pctile: f64,

    /// Identity of the region within its release
    pub unique_key: i64,
}

/// A coding region and its scores
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantRecord {
    pub chrom: String,
    pub start: i64,
    pub end: i64,

    /// Flat schema: score fields sit next to the coordinates
    #[serde(flatten)]
    pub score: Option<ScoreEntry>,

    /// Nested schema: exactly one entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<Vec<ScoreEntry>>,
}

impl VariantRecord {
    pub fn flat(chrom: String, start: i64, end: i64, score: ScoreEntry) -> Self {
        Self {
            chrom,
            start,
            end,
            score: Some(score),
            scores: None,
        }
    }

    pub fn nested(chrom: String, start: i64, end: i64, score: ScoreEntry) -> Self {
        Self {
            chrom,
            start,
            end,
            score: None,
            scores: Some(vec![score]),
        }
    }
}

/// Build the document id `chr<chrom>:g.<start>_<end>` from the raw field text.
pub fn document_id(chrom: &str, start: &str, end: &str) -> String {
    format!("chr{chrom}:g.{start}_{end}")
}

/// One output document, ready for bulk loading
///
/// Serializes as `{"_id": ..., "<source_key>": {...}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct CcrDocument {
    pub id: String,
    pub source_key: String,

    /// Swept record; empty values are already removed
    pub record: serde_json::Value,
}

impl Serialize for CcrDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("_id", &self.id)?;
        map.serialize_entry(&self.source_key, &self.record)?;
        map.end()
    }
}

/// Outcome of one fully read input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub file_name: String,
    pub lines_read: u64,
    pub documents: u64,
    pub skipped: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn score(varflag: VarFlag) -> ScoreEntry {
        ScoreEntry {
            ccr_pct: 95.5,
            gene: "BRCA1".to_string(),
            ranges: vec!["100-150".to_string()],
            varflag,
            syn_density: 0.8,
            cpg: 0.3,
            cov_score: 1.2,
            resid: 0.5,
            resid_pctile: 90.1,
            unique_key: 42,
        }
    }

    #[test]
    fn test_var_true_is_exact_match() {
        assert!(is_var_true("VARTRUE"));
        assert!(!is_var_true("VARTRUE2"));
        assert!(!is_var_true("vartrue"));
        assert!(!is_var_true(" VARTRUE"));
        assert!(!is_var_true("VARFALSE"));
    }

    #[test]
    fn test_varflag_multi_keeps_order() {
        assert_eq!(VarFlag::multi("VARTRUE,VARFALSE"), VarFlag::Multi(vec![true, false]));
        assert_eq!(VarFlag::multi("VARFALSE"), VarFlag::Multi(vec![false]));
        assert_eq!(VarFlag::single("VARTRUE,VARFALSE"), VarFlag::Single(false));
    }

    #[test]
    fn test_document_id() {
        assert_eq!(document_id("1", "100", "200"), "chr1:g.100_200");
        assert_eq!(document_id("X", "007", "9"), "chrX:g.007_9");
    }

    #[test]
    fn test_flat_record_inlines_scores() {
        let record = VariantRecord::flat("1".into(), 100, 200, score(VarFlag::Single(true)));
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["chrom"], "1");
        assert_eq!(value["gene"], "BRCA1");
        assert_eq!(value["varflag"], true);
        assert!(value.get("scores").is_none());
        assert!(value.get("score").is_none());
    }

    #[test]
    fn test_nested_record_wraps_scores() {
        let record =
            VariantRecord::nested("X".into(), 5, 9, score(VarFlag::Multi(vec![true, false])));
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["scores"][0]["varflag"], json!([true, false]));
        assert_eq!(value["scores"].as_array().unwrap().len(), 1);
        assert!(value.get("gene").is_none());
    }

    #[test]
    fn test_document_serializes_under_source_key() {
        let doc = CcrDocument {
            id: "chr1:g.100_200".to_string(),
            source_key: "ccr".to_string(),
            record: json!({"chrom": "1"}),
        };

        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({"_id": "chr1:g.100_200", "ccr": {"chrom": "1"}})
        );
    }

    proptest! {
        #[test]
        fn prop_document_id_keeps_raw_text(
            chrom in "[0-9XY]{1,2}",
            start in "[0-9]{1,9}",
            end in "[0-9]{1,9}",
        ) {
            let id = document_id(&chrom, &start, &end);
            let (head, coords) = id.split_once(":g.").unwrap();
            let (id_start, id_end) = coords.split_once('_').unwrap();

            prop_assert_eq!(head.strip_prefix("chr"), Some(chrom.as_str()));
            prop_assert_eq!(id_start, start.as_str());
            prop_assert_eq!(id_end, end.as_str());
        }
    }
}
