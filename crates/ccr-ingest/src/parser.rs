//! CCR line parser
//!
//! Parses one line of a CCR v2 BED release into a [`CcrDocument`].
//!
//! # File Format
//! No header. Exactly 13 delimiter-separated columns per line:
//!
//! ```text
//! chrom start end ccr_pct gene ranges varflag syn_density cpg cov_score resid resid_pctile unique_key
//! 1     100   200 95.5    BRCA1 100-150,160-200 VARTRUE 0.8 0.3 1.2 0.5 90.1 42
//! ```
//!
//! `ranges` is comma separated. In the nested schema `varflag` is comma
//! separated as well.

use thiserror::Error;

use crate::config::{CcrConfig, SchemaVariant};
use crate::models::{document_id, CcrDocument, ScoreEntry, VarFlag, VariantRecord};
use crate::sweep::sweep;

/// Columns every line must have
pub const FIELD_COUNT: usize = 13;

/// Why a single line was rejected
#[derive(Debug, Error)]
pub enum LineError {
    #[error("failed to unpack line {line}: expected {expected} fields, found {found}: {raw:?}")]
    FieldCount {
        line: u64,
        expected: usize,
        found: usize,
        raw: String,
    },

    #[error("failed to cast type for line {line}: {field} = {value:?}: {source}")]
    InvalidInteger {
        line: u64,
        field: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("failed to cast type for line {line}: {field} = {value:?}: {source}")]
    InvalidFloat {
        line: u64,
        field: &'static str,
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    #[error("failed to serialize record for line {line}: {source}")]
    Serialize {
        line: u64,
        #[source]
        source: serde_json::Error,
    },
}

impl LineError {
    /// 1-based number of the rejected line
    pub fn line(&self) -> u64 {
        match self {
            LineError::FieldCount { line, .. }
            | LineError::InvalidInteger { line, .. }
            | LineError::InvalidFloat { line, .. }
            | LineError::Serialize { line, .. } => *line,
        }
    }
}

/// The 13 raw columns of one line, borrowed from the line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CcrFields<'a> {
    pub chrom: &'a str,
    pub start: &'a str,
    pub end: &'a str,
    pub ccr_pct: &'a str,
    pub gene: &'a str,
    pub ranges: &'a str,
    pub varflag: &'a str,
    pub syn_density: &'a str,
    pub cpg: &'a str,
    pub cov_score: &'a str,
    pub resid: &'a str,
    pub resid_pctile: &'a str,
    pub unique_key: &'a str,
}

impl<'a> CcrFields<'a> {
    /// Build from exactly [`FIELD_COUNT`] columns; `None` for any other count.
    pub fn from_columns(columns: &[&'a str]) -> Option<Self> {
        let [
            chrom,
            start,
            end,
            ccr_pct,
            gene,
            ranges,
            varflag,
            syn_density,
            cpg,
            cov_score,
            resid,
            resid_pctile,
            unique_key,
        ] = *columns
        else {
            return None;
        };

        Some(Self {
            chrom,
            start,
            end,
            ccr_pct,
            gene,
            ranges,
            varflag,
            syn_density,
            cpg,
            cov_score,
            resid,
            resid_pctile,
            unique_key,
        })
    }
}

/// Parser for CCR lines of one configured release
#[derive(Debug, Clone)]
pub struct CcrParser {
    delimiter: char,
    schema: SchemaVariant,
    source_key: String,
}

impl CcrParser {
    pub fn new(delimiter: char, schema: SchemaVariant, source_key: impl Into<String>) -> Self {
        Self {
            delimiter,
            schema,
            source_key: source_key.into(),
        }
    }

    pub fn from_config(config: &CcrConfig) -> Self {
        Self::new(config.delimiter, config.schema, config.source_key.clone())
    }

    /// Strip the trailing newline and whitespace, then split into the 13
    /// columns.
    pub fn split_line<'a>(&self, line: &'a str, line_num: u64) -> Result<CcrFields<'a>, LineError> {
        let columns: Vec<&str> = line.trim_end().split(self.delimiter).collect();

        CcrFields::from_columns(&columns).ok_or_else(|| LineError::FieldCount {
            line: line_num,
            expected: FIELD_COUNT,
            found: columns.len(),
            raw: line.to_string(),
        })
    }

    /// Coerce the columns into a record of the configured schema.
    ///
    /// Nothing is built unless every numeric column parses.
    pub fn build_record(
        &self,
        fields: &CcrFields<'_>,
        line_num: u64,
    ) -> Result<VariantRecord, LineError> {
        let start = parse_int("start", fields.start, line_num)?;
        let end = parse_int("end", fields.end, line_num)?;

        let varflag = match self.schema {
            SchemaVariant::Flat => VarFlag::single(fields.varflag),
            SchemaVariant::Nested => VarFlag::multi(fields.varflag),
        };

        let score = ScoreEntry {
            ccr_pct: parse_float("ccr_pct", fields.ccr_pct, line_num)?,
            gene: fields.gene.to_string(),
            ranges: fields.ranges.split(',').map(str::to_string).collect(),
            varflag,
            syn_density: parse_float("syn_density", fields.syn_density, line_num)?,
            cpg: parse_float("cpg", fields.cpg, line_num)?,
            cov_score: parse_float("cov_score", fields.cov_score, line_num)?,
            resid: parse_float("resid", fields.resid, line_num)?,
            resid_pctile: parse_float("resid_pctile", fields.resid_pctile, line_num)?,
            unique_key: parse_int("unique_key", fields.unique_key, line_num)?,
        };

        let chrom = fields.chrom.to_string();
        Ok(match self.schema {
            SchemaVariant::Flat => VariantRecord::flat(chrom, start, end, score),
            SchemaVariant::Nested => VariantRecord::nested(chrom, start, end, score),
        })
    }

    /// Full per-line pipeline: split, coerce, sweep, wrap.
    pub fn parse_line(&self, line: &str, line_num: u64) -> Result<CcrDocument, LineError> {
        let fields = self.split_line(line, line_num)?;
        let record = self.build_record(&fields, line_num)?;

        let value = serde_json::to_value(&record).map_err(|source| LineError::Serialize {
            line: line_num,
            source,
        })?;

        Ok(CcrDocument {
            id: document_id(fields.chrom, fields.start, fields.end),
            source_key: self.source_key.clone(),
            record: sweep(value),
        })
    }
}

fn parse_int(field: &'static str, value: &str, line: u64) -> Result<i64, LineError> {
    value
        .trim()
        .parse()
        .map_err(|source| LineError::InvalidInteger {
            line,
            field,
            value: value.to_string(),
            source,
        })
}

fn parse_float(field: &'static str, value: &str, line: u64) -> Result<f64, LineError> {
    value
        .trim()
        .parse()
        .map_err(|source| LineError::InvalidFloat {
            line,
            field,
            value: value.to_string(),
            source,
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    const EXAMPLE: &str =
        "1\t100\t200\t95.5\tBRCA1\t100-150,160-200\tVARTRUE\t0.8\t0.3\t1.2\t0.5\t90.1\t42\n";

    fn flat() -> CcrParser {
        CcrParser::new('\t', SchemaVariant::Flat, "ccr")
    }

    fn nested() -> CcrParser {
        CcrParser::new('\t', SchemaVariant::Nested, "ccr")
    }

    #[test]
    fn test_parse_example_line_flat() {
        let doc = flat().parse_line(EXAMPLE, 1).unwrap();

        assert_eq!(doc.id, "chr1:g.100_200");
        assert_eq!(doc.source_key, "ccr");
        assert_eq!(
            doc.record,
            json!({
                "chrom": "1",
                "start": 100,
                "end": 200,
                "ccr_pct": 95.5,
                "gene": "BRCA1",
                "ranges": ["100-150", "160-200"],
                "varflag": true,
                "syn_density": 0.8,
                "cpg": 0.3,
                "cov_score": 1.2,
                "resid": 0.5,
                "resid_pctile": 90.1,
                "unique_key": 42
            })
        );
    }

    #[test]
    fn test_parse_example_line_nested() {
        let line = EXAMPLE.replace("VARTRUE", "VARTRUE,VARFALSE");
        let doc = nested().parse_line(&line, 1).unwrap();

        assert_eq!(doc.record["chrom"], "1");
        assert_eq!(doc.record["start"], 100);
        assert_eq!(doc.record["scores"].as_array().unwrap().len(), 1);
        assert_eq!(doc.record["scores"][0]["varflag"], json!([true, false]));
        assert_eq!(doc.record["scores"][0]["unique_key"], 42);
        assert!(doc.record.get("gene").is_none());
    }

    #[test]
    fn test_id_uses_raw_coordinate_text() {
        let line = EXAMPLE.replacen("\t100\t", "\t0100\t", 1);
        let doc = flat().parse_line(&line, 1).unwrap();

        assert_eq!(doc.id, "chr1:g.0100_200");
        assert_eq!(doc.record["start"], 100);
    }

    #[test]
    fn test_wrong_field_count() {
        let line = "1\t100\t200\t95.5\tBRCA1\t100-150\tVARTRUE\t0.8\t0.3\t1.2";
        let err = flat().parse_line(line, 7).unwrap_err();

        match &err {
            LineError::FieldCount {
                line: 7,
                expected: 13,
                found: 10,
                raw,
            } => assert_eq!(raw, line),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("line 7"));
    }

    #[test]
    fn test_too_many_fields() {
        let line = format!("{}\textra", EXAMPLE.trim_end());
        assert!(matches!(
            flat().parse_line(&line, 1),
            Err(LineError::FieldCount { found: 14, .. })
        ));
    }

    #[test]
    fn test_trailing_whitespace_is_stripped() {
        let line = EXAMPLE.replace('\n', "  \r\n");
        assert!(flat().parse_line(&line, 1).is_ok());
    }

    #[test]
    fn test_non_numeric_integer_field() {
        let line = EXAMPLE.replace("\t42\n", "\tkey42\n");
        let err = flat().parse_line(&line, 3).unwrap_err();

        assert!(matches!(
            err,
            LineError::InvalidInteger { line: 3, field: "unique_key", .. }
        ));
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_non_numeric_float_field() {
        let line = EXAMPLE.replace("\t95.5\t", "\thigh\t");
        let err = nested().parse_line(&line, 9).unwrap_err();

        assert!(matches!(err, LineError::InvalidFloat { line: 9, field: "ccr_pct", .. }));
        assert_eq!(err.line(), 9);
    }

    #[test]
    fn test_decimal_start_is_rejected() {
        let line = EXAMPLE.replacen("\t100\t", "\t100.0\t", 1);
        assert!(matches!(
            flat().parse_line(&line, 1),
            Err(LineError::InvalidInteger { field: "start", .. })
        ));
    }

    #[test]
    fn test_varflag_sentinel_equality() {
        for (token, expected) in [("VARTRUE", true), ("VARTRUE2", false), ("vartrue", false)] {
            let line = EXAMPLE.replace("VARTRUE", token);
            let doc = flat().parse_line(&line, 1).unwrap();
            assert_eq!(doc.record["varflag"], expected, "token {token}");
        }
    }

    #[test]
    fn test_gene_is_not_split() {
        let line = EXAMPLE.replace("BRCA1", "BRCA1,NBR2");
        let doc = flat().parse_line(&line, 1).unwrap();
        assert_eq!(doc.record["gene"], "BRCA1,NBR2");
    }

    #[test]
    fn test_empty_values_are_swept() {
        let line = EXAMPLE.replace("BRCA1", "").replace("100-150,160-200", "");
        let doc = flat().parse_line(&line, 1).unwrap();

        assert!(doc.record.get("gene").is_none());
        assert!(doc.record.get("ranges").is_none());
        assert_eq!(doc.record["varflag"], true);
    }

    #[test]
    fn test_zero_scores_are_kept() {
        let line = "2\t5\t6\t0\tTP53\t5-6\tVARFALSE\t0\t0\t0\t0\t0\t0";
        let doc = flat().parse_line(line, 1).unwrap();

        assert_eq!(doc.record["ccr_pct"], 0.0);
        assert_eq!(doc.record["unique_key"], 0);
        assert_eq!(doc.record["varflag"], false);
    }

    #[test]
    fn test_custom_delimiter() {
        let parser = CcrParser::new('|', SchemaVariant::Flat, "ccr");
        let line = EXAMPLE.trim_end().replace('\t', "|");
        let doc = parser.parse_line(&line, 1).unwrap();
        assert_eq!(doc.id, "chr1:g.100_200");
    }

    #[test]
    fn test_from_columns_requires_thirteen() {
        let columns = vec!["x"; 12];
        assert!(CcrFields::from_columns(&columns).is_none());
        let columns = vec!["x"; 13];
        assert!(CcrFields::from_columns(&columns).is_some());
    }
}
