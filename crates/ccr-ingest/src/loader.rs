//! Streaming CCR loader
//!
//! [`CcrLoader::load_data`] checks that every configured file exists and then
//! hands out a lazy [`CcrDocuments`] iterator. Files are read one line at a
//! time, strictly one after another, in configured order. Lines that cannot
//! be parsed are logged, counted and skipped; only I/O failures end the run.
//!
//! Dropping the iterator early closes the open file.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};

use ccr_common::{CcrError, Result};
use tracing::{debug, error, info, info_span, warn, Span};

use crate::config::{CcrConfig, SourceFile};
use crate::models::{CcrDocument, FileSummary};
use crate::parser::CcrParser;
use crate::progress::{format_duration, ProgressTracker};

/// Entry point for one configured CCR release
#[derive(Debug, Clone)]
pub struct CcrLoader {
    config: CcrConfig,
    parser: CcrParser,
}

impl CcrLoader {
    pub fn new(config: CcrConfig) -> Result<Self> {
        config.validate()?;
        let parser = CcrParser::from_config(&config);
        Ok(Self { config, parser })
    }

    pub fn config(&self) -> &CcrConfig {
        &self.config
    }

    /// Release and schema in use, e.g. `v2.20180420/nested`
    pub fn version(&self) -> String {
        self.config.version()
    }

    /// Join every configured file name onto `data_dir`.
    ///
    /// Fails with [`CcrError::FileNotFound`] on the first missing file.
    pub fn resolve(&self, data_dir: impl AsRef<Path>) -> Result<Vec<(PathBuf, SourceFile)>> {
        let data_dir = data_dir.as_ref();

        self.config
            .files
            .iter()
            .map(|source| {
                let path = data_dir.join(&source.file_name);
                if path.is_file() {
                    Ok((path, source.clone()))
                } else {
                    error!("Cannot find input file: {}", path.display());
                    Err(CcrError::FileNotFound { path })
                }
            })
            .collect()
    }

    /// Stream documents from every configured file under `data_dir`.
    ///
    /// All files are checked before the first line is read.
    pub fn load_data(&self, data_dir: impl AsRef<Path>) -> Result<CcrDocuments> {
        let pending = self.resolve(data_dir)?;

        Ok(CcrDocuments {
            parser: self.parser.clone(),
            progress_interval: self.config.progress_interval,
            echo_skipped_lines: self.config.echo_skipped_lines,
            pending: pending.into(),
            current: None,
            summaries: Vec::new(),
        })
    }
}

/// Lazy, single-pass sequence of documents over all configured files
///
/// Yields `Err` once on an I/O failure and is exhausted afterwards.
pub struct CcrDocuments {
    parser: CcrParser,
    progress_interval: u64,
    echo_skipped_lines: bool,
    pending: VecDeque<(PathBuf, SourceFile)>,
    current: Option<FileScan<BufReader<File>>>,
    summaries: Vec<FileSummary>,
}

impl CcrDocuments {
    /// Summaries of the files read to the end so far
    pub fn summaries(&self) -> &[FileSummary] {
        &self.summaries
    }

    /// Lines read so far over all files, skipped lines included
    pub fn lines_read(&self) -> u64 {
        let finished: u64 = self.summaries.iter().map(|s| s.lines_read).sum();
        finished + self.current.as_ref().map_or(0, |scan| scan.lines_read())
    }

    fn open_next(&mut self) -> Option<Result<()>> {
        let (path, source) = self.pending.pop_front()?;

        match File::open(&path) {
            Ok(file) => {
                self.current = Some(FileScan::new(
                    BufReader::new(file),
                    &source,
                    self.progress_interval,
                    self.echo_skipped_lines,
                ));
                Some(Ok(()))
            },
            Err(e) => {
                error!("Failed to open {}: {}", path.display(), e);
                self.pending.clear();
                Some(Err(e.into()))
            },
        }
    }
}

impl Iterator for CcrDocuments {
    type Item = Result<CcrDocument>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current.is_none() {
                if let Err(e) = self.open_next()? {
                    return Some(Err(e));
                }
            }
            let Some(scan) = self.current.as_mut() else {
                continue;
            };

            match scan.next_document(&self.parser) {
                Some(Ok(doc)) => return Some(Ok(doc)),
                Some(Err(e)) => {
                    self.current = None;
                    self.pending.clear();
                    return Some(Err(e.into()));
                },
                None => {
                    if let Some(scan) = self.current.take() {
                        self.summaries.push(scan.finish());
                    }
                },
            }
        }
    }
}

impl FusedIterator for CcrDocuments {}

impl Drop for CcrDocuments {
    fn drop(&mut self) {
        if let Some(scan) = &self.current {
            debug!(
                "Stopped reading {} after {} lines",
                scan.file_name, scan.lines_read
            );
        }
    }
}

/// Line-by-line pass over one input
///
/// Generic over the reader so any buffered source can be scanned.
pub struct FileScan<R> {
    file_name: String,
    lines: Lines<R>,
    tracker: ProgressTracker,
    span: Span,
    echo_skipped_lines: bool,
    lines_read: u64,
    documents: u64,
    skipped: u64,
    skipped_lines: Vec<String>,
}

impl<R: BufRead> FileScan<R> {
    pub fn new(
        reader: R,
        source: &SourceFile,
        progress_interval: u64,
        echo_skipped_lines: bool,
    ) -> Self {
        let span = info_span!("ccr_file", file = %source.file_name);
        span.in_scope(|| info!("start reading file: {}", source.file_name));

        Self {
            file_name: source.file_name.clone(),
            lines: reader.lines(),
            tracker: ProgressTracker::new(source.expected_line_count, progress_interval),
            span,
            echo_skipped_lines,
            lines_read: 0,
            documents: 0,
            skipped: 0,
            skipped_lines: Vec::new(),
        }
    }

    /// Next parsed document; `None` at end of input.
    ///
    /// Malformed lines are logged and skipped. A read error is returned as
    /// is.
    pub fn next_document(&mut self, parser: &CcrParser) -> Option<std::io::Result<CcrDocument>> {
        let _entered = self.span.enter();

        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    error!("Failed to read line {}: {}", self.lines_read + 1, e);
                    return Some(Err(e));
                },
            };

            self.lines_read += 1;
            if let Some(snapshot) = self.tracker.observe(self.lines_read) {
                info!("{}", snapshot);
            }

            match parser.parse_line(&line, self.lines_read) {
                Ok(doc) => {
                    self.documents += 1;
                    return Some(Ok(doc));
                },
                Err(e) => {
                    error!("{}", e);
                    self.skipped += 1;
                    if self.echo_skipped_lines {
                        self.skipped_lines.push(line);
                    }
                },
            }
        }
    }

    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    pub fn documents(&self) -> u64 {
        self.documents
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Log the end-of-file summary and, if enabled, every skipped line.
    pub fn finish(self) -> FileSummary {
        let _entered = self.span.enter();

        info!(
            "finished {} in {}: skipped {} of {} lines, {} documents",
            self.file_name,
            format_duration(self.tracker.elapsed()),
            self.skipped,
            self.lines_read,
            self.documents
        );

        if self.echo_skipped_lines && !self.skipped_lines.is_empty() {
            info!("{} skipped lines follow for manual review", self.skipped_lines.len());
            for line in &self.skipped_lines {
                warn!("skipped: {}", line);
            }
        }

        FileSummary {
            file_name: self.file_name.clone(),
            lines_read: self.lines_read,
            documents: self.documents,
            skipped: self.skipped,
        }
    }
}
