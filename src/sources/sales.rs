//! Historical domain sales corpus, loaded from CSV exports.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Header prepended to the combined records.
pub const CORPUS_HEADER: &str = "Domain,Price,Date";

/// A sample of historical sales as one CSV document.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesSample {
    pub csv: String,
    pub records: usize,
    pub files: usize,
}

impl SalesSample {
    /// Sample with no records, used when the corpus is unavailable.
    pub fn placeholder() -> Self {
        Self {
            csv: format!("{}\n", CORPUS_HEADER),
            records: 0,
            files: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }
}

/// Read every `*.csv` in `dir`, drop header lines, keep the first `sample_size` records.
///
/// Files are read in name order so the sample is stable between runs.
pub fn load_sample(dir: &Path, sample_size: usize) -> io::Result<SalesSample> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no CSV files in {}", dir.display()),
        ));
    }

    let mut lines: Vec<String> = Vec::new();
    for path in &files {
        let content = fs::read_to_string(path)?;
        debug!("Read {}", path.display());
        lines.extend(
            content
                .lines()
                .skip(1)
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from),
        );
        if lines.len() >= sample_size {
            break;
        }
    }
    lines.truncate(sample_size);

    let mut csv = String::from(CORPUS_HEADER);
    csv.push('\n');
    for line in &lines {
        csv.push_str(line);
        csv.push('\n');
    }

    Ok(SalesSample {
        csv,
        records: lines.len(),
        files: files.len(),
    })
}

/// Corpus loaded on first successful use and cached for the life of the process.
pub struct SalesCorpus {
    dir: Option<PathBuf>,
    sample_size: usize,
    cell: OnceCell<SalesSample>,
    placeholder: SalesSample,
}

impl SalesCorpus {
    pub fn new(dir: Option<PathBuf>, sample_size: usize) -> Self {
        Self {
            dir,
            sample_size,
            cell: OnceCell::new(),
            placeholder: SalesSample::placeholder(),
        }
    }

    /// The cached sample. A failed load yields the placeholder and is
    /// retried on the next call.
    pub async fn sample(&self) -> &SalesSample {
        let Some(dir) = self.dir.clone() else {
            return &self.placeholder;
        };
        let sample_size = self.sample_size;

        let loaded = self
            .cell
            .get_or_try_init(|| async move {
                match tokio::task::spawn_blocking(move || load_sample(&dir, sample_size)).await {
                    Ok(Ok(sample)) => {
                        info!(
                            "Loaded {} sales records from {} files",
                            sample.records, sample.files
                        );
                        Ok(sample)
                    }
                    Ok(Err(e)) => Err(format!("Failed to load sales corpus: {}", e)),
                    Err(e) => Err(format!("Sales corpus loader did not finish: {}", e)),
                }
            })
            .await;

        match loaded {
            Ok(sample) => sample,
            Err(message) => {
                warn!("{}", message);
                &self.placeholder
            }
        }
    }
}
