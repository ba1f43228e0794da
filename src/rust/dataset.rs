//! Conversion of the CSV corpus into a labeled directory tree, and loading of
//! such trees back into memory.
//!
//! The on-disk layout is `<root>/<category>/<unique>.txt`, one file per
//! example holding the raw keyword string.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::PipelineConfig;

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Malformed CSV row at line {line}: expected 2 columns, found {columns}")]
    MalformedRow { line: u64, columns: usize },
    #[error("Dataset directory not found: {0:?}")]
    MissingDirectory(PathBuf),
    #[error("No text files found in {0:?}")]
    EmptyDataset(PathBuf),
    #[error("Label '{label}' in {root:?} is not one of the training classes")]
    UnknownLabel { label: String, root: PathBuf },
}

/// Outcome of rebuilding one dataset tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildSummary {
    pub rows: usize,
    pub per_category: BTreeMap<String, usize>,
}

/// Materializes a `category;keywords` CSV file as a labeled directory tree.
#[derive(Debug, Clone)]
pub struct DatasetBuilder {
    known_categories: Vec<String>,
}

impl DatasetBuilder {
    pub fn new(known_categories: &[String]) -> Self {
        Self {
            known_categories: known_categories.to_vec(),
        }
    }

    /// Clears `dst_root` and writes one file per CSV row under
    /// `dst_root/<category>/`.
    ///
    /// Labels outside the known categories are written like any other label;
    /// they only produce a warning. A row with fewer than two columns aborts
    /// the build, leaving the rows written so far on disk. An empty line
    /// counts as a row with no columns.
    pub fn build<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        csv_path: P,
        dst_root: Q,
    ) -> Result<BuildSummary, DatasetError> {
        let csv_path = csv_path.as_ref();
        let dst_root = dst_root.as_ref();
        log::info!("Building dataset tree {:?} from {:?}", dst_root, csv_path);

        match fs::remove_dir_all(dst_root) {
            Ok(()) => log::debug!("Removed previous tree at {:?}", dst_root),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let contents = fs::read_to_string(csv_path)?;
        // The csv reader skips empty lines, so they are located up front.
        let mut blank_lines = contents
            .lines()
            .enumerate()
            .filter(|(_, line)| line.is_empty())
            .map(|(i, _)| i as u64 + 1)
            .peekable();

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .flexible(true)
            .from_reader(contents.as_bytes());

        let mut summary = BuildSummary::default();
        let mut warned = BTreeSet::new();
        for record in reader.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            if let Some(&blank) = blank_lines.peek() {
                if blank < line {
                    return Err(DatasetError::MalformedRow { line: blank, columns: 0 });
                }
            }
            if record.len() < 2 {
                return Err(DatasetError::MalformedRow {
                    line,
                    columns: record.len(),
                });
            }
            let (category, keywords) = (&record[0], &record[1]);

            if !self.known_categories.iter().any(|c| c == category) && warned.insert(category.to_string()) {
                log::warn!("Category '{}' is not a known category, creating it anyway", category);
            }

            let category_path = dst_root.join(category);
            fs::create_dir_all(&category_path)?;
            write_example(&category_path, keywords)?;

            summary.rows += 1;
            *summary.per_category.entry(category.to_string()).or_insert(0) += 1;
        }

        if let Some(blank) = blank_lines.next() {
            return Err(DatasetError::MalformedRow { line: blank, columns: 0 });
        }

        log::info!(
            "Wrote {} examples across {} categories to {:?}",
            summary.rows,
            summary.per_category.len(),
            dst_root
        );
        Ok(summary)
    }
}

fn write_example(category_path: &Path, keywords: &str) -> io::Result<PathBuf> {
    let mut file = tempfile::Builder::new()
        .prefix("")
        .suffix(".txt")
        .tempfile_in(category_path)?;
    file.write_all(keywords.as_bytes())?;
    let (_, path) = file.keep()?;
    Ok(path)
}

/// Rebuilds both the training and the test trees from their CSV files.
pub fn build_data_trees(config: &PipelineConfig) -> Result<(BuildSummary, BuildSummary), DatasetError> {
    let builder = DatasetBuilder::new(&config.categories);
    let train = builder.build(&config.train_csv, &config.train_dir)?;
    let test = builder.build(&config.test_csv, &config.test_dir)?;
    Ok((train, test))
}

/// In-memory `(text, label)` pairs read from a dataset tree.
///
/// Class names are the subdirectory names in sorted order; each label is an
/// index into them.
#[derive(Debug, Clone)]
pub struct LabeledDataset {
    class_names: Vec<String>,
    texts: Vec<String>,
    labels: Vec<usize>,
}

impl LabeledDataset {
    /// Loads a tree, inferring the class names from its subdirectories.
    pub fn from_directory<P: AsRef<Path>>(root: P, seed: u64) -> Result<Self, DatasetError> {
        let root = root.as_ref();
        let class_names = list_class_dirs(root)?;
        Self::load(root, class_names, seed)
    }

    /// Loads a tree whose classes are `categories` in their given order,
    /// whether or not a directory exists for each. Directories that are not
    /// one of the categories are appended after them in sorted order.
    pub fn from_directory_with_categories<P: AsRef<Path>>(
        root: P,
        categories: &[String],
        seed: u64,
    ) -> Result<Self, DatasetError> {
        let root = root.as_ref();
        let mut class_names = categories.to_vec();
        for name in list_class_dirs(root)? {
            if !class_names.contains(&name) {
                log::warn!(
                    "Directory '{}' in {:?} is not a known category, using it as class {}",
                    name,
                    root,
                    class_names.len()
                );
                class_names.push(name);
            }
        }
        Self::load(root, class_names, seed)
    }

    /// Loads a tree whose labels are encoded against `class_names`, as is
    /// done for the test tree with the training classes.
    pub fn from_directory_with_classes<P: AsRef<Path>>(
        root: P,
        class_names: &[String],
        seed: u64,
    ) -> Result<Self, DatasetError> {
        let root = root.as_ref();
        for label in list_class_dirs(root)? {
            if !class_names.contains(&label) {
                return Err(DatasetError::UnknownLabel {
                    label,
                    root: root.to_path_buf(),
                });
            }
        }
        Self::load(root, class_names.to_vec(), seed)
    }

    /// Builds a dataset from already loaded pairs.
    pub fn from_examples(class_names: Vec<String>, examples: Vec<(String, usize)>) -> Self {
        let (texts, labels) = examples.into_iter().unzip();
        Self {
            class_names,
            texts,
            labels,
        }
    }

    fn load(root: &Path, class_names: Vec<String>, seed: u64) -> Result<Self, DatasetError> {
        let mut examples = Vec::new();
        for (label, class_name) in class_names.iter().enumerate() {
            let class_dir = root.join(class_name);
            if !class_dir.is_dir() {
                continue;
            }
            let mut files: Vec<PathBuf> = fs::read_dir(&class_dir)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file() && path.extension().map_or(false, |ext| ext == "txt"))
                .collect();
            files.sort();
            for file in files {
                examples.push((fs::read_to_string(&file)?, label));
            }
        }

        if examples.is_empty() {
            return Err(DatasetError::EmptyDataset(root.to_path_buf()));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        examples.shuffle(&mut rng);

        log::info!(
            "Found {} files belonging to {} classes in {:?}",
            examples.len(),
            class_names.len(),
            root
        );
        Ok(Self::from_examples(class_names, examples))
    }

    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// One-hot label matrix of shape `[len, class_names.len()]`.
    pub fn one_hot_labels(&self) -> Array2<f32> {
        let mut one_hot = Array2::zeros((self.labels.len(), self.class_names.len()));
        for (row, &label) in self.labels.iter().enumerate() {
            one_hot[[row, label]] = 1.0;
        }
        one_hot
    }
}

fn list_class_dirs(root: &Path) -> Result<Vec<String>, DatasetError> {
    if !root.is_dir() {
        return Err(DatasetError::MissingDirectory(root.to_path_buf()));
    }
    let mut names: Vec<String> = fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    Ok(names)
}
