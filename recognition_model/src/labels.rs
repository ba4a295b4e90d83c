use crate::{
    config::{LabelsConfig, Validatable},
    error::{Error, Result},
};
use std::{
    fs::File,
    io::{self, BufRead},
    path::Path,
};

/// Human readable class names; line `i` of the labels file names class `i`.
#[derive(Debug, Clone, Default)]
pub struct ClassLabels {
    class_labels: Vec<String>,
}

impl ClassLabels {
    pub fn new(labels_cfg: &LabelsConfig) -> Result<Self> {
        Self::from_path(&labels_cfg.get_path())
    }

    pub fn from_path(filepath: &Path) -> Result<Self> {
        let to_error = |source: io::Error| Error::Labels {
            path: filepath.to_path_buf(),
            source,
        };

        let file = File::open(filepath).map_err(to_error)?;
        let labels = Self::from_reader(io::BufReader::new(file)).map_err(to_error)?;

        tracing::info!("Loaded {} class labels from {:?}", labels.len(), filepath);
        Ok(labels)
    }

    /// Blank lines are skipped.
    pub fn from_reader<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut class_labels = Vec::new();

        for line_result in reader.lines() {
            let line = line_result?;
            let label = line.trim();
            if !label.is_empty() {
                class_labels.push(label.to_string());
            }
        }

        Ok(Self { class_labels })
    }

    pub fn get(&self, class_index: usize) -> Option<&str> {
        self.class_labels.get(class_index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.class_labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.class_labels.is_empty()
    }
}
