use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// One labeled frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    /// Relative to the images root.
    pub image: PathBuf,
    pub label: String,
}

#[derive(Deserialize)]
struct RawRow {
    image: String,
    task: Option<String>,
    label: Option<String>,
}

impl RawRow {
    // `task` wins over `label` when both are present.
    fn into_sample(self, path: &Path, line: usize) -> Result<Sample> {
        let label = self
            .task
            .or(self.label)
            .ok_or_else(|| anyhow!("{}:{}: row has neither `task` nor `label`", path.display(), line))?;
        Ok(Sample {
            image: PathBuf::from(self.image),
            label,
        })
    }
}

/// Picks the reader by extension: `.csv` goes to `load_csv`, anything else is JSONL.
pub fn load_dataset(path: impl AsRef<Path>) -> Result<Vec<Sample>> {
    let path = path.as_ref();
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => load_csv(path),
        _ => load_jsonl(path),
    }
}

/// Reads `{"image": ..., "task" | "label": ...}` rows, one per line.
pub fn load_jsonl(path: impl AsRef<Path>) -> Result<Vec<Sample>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).with_context(|| format!("reading dataset {}", path.display()))?;

    let mut samples = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let row: RawRow = serde_json::from_str(line)
            .with_context(|| format!("{}:{}: malformed dataset row", path.display(), idx + 1))?;
        samples.push(row.into_sample(path, idx + 1)?);
    }

    if samples.is_empty() {
        bail!("dataset {} is empty", path.display());
    }
    Ok(samples)
}

/// Reads a headered CSV with an `image` column and a `task` and/or `label`
/// column. Empty cells count as absent.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Sample>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("reading dataset {}", path.display()))?;

    let mut samples = Vec::new();
    for (idx, row) in reader.deserialize::<RawRow>().enumerate() {
        // Line 1 is the header.
        let line = idx + 2;
        let row = row.with_context(|| format!("{}:{}: malformed dataset row", path.display(), line))?;
        samples.push(row.into_sample(path, line)?);
    }

    if samples.is_empty() {
        bail!("dataset {} is empty", path.display());
    }
    Ok(samples)
}

/// Sorted, de-duplicated ground-truth labels.
pub fn collect_class_names(samples: &[Sample]) -> Vec<String> {
    let mut classes: Vec<String> = samples.iter().map(|s| s.label.clone()).collect();
    classes.sort();
    classes.dedup();
    classes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_key_preferred_over_label() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.jsonl");
        fs::write(
            &path,
            "{\"image\": \"a.png\", \"task\": \"cooking\", \"label\": \"laundry\"}\n\n{\"image\": \"b.png\", \"label\": \"laundry\"}\n",
        )
        .unwrap();

        let samples = load_jsonl(&path).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].label, "cooking");
        assert_eq!(samples[1].label, "laundry");
        assert_eq!(collect_class_names(&samples), vec!["cooking", "laundry"]);
    }

    #[test]
    fn test_empty_dataset_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.jsonl");
        fs::write(&path, "\n").unwrap();
        assert!(load_jsonl(&path).is_err());
    }

    #[test]
    fn test_row_without_label_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nolabel.jsonl");
        fs::write(&path, "{\"image\": \"a.png\"}\n").unwrap();
        let err = load_jsonl(&path).unwrap_err();
        assert!(err.to_string().contains("neither"));
    }

    #[test]
    fn test_csv_task_column_preferred_over_label() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, "image,task,label\na.png,cooking,laundry\nb.png,,laundry\n").unwrap();

        let samples = load_csv(&path).unwrap();
        assert_eq!(
            samples,
            vec![
                Sample { image: PathBuf::from("a.png"), label: "cooking".into() },
                Sample { image: PathBuf::from("b.png"), label: "laundry".into() },
            ]
        );
    }

    #[test]
    fn test_csv_label_only_and_extension_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.CSV");
        fs::write(&path, "label,image\norganizing,shelf.png\n").unwrap();

        let samples = load_dataset(&path).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].label, "organizing");
        assert_eq!(samples[0].image, PathBuf::from("shelf.png"));
    }

    #[test]
    fn test_csv_header_only_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        fs::write(&path, "image,task\n").unwrap();
        assert!(load_csv(&path).unwrap_err().to_string().contains("empty"));
    }

    #[test]
    fn test_csv_row_without_label_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nolabel.csv");
        fs::write(&path, "image,task,label\na.png,,\n").unwrap();
        let err = load_csv(&path).unwrap_err();
        assert!(err.to_string().contains("neither"));
    }
}
