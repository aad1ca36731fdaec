//! The data access contract.

use polars::prelude::{LazyFrame, UnionArgs, concat_lf_diagonal};
use rules_model::{DatasetFrame, Result};
use serde_json::Value;

/// Loads one dataset file by reference.
pub type DatasetLoader<'a> = dyn Fn(&str) -> Result<DatasetFrame> + 'a;

/// Resolves dataset references and remote library metadata.
pub trait DataService: Send + Sync {
    /// Load the dataset named by `reference` (a path or file name).
    fn get_dataset(&self, reference: &str) -> Result<DatasetFrame>;

    /// Load every file in `files` with `loader` and stack the results
    /// row-wise. Columns keep their first-seen order; columns missing from a
    /// file are null for its rows.
    fn join_split_datasets(
        &self,
        loader: &DatasetLoader<'_>,
        files: &[String],
    ) -> Result<DatasetFrame> {
        let frames = files
            .iter()
            .map(|file| loader(file))
            .collect::<Result<Vec<_>>>()?;
        concat_frames(frames)
    }

    /// Model metadata for a standard version, in library JSON form.
    fn fetch_model_metadata(&self, _standard: &str, _version: &str) -> Result<Option<Value>> {
        Ok(None)
    }

    /// Standard (implementation guide) metadata, in library JSON form.
    fn fetch_standard_metadata(&self, _standard: &str, _version: &str) -> Result<Option<Value>> {
        Ok(None)
    }
}

/// Stack frames row-wise, unioning their columns.
pub fn concat_frames(frames: Vec<DatasetFrame>) -> Result<DatasetFrame> {
    match frames.len() {
        0 => Ok(DatasetFrame::default()),
        1 => Ok(frames.into_iter().next().unwrap_or_default()),
        _ => {
            let lazy: Vec<LazyFrame> = frames.iter().map(DatasetFrame::lazy).collect();
            let args = UnionArgs {
                to_supertypes: true,
                ..UnionArgs::default()
            };
            Ok(DatasetFrame::Lazy(concat_lf_diagonal(lazy, args)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{DataFrame, NamedFrom, Series};

    struct Empty;

    impl DataService for Empty {
        fn get_dataset(&self, reference: &str) -> Result<DatasetFrame> {
            Err(rules_model::EngineError::not_found("Dataset", reference))
        }
    }

    #[test]
    fn split_datasets_union_columns_in_first_seen_order() {
        let first = DataFrame::new(vec![
            Series::new("STUDYID".into(), ["S1"]).into(),
            Series::new("AESEQ".into(), [1i64]).into(),
        ])
        .unwrap();
        let second = DataFrame::new(vec![
            Series::new("AETERM".into(), ["HEADACHE"]).into(),
            Series::new("STUDYID".into(), ["S1"]).into(),
        ])
        .unwrap();

        let loader = |name: &str| -> Result<DatasetFrame> {
            Ok(match name {
                "ae1.csv" => first.clone().into(),
                _ => second.clone().into(),
            })
        };
        let joined = Empty
            .join_split_datasets(&loader, &["ae1.csv".to_string(), "ae2.csv".to_string()])
            .unwrap();

        assert_eq!(
            joined.column_names().unwrap(),
            vec!["STUDYID", "AESEQ", "AETERM"]
        );
        let df = joined.collect().unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.column("AETERM").unwrap().null_count(), 1);
    }

    #[test]
    fn no_files_is_empty_frame() {
        let loader = |_: &str| -> Result<DatasetFrame> { Ok(DatasetFrame::default()) };
        let joined = Empty.join_split_datasets(&loader, &[]).unwrap();
        assert_eq!(joined.height().unwrap(), 0);
    }

    #[test]
    fn remote_metadata_defaults_to_absent() {
        assert_eq!(Empty.fetch_model_metadata("sdtm", "1-5").unwrap(), None);
        assert_eq!(Empty.fetch_standard_metadata("sdtmig", "3-4").unwrap(), None);
    }
}
