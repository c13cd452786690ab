//! Result CSV export
//!
//! Rows are written to `<output>.tmp` beside the target and renamed into place
//! once flushed, so readers of the output path never see a partial file.

use crate::error::PipelineError;
use crate::table::ResultTable;
use csv_async::AsyncWriterBuilder;
use std::path::{Path, PathBuf};
use tracing::info;

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

async fn write_rows(table: &ResultTable, path: &Path) -> Result<(), PipelineError> {
    let file = tokio::fs::File::create(path).await?;
    let mut writer = AsyncWriterBuilder::new().create_serializer(file);
    for row in table.rows() {
        writer.serialize(row).await?;
    }
    writer.flush().await?;
    Ok(())
}

/// Write every row of `table` to `path` as CSV
pub async fn export_table(table: &ResultTable, path: &Path) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let temp = temp_path(path);
    if let Err(e) = write_rows(table, &temp).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(e);
    }
    tokio::fs::rename(&temp, path).await?;

    info!("Exported {} venues to {}", table.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_path_sits_beside_target() {
        assert_eq!(
            temp_path(Path::new("data/results.csv")),
            PathBuf::from("data/results.csv.tmp")
        );
    }

    #[tokio::test]
    async fn test_empty_table_writes_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("results.csv");
        export_table(&ResultTable::empty(), &path).await.unwrap();
        assert!(path.exists());
        assert!(!temp_path(&path).exists());
    }
}
