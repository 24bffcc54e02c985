use std::path::Path;

use anyhow::{Context, anyhow};
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::storage::{StoragePaths, file_present_nonempty};

/// National Doctors & Clinicians extract published by CMS.
pub const DEFAULT_CSV_URL: &str =
    "https://data.cms.gov/provider-data/sites/default/files/resources/DAC_NationalDownloadableFile.csv";

/// Makes sure the clinician CSV exists locally before the pipeline starts.
/// With `offline` set, a missing file is an error instead of a download.
pub async fn ensure_csv(paths: &StoragePaths, url: &str, offline: bool) -> anyhow::Result<()> {
    paths.ensure_dirs().context("create data directories")?;

    if file_present_nonempty(&paths.csv_path) {
        return Ok(());
    }
    if offline {
        return Err(anyhow!(
            "Missing clinician CSV at {} (run without --offline to auto-download).",
            paths.csv_path.display()
        ));
    }
    download_to(url, &paths.csv_path).await
}

const PROGRESS_STEP: u64 = 50 * 1024 * 1024;

/// Streams the CSV to `<dest>.part` and renames on completion, so a killed
/// download never leaves a truncated file at the final path.
async fn download_to(url: &str, dest: &Path) -> anyhow::Result<()> {
    let tmp = dest.with_extension("csv.part");
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    tracing::info!("Downloading {} -> {}", url, dest.display());

    let resp = reqwest::get(url)
        .await
        .with_context(|| format!("GET {url}"))?;
    if !resp.status().is_success() {
        return Err(anyhow!("Download failed ({}): {}", resp.status(), url));
    }

    let mut file = tokio::fs::File::create(&tmp)
        .await
        .with_context(|| format!("create {}", tmp.display()))?;

    let mut downloaded: u64 = 0;
    let mut next_report = PROGRESS_STEP;
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.with_context(|| format!("read body chunk from {url}"))?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;

        if downloaded >= next_report {
            tracing::info!("... {} MB so far", downloaded / (1024 * 1024));
            next_report += PROGRESS_STEP;
        }
    }

    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp, dest)
        .await
        .with_context(|| format!("rename {} -> {}", tmp.display(), dest.display()))?;

    tracing::info!("Download complete ({} MB)", downloaded / (1024 * 1024));
    Ok(())
}
