//! Download and unpack the Kokoro model bundle from the sherpa-onnx releases.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use bzip2::read::BzDecoder;
use tracing::{debug, info};

use crate::config::{AppConfig, KOKORO_BUNDLE};

const RELEASE_URL: &str = "https://github.com/k2-fsa/sherpa-onnx/releases/download/tts-models";

/// Log download progress every this many bytes.
const PROGRESS_STEP: u64 = 25 * 1024 * 1024;

fn bundle_url() -> String {
    format!("{RELEASE_URL}/{KOKORO_BUNDLE}.tar.bz2")
}

/// Download the Kokoro bundle into `<model_dir>/tts`, unless it is already there.
///
/// Blocking; call from a blocking task when inside the async runtime.
pub fn fetch_tts_models(config: &AppConfig) -> Result<()> {
    if config.tts_model_path().exists() {
        info!("✅ TTS models already present in {}", config.tts_dir().display());
        return Ok(());
    }

    let tts_root = config.model_dir.join("tts");
    fs::create_dir_all(&tts_root).with_context(|| format!("Failed to create {}", tts_root.display()))?;

    let archive_path = tts_root.join(format!("{KOKORO_BUNDLE}.tar.bz2.partial"));
    let url = bundle_url();
    info!("⬇️ Downloading {}", url);
    download(&url, &archive_path)?;

    info!("📦 Unpacking into {}", tts_root.display());
    let file = File::open(&archive_path).with_context(|| format!("Failed to open {}", archive_path.display()))?;
    unpack_bundle(file, &tts_root)?;
    fs::remove_file(&archive_path).with_context(|| format!("Failed to remove {}", archive_path.display()))?;

    if !config.tts_model_path().exists() {
        bail!("Bundle unpacked but {} is missing", config.tts_model_path().display());
    }
    info!("✅ TTS models installed in {}", config.tts_dir().display());
    Ok(())
}

fn download(url: &str, dest: &Path) -> Result<()> {
    let mut response = reqwest::blocking::Client::builder()
        .user_agent(concat!("paper-narrator/", env!("CARGO_PKG_VERSION")))
        .timeout(None)
        .build()
        .context("Failed to create HTTP client")?
        .get(url)
        .send()
        .with_context(|| format!("Failed to download {}", url))?;

    if !response.status().is_success() {
        bail!("Download of {} failed: HTTP {}", url, response.status());
    }

    let total = response.content_length();
    let mut out = File::create(dest).with_context(|| format!("Failed to create {}", dest.display()))?;
    let mut buffer = vec![0u8; 64 * 1024];
    let mut written: u64 = 0;
    let mut next_report = PROGRESS_STEP;

    loop {
        let read = response.read(&mut buffer).context("Download interrupted")?;
        if read == 0 {
            break;
        }
        out.write_all(&buffer[..read])?;
        written += read as u64;

        if written >= next_report {
            match total {
                Some(total) => info!("  {} / {} MB", written >> 20, total >> 20),
                None => info!("  {} MB", written >> 20),
            }
            next_report += PROGRESS_STEP;
        }
    }
    out.flush()?;
    debug!("Downloaded {} bytes to {}", written, dest.display());
    Ok(())
}

/// Unpack a `.tar.bz2` stream into `dest`.
fn unpack_bundle(reader: impl Read, dest: &Path) -> Result<()> {
    let mut archive = tar::Archive::new(BzDecoder::new(io::BufReader::new(reader)));
    archive.unpack(dest).with_context(|| format!("Failed to unpack model bundle into {}", dest.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bzip2::Compression;
    use bzip2::write::BzEncoder;

    #[test]
    fn test_bundle_url_points_at_release_asset() {
        assert_eq!(bundle_url(), "https://github.com/k2-fsa/sherpa-onnx/releases/download/tts-models/kokoro-multi-lang-v1_0.tar.bz2");
    }

    #[test]
    fn test_unpack_bundle_extracts_files() {
        let mut encoder = BzEncoder::new(Vec::new(), Compression::fast());
        {
            let mut builder = tar::Builder::new(&mut encoder);
            let data = b"fake model";
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, format!("{KOKORO_BUNDLE}/model.onnx"), &data[..]).unwrap();
            builder.finish().unwrap();
        }
        let archive = encoder.finish().unwrap();

        let dir = tempfile::tempdir().unwrap();
        unpack_bundle(archive.as_slice(), dir.path()).unwrap();

        let model = dir.path().join(KOKORO_BUNDLE).join("model.onnx");
        assert_eq!(fs::read(model).unwrap(), b"fake model");
    }
}
