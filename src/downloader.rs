use std::ffi::OsString;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};

/// Output template; the downloader zero-pads autonumbers to five digits, so
/// files sort in the order the URLs were listed.
const OUTPUT_TEMPLATE: &str = "%(autonumber)s";

/// Arguments for a metadata-only download of every URL in `urls_file`.
pub fn build_args(urls_file: &Path, raw_dir: &Path, delay_secs: f64) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-o".into(),
        raw_dir.join(OUTPUT_TEMPLATE).into_os_string(),
        "--skip-download".into(),
        "--write-info-json".into(),
        "-i".into(),
    ];

    if delay_secs > 0.0 {
        args.push("--sleep-interval".into());
        args.push(delay_secs.to_string().into());
    }

    args.push("-a".into());
    args.push(urls_file.as_os_str().to_owned());
    args
}

/// Runs the downloader and streams its output to the log. Individual videos
/// that fail are skipped by the downloader itself (`-i`), so a non-zero exit
/// is only reported as a warning.
pub fn download_metadata(
    downloader: &str,
    urls_file: &Path,
    raw_dir: &Path,
    delay_secs: f64,
) -> Result<()> {
    let args = build_args(urls_file, raw_dir, delay_secs);
    log::info!("Running {downloader} {}", display_args(&args));

    let mut child = Command::new(downloader)
        .args(&args)
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .with_context(|| format!("failed to start `{downloader}`. Is it installed and on PATH?"))?;

    if let Some(stdout) = child.stdout.take() {
        for line in BufReader::new(stdout).lines().map_while(Result::ok) {
            let line = line.trim();
            if !line.is_empty() {
                log::info!("{line}");
            }
        }
    }

    let status = child
        .wait()
        .with_context(|| format!("failed to wait for `{downloader}`"))?;
    if !status.success() {
        log::warn!("{downloader} exited with {status}; some videos may be missing");
    }

    Ok(())
}

fn display_args(args: &[OsString]) -> String {
    args.iter()
        .map(|a| a.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}
