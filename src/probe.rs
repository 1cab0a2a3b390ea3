use snafu::ResultExt;
use std::path::{Path, PathBuf};
use std::io;
use std::process::{Command, ExitStatus, Stdio};
use std::str::FromStr;
use std::fmt;
use serde::de;
use serde::Deserialize;
use crate::Tools;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("File {} does not exist", path.display()))]
    NotFound {
        path: PathBuf,
    },
    #[snafu(display("Could not run {}: {}", command.display(), source))]
    ProcessError {
        command: PathBuf,
        source: io::Error,
    },
    #[snafu(display("'{}' exited unsuccessfully ({}): {}", command.display(), status, stderr.trim()))]
    FfprobeError {
        command: PathBuf,
        status: ExitStatus,
        stderr: String,
    },
    #[snafu(display("Could not parse ffprobe output for '{}': {}", path.display(), source))]
    ParseProbeOutput {
        path: PathBuf,
        source: json::Error,
    },
}

/// Lists the codec names of every stream in `path`, in stream order.
pub fn find_codecs(tools: &Tools, path: &Path) -> Result<Vec<String>, Error> {
    let probe = probe(tools, path)?;
    Ok(probe.codec_names().map(str::to_owned).collect())
}

pub fn probe(tools: &Tools, path: &Path) -> Result<Probe, Error> {
    ensure!(path.exists(), NotFound { path });

    let command = &tools.ffprobe;
    let output = Command::new(command)
        .args(&[
            "-v", "error",
            "-show_entries", "stream=index,codec_type,codec_name:format=duration",
            "-print_format", "json",
        ])
        .arg("-i").arg(path)
        .stdin(Stdio::null())
        .output()
        .context(ProcessError { command })?;

    ensure!(output.status.success(), FfprobeError {
        command,
        status: output.status,
        stderr: String::from_utf8_lossy(&output.stderr),
    });

    let probe = json::from_slice::<Probe>(&output.stdout)
        .context(ParseProbeOutput { path })?;

    log::debug!("ffprobe found {} stream(s) in {}", probe.streams.len(), path.display());

    Ok(probe)
}

#[derive(Debug, Deserialize)]
pub struct Probe {
    #[serde(default)]
    pub streams: Vec<Stream>,
    #[serde(default)]
    pub format: Option<Format>,
}

#[derive(Debug, Deserialize)]
pub struct Stream {
    pub index: u32,
    #[serde(default)]
    pub codec_type: Option<String>,
    #[serde(default)]
    pub codec_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Format {
    #[serde(default, deserialize_with = "opt_from_str")]
    pub duration: Option<f64>,
}

impl Probe {
    pub fn codec_names(&self) -> impl Iterator<Item = &str> {
        self.streams.iter().filter_map(|stream| stream.codec_name.as_deref())
    }

    /// The `track`th stream of the given type, counted the way ffmpeg's `0:a:N` counts.
    pub fn nth_of_type(&self, codec_type: &str, track: u32) -> Option<&Stream> {
        self.streams.iter()
            .filter(|stream| stream.codec_type.as_deref() == Some(codec_type))
            .nth(track as usize)
    }

    pub fn duration(&self) -> Option<f64> {
        self.format.as_ref().and_then(|format| format.duration)
    }
}

fn opt_from_str<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where T: FromStr,
          T::Err: fmt::Display,
          D: de::Deserializer<'de>
{
    let s = Option::<String>::deserialize(deserializer)?;
    match s {
        Some(s) => T::from_str(&s).map(Some).map_err(de::Error::custom),
        None => Ok(None),
    }
}
