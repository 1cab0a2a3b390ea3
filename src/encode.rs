use std::ffi::OsString;
use std::process::{Command, ExitStatus, Stdio};
use std::path::{Path, PathBuf};
use std::io::{self, BufReader, BufRead, Write};
use snafu::{OptionExt, ResultExt};

pub fn run(ffmpeg: &Path, args: &[OsString], duration: Option<f64>) -> Result<(), Error> {
    log::debug!("Running {} {}", ffmpeg.display(), display_args(args));

    let mut child = Command::new(ffmpeg)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .spawn()
        .context(ProcessError { command: ffmpeg })?;

    let stdout = child.stdout.take().context(NoStdout)?;
    let stdout = BufReader::new(stdout);

    for line in stdout.lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };

        const OUT_TIME_MS: &str = "out_time_ms=";

        if let (Some(progress), Some(duration)) = (line.strip_prefix(OUT_TIME_MS), duration) {
            // out_time_ms is in microseconds despite the name
            let progress = progress.parse::<f64>().unwrap_or(0.);
            let progress = (progress / (duration * 10_000.)).min(100.);

            eprint!("\rEncoding progress: {:.2}%", progress);
            io::stderr().flush().ok();
        }
    }

    eprintln!();

    let status = child.wait().context(ProcessError { command: ffmpeg })?;
    ensure!(status.success(), FfmpegError { status });

    Ok(())
}

/// Everything needed to assemble one ffmpeg invocation.
pub struct Config<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
    pub video_track: u32,
    /// `None` writes a video-only file.
    pub audio_track: Option<u32>,
    pub video_flags: &'a str,
    /// `None` copies the audio stream unchanged.
    pub audio_flags: Option<&'a str>,
    pub subtitles: bool,
    pub burn_subtitles: bool,
    pub filters: Filters,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Filters {
    pub noise_reduction: bool,
    pub sharpen: bool,
}

impl Filters {
    fn chain(self) -> Option<String> {
        let mut filters = Vec::new();
        if self.noise_reduction {
            filters.push("hqdn3d");
        }
        if self.sharpen {
            filters.push("unsharp");
        }

        if filters.is_empty() {
            None
        } else {
            Some(filters.join(","))
        }
    }
}

pub fn build_args(config: &Config) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-hide_banner",
        "-nostdin",
        "-loglevel", "error",
        "-progress", "pipe:1",
        "-y",
    ].iter().map(OsString::from).collect();

    let video = format!("[0:v:{}]", config.video_track);
    let graph = match (config.burn_subtitles, config.filters.chain()) {
        (true, Some(chain)) => Some(format!("{}[0:s:0]overlay,{}[v]", video, chain)),
        (true, None) => Some(format!("{}[0:s:0]overlay[v]", video)),
        (false, Some(chain)) => Some(format!("{}{}[v]", video, chain)),
        (false, None) => None,
    };

    args.push("-i".into());
    args.push(config.input.into());

    match graph {
        Some(graph) => {
            args.push("-filter_complex".into());
            args.push(graph.into());
            args.push("-map".into());
            args.push("[v]".into());
        }
        None => {
            args.push("-map".into());
            args.push(format!("0:v:{}", config.video_track).into());
        }
    }

    if let Some(track) = config.audio_track {
        args.push("-map".into());
        args.push(format!("0:a:{}", track).into());
    }

    if config.subtitles && !config.burn_subtitles {
        args.extend(["-map", "0:s?", "-c:s", "copy"].iter().map(OsString::from));
    }

    args.push("-c:v".into());
    args.extend(config.video_flags.split_whitespace().map(OsString::from));

    if config.audio_track.is_some() {
        args.push("-c:a".into());
        match config.audio_flags {
            Some(flags) => args.extend(flags.split_whitespace().map(OsString::from)),
            None => args.push("copy".into()),
        }
    }

    args.push(config.output.into());
    args
}

fn display_args(args: &[OsString]) -> String {
    args.iter()
        .map(|arg| arg.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Could not run {}: {}", command.display(), source))]
    ProcessError {
        command: PathBuf,
        source: io::Error,
    },
    #[snafu(display("Could not capture ffmpeg output"))]
    NoStdout,
    #[snafu(display("ffmpeg exited unsuccessfully ({})", status))]
    FfmpegError {
        status: ExitStatus,
    },
}
