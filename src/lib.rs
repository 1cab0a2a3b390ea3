#[macro_use] extern crate serde_derive;
#[macro_use] extern crate snafu;
extern crate serde_json as json;
use std::path::{Path, PathBuf};
use snafu::ResultExt;

pub mod options;
pub use options::ConversionOptions;

mod output;
pub use output::resolve_out_file;

pub mod probe;
pub use probe::find_codecs;

pub mod flags;
pub mod encode;

#[cfg(target_os = "windows")]
const FFMPEG_EXE: &str = "ffmpeg.exe";
#[cfg(not(target_os = "windows"))]
const FFMPEG_EXE: &str = "ffmpeg";

#[cfg(target_os = "windows")]
const FFPROBE_EXE: &str = "ffprobe.exe";
#[cfg(not(target_os = "windows"))]
const FFPROBE_EXE: &str = "ffprobe";

pub type Result<T = (), E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("{}", source))]
    InvalidOption {
        source: options::Error,
    },
    #[snafu(display("Source file {} does not exist", path.display()))]
    NotFound {
        path: PathBuf,
    },
    #[snafu(display("Output file {} would overwrite the source", path.display()))]
    SameFile {
        path: PathBuf,
    },
    #[snafu(display("Could not probe '{}': {}", input.display(), source))]
    Probe {
        input: PathBuf,
        source: probe::Error,
    },
    #[snafu(display("{} has no {} track {}", input.display(), kind, track))]
    MissingTrack {
        input: PathBuf,
        kind: &'static str,
        track: u32,
    },
    #[snafu(display("Could not encode: {}", source))]
    Encode {
        source: encode::Error,
    },
}

/// Locations of the external binaries.
#[derive(Debug, Clone, PartialEq)]
pub struct Tools {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            ffmpeg: FFMPEG_EXE.into(),
            ffprobe: FFPROBE_EXE.into(),
        }
    }
}

/// Converts `options.source_file` and returns the path of the written file.
pub fn convert(tools: &Tools, mut options: ConversionOptions) -> Result<PathBuf> {
    options.validate().context(InvalidOption)?;

    let input = options.source_file.clone();
    ensure!(input.exists(), NotFound { path: &input });

    let output = resolve_out_file(&input, options.out_file.as_deref());
    ensure!(!same_file(&input, &output), SameFile { path: &output });
    log::info!("Converting {} to {}", input.display(), output.display());

    options.resolve_profile();
    let video = options.video().context(InvalidOption)?;
    let audio = options.audio().context(InvalidOption)?;

    let probe = probe::probe(tools, &input).context(Probe { input: &input })?;
    log::info!("Found these codecs in the source: {:?}", probe.codec_names().collect::<Vec<_>>());

    ensure!(probe.nth_of_type("video", options.video_track).is_some(), MissingTrack {
        input: &input,
        kind: "video",
        track: options.video_track,
    });

    let audio_track = options.audio_track.unwrap_or(0);
    let source_audio = probe.nth_of_type("audio", audio_track);
    if source_audio.is_none() {
        // only an explicitly requested track has to exist
        ensure!(options.audio_track.is_none(), MissingTrack {
            input: &input,
            kind: "audio",
            track: audio_track,
        });
        log::info!("{} has no audio, writing video only", input.display());
    }

    if options.burn_pgs_subs {
        ensure!(probe.nth_of_type("subtitle", 0).is_some(), MissingTrack {
            input: &input,
            kind: "subtitle",
            track: 0u32,
        });
    }

    let audio_flags = match (options.audio_override(), source_audio) {
        (Some(custom), _) => Some(custom),
        (None, Some(stream)) if !options.force_audio
            && stream.codec_name.as_deref() == Some(flags::audio_codec_name(audio)) =>
        {
            log::info!("Audio track {} is already {}, copying it", audio_track, audio);
            None
        }
        (None, _) => Some(flags::audio_flags(audio)),
    };

    let config = encode::Config {
        input: &input,
        output: &output,
        video_track: options.video_track,
        audio_track: source_audio.map(|_| audio_track),
        video_flags: options.video_override().unwrap_or_else(|| flags::video_flags(video)),
        audio_flags,
        subtitles: options.subtitles,
        burn_subtitles: options.burn_pgs_subs,
        filters: encode::Filters {
            noise_reduction: options.noise_reduction || options.restore,
            sharpen: options.sharpen || options.restore,
        },
    };

    log::info!("Encoding video as {}", video);
    encode::run(&tools.ffmpeg, &encode::build_args(&config), probe.duration())
        .context(Encode)?;

    Ok(output)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;

    /// Writes an executable shell script standing in for one of the external tools.
    #[cfg(unix)]
    pub fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn missing_tools() -> Tools {
        Tools {
            ffmpeg: "/nonexistent/ffmpeg".into(),
            ffprobe: "/nonexistent/ffprobe".into(),
        }
    }

    #[test]
    fn invalid_options_fail_before_file_access() {
        let options = ConversionOptions {
            profile: "pc".into(),
            source_file: "/nonexistent/movie.mkv".into(),
            ..Default::default()
        };
        match convert(&missing_tools(), options) {
            Err(Error::InvalidOption { source }) => {
                assert_eq!(source.to_string(), "Invalid profile specified: pc");
            }
            other => panic!("expected InvalidOption, got {:?}", other),
        }
    }

    #[test]
    fn missing_source_fails_before_spawning() {
        let options = ConversionOptions {
            source_file: "/nonexistent/missing.mkv".into(),
            ..Default::default()
        };
        match convert(&missing_tools(), options) {
            Err(Error::NotFound { path }) => assert_eq!(path, Path::new("/nonexistent/missing.mkv")),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn refuses_to_overwrite_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("movie.mkv");
        fs::write(&source, b"").unwrap();
        let options = ConversionOptions {
            source_file: source.clone(),
            out_file: Some(source),
            ..Default::default()
        };
        match convert(&missing_tools(), options) {
            Err(Error::SameFile { .. }) => {}
            other => panic!("expected SameFile, got {:?}", other),
        }
    }

    #[cfg(unix)]
    mod with_fake_tools {
        use super::*;

        const PROBE: &str = r#"{
            "streams": [
                { "index": 0, "codec_name": "h264", "codec_type": "video" },
                { "index": 1, "codec_name": "aac", "codec_type": "audio" },
                { "index": 2, "codec_name": "hdmv_pgs_subtitle", "codec_type": "subtitle" }
            ],
            "format": { "duration": "10.0" }
        }"#;

        struct Fixture {
            dir: tempfile::TempDir,
            tools: Tools,
            source: PathBuf,
        }

        impl Fixture {
            fn new() -> Self {
                Self::with_probe(PROBE)
            }

            fn with_probe(probe: &str) -> Self {
                let dir = tempfile::tempdir().unwrap();
                let source = dir.path().join("movie.mkv");
                fs::write(&source, b"").unwrap();
                let log = dir.path().join("args.txt");
                let tools = Tools {
                    ffprobe: script(dir.path(), "ffprobe", &format!("cat <<'EOF'\n{}\nEOF\n", probe)),
                    ffmpeg: script(dir.path(), "ffmpeg", &format!("echo \"$@\" > '{}'\n", log.display())),
                };
                Fixture { dir, tools, source }
            }

            fn options(&self) -> ConversionOptions {
                ConversionOptions {
                    source_file: self.source.clone(),
                    ..Default::default()
                }
            }

            fn recorded_args(&self) -> String {
                fs::read_to_string(self.dir.path().join("args.txt")).unwrap()
            }
        }

        #[test]
        fn converts_to_derived_path() {
            let fixture = Fixture::new();
            let output = convert(&fixture.tools, fixture.options()).unwrap();

            assert_eq!(output, fixture.dir.path().join("movie.converted.mkv"));
            let args = fixture.recorded_args();
            assert!(args.contains("-c:v libx265 "));
            assert!(args.contains("-c:a eac3 -ab 1536k -strict -2"));
            assert!(args.contains("-map 0:s? -c:s copy"));
            assert!(args.trim_end().ends_with("movie.converted.mkv"));
        }

        #[test]
        fn ps4_profile_copies_matching_audio() {
            let fixture = Fixture::new();
            let options = ConversionOptions {
                profile: "ps4".into(),
                audio_format: "dts".into(),
                ..fixture.options()
            };
            convert(&fixture.tools, options).unwrap();

            assert!(fixture.recorded_args().contains("-c:a copy"));
        }

        #[test]
        fn forced_audio_is_reencoded() {
            let fixture = Fixture::new();
            let options = ConversionOptions {
                audio_format: "aac".into(),
                force_audio: true,
                ..fixture.options()
            };
            convert(&fixture.tools, options).unwrap();

            assert!(fixture.recorded_args().contains("-c:a aac -b:a 512k"));
        }

        #[test]
        fn overrides_and_restore_filters() {
            let fixture = Fixture::new();
            let options = ConversionOptions {
                video_flags: Some("libx264 -crf 18".into()),
                restore: true,
                sharpen: true,
                ..fixture.options()
            };
            convert(&fixture.tools, options).unwrap();

            let args = fixture.recorded_args();
            assert!(args.contains("-c:v libx264 -crf 18 -c:a"));
            assert!(args.contains("[0:v:0]hqdn3d,unsharp[v]"));
        }

        #[test]
        fn missing_audio_track_is_reported() {
            let fixture = Fixture::new();
            let options = ConversionOptions { audio_track: Some(1), ..fixture.options() };

            match convert(&fixture.tools, options) {
                Err(Error::MissingTrack { kind, track, .. }) => {
                    assert_eq!((kind, track), ("audio", 1));
                }
                other => panic!("expected MissingTrack, got {:?}", other),
            }
        }

        const VIDEO_ONLY: &str = r#"{
            "streams": [ { "index": 0, "codec_name": "h264", "codec_type": "video" } ]
        }"#;

        #[test]
        fn video_only_source_drops_audio() {
            let fixture = Fixture::with_probe(VIDEO_ONLY);
            convert(&fixture.tools, fixture.options()).unwrap();

            let args = fixture.recorded_args();
            assert!(!args.contains("0:a"));
            assert!(!args.contains("-c:a"));
        }

        #[test]
        fn requested_audio_track_must_exist() {
            let fixture = Fixture::with_probe(VIDEO_ONLY);
            let options = ConversionOptions { audio_track: Some(0), ..fixture.options() };

            match convert(&fixture.tools, options) {
                Err(Error::MissingTrack { kind, track, .. }) => {
                    assert_eq!((kind, track), ("audio", 0));
                }
                other => panic!("expected MissingTrack, got {:?}", other),
            }
        }

        #[test]
        fn burning_needs_a_subtitle_stream() {
            let fixture = Fixture::with_probe(VIDEO_ONLY);
            let options = ConversionOptions { burn_pgs_subs: true, ..fixture.options() };

            match convert(&fixture.tools, options) {
                Err(Error::MissingTrack { kind, .. }) => assert_eq!(kind, "subtitle"),
                other => panic!("expected MissingTrack, got {:?}", other),
            }
            assert!(!fixture.dir.path().join("args.txt").exists());
        }

        #[test]
        fn burns_first_subtitle_stream() {
            let fixture = Fixture::new();
            let options = ConversionOptions { burn_pgs_subs: true, ..fixture.options() };
            convert(&fixture.tools, options).unwrap();

            let args = fixture.recorded_args();
            assert!(args.contains("[0:v:0][0:s:0]overlay[v]"));
            assert!(!args.contains("-c:s copy"));
        }
    }
}
