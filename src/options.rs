use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

const VIDEO_DEFAULT: &str = "x265";
const AUDIO_DEFAULT: &str = "eac3";

#[derive(Debug, PartialEq, Snafu)]
pub enum Error {
    #[snafu(display("Invalid {} specified: {}", field, value))]
    InvalidOption {
        field: &'static str,
        value: String,
    },
}

/// Conversion settings, as filled in from the command line.
///
/// The string fields hold the raw values so that `validate` can report exactly what
/// was given. An empty string means "not set".
#[derive(Debug, Clone)]
pub struct ConversionOptions {
    pub profile: String,
    pub source_file: PathBuf,
    pub out_file: Option<PathBuf>,
    pub video_format: String,
    pub audio_format: String,
    pub video_flags: Option<String>,
    pub audio_flags: Option<String>,
    pub subtitles: bool,
    pub burn_pgs_subs: bool,
    pub force_audio: bool,
    pub noise_reduction: bool,
    pub sharpen: bool,
    pub restore: bool,
    /// `None` selects track 0 if the source has one.
    pub audio_track: Option<u32>,
    pub video_track: u32,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            profile: String::new(),
            source_file: PathBuf::new(),
            out_file: None,
            video_format: VIDEO_DEFAULT.to_owned(),
            audio_format: AUDIO_DEFAULT.to_owned(),
            video_flags: None,
            audio_flags: None,
            subtitles: true,
            burn_pgs_subs: false,
            force_audio: false,
            noise_reduction: false,
            sharpen: false,
            restore: false,
            audio_track: None,
            video_track: 0,
        }
    }
}

impl ConversionOptions {
    pub fn validate(&self) -> Result<(), Error> {
        if !self.profile.is_empty() {
            self.profile.parse::<Profile>()?;
        }
        if !self.video_format.is_empty() {
            self.video_format.parse::<VideoFormat>()?;
        }
        if !self.audio_format.is_empty() {
            self.audio_format.parse::<AudioFormat>()?;
        }
        Ok(())
    }

    /// Applies the codec bundle of the selected profile, overriding `--video`/`--audio`.
    pub fn resolve_profile(&mut self) {
        let (video, audio) = match self.profile.as_str() {
            "" => return,
            "ps4" => (VideoFormat::X265, AudioFormat::Aac),
            _ => (VideoFormat::X265, AudioFormat::Eac3),
        };

        self.video_format = video.to_string();
        self.audio_format = audio.to_string();
    }

    pub fn video(&self) -> Result<VideoFormat, Error> {
        parse_or(&self.video_format, VIDEO_DEFAULT)
    }

    pub fn audio(&self) -> Result<AudioFormat, Error> {
        parse_or(&self.audio_format, AUDIO_DEFAULT)
    }

    /// The video flag override, if a non-empty one was given.
    pub fn video_override(&self) -> Option<&str> {
        non_empty(&self.video_flags)
    }

    pub fn audio_override(&self) -> Option<&str> {
        non_empty(&self.audio_flags)
    }
}

fn parse_or<T>(value: &str, default: &str) -> Result<T, Error>
    where T: FromStr<Err = Error>
{
    if value.is_empty() {
        default.parse()
    } else {
        value.parse()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Tv,
    Ps4,
}

impl FromStr for Profile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "tv" => Ok(Profile::Tv),
            "ps4" => Ok(Profile::Ps4),
            _ => InvalidOption { field: "profile", value: s }.fail(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoFormat {
    X264,
    X265,
}

impl FromStr for VideoFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "x264" => Ok(VideoFormat::X264),
            "x265" => Ok(VideoFormat::X265),
            _ => InvalidOption { field: "video format", value: s }.fail(),
        }
    }
}

impl fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            VideoFormat::X264 => "x264",
            VideoFormat::X265 => "x265",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Aac,
    Eac3,
    Dts,
}

impl FromStr for AudioFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "aac" => Ok(AudioFormat::Aac),
            "eac3" => Ok(AudioFormat::Eac3),
            "dts" => Ok(AudioFormat::Dts),
            _ => InvalidOption { field: "audio format", value: s }.fail(),
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            AudioFormat::Aac => "aac",
            AudioFormat::Eac3 => "eac3",
            AudioFormat::Dts => "dts",
        })
    }
}
