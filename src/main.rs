use std::path::PathBuf;
use std::process;
use structopt::StructOpt;
use movconv::{ConversionOptions, Tools};

#[derive(Debug, StructOpt)]
#[structopt(name = "movconv", about = "Convert movie files for home use")]
enum Opt {
    /// Convert a movie file using sane defaults for home use
    Convert(ConvertOpt),
}

#[derive(Debug, StructOpt)]
struct ConvertOpt {
    /// The path to the source file to convert from
    #[structopt(short, long)]
    from: PathBuf,
    /// The path of the resultant movie (default computed from source file name)
    #[structopt(short, long)]
    out: Option<PathBuf>,
    /// A profile of either tv or ps4 to inherit common parameters
    #[structopt(long, default_value = "")]
    profile: String,
    /// Specify/override the ffmpeg video flags
    #[structopt(long = "videoflags")]
    video_flags: Option<String>,
    /// Specify/override the ffmpeg audio flags
    #[structopt(long = "audioflags")]
    audio_flags: Option<String>,
    /// Audio format: eac3, aac or dts
    #[structopt(long, default_value = "eac3")]
    audio: String,
    /// Video format: x264 or x265
    #[structopt(long, default_value = "x265")]
    video: String,
    /// Copy subtitles: -s, --subtitles[=true|false] (default true)
    #[structopt(short, long, require_equals = true, overrides_with = "no-subtitles")]
    subtitles: Option<Option<bool>>,
    /// Do not copy subtitles
    #[structopt(long, overrides_with = "subtitles")]
    no_subtitles: bool,
    /// Burn PGS subtitles into the movie (requires video recode)
    #[structopt(long)]
    pcg: bool,
    /// Force the recoding of the audio
    #[structopt(long = "forceaudio")]
    force_audio: bool,
    /// Apply hqdn3d noise filter on video
    #[structopt(short, long = "noisereduction")]
    noise_reduction: bool,
    /// Apply sharpen filter on video
    #[structopt(long)]
    sharpen: bool,
    /// Apply hqdn3d then sharpen filter on video
    #[structopt(long)]
    restore: bool,
    /// Audio track number (defaults to 0, or none for a silent source)
    #[structopt(short, long = "audiotrack")]
    audio_track: Option<u32>,
    /// Video track number
    #[structopt(short, long = "videotrack", default_value = "0")]
    video_track: u32,
    /// The ffmpeg executable to run
    #[structopt(long, env = "MOVCONV_FFMPEG")]
    ffmpeg: Option<PathBuf>,
    /// The ffprobe executable to run
    #[structopt(long, env = "MOVCONV_FFPROBE")]
    ffprobe: Option<PathBuf>,
}

impl ConvertOpt {
    fn into_parts(self) -> (Tools, ConversionOptions) {
        let defaults = Tools::default();
        let tools = Tools {
            ffmpeg: self.ffmpeg.unwrap_or(defaults.ffmpeg),
            ffprobe: self.ffprobe.unwrap_or(defaults.ffprobe),
        };
        let options = ConversionOptions {
            profile: self.profile,
            source_file: self.from,
            out_file: self.out,
            video_format: self.video,
            audio_format: self.audio,
            video_flags: self.video_flags,
            audio_flags: self.audio_flags,
            subtitles: !self.no_subtitles && self.subtitles.map_or(true, |value| value.unwrap_or(true)),
            burn_pgs_subs: self.pcg,
            force_audio: self.force_audio,
            noise_reduction: self.noise_reduction,
            sharpen: self.sharpen,
            restore: self.restore,
            audio_track: self.audio_track,
            video_track: self.video_track,
        };
        (tools, options)
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Opt::Convert(opt) = Opt::from_args();
    log::debug!("Options: {:?}", opt);
    let (tools, options) = opt.into_parts();

    match movconv::convert(&tools, options) {
        Ok(output) => eprintln!("Done! Converted movie written to '{}'", output.display()),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
