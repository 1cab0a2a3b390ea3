use crate::options::{AudioFormat, VideoFormat};

// Encoder name followed by its options, as passed after `-c:v`/`-c:a`.
pub fn video_flags(format: VideoFormat) -> &'static str {
    match format {
        VideoFormat::X264 => "libx264 -profile:v high -level 4.2 -preset slow -crf 12 -pix_fmt yuv420p -movflags faststart",
        VideoFormat::X265 => "libx265 -pix_fmt yuv420p10le -preset fast -x265-params level=5.2:vbv-bufsize=60000:vbv-maxrate=60000:crf=20",
    }
}

pub fn audio_flags(format: AudioFormat) -> &'static str {
    match format {
        AudioFormat::Aac => "aac -b:a 512k -ac 2 -clev 1.414 -slev .5 -strict -2",
        AudioFormat::Eac3 => "eac3 -ab 1536k -strict -2",
        AudioFormat::Dts => "dca -ab 1536k -strict -2",
    }
}

/// The `codec_name` ffprobe reports for a stream already in this format.
pub fn audio_codec_name(format: AudioFormat) -> &'static str {
    match format {
        AudioFormat::Aac => "aac",
        AudioFormat::Eac3 => "eac3",
        AudioFormat::Dts => "dts",
    }
}
