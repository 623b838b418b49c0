//! Recommended MediaLive encoder and MediaPackage packaging presets.
//!
//! Every function returns a freshly built value, so callers are free to
//! customize the result.

use serde_json::{Value, json};

/// Output frame rate of every ladder rung.
pub const FRAMERATE: u32 = 25;

/// AAC bitrate of each audio rendition.
pub const AUDIO_BITRATE: u32 = 128_000;

/// AAC sample rate of each audio rendition.
pub const AUDIO_SAMPLE_RATE: u32 = 48_000;

/// GOP length in seconds.
pub const GOP_SIZE_SECONDS: f64 = 1.92;

/// Destination id used when the caller does not name one.
pub const DEFAULT_DESTINATION_ID: &str = "mediapackage";

/// One rendition of the video ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoRung {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
    pub bitrate: u32,
    pub sharpness: u32,
    pub scaling_behavior: &'static str,
}

/// The default 1080p/720p/480p/240p ladder at 25 fps.
pub const VIDEO_LADDER: [VideoRung; 4] = [
    VideoRung {
        name: "emp_1080p25",
        width: 1920,
        height: 1080,
        bitrate: 5_000_000,
        sharpness: 50,
        scaling_behavior: "DEFAULT",
    },
    VideoRung {
        name: "emp_720p25",
        width: 1280,
        height: 720,
        bitrate: 3_000_000,
        sharpness: 75,
        scaling_behavior: "DEFAULT",
    },
    VideoRung {
        name: "emp_480p25",
        width: 854,
        height: 480,
        bitrate: 1_500_000,
        sharpness: 100,
        scaling_behavior: "STRETCH_TO_OUTPUT",
    },
    VideoRung {
        name: "emp_240p25",
        width: 426,
        height: 240,
        bitrate: 750_000,
        sharpness: 100,
        scaling_behavior: "STRETCH_TO_OUTPUT",
    },
];

fn audio_description(name: &str) -> Value {
    json!({
        "audioSelectorName": "Default",
        "audioTypeControl": "FOLLOW_INPUT",
        "codecSettings": {
            "aacSettings": {
                "bitrate": AUDIO_BITRATE,
                "codingMode": "CODING_MODE_2_0",
                "inputType": "NORMAL",
                "profile": "LC",
                "rateControlMode": "CBR",
                "rawFormat": "NONE",
                "sampleRate": AUDIO_SAMPLE_RATE,
                "spec": "MPEG4",
            }
        },
        "languageCodeControl": "FOLLOW_INPUT",
        "name": name,
    })
}

fn video_description(rung: &VideoRung) -> Value {
    json!({
        "codecSettings": {
            "h264Settings": {
                "adaptiveQuantization": "HIGH",
                "afdSignaling": "NONE",
                "bitrate": rung.bitrate,
                "colorMetadata": "INSERT",
                "entropyEncoding": "CABAC",
                "flickerAq": "ENABLED",
                "forceFieldPictures": "DISABLED",
                "framerateControl": "SPECIFIED",
                "framerateDenominator": 1,
                "framerateNumerator": FRAMERATE,
                "gopBReference": "ENABLED",
                "gopClosedCadence": 1,
                "gopNumBFrames": 5,
                "gopSize": GOP_SIZE_SECONDS,
                "gopSizeUnits": "SECONDS",
                "level": "H264_LEVEL_AUTO",
                "lookAheadRateControl": "HIGH",
                "maxBitrate": rung.bitrate,
                "numRefFrames": 3,
                "parControl": "SPECIFIED",
                "parDenominator": 1,
                "parNumerator": 1,
                "profile": "MAIN",
                "rateControlMode": "QVBR",
                "scanType": "PROGRESSIVE",
                "sceneChangeDetect": "ENABLED",
                "slices": 1,
                "spatialAq": "ENABLED",
                "subgopLength": "DYNAMIC",
                "syntax": "DEFAULT",
                "temporalAq": "ENABLED",
                "timecodeInsertion": "DISABLED",
            }
        },
        "height": rung.height,
        "name": rung.name,
        "respondToAfd": "NONE",
        "scalingBehavior": rung.scaling_behavior,
        "sharpness": rung.sharpness,
        "width": rung.width,
    })
}

/// Encoder settings for the default ladder, sending every rendition to a
/// MediaPackage destination.
pub fn encoder_settings(destination_id: &str) -> Value {
    let audio_names: Vec<String> = (0..VIDEO_LADDER.len())
        .map(|i| format!("audio_{i}"))
        .collect();

    let outputs: Vec<Value> = VIDEO_LADDER
        .iter()
        .zip(&audio_names)
        .map(|(rung, audio)| {
            json!({
                "audioDescriptionNames": [audio],
                "outputName": rung.name,
                "outputSettings": { "mediaPackageOutputSettings": {} },
                "videoDescriptionName": rung.name,
            })
        })
        .collect();

    json!({
        "audioDescriptions": audio_names.iter().map(|n| audio_description(n)).collect::<Vec<_>>(),
        "globalConfiguration": {
            "outputLockingMode": "PIPELINE_LOCKING",
            "outputTimingSource": "INPUT_CLOCK",
            "supportLowFramerateInputs": "DISABLED",
        },
        "outputGroups": [{
            "outputGroupSettings": {
                "mediaPackageGroupSettings": {
                    "destination": { "destinationRefId": destination_id }
                }
            },
            "outputs": outputs,
        }],
        "timecodeConfig": { "source": "SYSTEMCLOCK" },
        "videoDescriptions": VIDEO_LADDER.iter().map(video_description).collect::<Vec<_>>(),
    })
}

/// Expected input format.
pub fn input_specification() -> Value {
    json!({
        "codec": "AVC",
        "maximumBitrate": "MAX_20_MBPS",
        "resolution": "HD",
    })
}

/// Settings applied to the attached input.
pub fn input_settings() -> Value {
    json!({
        "deblockFilter": "DISABLED",
        "denoiseFilter": "DISABLED",
        "filterStrength": 1,
        "inputFilter": "AUTO",
        "smpte2038DataPreference": "IGNORE",
        "sourceEndBehavior": "CONTINUE",
    })
}

/// Segment settings of a default origin endpoint.
pub fn origin_endpoint_segment() -> Value {
    json!({
        "SegmentDurationSeconds": 4,
        "SegmentName": "segment",
        "TsUseAudioRenditionGroup": false,
        "IncludeIframeOnlyStreams": false,
    })
}

/// The default HLS manifest of an origin endpoint.
pub fn hls_manifest(name: &str) -> Value {
    json!({
        "ManifestName": name,
        "ManifestWindowSeconds": 60,
        "ProgramDateTimeIntervalSeconds": 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoder_settings_ladder() {
        let settings = encoder_settings("dest");

        let videos = settings["videoDescriptions"].as_array().unwrap();
        assert_eq!(videos.len(), 4);
        assert_eq!(videos[0]["name"], "emp_1080p25");
        assert_eq!(videos[0]["codecSettings"]["h264Settings"]["bitrate"], 5_000_000);
        assert_eq!(videos[3]["width"], 426);
        assert_eq!(videos[3]["scalingBehavior"], "STRETCH_TO_OUTPUT");

        let audios = settings["audioDescriptions"].as_array().unwrap();
        assert_eq!(audios.len(), 4);
        assert_eq!(audios[2]["name"], "audio_2");

        let group = &settings["outputGroups"][0];
        assert_eq!(
            group["outputGroupSettings"]["mediaPackageGroupSettings"]["destination"]["destinationRefId"],
            "dest"
        );
        assert_eq!(group["outputs"][1]["audioDescriptionNames"][0], "audio_1");
        assert_eq!(group["outputs"][1]["videoDescriptionName"], "emp_720p25");
    }

    #[test]
    fn test_presets_are_fresh_values() {
        let mut first = encoder_settings("a");
        first["timecodeConfig"]["source"] = json!("EMBEDDED");
        assert_eq!(encoder_settings("a")["timecodeConfig"]["source"], "SYSTEMCLOCK");
    }
}
