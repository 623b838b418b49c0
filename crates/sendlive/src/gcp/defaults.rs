//! Default Live Stream API channel topology: one 720p H.264 rendition, one
//! stereo AAC rendition and one HLS manifest.

use serde_json::{Value, json};

pub const VIDEO_STREAM_KEY: &str = "es_video_720p";
pub const AUDIO_STREAM_KEY: &str = "es_audio";
pub const VIDEO_MUX_KEY: &str = "mux_video_720p";
pub const AUDIO_MUX_KEY: &str = "mux_audio";
pub const INPUT_ATTACHMENT_KEY: &str = "input-attachment";
pub const MANIFEST_FILE_NAME: &str = "manifest.m3u8";

/// Segment length of both mux streams.
pub const SEGMENT_DURATION: &str = "2s";

pub fn elementary_streams() -> Value {
    json!([
        {
            "key": VIDEO_STREAM_KEY,
            "videoStream": {
                "h264": {
                    "profile": "high",
                    "widthPixels": 1280,
                    "heightPixels": 720,
                    "bitrateBps": 3_000_000,
                    "frameRate": 30,
                }
            }
        },
        {
            "key": AUDIO_STREAM_KEY,
            "audioStream": {
                "codec": "aac",
                "channelCount": 2,
                "bitrateBps": 160_000,
            }
        }
    ])
}

pub fn mux_streams() -> Value {
    json!([
        {
            "key": VIDEO_MUX_KEY,
            "elementaryStreams": [VIDEO_STREAM_KEY],
            "segmentSettings": { "segmentDuration": SEGMENT_DURATION },
        },
        {
            "key": AUDIO_MUX_KEY,
            "elementaryStreams": [AUDIO_STREAM_KEY],
            "segmentSettings": { "segmentDuration": SEGMENT_DURATION },
        }
    ])
}

pub fn manifests() -> Value {
    json!([
        {
            "fileName": MANIFEST_FILE_NAME,
            "type": "HLS",
            "muxStreams": [VIDEO_MUX_KEY, AUDIO_MUX_KEY],
            "maxSegmentCount": 5,
        }
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_references_every_mux_stream() {
        let muxes: Vec<_> = mux_streams()
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["key"].clone())
            .collect();

        assert_eq!(manifests()[0]["muxStreams"].as_array().unwrap(), &muxes);
    }

    #[test]
    fn test_mux_streams_reference_elementary_streams() {
        let keys: Vec<_> = elementary_streams()
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["key"].clone())
            .collect();

        for mux in mux_streams().as_array().unwrap() {
            assert!(keys.contains(&mux["elementaryStreams"][0]));
        }
    }
}
