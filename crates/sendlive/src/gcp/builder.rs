//! Live Stream API resource descriptors.

use serde_json::{Value, json};

use super::{GcpInputType, defaults};
use crate::tags::Tags;

/// Builds an input descriptor.
pub fn build_input(input_type: GcpInputType, labels: &Tags) -> Value {
    json!({
        "type": input_type,
        "labels": labels,
    })
}

/// Builds a channel descriptor from the default topology.
///
/// `input` is the full resource name of the input to attach; `output_uri`
/// is the `gs://` folder the channel writes to.
pub fn build_channel(name: &str, input: &str, output_uri: &str, labels: &Tags) -> Value {
    json!({
        "name": name,
        "inputAttachments": [{
            "key": defaults::INPUT_ATTACHMENT_KEY,
            "input": input,
        }],
        "output": { "uri": output_uri },
        "elementaryStreams": defaults::elementary_streams(),
        "muxStreams": defaults::mux_streams(),
        "manifests": defaults::manifests(),
        "labels": labels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags;

    #[test]
    fn test_build_channel() {
        let labels = tags::normalize_keys_lowercase(&tags::normalize(None));
        let channel = build_channel(
            "projects/p/locations/r/channels/my_stream",
            "projects/p/locations/r/inputs/my_stream",
            "gs://bucket/my_stream/",
            &labels,
        );

        assert_eq!(channel["inputAttachments"][0]["key"], "input-attachment");
        assert_eq!(
            channel["inputAttachments"][0]["input"],
            "projects/p/locations/r/inputs/my_stream"
        );
        assert_eq!(channel["output"]["uri"], "gs://bucket/my_stream/");
        assert_eq!(channel["manifests"][0]["fileName"], "manifest.m3u8");
        assert_eq!(channel["labels"]["created-by"], "sendlive");
    }

    #[test]
    fn test_build_input() {
        let input = build_input(GcpInputType::SrtPush, &Tags::new());
        assert_eq!(input["type"], "SRT_PUSH");
    }
}
