//! MediaLive channel descriptor builder.

use serde_json::{Value, json};

use super::defaults;
use crate::tags::{self, Tags};

/// Builds a MediaLive `CreateChannel` body from the default presets.
///
/// The encoder ladder sends every rendition to one MediaPackage channel.
#[derive(Debug, Clone)]
pub struct EncoderChannelBuilder {
    name: String,
    input_id: String,
    mediapackage_channel_id: String,
    destination_id: String,
    role_arn: Option<String>,
    tags: Option<Tags>,
}

impl EncoderChannelBuilder {
    /// Starts a channel named `name` reading from `input_id` and publishing
    /// to `mediapackage_channel_id`.
    pub fn new(
        name: impl Into<String>,
        input_id: impl Into<String>,
        mediapackage_channel_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            input_id: input_id.into(),
            mediapackage_channel_id: mediapackage_channel_id.into(),
            destination_id: defaults::DEFAULT_DESTINATION_ID.to_string(),
            role_arn: None,
            tags: None,
        }
    }

    /// Overrides the destination id linking the output group to the
    /// MediaPackage destination.
    #[must_use]
    pub fn with_destination_id(mut self, destination_id: impl Into<String>) -> Self {
        self.destination_id = destination_id.into();
        self
    }

    /// Sets the IAM role the channel runs as.
    #[must_use]
    pub fn with_role_arn(mut self, role_arn: Option<String>) -> Self {
        self.role_arn = role_arn;
        self
    }

    /// Sets caller tags; the provenance tag is always added.
    #[must_use]
    pub fn with_tags(mut self, tags: Option<Tags>) -> Self {
        self.tags = tags;
        self
    }

    /// Builds the descriptor.
    pub fn build(&self) -> Value {
        let mut descriptor = json!({
            "channelClass": "SINGLE_PIPELINE",
            "destinations": [{
                "id": self.destination_id,
                "mediaPackageSettings": [{ "channelId": self.mediapackage_channel_id }],
            }],
            "encoderSettings": defaults::encoder_settings(&self.destination_id),
            "inputAttachments": [{
                "inputAttachmentName": self.input_id,
                "inputId": self.input_id,
                "inputSettings": defaults::input_settings(),
            }],
            "inputSpecification": defaults::input_specification(),
            "name": self.name,
            "tags": tags::normalize(self.tags.as_ref()),
        });

        if let Some(role_arn) = &self.role_arn {
            descriptor["roleArn"] = json!(role_arn);
        }

        descriptor
    }
}
