use serde::{Deserialize, Serialize};

use super::short_id;

const WEB_DATA_STREAM: &str = "WEB_DATA_STREAM";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataStream {
    /// Resource name, `properties/{property_id}/dataStreams/{stream_id}`
    pub name: String,
    #[serde(rename = "type")]
    pub stream_type: Option<String>,
    pub display_name: Option<String>,
    pub create_time: Option<String>,
    pub web_stream_data: Option<WebStreamData>,
    pub android_app_stream_data: Option<AndroidAppStreamData>,
    pub ios_app_stream_data: Option<IosAppStreamData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebStreamData {
    pub measurement_id: Option<String>,
    pub firebase_app_id: Option<String>,
    pub default_uri: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidAppStreamData {
    pub firebase_app_id: Option<String>,
    pub package_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IosAppStreamData {
    pub firebase_app_id: Option<String>,
    pub bundle_id: Option<String>,
}

impl DataStream {
    pub fn id(&self) -> &str {
        short_id(&self.name)
    }

    pub fn measurement_id(&self) -> Option<&str> {
        self.web_stream_data
            .as_ref()
            .and_then(|web| web.measurement_id.as_deref())
    }
}

/// Request body for creating a web data stream
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDataStream {
    pub display_name: String,
    #[serde(rename = "type")]
    pub stream_type: String,
    pub web_stream_data: WebStreamData,
}

impl NewDataStream {
    pub fn web(display_name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            stream_type: WEB_DATA_STREAM.to_string(),
            web_stream_data: WebStreamData {
                default_uri: Some(url.into()),
                ..WebStreamData::default()
            },
        }
    }
}
