use serde::{Deserialize, Serialize};

// Nested structs capturing the shape of the VideoAccessToken_Clip GraphQL response.
// Every level is optional since the endpoint answers `"clip": null` for unknown slugs.

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VideoSourceResponse {
    pub data: Option<Data>,
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Data {
    pub clip: Option<Clip>,
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub playback_access_token: Option<PlaybackAccessToken>,

    pub video_qualities: Option<Vec<VideoQuality>>,
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VideoQuality {
    pub quality: Option<String>,

    #[serde(rename = "sourceURL")]
    pub source_url: Option<String>,
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackAccessToken {
    pub signature: Option<String>,

    pub value: Option<String>,
}
