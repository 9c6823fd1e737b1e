//! Inbound path parsing and resource classification
//!
//! `/{channel}/{resource...}` is split into a channel lookup and a resource
//! path; the resource path alone decides the [`ResourceClass`].


use crate::channel::{Channel, ChannelRegistry};
use crate::{Error, Result};

/// Resource name a client requests for the top of a channel's playlist hierarchy.
pub const MASTER_PLAYLIST: &str = "playlist.m3u8";

const PLAYLIST_EXTENSION: &str = "m3u8";
const SEGMENT_EXTENSIONS: &[&str] = &["ts", "aac", "mp3", "m4a", "m4s", "mp4"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceClass {
    MasterPlaylist,
    Chunklist,
    Segment,
}

impl ResourceClass {
    /// Classify a resource path.
    ///
    /// Non-playlist resources with an unknown extension are treated as opaque segments.
    #[must_use]
    pub fn classify(resource_path: &str) -> Self {
        if resource_path == MASTER_PLAYLIST {
            return Self::MasterPlaylist;
        }

        let extension = extension(resource_path);
        if SEGMENT_EXTENSIONS
            .iter()
            .any(|ext| extension.eq_ignore_ascii_case(ext))
        {
            Self::Segment
        } else if extension.eq_ignore_ascii_case(PLAYLIST_EXTENSION) {
            Self::Chunklist
        } else {
            Self::Segment
        }
    }

    #[must_use]
    pub const fn is_playlist(self) -> bool {
        matches!(self, Self::MasterPlaylist | Self::Chunklist)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MasterPlaylist => "master_playlist",
            Self::Chunklist => "chunklist",
            Self::Segment => "segment",
        }
    }
}

/// A validated request for one resource of one channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    pub channel: Channel,
    pub resource_path: String,
    pub class: ResourceClass,
}

impl ResourceRequest {
    /// Validate a channel id and resource path taken from the inbound URL.
    ///
    /// An empty resource path means the master playlist.
    pub fn parse(
        registry: &ChannelRegistry,
        channel_id: &str,
        resource_path: Option<&str>,
    ) -> Result<Self> {
        let channel = registry.get(channel_id)?.clone();

        let resource_path = match resource_path.map(|p| p.trim_matches('/')) {
            None | Some("") => MASTER_PLAYLIST.to_string(),
            Some(path) => {
                if path
                    .split('/')
                    .any(|segment| segment.is_empty() || segment == "." || segment == "..")
                {
                    return Err(Error::InvalidResource(path.to_string()));
                }
                path.to_string()
            }
        };

        let class = ResourceClass::classify(&resource_path);
        Ok(Self {
            channel,
            resource_path,
            class,
        })
    }

    #[must_use]
    pub fn extension(&self) -> &str {
        extension(&self.resource_path)
    }
}

/// Extension of the last path segment, without the dot and ignoring any query string.
#[must_use]
pub fn extension(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let file_name = path.rsplit('/').next().unwrap_or_default();
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext,
        _ => "",
    }
}
