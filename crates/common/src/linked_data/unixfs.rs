use prost::Message;
use serde::{Deserialize, Serialize};

use super::CodecError;

/// The UnixFS `Data` message carried in the data field of
///  every dag-pb node we write.
#[derive(Clone, PartialEq, Message)]
pub struct UnixFs {
    #[prost(enumeration = "DataType", required, tag = "1")]
    pub data_type: i32,
    #[prost(bytes = "vec", optional, tag = "2")]
    pub data: Option<Vec<u8>>,
    #[prost(uint64, optional, tag = "3")]
    pub filesize: Option<u64>,
    #[prost(uint64, repeated, packed = "false", tag = "4")]
    pub blocksizes: Vec<u64>,
    #[prost(uint64, optional, tag = "5")]
    pub hash_type: Option<u64>,
    #[prost(uint64, optional, tag = "6")]
    pub fanout: Option<u64>,
    #[prost(uint32, optional, tag = "7")]
    pub mode: Option<u32>,
    #[prost(message, optional, tag = "8")]
    pub mtime: Option<UnixTime>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum DataType {
    Raw = 0,
    Directory = 1,
    File = 2,
    Metadata = 3,
    Symlink = 4,
    HamtShard = 5,
}

#[derive(Clone, PartialEq, Message)]
pub struct UnixTime {
    #[prost(int64, required, tag = "1")]
    pub seconds: i64,
    #[prost(fixed32, optional, tag = "2")]
    pub fractional_nanoseconds: Option<u32>,
}

/// Modification time, seconds since the epoch plus nanoseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Mtime {
    pub secs: i64,
    pub nsecs: u32,
}

impl Mtime {
    pub fn new(secs: i64, nsecs: u32) -> Self {
        Self { secs, nsecs }
    }

    pub fn now() -> Self {
        let now = chrono::Utc::now();
        Self {
            secs: now.timestamp(),
            nsecs: now.timestamp_subsec_nanos(),
        }
    }
}

/// Optional POSIX-ish metadata a file or directory node may carry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Metadata {
    pub mode: Option<u32>,
    pub mtime: Option<Mtime>,
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        self.mode.is_none() && self.mtime.is_none()
    }
}

impl UnixFs {
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type: data_type as i32,
            ..Default::default()
        }
    }

    pub fn kind(&self) -> Result<DataType, CodecError> {
        DataType::try_from(self.data_type).map_err(|_| CodecError::UnknownDataType(self.data_type))
    }

    pub fn metadata(&self) -> Metadata {
        Metadata {
            mode: self.mode.map(|mode| mode & 0o7777),
            mtime: self.mtime.as_ref().map(|mtime| Mtime {
                secs: mtime.seconds,
                nsecs: mtime.fractional_nanoseconds.unwrap_or_default(),
            }),
        }
    }

    pub fn set_metadata(&mut self, metadata: &Metadata) {
        self.mode = metadata.mode.map(|mode| mode & 0o7777);
        // zero nanoseconds are left out of the encoding
        self.mtime = metadata.mtime.map(|mtime| UnixTime {
            seconds: mtime.secs,
            fractional_nanoseconds: (mtime.nsecs > 0).then_some(mtime.nsecs),
        });
    }

    /// Number of content bytes reachable from a file node
    pub fn file_size(&self) -> u64 {
        self.filesize.unwrap_or_else(|| {
            let inline = self.data.as_ref().map(Vec::len).unwrap_or_default() as u64;
            inline + self.blocksizes.iter().sum::<u64>()
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.encode_to_vec()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(Self::decode(bytes)?)
    }
}
