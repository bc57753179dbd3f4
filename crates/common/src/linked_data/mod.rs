use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

mod dag_pb;
mod unixfs;

pub use cid::Cid;
pub use dag_pb::{PbLink, PbNode};
pub use multihash::Multihash;
pub use unixfs::{DataType, Metadata, Mtime, UnixFs, UnixTime};

/// Multicodec of dag-pb encoded blocks
pub const DAG_PB_CODEC: u64 = 0x70;
/// Multicodec of raw leaf blocks
pub const RAW_CODEC: u64 = 0x55;
/// Multihash code of sha2-256
pub const SHA2_256_CODE: u64 = 0x12;
/// Multicodec recorded as the `hashType` of HAMT shard nodes
pub const MURMUR3_X64_64_CODE: u64 = 0x22;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("protobuf decode error: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("cid error: {0}")]
    Cid(#[from] cid::Error),
    #[error("multihash error: {0}")]
    Multihash(#[from] multihash::Error),
    #[error("dag-pb link is missing its hash")]
    MissingHash,
    #[error("dag-pb node carries no unixfs data")]
    MissingData,
    #[error("unknown unixfs data type: {0}")]
    UnknownDataType(i32),
    #[error("unsupported codec: {0:#x}")]
    UnsupportedCodec(u64),
    #[error("unsupported cid version: {0}")]
    UnsupportedCidVersion(u8),
}

/// CID version used for newly written dag-pb nodes.
///  Raw leaves can't be expressed as v0 and always
///  use v1, regardless of this setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CidVersion {
    #[default]
    V0,
    V1,
}

impl TryFrom<u8> for CidVersion {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CidVersion::V0),
            1 => Ok(CidVersion::V1),
            other => Err(CodecError::UnsupportedCidVersion(other)),
        }
    }
}

impl From<CidVersion> for u8 {
    fn from(version: CidVersion) -> Self {
        match version {
            CidVersion::V0 => 0,
            CidVersion::V1 => 1,
        }
    }
}

/// Hash `bytes` with sha2-256 and wrap the digest in a CID
///  of the requested version. Anything that isn't dag-pb
///  falls back to v1.
pub fn block_cid(version: CidVersion, codec: u64, bytes: &[u8]) -> Result<Cid, CodecError> {
    let digest = Sha256::digest(bytes);
    let hash = Multihash::<64>::wrap(SHA2_256_CODE, &digest)?;
    match version {
        CidVersion::V0 if codec == DAG_PB_CODEC => Ok(Cid::new_v0(hash)?),
        _ => Ok(Cid::new_v1(codec, hash)),
    }
}

/**
 * Links
 * =====
 * A named pointer from a directory to a child node.
 *  `size` is the cumulative size of everything reachable
 *  through the link (the dag-pb `Tsize`): the child's block
 *  plus the sizes of all of its own links.
 */
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    name: String,
    cid: Cid,
    size: u64,
}

impl Link {
    pub fn new(name: impl Into<String>, cid: Cid, size: u64) -> Self {
        Self {
            name: name.into(),
            cid,
            size,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cid(&self) -> &Cid {
        &self.cid
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Bytes this link contributes to a directory's estimated
    ///  serialized size: the name plus the binary CID.
    pub fn estimated_size(&self) -> u64 {
        (self.name.len() + self.cid.to_bytes().len()) as u64
    }

    pub(crate) fn to_pb(&self) -> PbLink {
        PbLink::new(self.name.clone(), &self.cid, self.size)
    }
}

/// A decoded block: either a dag-pb node with its UnixFS
///  payload, or the bytes of a raw leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    DagPb { node: PbNode, unixfs: UnixFs },
    Raw(Bytes),
}

impl Block {
    /// Decode the block behind `cid`, dispatching on the CID's codec
    pub fn decode(cid: &Cid, bytes: Bytes) -> Result<Self, CodecError> {
        match cid.codec() {
            DAG_PB_CODEC => {
                let node = PbNode::from_bytes(&bytes)?;
                let data = node.data.as_deref().ok_or(CodecError::MissingData)?;
                let unixfs = UnixFs::from_bytes(data)?;
                Ok(Block::DagPb { node, unixfs })
            }
            RAW_CODEC => Ok(Block::Raw(bytes)),
            other => Err(CodecError::UnsupportedCodec(other)),
        }
    }

    /// Length of the encoded block itself
    pub fn encoded_len(&self) -> u64 {
        match self {
            Block::DagPb { node, .. } => node.to_bytes().len() as u64,
            Block::Raw(bytes) => bytes.len() as u64,
        }
    }

    /// Sum of the `Tsize` of every outgoing link
    pub fn links_size(&self) -> u64 {
        match self {
            Block::DagPb { node, .. } => node.links.iter().map(PbLink::tsize).sum(),
            Block::Raw(_) => 0,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_empty_directory_cid() {
        let node = PbNode {
            data: Some(UnixFs::new(DataType::Directory).to_bytes()),
            links: vec![],
        };
        let bytes = node.to_bytes();
        assert_eq!(bytes, vec![0x0a, 0x02, 0x08, 0x01]);

        let v0 = block_cid(CidVersion::V0, DAG_PB_CODEC, &bytes).unwrap();
        assert_eq!(
            v0.to_string(),
            "QmUNLLsPACCz1vLxQVkXqqLX5R1X345qqfHbsf67hvA3Nn"
        );
        let v1 = block_cid(CidVersion::V1, DAG_PB_CODEC, &bytes).unwrap();
        assert_eq!(
            v1.to_string(),
            "bafybeiczsscdsbs7ffqz55asqdf3smv6klcw3gofszvwlyarci47bgf354"
        );
    }

    #[test]
    fn test_raw_blocks_are_always_v1() {
        let cid = block_cid(CidVersion::V0, RAW_CODEC, b"hello").unwrap();
        assert_eq!(cid.version(), cid::Version::V1);
        assert_eq!(cid.codec(), RAW_CODEC);
    }

    #[test]
    fn test_decode_dispatches_on_codec() {
        let raw = block_cid(CidVersion::V1, RAW_CODEC, b"leaf").unwrap();
        let block = Block::decode(&raw, Bytes::from_static(b"leaf")).unwrap();
        assert_eq!(block, Block::Raw(Bytes::from_static(b"leaf")));
        assert_eq!(block.encoded_len(), 4);

        let node = PbNode {
            data: Some(UnixFs::new(DataType::Directory).to_bytes()),
            links: vec![PbLink::new("a", &raw, 4)],
        };
        let bytes = node.to_bytes();
        let cid = block_cid(CidVersion::V0, DAG_PB_CODEC, &bytes).unwrap();
        match Block::decode(&cid, Bytes::from(bytes)).unwrap() {
            Block::DagPb { node, unixfs } => {
                assert_eq!(unixfs.kind().unwrap(), DataType::Directory);
                assert_eq!(node.links[0].cid().unwrap(), raw);
            }
            Block::Raw(_) => panic!("expected a dag-pb node"),
        }
    }

    #[test]
    fn test_cid_version_from_int() {
        assert_eq!(CidVersion::try_from(1).unwrap(), CidVersion::V1);
        assert!(CidVersion::try_from(2).is_err());
    }
}
