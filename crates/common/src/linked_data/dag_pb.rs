use prost::Message;

use super::{Cid, CodecError};

/// A dag-pb link. Field numbers follow the dag-pb schema,
///  which is why `Hash` sits on tag 1 and `Tsize` on tag 3.
#[derive(Clone, PartialEq, Message)]
pub struct PbLink {
    #[prost(bytes = "vec", optional, tag = "1")]
    pub hash: Option<Vec<u8>>,
    #[prost(string, optional, tag = "2")]
    pub name: Option<String>,
    #[prost(uint64, optional, tag = "3")]
    pub tsize: Option<u64>,
}

impl PbLink {
    pub fn new(name: impl Into<String>, cid: &Cid, tsize: u64) -> Self {
        Self {
            hash: Some(cid.to_bytes()),
            name: Some(name.into()),
            tsize: Some(tsize),
        }
    }

    pub fn cid(&self) -> Result<Cid, CodecError> {
        let hash = self.hash.as_deref().ok_or(CodecError::MissingHash)?;
        Ok(Cid::try_from(hash)?)
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct PbNode {
    #[prost(bytes = "vec", optional, tag = "1")]
    pub data: Option<Vec<u8>>,
    #[prost(message, repeated, tag = "2")]
    pub links: Vec<PbLink>,
}

impl PbNode {
    /// Encode in the canonical dag-pb layout: every link first,
    ///  in order, then the data field. A plain `encode_to_vec`
    ///  would write fields in tag order and hash differently.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        for link in &self.links {
            prost::encoding::message::encode(2, link, &mut buf);
        }
        if let Some(data) = &self.data {
            prost::encoding::bytes::encode(1, data, &mut buf);
        }
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(Self::decode(bytes)?)
    }
}
