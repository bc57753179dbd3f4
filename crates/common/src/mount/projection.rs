use crate::exporter;
use crate::linked_data::{Cid, Link};
use crate::store::BlockStore;

use super::MountError;

/// Turn an existing node into a link named `name`, sized with
///  the node's cumulative size. Nothing is re-encoded.
pub async fn cid_to_link<S: BlockStore>(
    store: &S,
    cid: &Cid,
    name: &str,
) -> Result<Link, MountError> {
    let entry = exporter::resolve(store, cid, None).await?;
    Ok(Link::new(name, *cid, entry.cumulative_size))
}
