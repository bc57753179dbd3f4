/**
 * Settings shared by every operation on a tree:
 *  CID version, shard threshold and fanout, chunking.
 */
pub mod config;
/**
 * Directory representations and the HAMT sharding
 *  engine. Decides between a flat link list and a
 *  shard tree based on the directory's size.
 */
pub mod dir;
/**
 * Read side: walks paths through flat and sharded
 *  directories and reads ranges out of files.
 */
pub mod exporter;
/**
 * Write side for file content: fixed size chunking
 *  into a balanced tree of UnixFS nodes.
 */
pub mod importer;
/**
 * dag-pb and UnixFS codecs, CIDs and links.
 */
pub mod linked_data;
/**
 * Filesystem style handle over a root CID.
 *  Every mutation yields a new root.
 */
pub mod mount;
/**
 * Content addressed block storage, in memory
 *  or on disk.
 */
pub mod store;

pub mod prelude {
    pub use crate::config::Config;
    pub use crate::dir::{DirError, DirOptions, Directory, Persisted};
    pub use crate::exporter::{Entry, EntryKind};
    pub use crate::linked_data::{Cid, CidVersion, Link, Metadata, Mtime};
    pub use crate::mount::{
        AddOptions, CatOptions, CpOptions, LsEntry, MkdirOptions, Mount, MountError, RmOptions,
        Stat,
    };
    pub use crate::store::{BlockStore, BlockStoreError, FsBlockStore, MemoryBlockStore};
}
