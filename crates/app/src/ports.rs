//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the two external
//! collaborators: the cloud device service and the local pairing library.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod accessory;
pub mod cloud;
pub mod snapshot;
pub mod stream;

pub use accessory::{AccessoryHost, Listener};
pub use cloud::CloudDevices;
pub use snapshot::SnapshotSink;
pub use stream::DeviceStream;
