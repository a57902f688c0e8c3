//! Repository ingestion primitives: descriptor parsing, git transport,
//! SSH key materialization, workflow diagram synthesis and README rendering.

pub mod descriptor;
pub mod diagram;
pub mod error;
pub mod git;
pub mod readme;
pub mod ssh;
pub mod workdir;

pub use descriptor::Descriptor;
pub use diagram::{DiagramSynthesizer, NoDiagram, ProgressLogDiagram};
pub use error::{GitError, IngestError};
pub use git::GitClient;
pub use ssh::{SshCredential, TransportKey};
